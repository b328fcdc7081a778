use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{trigger_auth_middleware, TriggerAuthState};
use crate::handlers::{
    health, notification_created, retention_sweep, root, send_direct_notification,
    update_user_token, user_deleted, NotificationState,
};

/// Creates the router with the callables, the trigger endpoints and the
/// health checks.
///
/// Trigger endpoints require the `X-Trigger-Secret` header to match
/// `trigger_secret`; without a configured secret they answer 500.
pub fn routes(state: Arc<NotificationState>, trigger_secret: Option<String>) -> Router {
    if trigger_secret.as_deref().map_or(true, str::is_empty) {
        warn!("No trigger shared secret configured, /triggers/* will reject all calls");
    }

    let auth_state = Arc::new(TriggerAuthState {
        shared_secret: trigger_secret,
    });

    let triggers = Router::new()
        .route("/triggers/notification-created", post(notification_created))
        .route("/triggers/user-deleted", post(user_deleted))
        .route("/triggers/retention-sweep", post(retention_sweep))
        .layer(middleware::from_fn_with_state(
            auth_state,
            trigger_auth_middleware,
        ));

    info!("Notification routes initialized");

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/updateUserToken", post(update_user_token))
        .route("/sendDirectNotification", post(send_direct_notification))
        .merge(triggers)
        .with_state(state)
}
