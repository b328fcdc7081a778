//! HTTP handlers for the callables and the platform triggers
//!
//! Callables speak the Firebase callable protocol: arguments arrive wrapped
//! in `{"data": ...}` and results leave wrapped in `{"result": ...}`.
//! Trigger endpoints are invoked by the hosting platform with the created
//! document or event as plain JSON and answer with the run's outcome.

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use solarvita_common::{
    invalid_argument, unauthenticated, CallableRequest, CallableResponse, IdentityVerifier,
    NotificationDocument, NotificationRecord, NotificationRepository, PurgeCounts,
    SolarvitaError,
};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::auth::Caller;
use crate::dispatch::{DispatchOutcome, DispatchTrigger};
use crate::janitor::TokenJanitor;
use crate::registry::{RegisterTokenRequest, RegisterTokenResult, TokenRegistry};
use crate::sweeper::{RetentionSweeper, SweepReport};
use crate::writer::{DirectNotificationRequest, DirectNotificationResult, NotificationWriter};

/// Shared state for the notification handlers
///
/// Every collaborator is built once at startup and shared read-only.
pub struct NotificationState {
    pub registry: Arc<TokenRegistry>,
    pub writer: Arc<NotificationWriter>,
    pub dispatch: Arc<DispatchTrigger>,
    pub janitor: Arc<TokenJanitor>,
    pub sweeper: Arc<RetentionSweeper>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub notifications: Arc<dyn NotificationRepository>,
}

/// Event body of the account deletion trigger.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct UserDeletedEvent {
    pub uid: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: bool,
}

// Unauthenticated wins over a malformed body.
fn callable_args<T>(
    caller: &Caller,
    body: Result<Json<CallableRequest<T>>, JsonRejection>,
) -> Result<T, SolarvitaError> {
    match body {
        Ok(Json(request)) => Ok(request.data),
        Err(_) if caller.identity().is_none() => Err(unauthenticated("User must be authenticated")),
        Err(rejection) => Err(invalid_argument(rejection.body_text())),
    }
}

/// Registers the caller's device push token.
#[axum::debug_handler(state = Arc<NotificationState>)]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/updateUserToken",
    request_body = RegisterTokenRequest,
    responses(
        (status = 200, description = "Token stored", body = RegisterTokenResult),
        (status = 400, description = "Missing token"),
        (status = 401, description = "Caller not authenticated"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Callables"
))]
pub async fn update_user_token(
    State(state): State<Arc<NotificationState>>,
    caller: Caller,
    body: Result<Json<CallableRequest<RegisterTokenRequest>>, JsonRejection>,
) -> Result<CallableResponse<RegisterTokenResult>, SolarvitaError> {
    let request = callable_args(&caller, body)?;

    let result = state
        .registry
        .register_token(
            caller.identity(),
            &request.token,
            request.platform.unwrap_or_default(),
        )
        .await?;

    Ok(CallableResponse::new(result))
}

/// Creates a notification for another user; delivery follows through the
/// creation trigger.
#[axum::debug_handler(state = Arc<NotificationState>)]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/sendDirectNotification",
    request_body = DirectNotificationRequest,
    responses(
        (status = 200, description = "Notification stored", body = DirectNotificationResult),
        (status = 400, description = "Missing userId, title or body"),
        (status = 401, description = "Caller not authenticated"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Callables"
))]
pub async fn send_direct_notification(
    State(state): State<Arc<NotificationState>>,
    caller: Caller,
    body: Result<Json<CallableRequest<DirectNotificationRequest>>, JsonRejection>,
) -> Result<CallableResponse<DirectNotificationResult>, SolarvitaError> {
    let request = callable_args(&caller, body)?;

    let result = state
        .writer
        .send_direct_notification(caller.identity(), request)
        .await?;

    Ok(CallableResponse::new(result))
}

/// Stores a record the platform reports as created, then dispatches it.
#[axum::debug_handler(state = Arc<NotificationState>)]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/triggers/notification-created",
    request_body = NotificationDocument,
    responses(
        (status = 200, description = "Dispatch finished", body = DispatchOutcome),
        (status = 400, description = "Malformed document"),
        (status = 401, description = "Missing or wrong trigger secret"),
        (status = 500, description = "Dispatch failed, retry")
    ),
    tag = "Triggers"
))]
pub async fn notification_created(
    State(state): State<Arc<NotificationState>>,
    body: Result<Json<NotificationDocument>, JsonRejection>,
) -> Result<Json<DispatchOutcome>, SolarvitaError> {
    let Json(document) = body.map_err(|rejection| invalid_argument(rejection.body_text()))?;
    let record = NotificationRecord::try_from(document)?;

    // A redelivered event finds its record stored already and sends again.
    let created = state.writer.store(&record).await?;
    debug!(id = %record.id, created, "Notification created trigger");

    let outcome = state.dispatch.dispatch(&record).await?;
    Ok(Json(outcome))
}

/// Deletes the notifications and tokens of a deleted account.
#[axum::debug_handler(state = Arc<NotificationState>)]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/triggers/user-deleted",
    request_body = UserDeletedEvent,
    responses(
        (status = 200, description = "User data deleted", body = PurgeCounts),
        (status = 401, description = "Missing or wrong trigger secret"),
        (status = 500, description = "Purge failed, retry")
    ),
    tag = "Triggers"
))]
pub async fn user_deleted(
    State(state): State<Arc<NotificationState>>,
    body: Result<Json<UserDeletedEvent>, JsonRejection>,
) -> Result<Json<PurgeCounts>, SolarvitaError> {
    let Json(event) = body.map_err(|rejection| invalid_argument(rejection.body_text()))?;
    if event.uid.trim().is_empty() {
        return Err(invalid_argument("uid is required"));
    }

    info!(user_id = %event.uid, "User deleted trigger");
    let counts = state.janitor.purge_user(&event.uid).await?;
    Ok(Json(counts))
}

/// Runs one retention sweep immediately.
#[axum::debug_handler(state = Arc<NotificationState>)]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/triggers/retention-sweep",
    responses(
        (status = 200, description = "Sweep finished", body = SweepReport),
        (status = 401, description = "Missing or wrong trigger secret"),
        (status = 500, description = "Sweep failed for some users, retry")
    ),
    tag = "Triggers"
))]
pub async fn retention_sweep(
    State(state): State<Arc<NotificationState>>,
) -> Result<Json<SweepReport>, SolarvitaError> {
    let report = state.sweeper.sweep().await.map_err(|err| {
        error!(error = %err, "Triggered retention sweep failed");
        err
    })?;
    Ok(Json(report))
}

pub async fn root() -> &'static str {
    "Welcome to the SolarVita notification backend!"
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Store reachable", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    ),
    tag = "Health"
))]
pub async fn health(State(state): State<Arc<NotificationState>>) -> Response {
    let store = state.notifications.is_healthy().await;
    let (status_code, status) = if store {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (status_code, Json(HealthResponse { status, store })).into_response()
}
