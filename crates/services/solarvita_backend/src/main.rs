// File: services/solarvita_backend/src/main.rs
use axum::Router;
use solarvita_common::{config_error, init_from_config, internal_error, SolarvitaError};
use solarvita_config::load_config;
use solarvita_notifications::{events, routes};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

mod app_state;
mod scheduler;

use app_state::AppState;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = %err, "Server stopped");
        eprintln!("solarvita-backend: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), SolarvitaError> {
    let config = Arc::new(load_config().map_err(|e| config_error(format!("Failed to load config: {e}")))?);
    init_from_config(&config.logging.level);

    let AppState {
        config,
        notifications,
        events: trigger_events,
    } = AppState::new(config).await?;

    let worker = events::spawn_worker(trigger_events, notifications.dispatch.clone());
    let sweeps = scheduler::spawn_retention_sweeps(
        notifications.sweeper.clone(),
        scheduler::sweep_interval(config.notifications.sweep_interval_hours),
    );

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app: Router = routes(notifications, config.triggers.shared_secret.clone());

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use solarvita_notifications::openapi::NotificationsApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "SolarVita Notifications API",
                version = "0.1.0",
                description = "Push token registration, notification callables and platform triggers"
            ),
            tags(
                (name = "Callables", description = "Firebase callable protocol endpoints"),
                (name = "Triggers", description = "Endpoints invoked by the hosting platform"),
                (name = "Health", description = "Liveness and store reachability")
            ),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(NotificationsApiDoc::openapi());
        info!("Adding Swagger UI at /docs");

        app = app.merge(SwaggerUi::new("/docs").url("/docs/openapi.json", openapi_doc));
    }

    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| internal_error(format!("Failed to bind {addr}: {e}")))?;
    info!("Starting server at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| internal_error(format!("Server error: {e}")))?;

    // The router owned the last writer, so the bus is closed now and the
    // worker drains what is still queued.
    sweeps.abort();
    match tokio::time::timeout(DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => info!("Trigger queue drained"),
        Ok(Err(err)) => error!(error = %err, "Trigger worker failed"),
        Err(_) => warn!(
            timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "Trigger queue not drained before timeout"
        ),
    }
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
