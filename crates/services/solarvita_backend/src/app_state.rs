// --- File: crates/services/solarvita_backend/src/app_state.rs ---
use solarvita_common::{
    config_error, IdentityVerifier, NotificationRepository, PushGateway, SolarvitaError,
    TokenRepository,
};
use solarvita_config::AppConfig;
use solarvita_db::{init_schema, DbClient, MemoryStore, SqlNotificationRepository, SqlTokenRepository};
use solarvita_firebase::{
    DryRunGateway, FirebaseClient, FirebaseIdentityVerifier, UnconfiguredIdentityVerifier,
};
use solarvita_notifications::events::{self, TriggerReceiver};
use solarvita_notifications::{
    DispatchTrigger, NotificationState, NotificationWriter, RetentionSweeper, TokenJanitor,
    TokenRegistry,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the server needs, built once at startup.
///
/// `events` is the receiving end of the trigger bus and must be handed to a
/// worker, otherwise writes block once the queue is full.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub notifications: Arc<NotificationState>,
    pub events: TriggerReceiver,
}

type Stores = (Arc<dyn TokenRepository>, Arc<dyn NotificationRepository>);

impl AppState {
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, SolarvitaError> {
        let (tokens, notifications) = build_stores(&config).await?;
        let gateway = build_gateway(&config)?;
        let verifier = build_verifier(&config);

        let (sender, events) = events::channel(config.notifications.trigger_queue_capacity);
        let janitor = Arc::new(TokenJanitor::new(tokens.clone(), notifications.clone()));

        let state = NotificationState {
            registry: Arc::new(TokenRegistry::new(
                tokens.clone(),
                config.notifications.token_storage,
            )),
            writer: Arc::new(NotificationWriter::new(notifications.clone(), sender)),
            dispatch: Arc::new(DispatchTrigger::new(
                tokens,
                notifications.clone(),
                gateway,
                janitor.clone(),
            )),
            janitor,
            sweeper: Arc::new(RetentionSweeper::new(
                notifications.clone(),
                &config.notifications,
            )),
            verifier,
            notifications,
        };

        Ok(Self {
            config,
            notifications: Arc::new(state),
            events,
        })
    }
}

async fn build_stores(config: &AppConfig) -> Result<Stores, SolarvitaError> {
    let Some(db_config) = &config.database else {
        warn!("No database configured, using the in-memory store");
        let store = Arc::new(MemoryStore::new());
        return Ok((store.clone(), store));
    };

    let db_client = DbClient::from_config(db_config)
        .await
        .map_err(|e| config_error(format!("Failed to connect to database: {e}")))?;
    init_schema(&db_client)
        .await
        .map_err(|e| config_error(format!("Failed to initialize schema: {e}")))?;
    info!("Database store initialized");

    Ok((
        Arc::new(SqlTokenRepository::new(db_client.clone())),
        Arc::new(SqlNotificationRepository::new(db_client)),
    ))
}

fn build_gateway(config: &AppConfig) -> Result<Arc<dyn PushGateway>, SolarvitaError> {
    match config.firebase.as_ref().filter(|f| f.key_path.is_some()) {
        Some(firebase) => {
            let client = FirebaseClient::new(firebase)
                .map_err(|e| config_error(format!("Failed to create FCM client: {e}")))?;
            info!("FCM gateway initialized");
            Ok(Arc::new(client))
        }
        None => {
            warn!("No Firebase service account configured, pushes are logged only");
            Ok(Arc::new(DryRunGateway::new()))
        }
    }
}

fn build_verifier(config: &AppConfig) -> Arc<dyn IdentityVerifier> {
    match config
        .firebase
        .as_ref()
        .and_then(|f| f.project_id.as_deref())
        .filter(|pid| !pid.is_empty())
    {
        Some(project_id) => Arc::new(FirebaseIdentityVerifier::new(project_id)),
        None => {
            warn!("No Firebase project id configured, callables will reject every caller");
            Arc::new(UnconfiguredIdentityVerifier)
        }
    }
}
