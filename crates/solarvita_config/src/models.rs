// --- File: crates/solarvita_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8086,
        }
    }
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:data/solarvita.db, loaded via SOLARVITA__DATABASE__URL
}

// --- Firebase Config ---
// Service account key is a file path; the key itself never lives in the config.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct FirebaseConfig {
    pub project_id: Option<String>,
    pub key_path: Option<String>,
    // Overrides https://fcm.googleapis.com, used against local fakes
    #[serde(default)]
    pub fcm_endpoint: Option<String>,
}

/// How device tokens are laid out per user.
///
/// A deployment picks exactly one of these; the two are never mixed.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenStorage {
    /// Single `current` slot, overwritten on every registration.
    #[default]
    Current,
    /// One slot per token value, so every installed device keeps its own entry.
    PerDevice,
}

// --- Notification pipeline Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotificationsConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default = "default_sweep_interval_hours")]
    pub sweep_interval_hours: u64,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default)]
    pub token_storage: TokenStorage,
    #[serde(default = "default_trigger_queue_capacity")]
    pub trigger_queue_capacity: usize,
}

fn default_retention_days() -> i64 {
    30
}

fn default_sweep_interval_hours() -> u64 {
    24
}

// Firestore caps a write batch at 500 operations
fn default_max_batch_size() -> usize {
    500
}

fn default_trigger_queue_capacity() -> usize {
    1024
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            sweep_interval_hours: default_sweep_interval_hours(),
            max_batch_size: default_max_batch_size(),
            token_storage: TokenStorage::default(),
            trigger_queue_capacity: default_trigger_queue_capacity(),
        }
    }
}

// --- Trigger endpoint Config ---
// Secret loaded from env var SOLARVITA_SECRET_TRIGGERS_SHARED_SECRET when set to "secret_from_env"
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TriggerConfig {
    pub shared_secret: Option<String>,
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>, // falls back to the in-memory store
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>, // falls back to the dry-run gateway

    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub triggers: TriggerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}
