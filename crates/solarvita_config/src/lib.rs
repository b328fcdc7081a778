//! Configuration for the SolarVita notification backend.
//!
//! Sources are layered in this order, later ones winning:
//!
//! 1. `config/default.toml`
//! 2. `config/<RUN_ENV>.toml` (`RUN_ENV` defaults to `debug`)
//! 3. `SOLARVITA__SECTION__KEY` environment variables
//!
//! A `.env` file is loaded once before the sources are read. Values set to
//! `secret_from_env` are then replaced from `SOLARVITA_SECRET_*` variables.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::{Path, PathBuf};

pub mod env_vars;
pub mod models;

pub use models::*;

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// `DOTENV_OVERRIDE` selects another file; otherwise `.env` in the working
/// directory is used. Loading happens at most once per process and a missing
/// file is not an error. Returns the path that was (or would have been) used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

/// Loads the application configuration from `CONFIG_DIR` (default `config`).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    load_config_from(Path::new(&config_dir))
}

/// Loads the application configuration from the given directory.
///
/// Both files are optional, so an empty directory yields the defaults
/// (plus whatever the environment provides).
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, ConfigError> {
    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env_vars::get_config_prefix();

    let default_path: PathBuf = config_dir.join("default");
    let env_path: PathBuf = config_dir.join(&run_env);

    tracing::debug!(
        default = %default_path.display(),
        environment = %env_path.display(),
        "Loading configuration"
    );

    let builder = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .separator(env_vars::CONFIG_SEPARATOR)
                .try_parsing(true),
        );

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    let config = apply_secret_overrides(raw_config)?;
    validate(&config)?;
    Ok(config)
}

/// Upper bound for `notifications.retention_days` (100 years).
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Rejects values the pipeline cannot run with.
///
/// A retention of zero or less would let the sweep delete every record.
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let retention_days = config.notifications.retention_days;
    if !(1..=MAX_RETENTION_DAYS).contains(&retention_days) {
        return Err(ConfigError::Message(format!(
            "notifications.retention_days must be between 1 and {} (got {}, see {})",
            MAX_RETENTION_DAYS,
            retention_days,
            env_vars::config_path_to_env_var("notifications.retention_days")
        )));
    }
    Ok(())
}

/// Replaces every `secret_from_env` marker with its environment value.
pub fn apply_secret_overrides(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;
    env_vars::inject_env_vars(&mut json);
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("failed to rebuild config: {err}")))
}
