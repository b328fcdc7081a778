//! Environment variable handling for the SolarVita backend.
//!
//! Configuration values are overridden with `SOLARVITA__SECTION__KEY`
//! variables. Secrets use a separate `SOLARVITA_SECRET_SECTION_KEY` pattern
//! and are only consulted for config values set to the `secret_from_env`
//! marker.

use std::env;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "SOLARVITA";

/// The prefix for secret environment variables
pub const SECRET_PREFIX: &str = "SOLARVITA_SECRET";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// The separator for secret environment variables
pub const SECRET_SEPARATOR: &str = "_";

/// Placeholder value that is replaced by the matching secret variable
pub const SECRET_MARKER: &str = "secret_from_env";

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Convert a configuration path to an environment variable name
///
/// `"server.host"` becomes `"SOLARVITA__SERVER__HOST"`.
pub fn config_path_to_env_var(path: &str) -> String {
    let prefix = get_config_prefix();
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", prefix, CONFIG_SEPARATOR, path).to_uppercase()
}

/// Convert a secret path to an environment variable name
///
/// `"triggers.shared_secret"` becomes `"SOLARVITA_SECRET_TRIGGERS_SHARED_SECRET"`.
pub fn secret_path_to_env_var(path: &str) -> String {
    let path = path.replace('.', SECRET_SEPARATOR);
    format!("{}{}{}", SECRET_PREFIX, SECRET_SEPARATOR, path).to_uppercase()
}

/// Get an environment variable for a secret path
pub fn get_secret_env_var(path: &str) -> Option<String> {
    env::var(secret_path_to_env_var(path)).ok()
}

/// Inject secrets into a JSON value
///
/// Recursively replaces every `"secret_from_env"` string with the value of
/// the secret variable derived from its path. Markers without a matching
/// variable become `null`, so optional secrets simply stay unset.
///
/// Returns `true` if any value was replaced.
pub fn inject_env_vars(value: &mut serde_json::Value) -> bool {
    use serde_json::Value;

    fn walk(path: Vec<String>, obj: &mut Value) -> bool {
        let mut replaced = false;

        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    replaced |= walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let path_str = path.join(".");
                match get_secret_env_var(&path_str) {
                    Some(env_val) => {
                        *obj = Value::String(env_val);
                        replaced = true;
                    }
                    None => {
                        tracing::warn!("Secret variable for {} not found", path_str);
                        *obj = Value::Null;
                    }
                }
            }
            _ => {}
        }

        replaced
    }

    walk(vec![], value)
}
