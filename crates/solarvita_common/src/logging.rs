//! Logging setup for the SolarVita services.
//!
//! All crates log through the `tracing` macros; this module only installs
//! the global subscriber.

use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber at INFO.
///
/// ```
/// use solarvita_common::logging;
///
/// logging::init();
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` is honored; the given level is added as a directive for the
/// `solarvita*` targets. A second call is a no-op.
pub fn init_with_level(level: Level) {
    let mut filter = EnvFilter::from_default_env();
    for target in ["solarvita", "solarvita_backend", "solarvita_notifications"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(err) => eprintln!("Ignoring log directive for {}: {}", target, err),
        }
    }

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize from a configured level name such as `"debug"`.
///
/// Unknown names fall back to INFO.
pub fn init_from_config(level: &str) {
    match level.parse::<Level>() {
        Ok(level) => init_with_level(level),
        Err(_) => {
            init_with_level(Level::INFO);
            warn!("Unknown log level '{}', using info", level);
        }
    }
}
