// --- File: crates/solarvita_common/src/error.rs ---
use std::fmt;
use thiserror::Error;
use tracing::error;

/// The error taxonomy shared by every SolarVita crate.
///
/// Callable entry points surface the first three variants to the client.
/// `DeliveryFailure` and `CleanupFailure` are recovered locally by the
/// dispatch pipeline and only ever reach the logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolarvitaError {
    /// The callable was invoked without a verified caller identity
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// A required field is missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected failure; the message is safe to show to clients
    #[error("Internal error: {0}")]
    Internal(String),

    /// A send to a single device token failed
    #[error("Delivery to token {token} failed: {reason}")]
    DeliveryFailure { token: String, reason: String },

    /// A batch delete of stale data failed
    #[error("Cleanup failed: {0}")]
    CleanupFailure(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for SolarvitaError {
    fn status_code(&self) -> u16 {
        match self {
            SolarvitaError::Unauthenticated(_) => 401,
            SolarvitaError::InvalidArgument(_) => 400,
            SolarvitaError::Internal(_) => 500,
            SolarvitaError::DeliveryFailure { .. } => 502,
            SolarvitaError::CleanupFailure(_) => 500,
            SolarvitaError::ConfigError(_) => 500,
        }
    }
}

impl SolarvitaError {
    /// Status string of the callable protocol error envelope.
    pub fn callable_status(&self) -> &'static str {
        match self {
            SolarvitaError::Unauthenticated(_) => "UNAUTHENTICATED",
            SolarvitaError::InvalidArgument(_) => "INVALID_ARGUMENT",
            _ => "INTERNAL",
        }
    }

    /// Message shown to the client. Only the client-facing variants carry
    /// their text through; everything else stays opaque.
    pub fn client_message(&self) -> String {
        match self {
            SolarvitaError::Unauthenticated(msg)
            | SolarvitaError::InvalidArgument(msg)
            | SolarvitaError::Internal(msg) => msg.clone(),
            _ => "Internal error".to_string(),
        }
    }
}

/// Turns a foreign error into an opaque `Internal` error.
///
/// The underlying cause is logged here and never reaches the client; only
/// the supplied context does.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, SolarvitaError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, SolarvitaError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, SolarvitaError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|cause| {
            error!(error = %cause, "{}", context);
            SolarvitaError::Internal(context.to_string())
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T, SolarvitaError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|cause| {
            let context = f();
            error!(error = %cause, "{}", context);
            SolarvitaError::Internal(context.to_string())
        })
    }
}

impl From<serde_json::Error> for SolarvitaError {
    fn from(err: serde_json::Error) -> Self {
        SolarvitaError::InvalidArgument(err.to_string())
    }
}

// Utility functions for error handling
pub fn unauthenticated<T: fmt::Display>(message: T) -> SolarvitaError {
    SolarvitaError::Unauthenticated(message.to_string())
}

pub fn invalid_argument<T: fmt::Display>(message: T) -> SolarvitaError {
    SolarvitaError::InvalidArgument(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> SolarvitaError {
    SolarvitaError::Internal(message.to_string())
}

pub fn config_error<T: fmt::Display>(message: T) -> SolarvitaError {
    SolarvitaError::ConfigError(message.to_string())
}
