// --- File: crates/solarvita_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // Callable protocol envelopes
pub mod logging; // Logging utilities
pub mod models; // Data structures and models
pub mod push; // Push message and gateway seam
pub mod services; // Store and identity abstractions

// Re-export error types and utilities for easier access
pub use error::{
    config_error, internal_error, invalid_argument, unauthenticated, Context, HttpStatusCode,
    SolarvitaError,
};

pub use http::{CallableRequest, CallableResponse};

pub use logging::{init, init_from_config, init_with_level};

pub use models::{
    CallerIdentity, DeviceToken, NotificationDocument, NotificationPayload, NotificationRecord,
    NotificationType, Platform, PurgeCounts, Recipient,
};

pub use push::{DeliveryError, PushGateway, PushMessage};

pub use services::{IdentityVerifier, NotificationRepository, StoreError, TokenRepository};
