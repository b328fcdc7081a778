//! Repository modules for database access
//!
//! SQL implementations of the store traits declared in `solarvita_common`.

pub mod notifications;
pub mod tokens;

pub use notifications::SqlNotificationRepository;
pub use tokens::SqlTokenRepository;
