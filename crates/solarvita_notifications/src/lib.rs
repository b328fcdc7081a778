//! SolarVita notification pipeline
//!
//! - [`registry::TokenRegistry`] stores device push tokens per user
//! - [`writer::NotificationWriter`] stores notification records and emits
//!   creation events
//! - [`dispatch::DispatchTrigger`] fans a created record out to its devices
//! - [`janitor::TokenJanitor`] prunes dead tokens and purges deleted accounts
//! - [`sweeper::RetentionSweeper`] deletes records past the retention window
//!
//! [`routes`] exposes the callables and the platform triggers over HTTP.

pub mod auth;
pub mod dispatch;
#[cfg(feature = "openapi")]
pub mod doc;
pub mod events;
pub mod handlers;
pub mod janitor;
pub mod message;
pub mod registry;
pub mod routes;
pub mod sweeper;
pub mod templates;
pub mod writer;

pub use dispatch::{DispatchOutcome, DispatchTrigger};
pub use events::{TriggerEvent, TriggerSender};
pub use handlers::NotificationState;
pub use janitor::TokenJanitor;
pub use registry::TokenRegistry;
pub use routes::routes;
pub use sweeper::{RetentionSweeper, SweepReport};
pub use templates::{template_for, Template};
pub use writer::NotificationWriter;

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::NotificationsApiDoc;
}
