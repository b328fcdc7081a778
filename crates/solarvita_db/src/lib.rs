//! Storage for the SolarVita notification backend
//!
//! Device tokens and notification records are kept either in a SQL database
//! reached through `sqlx`'s Any driver (SQLite by default, PostgreSQL with
//! the `postgres` feature) or in the in-memory [`MemoryStore`].
//!
//! # Example
//!
//! ```rust,no_run
//! use solarvita_db::{init_schema, DbClient, SqlNotificationRepository, SqlTokenRepository};
//!
//! async fn setup_db() -> Result<(), Box<dyn std::error::Error>> {
//!     let db_client = DbClient::from_url("sqlite:data/solarvita.db").await?;
//!     init_schema(&db_client).await?;
//!     let tokens = SqlTokenRepository::new(db_client.clone());
//!     let notifications = SqlNotificationRepository::new(db_client);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod memory;
pub mod repositories;
pub mod schema;

pub use client::DbClient;
pub use error::DbError;
pub use memory::MemoryStore;
pub use repositories::{SqlNotificationRepository, SqlTokenRepository};
pub use schema::init_schema;
