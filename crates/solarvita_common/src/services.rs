// --- File: crates/solarvita_common/src/services.rs ---
//! Service abstractions for the store and the identity provider.
//!
//! These traits decouple the notification pipeline from a concrete database
//! or auth backend. Every collaborator is built once at startup and shared
//! as `Arc<dyn Trait>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::SolarvitaError;
use crate::models::{CallerIdentity, DeviceToken, NotificationRecord, PurgeCounts};

/// Errors reported by a store implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),
}

/// Device token storage.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Inserts or overwrites the token stored under `(user_id, slot)`.
    async fn upsert_token(&self, token: &DeviceToken) -> Result<(), StoreError>;

    /// All token records of a user, in no particular order.
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<DeviceToken>, StoreError>;

    /// Deletes every record of `user_id` whose token value is in `tokens`,
    /// atomically. Returns the number of deleted records.
    async fn delete_matching(&self, user_id: &str, tokens: &[String]) -> Result<u64, StoreError>;
}

/// Notification record storage.
///
/// User-scoped records live in the per-user log; device-scoped records live
/// in the outbox until they are delivered.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Stores `record`. Returns `false`, leaving the stored record untouched,
    /// when a record with the same id already exists.
    async fn insert(&self, record: &NotificationRecord) -> Result<bool, StoreError>;

    /// Records of one user, newest first.
    async fn find_for_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>, StoreError>;

    async fn find_outbox(&self, id: &str) -> Result<Option<NotificationRecord>, StoreError>;

    /// Removes a delivered outbox record. Returns whether it existed.
    async fn delete_outbox(&self, id: &str) -> Result<bool, StoreError>;

    /// Every user that owns at least one record.
    async fn user_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Deletes up to `limit` records of `user_id` created strictly before
    /// `cutoff`, oldest first, in one atomic batch.
    async fn delete_older_than(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<u64, StoreError>;

    /// Deletes every notification and token of a user in one atomic batch.
    async fn purge_user(&self, user_id: &str) -> Result<PurgeCounts, StoreError>;

    async fn is_healthy(&self) -> bool;
}

/// Verifies a bearer ID token and returns the caller it identifies.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<CallerIdentity, SolarvitaError>;
}
