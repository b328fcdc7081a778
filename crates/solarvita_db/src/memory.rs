//! In-memory store used when no database is configured, and by tests.
//!
//! One mutex guards all collections, so every operation is atomic with
//! respect to the others.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use solarvita_common::{
    DeviceToken, NotificationRecord, NotificationRepository, PurgeCounts, Recipient, StoreError,
    TokenRepository,
};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Collections {
    // keyed by (user_id, slot)
    tokens: HashMap<(String, String), DeviceToken>,
    notifications: HashMap<String, NotificationRecord>,
    outbox: HashMap<String, NotificationRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn upsert_token(&self, token: &DeviceToken) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .tokens
            .insert((token.user_id.clone(), token.slot.clone()), token.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<DeviceToken>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_matching(&self, user_id: &str, tokens: &[String]) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.tokens.len();
        inner
            .tokens
            .retain(|_, t| !(t.user_id == user_id && tokens.contains(&t.token)));
        Ok((before - inner.tokens.len()) as u64)
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert(&self, record: &NotificationRecord) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let collection = match record.recipient {
            Recipient::User(_) => &mut inner.notifications,
            Recipient::Device(_) => &mut inner.outbox,
        };
        if collection.contains_key(&record.id) {
            return Ok(false);
        }
        collection.insert(record.id.clone(), record.clone());
        Ok(true)
    }

    async fn find_for_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>, StoreError> {
        let inner = self.inner.lock().await;
        let mut records: Vec<_> = inner
            .notifications
            .values()
            .filter(|r| r.user_id() == Some(user_id))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn find_outbox(&self, id: &str) -> Result<Option<NotificationRecord>, StoreError> {
        Ok(self.inner.lock().await.outbox.get(id).cloned())
    }

    async fn delete_outbox(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.outbox.remove(id).is_some())
    }

    async fn user_ids(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().await;
        let ids: BTreeSet<String> = inner
            .notifications
            .values()
            .filter_map(|r| r.user_id().map(str::to_string))
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn delete_older_than(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;

        let mut old: Vec<(DateTime<Utc>, String)> = inner
            .notifications
            .values()
            .filter(|r| r.user_id() == Some(user_id) && r.created_at < cutoff)
            .map(|r| (r.created_at, r.id.clone()))
            .collect();
        old.sort();
        old.truncate(limit);

        for (_, id) in &old {
            inner.notifications.remove(id);
        }
        Ok(old.len() as u64)
    }

    async fn purge_user(&self, user_id: &str) -> Result<PurgeCounts, StoreError> {
        let mut inner = self.inner.lock().await;

        let notifications_before = inner.notifications.len();
        inner
            .notifications
            .retain(|_, r| r.user_id() != Some(user_id));
        let tokens_before = inner.tokens.len();
        inner.tokens.retain(|(owner, _), _| owner != user_id);

        Ok(PurgeCounts {
            notifications: (notifications_before - inner.notifications.len()) as u64,
            tokens: (tokens_before - inner.tokens.len()) as u64,
        })
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
