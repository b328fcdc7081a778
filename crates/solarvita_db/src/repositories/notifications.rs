//! SQL implementation of the notification repository
//!
//! User-scoped records live in `notifications`, device-scoped chat records
//! in `outbox_notifications`. Both tables share the same columns apart from
//! the recipient.

use crate::error::DbError;
use crate::DbClient;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use solarvita_common::{
    NotificationPayload, NotificationRecord, NotificationRepository, NotificationType,
    PurgeCounts, Recipient, StoreError,
};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

const RECORD_COLUMNS: &str =
    "id, title, body, type, data, action_url, image_url, created_at, is_read";

#[derive(Debug, Clone)]
pub struct SqlNotificationRepository {
    db_client: DbClient,
}

impl SqlNotificationRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, DbError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| DbError::CorruptRow(format!("bad timestamp {}", millis)))
}

fn record_from_row(row: &AnyRow, recipient: Recipient) -> Result<NotificationRecord, DbError> {
    let kind: String = row.try_get("type")?;
    let data: String = row.try_get("data")?;
    let created_at: i64 = row.try_get("created_at")?;
    let is_read: i64 = row.try_get("is_read")?;

    let data: NotificationPayload =
        serde_json::from_str(&data).map_err(|e| DbError::CorruptRow(e.to_string()))?;

    Ok(NotificationRecord {
        id: row.try_get("id")?,
        recipient,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        kind: NotificationType::parse(&kind),
        type_tag: Some(kind),
        data,
        action_url: row.try_get("action_url")?,
        image_url: row.try_get("image_url")?,
        created_at: millis_to_datetime(created_at)?,
        is_read: is_read != 0,
    })
}

#[async_trait]
impl NotificationRepository for SqlNotificationRepository {
    async fn insert(&self, record: &NotificationRecord) -> Result<bool, StoreError> {
        debug!(id = %record.id, "Inserting notification record");

        let (table, recipient_column, recipient) = match &record.recipient {
            Recipient::User(user_id) => ("notifications", "user_id", user_id),
            Recipient::Device(token) => ("outbox_notifications", "recipient_token", token),
        };

        let query = format!(
            "INSERT INTO {table} (id, {recipient_column}, title, body, type, data, action_url, image_url, created_at, is_read) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO NOTHING"
        );

        let data = serde_json::to_string(&record.data)
            .map_err(|e| DbError::QueryError(format!("Failed to encode payload: {}", e)))?;

        let result = sqlx::query(&query)
            .bind(&record.id)
            .bind(recipient)
            .bind(record.title.clone())
            .bind(record.body.clone())
            .bind(record.wire_type())
            .bind(data)
            .bind(record.action_url.clone())
            .bind(record.image_url.clone())
            .bind(record.created_at.timestamp_millis())
            .bind(i64::from(record.is_read))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert notification record: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_for_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>, StoreError> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC"
        );

        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        let records = rows
            .iter()
            .map(|row| record_from_row(row, Recipient::User(user_id.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn find_outbox(&self, id: &str) -> Result<Option<NotificationRecord>, StoreError> {
        let query = format!(
            "SELECT {RECORD_COLUMNS}, recipient_token FROM outbox_notifications WHERE id = $1"
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        match row {
            Some(row) => {
                let token: String = row.try_get("recipient_token").map_err(DbError::from)?;
                Ok(Some(record_from_row(&row, Recipient::Device(token))?))
            }
            None => Ok(None),
        }
    }

    async fn delete_outbox(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM outbox_notifications WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn user_ids(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT DISTINCT user_id FROM notifications ORDER BY user_id")
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        let ids = rows
            .iter()
            .map(|row| row.try_get::<String, _>("user_id"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)?;
        Ok(ids)
    }

    async fn delete_older_than(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<u64, StoreError> {
        let query = r#"
            DELETE FROM notifications
            WHERE id IN (
                SELECT id FROM notifications
                WHERE user_id = $1 AND created_at < $2
                ORDER BY created_at
                LIMIT $3
            )
        "#;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(cutoff.timestamp_millis())
            .bind(limit)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!(user_id, "Failed to delete old notifications: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected())
    }

    // The purge spans both tables, so it runs here in a single transaction.
    async fn purge_user(&self, user_id: &str) -> Result<PurgeCounts, StoreError> {
        let mut tx = self.db_client.begin().await?;

        let notifications = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?
            .rows_affected();

        let tokens = sqlx::query("DELETE FROM fcm_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!(user_id, notifications, tokens, "Purged user data");
        Ok(PurgeCounts {
            notifications,
            tokens,
        })
    }

    async fn is_healthy(&self) -> bool {
        self.db_client.is_healthy().await
    }
}
