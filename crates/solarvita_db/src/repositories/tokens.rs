//! SQL implementation of the token repository

use crate::error::DbError;
use crate::DbClient;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use solarvita_common::{DeviceToken, StoreError, TokenRepository};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct SqlTokenRepository {
    db_client: DbClient,
}

impl SqlTokenRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn token_from_row(row: &AnyRow) -> Result<DeviceToken, DbError> {
    let platform: String = row.try_get("platform")?;
    let updated_at: i64 = row.try_get("updated_at")?;

    Ok(DeviceToken {
        user_id: row.try_get("user_id")?,
        slot: row.try_get("slot")?,
        token: row.try_get("token")?,
        platform: platform.parse().unwrap_or_default(),
        updated_at: Utc
            .timestamp_millis_opt(updated_at)
            .single()
            .ok_or_else(|| DbError::CorruptRow(format!("bad updated_at {}", updated_at)))?,
    })
}

#[async_trait]
impl TokenRepository for SqlTokenRepository {
    async fn upsert_token(&self, token: &DeviceToken) -> Result<(), StoreError> {
        debug!(user_id = %token.user_id, slot = %token.slot, "Upserting device token");

        let query = r#"
            INSERT INTO fcm_tokens (user_id, slot, token, platform, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, slot)
            DO UPDATE SET token = excluded.token,
                          platform = excluded.platform,
                          updated_at = excluded.updated_at
        "#;

        sqlx::query(query)
            .bind(&token.user_id)
            .bind(&token.slot)
            .bind(&token.token)
            .bind(token.platform.as_str())
            .bind(token.updated_at.timestamp_millis())
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to upsert device token: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<DeviceToken>, StoreError> {
        debug!("Finding device tokens for user: {}", user_id);

        let query = r#"
            SELECT user_id, slot, token, platform, updated_at
            FROM fcm_tokens
            WHERE user_id = $1
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find device tokens: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        let tokens = rows
            .iter()
            .map(token_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tokens)
    }

    async fn delete_matching(&self, user_id: &str, tokens: &[String]) -> Result<u64, StoreError> {
        if tokens.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db_client.begin().await?;
        let mut deleted = 0;

        for token in tokens {
            let result = sqlx::query("DELETE FROM fcm_tokens WHERE user_id = $1 AND token = $2")
                .bind(user_id)
                .bind(token)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            deleted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!(user_id, deleted, "Deleted device tokens");
        Ok(deleted)
    }
}
