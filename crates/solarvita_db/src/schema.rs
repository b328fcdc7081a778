//! Table layout of the SolarVita store.
//!
//! Timestamps are stored as BIGINT milliseconds since the epoch and flags as
//! integers, because the Any driver cannot decode dates or booleans portably.

use crate::client::DbClient;
use crate::error::DbError;
use tracing::{debug, info};

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS fcm_tokens (
        user_id TEXT NOT NULL,
        slot TEXT NOT NULL,
        token TEXT NOT NULL,
        platform TEXT NOT NULL,
        updated_at BIGINT NOT NULL,
        PRIMARY KEY (user_id, slot)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        title TEXT,
        body TEXT,
        type TEXT NOT NULL,
        data TEXT NOT NULL,
        action_url TEXT,
        image_url TEXT,
        created_at BIGINT NOT NULL,
        is_read BIGINT NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_notifications_user_created
        ON notifications (user_id, created_at)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS outbox_notifications (
        id TEXT PRIMARY KEY,
        recipient_token TEXT NOT NULL,
        title TEXT,
        body TEXT,
        type TEXT NOT NULL,
        data TEXT NOT NULL,
        action_url TEXT,
        image_url TEXT,
        created_at BIGINT NOT NULL,
        is_read BIGINT NOT NULL DEFAULT 0
    )
    "#,
];

/// Creates the tables and indexes if they do not exist yet.
pub async fn init_schema(db_client: &DbClient) -> Result<(), DbError> {
    debug!("Initializing notification schema");

    for statement in STATEMENTS {
        db_client.execute(statement).await?;
    }

    info!("Notification schema initialized successfully");
    Ok(())
}
