//! Creation of notification records.
//!
//! Storing a record is the only way a push gets sent: every successful
//! insert publishes a creation event on the trigger bus.

use serde::{Deserialize, Serialize};
use solarvita_common::{
    invalid_argument, unauthenticated, CallerIdentity, Context, NotificationPayload,
    NotificationRecord, NotificationRepository, Recipient, SolarvitaError,
};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::events::{TriggerEvent, TriggerSender};

/// Arguments of the `sendDirectNotification` callable.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectNotificationRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub notification_data: Option<NotificationPayload>,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectNotificationResult {
    pub success: bool,
    pub notification_id: String,
}

pub struct NotificationWriter {
    notifications: Arc<dyn NotificationRepository>,
    events: TriggerSender,
}

impl NotificationWriter {
    pub fn new(notifications: Arc<dyn NotificationRepository>, events: TriggerSender) -> Self {
        Self {
            notifications,
            events,
        }
    }

    /// Persists `record` without publishing anything.
    ///
    /// Returns `false` when a record with the same id is already stored; the
    /// stored one is kept as it is.
    pub async fn store(&self, record: &NotificationRecord) -> Result<bool, SolarvitaError> {
        self.notifications
            .insert(record)
            .await
            .context("Failed to store notification")
    }

    /// Persists `record` and publishes its creation event.
    ///
    /// A record whose id is already stored is not published again. Once the
    /// record is stored the insert succeeds; a bus that is already closed
    /// (server shutting down) is logged.
    pub async fn insert(&self, record: NotificationRecord) -> Result<bool, SolarvitaError> {
        if !self.store(&record).await? {
            debug!(id = %record.id, "Notification already stored, not published again");
            return Ok(false);
        }

        let id = record.id.clone();
        if let Err(err) = self
            .events
            .publish(TriggerEvent::NotificationCreated(record))
            .await
        {
            error!(id = %id, error = %err, "Stored notification was not queued for dispatch");
        }
        Ok(true)
    }

    /// Creates a user-scoped notification on behalf of an authenticated
    /// caller. Nothing is written when validation fails.
    pub async fn send_direct_notification(
        &self,
        caller: Option<&CallerIdentity>,
        request: DirectNotificationRequest,
    ) -> Result<DirectNotificationResult, SolarvitaError> {
        let caller = caller.ok_or_else(|| unauthenticated("User must be authenticated"))?;

        if request.user_id.trim().is_empty()
            || request.title.trim().is_empty()
            || request.body.trim().is_empty()
        {
            return Err(invalid_argument("Missing required fields: userId, title, body"));
        }

        let id = Uuid::new_v4().to_string();
        let mut record = NotificationRecord::with_type_tag(
            id.clone(),
            Recipient::User(request.user_id),
            request.kind.as_deref(),
        );
        record.title = Some(request.title);
        record.body = Some(request.body);
        record.data = request.notification_data.unwrap_or_default();
        record.action_url = request.action_url;
        record.image_url = request.image_url;

        info!(
            id = %id,
            sender = %caller.uid,
            kind = %record.kind,
            "Direct notification requested"
        );
        self.insert(record).await?;

        Ok(DirectNotificationResult {
            success: true,
            notification_id: id,
        })
    }
}
