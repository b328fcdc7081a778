//! Fan-out of a freshly created notification record to its devices.
//!
//! A creation event may be delivered more than once. Running the dispatch
//! again for the same record sends the push again and has no other effect.

use futures::future::join_all;
use serde::Serialize;
use solarvita_common::{
    Context, NotificationRecord, NotificationRepository, PushGateway, Recipient, SolarvitaError,
    TokenRepository,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::janitor::TokenJanitor;
use crate::message::build_message;

/// Tally of one dispatch run.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub success: usize,
    pub failures: usize,
    pub total_targets: usize,
}

pub struct DispatchTrigger {
    tokens: Arc<dyn TokenRepository>,
    notifications: Arc<dyn NotificationRepository>,
    gateway: Arc<dyn PushGateway>,
    janitor: Arc<TokenJanitor>,
}

impl DispatchTrigger {
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        notifications: Arc<dyn NotificationRepository>,
        gateway: Arc<dyn PushGateway>,
        janitor: Arc<TokenJanitor>,
    ) -> Self {
        Self {
            tokens,
            notifications,
            gateway,
            janitor,
        }
    }

    pub async fn dispatch(
        &self,
        record: &NotificationRecord,
    ) -> Result<DispatchOutcome, SolarvitaError> {
        let targets = self.resolve_targets(record).await?;
        if targets.is_empty() {
            info!(id = %record.id, "No device tokens for notification, nothing to send");
            return Ok(DispatchOutcome::default());
        }

        let message = build_message(record);
        debug!(
            id = %record.id,
            kind = %record.kind,
            targets = targets.len(),
            "Dispatching notification"
        );

        // Settle every send; one failing token never cancels the others.
        let sends = targets.iter().map(|token| {
            let gateway = Arc::clone(&self.gateway);
            let message = &message;
            async move { (token, gateway.send(token, message).await) }
        });
        let results = join_all(sends).await;

        let mut failed_tokens = Vec::new();
        for (token, result) in results {
            match result {
                Ok(message_name) => debug!(token = %token, %message_name, "Push delivered"),
                Err(err) => {
                    let failure = SolarvitaError::DeliveryFailure {
                        token: token.clone(),
                        reason: err.to_string(),
                    };
                    warn!(id = %record.id, code = err.code(), error = %failure, "Push failed");
                    failed_tokens.push(token.clone());
                }
            }
        }

        let outcome = DispatchOutcome {
            success: targets.len() - failed_tokens.len(),
            failures: failed_tokens.len(),
            total_targets: targets.len(),
        };

        match &record.recipient {
            Recipient::User(user_id) => {
                self.janitor.prune_tokens(user_id, &failed_tokens).await;
            }
            Recipient::Device(_) if outcome.failures == 0 => {
                if let Err(err) = self.notifications.delete_outbox(&record.id).await {
                    error!(id = %record.id, error = %err, "Failed to remove delivered outbox record");
                }
            }
            // No owning user to prune for; the record stays for inspection.
            Recipient::Device(_) => {}
        }

        info!(
            id = %record.id,
            success = outcome.success,
            failures = outcome.failures,
            total_targets = outcome.total_targets,
            "Notification dispatched"
        );
        Ok(outcome)
    }

    async fn resolve_targets(
        &self,
        record: &NotificationRecord,
    ) -> Result<Vec<String>, SolarvitaError> {
        let tokens: Vec<String> = match &record.recipient {
            Recipient::User(user_id) => self
                .tokens
                .find_by_user(user_id)
                .await
                .context("Failed to load device tokens")?
                .into_iter()
                .map(|t| t.token)
                .collect(),
            Recipient::Device(token) => vec![token.clone()],
        };

        Ok(tokens
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect())
    }
}
