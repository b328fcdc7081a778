//! Gateway used when no Firebase project is configured.
//!
//! Every send is logged and reported as delivered, so the rest of the
//! pipeline (templates, tallies, outbox handling) runs unchanged locally.

use async_trait::async_trait;
use solarvita_common::{DeliveryError, PushGateway, PushMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

#[derive(Debug, Default)]
pub struct DryRunGateway {
    sent: AtomicU64,
}

impl DryRunGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages "sent" so far.
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PushGateway for DryRunGateway {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<String, DeliveryError> {
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            token,
            title = %message.notification.title,
            channel = %message.android.notification.channel_id,
            "[dry-run] push notification"
        );
        Ok(format!("projects/dry-run/messages/{}", n))
    }
}
