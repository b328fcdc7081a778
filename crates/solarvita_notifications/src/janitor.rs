//! Removal of dead tokens and of everything a deleted account owned.

use solarvita_common::{
    NotificationRepository, PurgeCounts, SolarvitaError, TokenRepository,
};
use std::sync::Arc;
use tracing::{error, info};

pub struct TokenJanitor {
    tokens: Arc<dyn TokenRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl TokenJanitor {
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            tokens,
            notifications,
        }
    }

    /// Deletes the user's records holding any of `invalid_tokens` in one
    /// atomic batch.
    ///
    /// A failed delete is logged and swallowed; the tokens will fail again on
    /// the next dispatch and be retried then. Returns the deleted count.
    pub async fn prune_tokens(&self, user_id: &str, invalid_tokens: &[String]) -> u64 {
        if invalid_tokens.is_empty() {
            return 0;
        }

        match self.tokens.delete_matching(user_id, invalid_tokens).await {
            Ok(deleted) => {
                info!(user_id, requested = invalid_tokens.len(), deleted, "Pruned invalid tokens");
                deleted
            }
            Err(err) => {
                let failure = SolarvitaError::CleanupFailure(err.to_string());
                error!(user_id, error = %failure, "Failed to prune invalid tokens");
                0
            }
        }
    }

    /// Deletes every notification and token of `user_id` atomically.
    ///
    /// Running it again for the same user deletes nothing and succeeds.
    pub async fn purge_user(&self, user_id: &str) -> Result<PurgeCounts, SolarvitaError> {
        let counts = self.notifications.purge_user(user_id).await.map_err(|err| {
            error!(user_id, error = %err, "Failed to purge user data");
            SolarvitaError::CleanupFailure(err.to_string())
        })?;

        info!(
            user_id,
            notifications = counts.notifications,
            tokens = counts.tokens,
            "Deleted user data"
        );
        Ok(counts)
    }
}
