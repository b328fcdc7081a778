//! Device token registration.

use serde::{Deserialize, Serialize};
use solarvita_common::{
    invalid_argument, unauthenticated, CallerIdentity, Context, DeviceToken, Platform,
    SolarvitaError, TokenRepository,
};
use solarvita_config::TokenStorage;
use std::sync::Arc;
use tracing::info;

/// Arguments of the `updateUserToken` callable.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTokenRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub platform: Option<Platform>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterTokenResult {
    pub success: bool,
}

pub struct TokenRegistry {
    tokens: Arc<dyn TokenRepository>,
    storage: TokenStorage,
}

impl TokenRegistry {
    pub fn new(tokens: Arc<dyn TokenRepository>, storage: TokenStorage) -> Self {
        Self { tokens, storage }
    }

    /// Stores `token` for the calling user.
    ///
    /// With `TokenStorage::Current` the user's single slot is overwritten;
    /// with `TokenStorage::PerDevice` each token value gets its own slot.
    pub async fn register_token(
        &self,
        caller: Option<&CallerIdentity>,
        token: &str,
        platform: Platform,
    ) -> Result<RegisterTokenResult, SolarvitaError> {
        let caller = caller.ok_or_else(|| unauthenticated("User must be authenticated"))?;

        let token = token.trim();
        if token.is_empty() {
            return Err(invalid_argument("token is required"));
        }

        let slot = match self.storage {
            TokenStorage::Current => DeviceToken::CURRENT_SLOT.to_string(),
            TokenStorage::PerDevice => token.to_string(),
        };

        let record = DeviceToken::new(caller.uid.clone(), slot, token.to_string(), platform);
        self.tokens
            .upsert_token(&record)
            .await
            .context("Failed to update token")?;

        info!(user_id = %caller.uid, %platform, "Device token registered");
        Ok(RegisterTokenResult { success: true })
    }
}
