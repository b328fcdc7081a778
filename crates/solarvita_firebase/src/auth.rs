//! OAuth2 access tokens for the FCM HTTP v1 API
//!
//! Tokens are minted from a service account key with `yup-oauth2` and kept
//! for a little less than their one-hour lifetime, so a burst of sends only
//! pays for one token exchange.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator};

use crate::client::FirebaseError;

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const TOKEN_TTL: Duration = Duration::from_secs(50 * 60);

#[derive(Debug, Clone)]
enum TokenSource {
    ServiceAccount(PathBuf),
    Static(String),
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct FcmAuth {
    source: TokenSource,
    cached: Mutex<Option<CachedToken>>,
}

impl FcmAuth {
    pub fn service_account(key_path: impl Into<PathBuf>) -> Self {
        Self {
            source: TokenSource::ServiceAccount(key_path.into()),
            cached: Mutex::new(None),
        }
    }

    /// A fixed bearer token, for local fakes of the FCM API.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Static(token.into()),
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid access token, refreshing it when the cached one expired.
    pub async fn access_token(&self) -> Result<String, FirebaseError> {
        let key_path = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::ServiceAccount(path) => path,
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let value = fetch_access_token(key_path).await?;
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + TOKEN_TTL,
        });
        Ok(value)
    }
}

async fn fetch_access_token(key_path: &Path) -> Result<String, FirebaseError> {
    debug!("Requesting FCM access token");

    let sa_key = read_service_account_key(key_path)
        .await
        .map_err(|e| FirebaseError::AuthError(format!("Failed to read service account key: {}", e)))?;

    let auth = ServiceAccountAuthenticator::builder(sa_key)
        .build()
        .await
        .map_err(|e| FirebaseError::AuthError(e.to_string()))?;

    let auth_token = auth
        .token(&[FCM_SCOPE])
        .await
        .map_err(|e| FirebaseError::AuthError(e.to_string()))?;

    auth_token
        .token()
        .map(str::to_string)
        .ok_or_else(|| FirebaseError::AuthError("No token available".to_string()))
}
