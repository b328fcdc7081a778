//! Firebase Auth ID-token verification
//!
//! Callables receive the caller's Firebase ID token as a bearer token. It is
//! an RS256 JWT signed by one of the keys published in Google's `securetoken`
//! JWK set, with the project id as audience.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use solarvita_common::{unauthenticated, CallerIdentity, IdentityVerifier, SolarvitaError};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const KEYS_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

pub struct FirebaseIdentityVerifier {
    project_id: String,
    jwks_url: String,
    http: Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseIdentityVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::with_jwks_url(project_id, GOOGLE_JWKS_URL)
    }

    pub fn with_jwks_url(project_id: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            http: Client::new(),
            keys: RwLock::new(None),
        }
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, SolarvitaError> {
        {
            let cached = self.keys.read().await;
            if let Some(cached) = cached.as_ref() {
                if cached.fetched_at.elapsed() < KEYS_TTL {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return DecodingKey::from_jwk(jwk)
                            .map_err(|e| unauthenticated(format!("Unusable signing key: {}", e)));
                    }
                }
            }
        }

        // Unknown kid or stale set: Google rotated its keys.
        let keys = self.fetch_keys().await?;
        let key = keys
            .find(kid)
            .ok_or_else(|| unauthenticated("ID token signed by an unknown key"))
            .and_then(|jwk| {
                DecodingKey::from_jwk(jwk)
                    .map_err(|e| unauthenticated(format!("Unusable signing key: {}", e)))
            });

        *self.keys.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        key
    }

    async fn fetch_keys(&self) -> Result<JwkSet, SolarvitaError> {
        debug!(url = %self.jwks_url, "Fetching Firebase signing keys");

        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch Firebase signing keys");
                SolarvitaError::Internal("Failed to fetch signing keys".to_string())
            })?;

        response.json::<JwkSet>().await.map_err(|e| {
            warn!(error = %e, "Malformed Firebase signing key set");
            SolarvitaError::Internal("Failed to fetch signing keys".to_string())
        })
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseIdentityVerifier {
    async fn verify(&self, id_token: &str) -> Result<CallerIdentity, SolarvitaError> {
        let header =
            decode_header(id_token).map_err(|e| unauthenticated(format!("Malformed ID token: {}", e)))?;
        if header.alg != Algorithm::RS256 {
            return Err(unauthenticated("ID token must be signed with RS256"));
        }
        let kid = header
            .kid
            .ok_or_else(|| unauthenticated("ID token has no key id"))?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);

        let data = decode::<FirebaseClaims>(id_token, &key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    unauthenticated("ID token has expired")
                }
                _ => unauthenticated(format!("ID token rejected: {}", e)),
            }
        })?;

        if data.claims.sub.is_empty() {
            return Err(unauthenticated("ID token has no subject"));
        }

        Ok(CallerIdentity {
            uid: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Verifier for deployments without a Firebase project: every call is
/// rejected as unauthenticated.
#[derive(Debug, Default)]
pub struct UnconfiguredIdentityVerifier;

#[async_trait]
impl IdentityVerifier for UnconfiguredIdentityVerifier {
    async fn verify(&self, _id_token: &str) -> Result<CallerIdentity, SolarvitaError> {
        Err(unauthenticated("Identity verification is not configured"))
    }
}
