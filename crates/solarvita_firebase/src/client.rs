//! Firebase Cloud Messaging client module
//!
//! Sends one `PushMessage` to one registration token through the FCM HTTP
//! v1 API and classifies failures into `DeliveryError`s.

use crate::auth::FcmAuth;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use solarvita_common::{DeliveryError, PushGateway, PushMessage};
use solarvita_config::FirebaseConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com";

/// Errors that can occur when interacting with the Firebase Cloud Messaging API
#[derive(Error, Debug)]
pub enum FirebaseError {
    /// Error during authentication with Firebase
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error during HTTP request to Firebase API
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Missing required configuration
    #[error("Missing configuration: {0}")]
    ConfigError(String),

    /// Error returned by the Firebase API
    #[error("Firebase API error {http_status} ({code}): {message}")]
    ApiError {
        http_status: u16,
        /// FCM error code when present (`UNREGISTERED`), else the RPC status
        code: String,
        message: String,
    },
}

/// Request body of `projects/*/messages:send`.
#[derive(Debug, Serialize)]
pub struct FcmMessage<'a> {
    pub message: TargetedMessage<'a>,
}

#[derive(Debug, Serialize)]
pub struct TargetedMessage<'a> {
    pub token: &'a str,
    #[serde(flatten)]
    pub content: &'a PushMessage,
}

#[derive(Debug, Deserialize)]
pub struct FcmResponse {
    /// `projects/{project_id}/messages/{message_id}`
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct FcmErrorBody {
    error: FcmErrorStatus,
}

#[derive(Debug, Deserialize)]
struct FcmErrorStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<FcmErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FcmErrorDetail {
    #[serde(default)]
    error_code: Option<String>,
}

pub struct FirebaseClient {
    client: Client,
    auth: FcmAuth,
    send_url: String,
}

impl FirebaseClient {
    /// Creates a client authenticated with the configured service account key.
    ///
    /// # Errors
    ///
    /// Fails if `project_id` or `key_path` is missing.
    pub fn new(config: &FirebaseConfig) -> Result<Self, FirebaseError> {
        let key_path = config.key_path.as_deref().ok_or_else(|| {
            FirebaseError::ConfigError("Missing key_path in FirebaseConfig".to_string())
        })?;

        Self::with_auth(config, FcmAuth::service_account(key_path))
    }

    pub fn with_auth(config: &FirebaseConfig, auth: FcmAuth) -> Result<Self, FirebaseError> {
        let project_id = config.project_id.as_deref().ok_or_else(|| {
            FirebaseError::ConfigError("Missing project_id in FirebaseConfig".to_string())
        })?;

        let endpoint = config
            .fcm_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_FCM_ENDPOINT)
            .trim_end_matches('/');

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            auth,
            send_url: format!("{}/v1/projects/{}/messages:send", endpoint, project_id),
        })
    }

    /// Sends a message to a single registration token.
    ///
    /// Returns the message name assigned by FCM.
    pub async fn send_message(
        &self,
        token: &str,
        message: &PushMessage,
    ) -> Result<String, FirebaseError> {
        let access_token = self.auth.access_token().await?;

        let body = FcmMessage {
            message: TargetedMessage {
                token,
                content: message,
            },
        };

        let response = self
            .client
            .post(&self.send_url)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(parse_api_error(status.as_u16(), &error_text));
        }

        let fcm_response: FcmResponse = response.json().await?;
        debug!(message_name = %fcm_response.name, "FCM accepted message");
        Ok(fcm_response.name)
    }
}

fn parse_api_error(http_status: u16, body: &str) -> FirebaseError {
    match serde_json::from_str::<FcmErrorBody>(body) {
        Ok(parsed) => {
            let code = parsed
                .error
                .details
                .iter()
                .find_map(|d| d.error_code.clone())
                .unwrap_or(parsed.error.status);
            FirebaseError::ApiError {
                http_status,
                code,
                message: parsed.error.message,
            }
        }
        Err(_) => FirebaseError::ApiError {
            http_status,
            code: String::new(),
            message: body.to_string(),
        },
    }
}

impl From<FirebaseError> for DeliveryError {
    fn from(err: FirebaseError) -> Self {
        match err {
            FirebaseError::AuthError(msg) | FirebaseError::ConfigError(msg) => {
                DeliveryError::Auth(msg)
            }
            FirebaseError::RequestError(e) => DeliveryError::Unavailable(e.to_string()),
            FirebaseError::ApiError {
                http_status,
                code,
                message,
            } => match (code.as_str(), http_status) {
                ("UNREGISTERED" | "NOT_FOUND", _) | (_, 404) => DeliveryError::Unregistered(message),
                ("INVALID_ARGUMENT" | "SENDER_ID_MISMATCH", _) | (_, 400) => {
                    DeliveryError::InvalidArgument(message)
                }
                ("THIRD_PARTY_AUTH_ERROR" | "UNAUTHENTICATED" | "PERMISSION_DENIED", _)
                | (_, 401 | 403) => DeliveryError::Auth(message),
                ("UNAVAILABLE" | "INTERNAL" | "QUOTA_EXCEEDED", _) | (_, 429 | 500..=599) => {
                    DeliveryError::Unavailable(message)
                }
                _ => DeliveryError::Other(format!("{} ({})", message, code)),
            },
        }
    }
}

#[async_trait]
impl PushGateway for FirebaseClient {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<String, DeliveryError> {
        self.send_message(token, message).await.map_err(|err| {
            warn!(error = %err, "FCM send failed");
            DeliveryError::from(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fcm_error_code_wins_over_status() {
        let body = r#"{
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND",
                "details": [{
                    "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                    "errorCode": "UNREGISTERED"
                }]
            }
        }"#;

        match parse_api_error(404, body) {
            FirebaseError::ApiError { code, .. } => assert_eq!(code, "UNREGISTERED"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_delivery_error_mapping() {
        let api = |status: u16, code: &str| FirebaseError::ApiError {
            http_status: status,
            code: code.to_string(),
            message: "m".to_string(),
        };

        assert!(matches!(
            DeliveryError::from(api(404, "UNREGISTERED")),
            DeliveryError::Unregistered(_)
        ));
        assert!(matches!(
            DeliveryError::from(api(400, "INVALID_ARGUMENT")),
            DeliveryError::InvalidArgument(_)
        ));
        assert!(matches!(
            DeliveryError::from(api(503, "UNAVAILABLE")),
            DeliveryError::Unavailable(_)
        ));
        assert!(matches!(
            DeliveryError::from(api(401, "THIRD_PARTY_AUTH_ERROR")),
            DeliveryError::Auth(_)
        ));
        assert!(matches!(
            DeliveryError::from(api(418, "")),
            DeliveryError::Other(_)
        ));
    }

    #[test]
    fn test_unparseable_error_body_is_kept() {
        match parse_api_error(502, "Bad Gateway") {
            FirebaseError::ApiError { message, code, .. } => {
                assert_eq!(message, "Bad Gateway");
                assert!(code.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
