// --- File: crates/solarvita_common/src/push.rs ---
//! Platform-neutral push message and the gateway seam that delivers it.
//!
//! The field names follow the FCM HTTP v1 `Message` resource so a gateway
//! can embed a `PushMessage` next to its target token without remapping.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub notification: PushNotification,
    pub data: BTreeMap<String, String>,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AndroidPriority {
    High,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AndroidConfig {
    pub priority: AndroidPriority,
    pub notification: AndroidNotification,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AndroidNotification {
    pub channel_id: String,
    pub sound: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApnsConfig {
    pub headers: BTreeMap<String, String>,
    pub payload: ApnsPayload,
    pub fcm_options: ApnsFcmOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Aps {
    pub badge: u32,
    pub sound: String,
    pub content_available: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApnsFcmOptions {
    pub analytics_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Why a single send failed.
///
/// The dispatch pipeline prunes the token on every variant; the code is kept
/// so the logs show what the gateway actually reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The token is no longer registered with the push service
    #[error("token unregistered: {0}")]
    Unregistered(String),

    /// The push service rejected the token or message as malformed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The push service is overloaded or down
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Gateway credentials were rejected or could not be obtained
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("delivery failed: {0}")]
    Other(String),
}

impl DeliveryError {
    /// Short machine-readable code for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            DeliveryError::Unregistered(_) => "unregistered",
            DeliveryError::InvalidArgument(_) => "invalid_argument",
            DeliveryError::Unavailable(_) => "unavailable",
            DeliveryError::Auth(_) => "auth",
            DeliveryError::Other(_) => "other",
        }
    }
}

/// Delivers one message to one device token.
///
/// Returns the push service's message name on success.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<String, DeliveryError>;
}
