// --- File: crates/solarvita_common/src/models.rs ---
//! Data model of the notification pipeline.
//!
//! Users are opaque uid strings. They own device tokens and notification
//! records; both are stored by the repositories in `services`.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{invalid_argument, SolarvitaError};

/// Verified identity of a callable invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Firebase uid
    pub uid: String,
    pub email: Option<String>,
}

/// Platform tag attached to a device token.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Web => "web",
            Platform::Unknown => "unknown",
        }
    }
}

impl FromStr for Platform {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "android" => Platform::Android,
            "ios" => Platform::Ios,
            "web" => Platform::Web,
            _ => Platform::Unknown,
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A push token of one installed app instance.
///
/// `slot` is the per-user key of the record: the literal `current` for
/// single-slot deployments, the token value itself for per-device ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceToken {
    pub user_id: String,
    pub slot: String,
    pub token: String,
    pub platform: Platform,
    pub updated_at: DateTime<Utc>,
}

impl DeviceToken {
    /// Name of the slot used by single-token deployments.
    pub const CURRENT_SLOT: &'static str = "current";

    /// Creates a token record stamped with the server clock.
    pub fn new(user_id: String, slot: String, token: String, platform: Platform) -> Self {
        Self {
            user_id,
            slot,
            token,
            platform,
            updated_at: Utc::now(),
        }
    }
}

/// The kind of a notification, as written by the mobile client.
///
/// Clients send Dart enum names such as `NotificationType.supportRequest`.
/// Parsing accepts the tag with or without that prefix and in camelCase or
/// snake_case. Tags nobody knows are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NotificationType {
    Chat,
    SupportRequest,
    SupportAccepted,
    SupportRejected,
    Like,
    Comment,
    Follow,
    Mention,
    Post,
    Achievement,
    Reminder,
    #[default]
    System,
    Other(String),
}

const DART_ENUM_PREFIX: &str = "NotificationType.";

impl NotificationType {
    pub fn parse(tag: &str) -> Self {
        let name = tag.trim();
        let name = name.strip_prefix(DART_ENUM_PREFIX).unwrap_or(name);
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "chat" | "chatmessage" | "message" => NotificationType::Chat,
            "supportrequest" => NotificationType::SupportRequest,
            "supportaccepted" => NotificationType::SupportAccepted,
            "supportrejected" => NotificationType::SupportRejected,
            "like" => NotificationType::Like,
            "comment" => NotificationType::Comment,
            "follow" => NotificationType::Follow,
            "mention" => NotificationType::Mention,
            "post" => NotificationType::Post,
            "achievement" => NotificationType::Achievement,
            "reminder" => NotificationType::Reminder,
            "system" => NotificationType::System,
            _ => NotificationType::Other(tag.to_string()),
        }
    }

    /// Short camelCase name, e.g. `supportRequest`.
    pub fn name(&self) -> &str {
        match self {
            NotificationType::Chat => "chat",
            NotificationType::SupportRequest => "supportRequest",
            NotificationType::SupportAccepted => "supportAccepted",
            NotificationType::SupportRejected => "supportRejected",
            NotificationType::Like => "like",
            NotificationType::Comment => "comment",
            NotificationType::Follow => "follow",
            NotificationType::Mention => "mention",
            NotificationType::Post => "post",
            NotificationType::Achievement => "achievement",
            NotificationType::Reminder => "reminder",
            NotificationType::System => "system",
            NotificationType::Other(raw) => raw,
        }
    }

    /// Canonical wire tag, e.g. `NotificationType.supportRequest`.
    pub fn as_tag(&self) -> String {
        match self {
            NotificationType::Other(raw) => raw.clone(),
            known => format!("{}{}", DART_ENUM_PREFIX, known.name()),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_tag())
    }
}

impl Serialize for NotificationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_tag())
    }
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(match tag.as_deref() {
            None | Some("") => NotificationType::default(),
            Some(tag) => NotificationType::parse(tag),
        })
    }
}

/// Free-form payload attached to a notification.
///
/// The push data channel only carries strings, so every value is coerced to
/// text when the payload is built: strings stay as they are, everything else
/// becomes its JSON text (`42`, `true`, `null`, `{"a":1}`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct NotificationPayload(BTreeMap<String, String>);

impl NotificationPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payload from a JSON object; anything else yields an empty payload.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| (key, coerce_to_text(value)))
                .collect(),
            _ => Self::default(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn coerce_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

impl FromIterator<(String, String)> for NotificationPayload {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for NotificationPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value.map(Self::from_json).unwrap_or_default())
    }
}

/// Who a notification record is delivered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every token registered by the user; the record is a durable log entry.
    User(String),
    /// A single token carried on the record; the record is an outbox entry
    /// removed after a successful send.
    Device(String),
}

/// A persisted notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    pub id: String,
    pub recipient: Recipient,
    pub title: Option<String>,
    pub body: Option<String>,
    pub kind: NotificationType,
    /// The type string exactly as the writer sent it, if any
    pub type_tag: Option<String>,
    pub data: NotificationPayload,
    pub action_url: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl NotificationRecord {
    /// A fresh, unread record for `recipient` stamped with the server clock.
    pub fn new(id: impl Into<String>, recipient: Recipient, kind: NotificationType) -> Self {
        Self {
            id: id.into(),
            recipient,
            title: None,
            body: None,
            kind,
            type_tag: None,
            data: NotificationPayload::default(),
            action_url: None,
            image_url: None,
            created_at: Utc::now(),
            is_read: false,
        }
    }

    /// A record typed by the raw tag a writer supplied. The tag is kept
    /// verbatim for the push payload; the parsed kind drives the template.
    pub fn with_type_tag(
        id: impl Into<String>,
        recipient: Recipient,
        tag: Option<&str>,
    ) -> Self {
        let tag = tag.map(str::trim).filter(|t| !t.is_empty());
        let kind = tag.map(NotificationType::parse).unwrap_or_default();
        let mut record = Self::new(id, recipient, kind);
        record.type_tag = tag.map(str::to_string);
        record
    }

    /// The type as it goes out on the wire: the writer's own tag when there
    /// is one, the canonical tag otherwise.
    pub fn wire_type(&self) -> String {
        self.type_tag.clone().unwrap_or_else(|| self.kind.as_tag())
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.recipient {
            Recipient::User(user_id) => Some(user_id),
            Recipient::Device(_) => None,
        }
    }
}

/// Wire shape of a notification document, as delivered by the store's
/// creation trigger.
///
/// `recipientToken` marks the single-recipient outbox shape; otherwise the
/// record must name its owning `userId`.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_token: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: NotificationPayload,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Creation time in milliseconds since the epoch
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub is_read: bool,
}

impl TryFrom<NotificationDocument> for NotificationRecord {
    type Error = SolarvitaError;

    fn try_from(doc: NotificationDocument) -> Result<Self, Self::Error> {
        if doc.id.trim().is_empty() {
            return Err(invalid_argument("Notification document has no id"));
        }

        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        let recipient = match (non_empty(doc.recipient_token), non_empty(doc.user_id)) {
            (Some(token), _) => Recipient::Device(token),
            (None, Some(user_id)) => Recipient::User(user_id),
            (None, None) => {
                return Err(invalid_argument(
                    "Notification document names neither userId nor recipientToken",
                ))
            }
        };

        let created_at = match doc.timestamp {
            Some(millis) => Utc
                .timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| invalid_argument("Notification timestamp out of range"))?,
            None => Utc::now(),
        };

        let mut record = NotificationRecord::with_type_tag(doc.id, recipient, doc.kind.as_deref());
        record.title = doc.title;
        record.body = doc.body;
        record.data = doc.data;
        record.action_url = doc.action_url;
        record.image_url = doc.image_url;
        record.created_at = created_at;
        record.is_read = doc.is_read;
        Ok(record)
    }
}

impl From<&NotificationRecord> for NotificationDocument {
    fn from(record: &NotificationRecord) -> Self {
        let (user_id, recipient_token) = match &record.recipient {
            Recipient::User(user_id) => (Some(user_id.clone()), None),
            Recipient::Device(token) => (None, Some(token.clone())),
        };

        NotificationDocument {
            id: record.id.clone(),
            user_id,
            recipient_token,
            title: record.title.clone(),
            body: record.body.clone(),
            kind: Some(record.wire_type()),
            data: record.data.clone(),
            action_url: record.action_url.clone(),
            image_url: record.image_url.clone(),
            timestamp: Some(record.created_at.timestamp_millis()),
            is_read: record.is_read,
        }
    }
}

/// Rows removed by an account purge.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeCounts {
    pub notifications: u64,
    pub tokens: u64,
}

impl PurgeCounts {
    pub fn total(&self) -> u64 {
        self.notifications + self.tokens
    }
}
