//! Test fixtures for the Firebase integration tests

#![allow(dead_code)]

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use solarvita_common::push::{
    AndroidConfig, AndroidNotification, AndroidPriority, ApnsConfig, ApnsFcmOptions,
    ApnsPayload, Aps, PushNotification,
};
use solarvita_common::PushMessage;
use solarvita_config::FirebaseConfig;
use std::collections::BTreeMap;

pub const PROJECT_ID: &str = "solarvita-test";
pub const KEY_ID: &str = "test-key-1";

const PRIVATE_KEY: &str = include_str!("fixtures/test_rsa_key.pem");
pub const JWKS: &str = include_str!("fixtures/jwks.json");

pub fn firebase_config(endpoint: &str) -> FirebaseConfig {
    FirebaseConfig {
        project_id: Some(PROJECT_ID.to_string()),
        key_path: None,
        fcm_endpoint: Some(endpoint.to_string()),
    }
}

pub fn sample_message() -> PushMessage {
    let mut data = BTreeMap::new();
    data.insert("id".to_string(), "n1".to_string());
    data.insert("type".to_string(), "NotificationType.chat".to_string());

    PushMessage {
        notification: PushNotification {
            title: "New Message".to_string(),
            body: "You have a new message".to_string(),
            image: None,
        },
        data: data.clone(),
        android: AndroidConfig {
            priority: AndroidPriority::High,
            notification: AndroidNotification {
                channel_id: "chat_notifications".to_string(),
                sound: "default".to_string(),
                image: None,
            },
            data,
        },
        apns: ApnsConfig {
            headers: BTreeMap::from([("apns-priority".to_string(), "10".to_string())]),
            payload: ApnsPayload {
                aps: Aps {
                    badge: 1,
                    sound: "default".to_string(),
                    content_available: 1,
                },
            },
            fcm_options: ApnsFcmOptions {
                analytics_label: "chat_notification".to_string(),
                image: None,
            },
        },
    }
}

/// Signs an ID token the way Firebase Auth does, with overridable claims.
pub fn id_token(overrides: serde_json::Value, kid: &str) -> String {
    let now = Utc::now();
    let mut claims = json!({
        "iss": format!("https://securetoken.google.com/{}", PROJECT_ID),
        "aud": PROJECT_ID,
        "sub": "user-123",
        "user_id": "user-123",
        "email": "runner@solarvita.app",
        "iat": now.timestamp(),
        "auth_time": now.timestamp(),
        "exp": (now + Duration::hours(1)).timestamp(),
    });
    if let (Some(base), Some(extra)) = (claims.as_object_mut(), overrides.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).expect("test key");
    encode(&header, &claims, &key).expect("signed token")
}
