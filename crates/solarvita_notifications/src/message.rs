//! Builds the multi-platform push message for a notification record.

use solarvita_common::push::{
    AndroidConfig, AndroidNotification, AndroidPriority, ApnsConfig, ApnsFcmOptions,
    ApnsPayload, Aps, PushNotification,
};
use solarvita_common::{NotificationRecord, PushMessage};
use std::collections::BTreeMap;

use crate::templates::{template_for, Priority, Template};

pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";
const DEFAULT_SOUND: &str = "default";
const ANALYTICS_LABEL_MAX: usize = 50;

/// Resolves the template for the record's type and builds one message that
/// is sent unchanged to every target token.
pub fn build_message(record: &NotificationRecord) -> PushMessage {
    let template = template_for(&record.kind);
    build_message_with(record, &template)
}

pub fn build_message_with(record: &NotificationRecord, template: &Template) -> PushMessage {
    let title = non_empty(record.title.as_deref()).unwrap_or(template.title);
    let body = non_empty(record.body.as_deref()).unwrap_or(template.body);
    let image = non_empty(record.image_url.as_deref()).map(str::to_string);

    let mut data = BTreeMap::from([
        ("id".to_string(), record.id.clone()),
        ("type".to_string(), record.wire_type()),
        ("actionUrl".to_string(), record.action_url.clone().unwrap_or_default()),
        ("imageUrl".to_string(), record.image_url.clone().unwrap_or_default()),
        ("channelId".to_string(), template.channel_id.to_string()),
        ("click_action".to_string(), CLICK_ACTION.to_string()),
    ]);
    // The writer's payload goes last and wins on key collisions.
    data.extend(record.data.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut android_data = data.clone();
    android_data.insert("title".into(), title.to_string());
    android_data.insert("body".into(), body.to_string());

    let (android_priority, apns_priority) = match template.priority {
        Priority::High => (AndroidPriority::High, "10"),
        Priority::Default => (AndroidPriority::Normal, "5"),
    };

    PushMessage {
        notification: PushNotification {
            title: title.to_string(),
            body: body.to_string(),
            image: image.clone(),
        },
        data,
        android: AndroidConfig {
            priority: android_priority,
            notification: AndroidNotification {
                channel_id: template.channel_id.to_string(),
                sound: DEFAULT_SOUND.to_string(),
                image: image.clone(),
            },
            data: android_data,
        },
        apns: ApnsConfig {
            headers: BTreeMap::from([("apns-priority".to_string(), apns_priority.to_string())]),
            payload: ApnsPayload {
                aps: Aps {
                    badge: 1,
                    sound: DEFAULT_SOUND.to_string(),
                    content_available: 1,
                },
            },
            fcm_options: ApnsFcmOptions {
                analytics_label: analytics_label(record.kind.name()),
                image,
            },
        },
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// FCM only accepts [a-zA-Z0-9-_.~%]{1,50} as analytics label.
fn analytics_label(type_name: &str) -> String {
    let name = type_name.strip_prefix("NotificationType.").unwrap_or(type_name);
    let label: String = format!("{}_notification", name)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "-_.~%".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect();
    label.chars().take(ANALYTICS_LABEL_MAX).collect()
}
