//! Per-type presentation defaults.
//!
//! Every `NotificationType`, including unknown tags, maps to exactly one
//! template. Unknown tags get the generic one.

use solarvita_common::NotificationType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Default,
}

/// Default title and body, Android channel and delivery priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub title: &'static str,
    pub body: &'static str,
    pub channel_id: &'static str,
    pub priority: Priority,
}

pub const CHAT_CHANNEL: &str = "chat_notifications";
pub const SOCIAL_CHANNEL: &str = "social_notifications";
pub const ACHIEVEMENT_CHANNEL: &str = "achievement_notifications";
pub const REMINDER_CHANNEL: &str = "reminder_notifications";

pub const GENERIC_TEMPLATE: Template = Template {
    title: "Notification",
    body: "You have a new notification",
    channel_id: SOCIAL_CHANNEL,
    priority: Priority::Default,
};

pub fn template_for(kind: &NotificationType) -> Template {
    match kind {
        NotificationType::Chat => Template {
            title: "New Message",
            body: "You have a new message",
            channel_id: CHAT_CHANNEL,
            priority: Priority::High,
        },
        NotificationType::SupportRequest => Template {
            title: "Support Request",
            body: "Someone wants to support you",
            channel_id: SOCIAL_CHANNEL,
            priority: Priority::High,
        },
        NotificationType::SupportAccepted => Template {
            title: "Support Accepted",
            body: "Your support request was accepted",
            channel_id: SOCIAL_CHANNEL,
            priority: Priority::Default,
        },
        NotificationType::SupportRejected => Template {
            title: "Support Declined",
            body: "Your support request was declined",
            channel_id: SOCIAL_CHANNEL,
            priority: Priority::Default,
        },
        NotificationType::Like
        | NotificationType::Comment
        | NotificationType::Follow
        | NotificationType::Mention
        | NotificationType::Post => Template {
            title: "Social Update",
            body: "You have a new social notification",
            channel_id: SOCIAL_CHANNEL,
            priority: Priority::Default,
        },
        NotificationType::Achievement => Template {
            title: "Achievement Unlocked",
            body: "You earned a new achievement",
            channel_id: ACHIEVEMENT_CHANNEL,
            priority: Priority::Default,
        },
        NotificationType::Reminder => Template {
            title: "Reminder",
            body: "You have a reminder",
            channel_id: REMINDER_CHANNEL,
            priority: Priority::High,
        },
        NotificationType::System | NotificationType::Other(_) => GENERIC_TEMPLATE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_aliases_share_template() {
        let chat = template_for(&NotificationType::parse("chat_message"));
        assert_eq!(chat, template_for(&NotificationType::parse("NotificationType.chat")));
        assert_eq!(chat.title, "New Message");
        assert_eq!(chat.channel_id, CHAT_CHANNEL);
        assert_eq!(chat.priority, Priority::High);
    }

    #[test]
    fn test_unknown_type_gets_generic_template() {
        let unknown = NotificationType::parse("NotificationType.somethingNew");
        assert_eq!(template_for(&unknown), GENERIC_TEMPLATE);
    }

    #[test]
    fn test_social_types_share_channel() {
        for tag in ["like", "comment", "follow", "mention", "post"] {
            let template = template_for(&NotificationType::parse(tag));
            assert_eq!(template.channel_id, SOCIAL_CHANNEL, "{tag}");
            assert_eq!(template.title, "Social Update", "{tag}");
        }
    }

    #[test]
    fn test_high_priority_types() {
        assert_eq!(
            template_for(&NotificationType::SupportRequest).priority,
            Priority::High
        );
        assert_eq!(template_for(&NotificationType::Reminder).priority, Priority::High);
        assert_eq!(
            template_for(&NotificationType::Achievement).priority,
            Priority::Default
        );
    }
}
