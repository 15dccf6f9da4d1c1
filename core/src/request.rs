/// Building `Notify` requests from host events
use crate::event::NotificationEvent;
use crate::icon::{self, IconPayload};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

pub const DEFAULT_APP_NAME: &str = "Psi";

/// Server decides how long the bubble stays up
pub const EXPIRE_DEFAULT: i32 = -1;

pub const HINT_CATEGORY: &str = "category";
pub const HINT_URGENCY: &str = "urgency";
pub const HINT_ICON_DATA: &str = "icon_data";

/// Urgency levels defined by the notification protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Urgency {
    Low = 0,
    Normal = 1,
    Critical = 2,
}

impl Urgency {
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Typed view of the `hints` dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_data: Option<IconPayload>,
}

impl Hints {
    /// Hint keys that will be put on the wire, in insertion order
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::with_capacity(3);
        if self.category.is_some() {
            keys.push(HINT_CATEGORY);
        }
        keys.push(HINT_URGENCY);
        if self.icon_data.is_some() {
            keys.push(HINT_ICON_DATA);
        }
        keys
    }
}

/// One `Notify` call, built fresh for every dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub app_name: String,
    /// Always 0: every alert is a new notification
    pub replaces_id: u32,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub actions: Vec<String>,
    pub hints: Hints,
    pub expire_timeout: i32,
}

/// Maps host events onto notification requests
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    app_name: String,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_APP_NAME)
    }
}

impl RequestBuilder {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    pub fn build(&self, event: &NotificationEvent, icon: Option<&DynamicImage>) -> NotificationRequest {
        let contact = event.sender().display_name();
        let (category, summary, body) = summarize(event, contact);

        NotificationRequest {
            app_name: self.app_name.clone(),
            replaces_id: 0,
            app_icon: String::new(),
            summary,
            body,
            actions: Vec::new(),
            hints: Hints {
                category: category.map(str::to_string),
                urgency: Urgency::Normal,
                icon_data: icon.and_then(icon::encode),
            },
            expire_timeout: EXPIRE_DEFAULT,
        }
    }
}

/// Category, summary and body for an event.
fn summarize(event: &NotificationEvent, contact: &str) -> (Option<&'static str>, String, String) {
    let kind = event.kind();
    match event {
        NotificationEvent::PresenceOnline { presence, .. } => (
            Some("presence.online"),
            format!("{}: {} ({})", kind.label(), contact, presence.status_text),
            presence.status_message.clone(),
        ),
        NotificationEvent::PresenceOffline { presence, .. } => (
            Some("presence.offline"),
            format!("{}: {} ({})", kind.label(), contact, presence.status_text),
            presence.status_message.clone(),
        ),
        NotificationEvent::PresenceChange { presence, .. } => (
            Some("presence"),
            format!("{}: {} ({})", kind.label(), contact, presence.status_text),
            presence.status_message.clone(),
        ),
        NotificationEvent::Message { message, .. } => (
            Some("im.received"),
            format!("{}: {} says:", kind.label(), contact),
            message.body.clone(),
        ),
        NotificationEvent::Chat { message, .. } => (
            Some("im.received"),
            format!("{} from {}", kind.label(), contact),
            message.body.clone(),
        ),
        NotificationEvent::Headline { message, .. } => {
            let summary = if message.subject.is_empty() {
                contact.to_string()
            } else {
                message.subject.clone()
            };
            (None, summary, message.body.clone())
        }
        NotificationEvent::File { .. } => (
            None,
            kind.label().to_string(),
            "[Incoming File]".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ChatMessage, Presence, Sender};
    use image::{Rgba, RgbaImage};

    fn presence(status: &str, msg: &str) -> Presence {
        Presence {
            status_text: status.to_string(),
            status_message: msg.to_string(),
        }
    }

    fn message(subject: &str, body: &str) -> ChatMessage {
        ChatMessage {
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_presence_online() {
        let ev = NotificationEvent::PresenceOnline {
            from: Sender::new("alice@example.com").with_roster_name("Alice"),
            presence: presence("Away", "brb"),
        };
        let req = RequestBuilder::default().build(&ev, None);
        assert_eq!(req.summary, "Contact becomes Available: Alice (Away)");
        assert_eq!(req.body, "brb");
        assert_eq!(req.hints.category.as_deref(), Some("presence.online"));
        assert_eq!(req.hints.urgency, Urgency::Normal);
        assert!(req.hints.icon_data.is_none());
    }

    #[test]
    fn test_presence_offline_and_change() {
        let from = Sender::new("alice@example.com").with_roster_name("Alice");
        let builder = RequestBuilder::default();

        let off = builder.build(
            &NotificationEvent::PresenceOffline {
                from: from.clone(),
                presence: presence("Offline", "bye"),
            },
            None,
        );
        assert_eq!(off.summary, "Contact becomes Unavailable: Alice (Offline)");
        assert_eq!(off.body, "bye");
        assert_eq!(off.hints.category.as_deref(), Some("presence.offline"));

        let change = builder.build(
            &NotificationEvent::PresenceChange {
                from,
                presence: presence("Do not Disturb", ""),
            },
            None,
        );
        assert_eq!(change.summary, "Contact changes Status: Alice (Do not Disturb)");
        assert_eq!(change.body, "");
        assert_eq!(change.hints.category.as_deref(), Some("presence"));
    }

    #[test]
    fn test_message_and_chat() {
        let builder = RequestBuilder::default();
        let from = Sender::new("carol@example.com").with_nick("Carol");

        let msg = builder.build(
            &NotificationEvent::Message {
                from: from.clone(),
                message: message("", "hello there"),
            },
            None,
        );
        assert_eq!(msg.summary, "Incoming Message: Carol says:");
        assert_eq!(msg.body, "hello there");
        assert_eq!(msg.hints.category.as_deref(), Some("im.received"));

        let chat = builder.build(
            &NotificationEvent::Chat {
                from,
                message: message("", "ping"),
            },
            None,
        );
        assert_eq!(chat.summary, "Incoming Message from Carol");
        assert_eq!(chat.body, "ping");
        assert_eq!(chat.hints.category.as_deref(), Some("im.received"));
    }

    #[test]
    fn test_headline_subject_or_contact() {
        let builder = RequestBuilder::default();
        let from = Sender::new("news@example.com").with_roster_name("News");

        let with_subject = builder.build(
            &NotificationEvent::Headline {
                from: from.clone(),
                message: message("Breaking", "details"),
            },
            None,
        );
        assert_eq!(with_subject.summary, "Breaking");
        assert_eq!(with_subject.body, "details");
        assert!(with_subject.hints.category.is_none());

        let without = builder.build(
            &NotificationEvent::Headline {
                from,
                message: message("", "details"),
            },
            None,
        );
        assert_eq!(without.summary, "News");
    }

    #[test]
    fn test_file_without_name() {
        let ev = NotificationEvent::File {
            from: Sender::new("bob@example.com"),
            file_name: Some("report.pdf".to_string()),
        };
        assert_eq!(ev.sender().display_name(), "bob@example.com");
        let req = RequestBuilder::default().build(&ev, None);
        assert_eq!(req.summary, "Incoming File");
        assert_eq!(req.body, "[Incoming File]");
        assert!(req.hints.category.is_none());
        assert_eq!(req.hints.keys(), vec![HINT_URGENCY]);
    }

    #[test]
    fn test_fixed_fields() {
        let ev = NotificationEvent::Chat {
            from: Sender::new("x@y"),
            message: message("", "b"),
        };
        let req = RequestBuilder::new("Custom").build(&ev, None);
        assert_eq!(req.app_name, "Custom");
        assert_eq!(req.replaces_id, 0);
        assert_eq!(req.app_icon, "");
        assert!(req.actions.is_empty());
        assert_eq!(req.expire_timeout, -1);
        assert_eq!(req.hints.urgency.as_byte(), 1);
    }

    #[test]
    fn test_icon_hint_present_with_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([9, 8, 7, 6])));
        let ev = NotificationEvent::Chat {
            from: Sender::new("x@y"),
            message: message("", "b"),
        };
        let req = RequestBuilder::default().build(&ev, Some(&img));
        let icon = req.hints.icon_data.as_ref().unwrap();
        assert_eq!(icon.data.len(), 16);
        assert_eq!(req.hints.keys(), vec![HINT_CATEGORY, HINT_URGENCY, HINT_ICON_DATA]);
    }

    #[test]
    fn test_name_appears_in_summary() {
        let builder = RequestBuilder::default();
        let from = Sender::new("z@example.com").with_roster_name("Zoë Q");
        let events = vec![
            NotificationEvent::PresenceOnline { from: from.clone(), presence: presence("Online", "") },
            NotificationEvent::PresenceOffline { from: from.clone(), presence: presence("Offline", "") },
            NotificationEvent::PresenceChange { from: from.clone(), presence: presence("Away", "") },
            NotificationEvent::Message { from: from.clone(), message: message("", "") },
            NotificationEvent::Chat { from, message: message("", "") },
        ];
        for ev in &events {
            let req = builder.build(ev, None);
            assert!(req.summary.contains("Zoë Q"), "{:?}: {}", ev.kind(), req.summary);
        }
    }
}
