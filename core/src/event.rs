/// Events the host application raises for the user
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who an event came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Bare address of the originating contact (`user@host`, no resource)
    pub address: String,
    /// Name stored on the roster entry, if the contact is on the roster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roster_name: Option<String>,
    /// Nickname carried by the event itself (auth requests, messages)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
}

impl Sender {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            roster_name: None,
            nick: None,
        }
    }

    pub fn with_roster_name(mut self, name: impl Into<String>) -> Self {
        self.roster_name = Some(name.into());
        self
    }

    pub fn with_nick(mut self, nick: impl Into<String>) -> Self {
        self.nick = Some(nick.into());
        self
    }

    /// Name to show for this contact.
    ///
    /// Roster name wins over the event nickname; the bare address is used when
    /// neither is set or the chosen one is empty.
    pub fn display_name(&self) -> &str {
        let chosen = match (&self.roster_name, &self.nick) {
            (Some(name), _) => name.as_str(),
            (None, Some(nick)) => nick.as_str(),
            (None, None) => "",
        };
        if chosen.is_empty() {
            &self.address
        } else {
            chosen
        }
    }
}

/// Presence details for online/offline/status-change alerts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// Human readable status ("Away", "Online", ...)
    pub status_text: String,
    /// Free-form status message set by the contact
    #[serde(default)]
    pub status_message: String,
}

/// Message content for message/chat/headline alerts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// An alert to show the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    PresenceOnline { from: Sender, presence: Presence },
    PresenceOffline { from: Sender, presence: Presence },
    PresenceChange { from: Sender, presence: Presence },
    Message { from: Sender, message: ChatMessage },
    Chat { from: Sender, message: ChatMessage },
    Headline { from: Sender, message: ChatMessage },
    File {
        from: Sender,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
    },
}

impl NotificationEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            NotificationEvent::PresenceOnline { from, .. }
            | NotificationEvent::PresenceOffline { from, .. }
            | NotificationEvent::PresenceChange { from, .. }
            | NotificationEvent::Message { from, .. }
            | NotificationEvent::Chat { from, .. }
            | NotificationEvent::Headline { from, .. }
            | NotificationEvent::File { from, .. } => from,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            NotificationEvent::PresenceOnline { .. } => EventKind::PresenceOnline,
            NotificationEvent::PresenceOffline { .. } => EventKind::PresenceOffline,
            NotificationEvent::PresenceChange { .. } => EventKind::PresenceChange,
            NotificationEvent::Message { .. } => EventKind::Message,
            NotificationEvent::Chat { .. } => EventKind::Chat,
            NotificationEvent::Headline { .. } => EventKind::Headline,
            NotificationEvent::File { .. } => EventKind::File,
        }
    }
}

/// Event tag without payload, used for configuration and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PresenceOnline,
    PresenceOffline,
    PresenceChange,
    Message,
    Chat,
    Headline,
    File,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::PresenceOnline,
        EventKind::PresenceOffline,
        EventKind::PresenceChange,
        EventKind::Message,
        EventKind::Chat,
        EventKind::Headline,
        EventKind::File,
    ];

    /// User-facing name of this kind of notification
    pub fn label(self) -> &'static str {
        match self {
            EventKind::PresenceOnline => "Contact becomes Available",
            EventKind::PresenceOffline => "Contact becomes Unavailable",
            EventKind::PresenceChange => "Contact changes Status",
            EventKind::Message | EventKind::Chat => "Incoming Message",
            EventKind::Headline => "Incoming Headline",
            EventKind::File => "Incoming File",
        }
    }

    /// Kinds a fresh profile has switched on
    pub fn default_enabled() -> Vec<EventKind> {
        vec![
            EventKind::PresenceOnline,
            EventKind::Message,
            EventKind::Chat,
            EventKind::Headline,
            EventKind::File,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::PresenceOnline => "online",
            EventKind::PresenceOffline => "offline",
            EventKind::PresenceChange => "status",
            EventKind::Message => "message",
            EventKind::Chat => "chat",
            EventKind::Headline => "headline",
            EventKind::File => "file",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown event kind '{}'", s))
    }
}
