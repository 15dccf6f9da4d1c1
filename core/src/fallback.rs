/// In-process popups shown when the desktop service does not take a notification
use crate::event::NotificationEvent;
use crate::request::RequestBuilder;
use colored::*;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Renders a local notification for an event the service did not deliver
pub trait FallbackSink: Send + Sync {
    fn show(&self, event: &NotificationEvent, icon: Option<&DynamicImage>);
}

/// Which built-in fallback the binary uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    #[default]
    Console,
    Silent,
}

impl FallbackMode {
    /// Build the sink, labelling console popups with `app_name`
    pub fn sink(self, app_name: &str) -> Box<dyn FallbackSink> {
        match self {
            FallbackMode::Console => Box::new(ConsoleFallback::new(app_name)),
            FallbackMode::Silent => Box::new(SilentFallback),
        }
    }
}

/// Prints a one-line popup to stderr
#[derive(Debug, Default)]
pub struct ConsoleFallback {
    builder: RequestBuilder,
}

impl ConsoleFallback {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            builder: RequestBuilder::new(app_name),
        }
    }

    fn line(&self, event: &NotificationEvent, icon: Option<&DynamicImage>) -> String {
        // Same wording as the desktop bubble would have had
        let req = self.builder.build(event, None);
        let badge = if icon.is_some() { "◉" } else { "○" };
        format!(
            "{} {} {} {}",
            badge.bright_cyan(),
            format!("[{}]", req.app_name).dimmed(),
            req.summary.bright_white().bold(),
            req.body.dimmed()
        )
    }
}

impl FallbackSink for ConsoleFallback {
    fn show(&self, event: &NotificationEvent, icon: Option<&DynamicImage>) {
        eprintln!("{}", self.line(event, icon));
    }
}

/// Only logs
#[derive(Debug, Default)]
pub struct SilentFallback;

impl FallbackSink for SilentFallback {
    fn show(&self, event: &NotificationEvent, _icon: Option<&DynamicImage>) {
        info!(
            "Fallback popup for {} from {}",
            event.kind(),
            event.sender().address
        );
    }
}

/// Keeps every event it is asked to show
#[derive(Debug, Default)]
pub struct RecordingFallback {
    shown: Mutex<Vec<(NotificationEvent, bool)>>,
}

impl RecordingFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events shown so far, oldest first
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(ev, _)| ev.clone())
            .collect()
    }

    /// Whether each shown event came with an icon
    pub fn icons(&self) -> Vec<bool> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, icon)| *icon)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.shown.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl FallbackSink for RecordingFallback {
    fn show(&self, event: &NotificationEvent, icon: Option<&DynamicImage>) {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event.clone(), icon.is_some()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ChatMessage, Sender};

    fn chat() -> NotificationEvent {
        NotificationEvent::Chat {
            from: Sender::new("alice@example.com").with_roster_name("Alice"),
            message: ChatMessage {
                subject: String::new(),
                body: "ping".to_string(),
            },
        }
    }

    #[test]
    fn test_console_line_uses_app_name() {
        let line = ConsoleFallback::new("Tester").line(&chat(), None);
        assert!(line.contains("[Tester]"), "{}", line);
        assert!(line.contains("Incoming Message from Alice"), "{}", line);
        assert!(line.contains("ping"), "{}", line);

        let default = ConsoleFallback::default().line(&chat(), None);
        assert!(default.contains("[Psi]"), "{}", default);
    }

    #[test]
    fn test_recording_keeps_order_and_icons() {
        let sink = RecordingFallback::new();
        let img = DynamicImage::new_rgba8(1, 1);
        sink.show(&chat(), Some(&img));
        sink.show(&chat(), None);
        assert_eq!(sink.count(), 2);
        assert_eq!(sink.icons(), vec![true, false]);
        assert_eq!(sink.events()[0].kind(), crate::event::EventKind::Chat);
    }
}
