/// fdnotify - desktop notification dispatch for instant messaging clients
///
/// Sends presence, message, headline and file alerts to the freedesktop
/// notification service over the session bus and falls back to a local
/// popup when the service is missing or refuses the call.

pub mod avatar;
pub mod cli_app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod fallback;
pub mod icon;
pub mod request;
pub mod service;

pub use config::Config;
pub use dispatch::{DispatchController, DispatchStats};
pub use error::{NotifyError, Result};
pub use event::{ChatMessage, EventKind, NotificationEvent, Presence, Sender};
pub use fallback::FallbackSink;
pub use request::{NotificationRequest, RequestBuilder};
pub use service::Outcome;
