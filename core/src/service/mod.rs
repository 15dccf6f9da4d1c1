/// Desktop notification service access
pub mod client;
pub mod dbus;
pub mod transport;

pub use client::{NotificationServiceClient, Outcome, ServiceHandle};
pub use dbus::ZbusTransport;
pub use transport::{Call, NotificationTransport, ScriptedReply, ScriptedTransport};

use serde::{Deserialize, Serialize};

pub const NOTIFICATIONS_SERVICE: &str = "org.freedesktop.Notifications";
pub const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";
pub const NOTIFICATIONS_INTERFACE: &str = "org.freedesktop.Notifications";

/// Where the notification service lives on the bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub service: String,
    pub path: String,
    pub interface: String,
}

impl Default for ServiceEndpoint {
    fn default() -> Self {
        Self {
            service: NOTIFICATIONS_SERVICE.to_string(),
            path: NOTIFICATIONS_PATH.to_string(),
            interface: NOTIFICATIONS_INTERFACE.to_string(),
        }
    }
}

impl std::fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.service, self.path)
    }
}
