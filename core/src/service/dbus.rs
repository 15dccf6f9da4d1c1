/// Session bus transport for `org.freedesktop.Notifications`
use super::transport::NotificationTransport;
use super::ServiceEndpoint;
use crate::error::{NotifyError, Result};
use crate::request::{Hints, NotificationRequest, HINT_CATEGORY, HINT_ICON_DATA, HINT_URGENCY};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;
use zbus::zvariant::{DynamicType, Value};
use zbus::Connection;

/// Errors the bus daemon sends on the service's behalf when it cannot
/// deliver the call. These mean "nobody answered", not "the server said no".
const BUS_DELIVERY_ERRORS: &[&str] = &[
    "org.freedesktop.DBus.Error.ServiceUnknown",
    "org.freedesktop.DBus.Error.NameHasNoOwner",
    "org.freedesktop.DBus.Error.NoReply",
    "org.freedesktop.DBus.Error.Timeout",
    "org.freedesktop.DBus.Error.Disconnected",
];

/// Talks to the notification service over the D-Bus session bus.
///
/// The connection is opened on first use and kept while it works; after a
/// transport failure it is dropped so the next call reconnects.
pub struct ZbusTransport {
    endpoint: ServiceEndpoint,
    connection: Mutex<Option<Connection>>,
}

impl ZbusTransport {
    pub fn new(endpoint: ServiceEndpoint) -> Self {
        Self {
            endpoint,
            connection: Mutex::new(None),
        }
    }

    async fn connection(&self) -> Result<Connection> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = Connection::session()
            .await
            .map_err(|e| NotifyError::SendUnreachable(format!("session bus: {}", e)))?;
        debug!("Connected to session bus for {}", self.endpoint);
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn call<B>(&self, method: &str, body: &B) -> Result<zbus::Message>
    where
        B: Serialize + DynamicType,
    {
        let conn = self.connection().await?;
        let result = conn
            .call_method(
                Some(self.endpoint.service.as_str()),
                self.endpoint.path.as_str(),
                Some(self.endpoint.interface.as_str()),
                method,
                body,
            )
            .await;

        match result {
            Ok(reply) => Ok(reply),
            Err(e) => {
                let err = classify(e);
                if !err.is_rejection() {
                    self.connection.lock().await.take();
                }
                Err(err)
            }
        }
    }
}

impl NotificationTransport for ZbusTransport {
    async fn get_capabilities(&self) -> Result<Option<Vec<String>>> {
        let reply = self.call("GetCapabilities", &()).await?;
        Ok(reply.body().deserialize::<Vec<String>>().ok())
    }

    async fn notify(&self, request: &NotificationRequest) -> Result<u32> {
        let reply = self.call("Notify", &notify_body(request)).await?;
        // A method return is delivery; the id is informational.
        Ok(reply.body().deserialize::<u32>().unwrap_or_default())
    }
}

fn classify(err: zbus::Error) -> NotifyError {
    match err {
        zbus::Error::MethodError(name, detail, _) => {
            let name = name.to_string();
            let message = detail.unwrap_or_default();
            if BUS_DELIVERY_ERRORS.contains(&name.as_str()) {
                NotifyError::SendUnreachable(format!("{}: {}", name, message))
            } else {
                NotifyError::SendRejected { name, message }
            }
        }
        other => NotifyError::SendUnreachable(other.to_string()),
    }
}

/// `Notify` arguments, `susssasa{sv}i`
type NotifyBody<'a> = (
    &'a str,
    u32,
    &'a str,
    &'a str,
    &'a str,
    Vec<&'a str>,
    HashMap<&'static str, Value<'a>>,
    i32,
);

fn notify_body(request: &NotificationRequest) -> NotifyBody<'_> {
    (
        request.app_name.as_str(),
        request.replaces_id,
        request.app_icon.as_str(),
        request.summary.as_str(),
        request.body.as_str(),
        request.actions.iter().map(String::as_str).collect(),
        wire_hints(&request.hints),
        request.expire_timeout,
    )
}

/// `a{sv}` hints dictionary
fn wire_hints(hints: &Hints) -> HashMap<&'static str, Value<'_>> {
    let mut map = HashMap::new();
    if let Some(category) = &hints.category {
        map.insert(HINT_CATEGORY, Value::from(category.as_str()));
    }
    map.insert(HINT_URGENCY, Value::from(hints.urgency.as_byte()));
    if let Some(icon) = &hints.icon_data {
        map.insert(HINT_ICON_DATA, Value::from(icon.clone()));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ChatMessage, NotificationEvent, Sender};
    use crate::icon::IconPayload;
    use crate::request::{RequestBuilder, Urgency};

    #[test]
    fn test_wire_hints_keys_and_types() {
        let hints = Hints {
            category: Some("im.received".to_string()),
            urgency: Urgency::Normal,
            icon_data: Some(IconPayload {
                width: 1,
                height: 1,
                rowstride: 4,
                has_alpha: true,
                bits_per_sample: 8,
                channels: 4,
                data: vec![1, 2, 3, 4],
            }),
        };
        let map = wire_hints(&hints);
        assert_eq!(map.len(), 3);
        assert_eq!(map[HINT_URGENCY], Value::U8(1));
        assert_eq!(map[HINT_CATEGORY], Value::from("im.received"));
        assert_eq!(map[HINT_ICON_DATA].value_signature().as_str(), "(iiibiiay)");
    }

    #[test]
    fn test_wire_hints_without_optional() {
        let hints = Hints {
            category: None,
            urgency: Urgency::Normal,
            icon_data: None,
        };
        let map = wire_hints(&hints);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(HINT_URGENCY));
    }

    #[test]
    fn test_notify_body_signature() {
        let req = RequestBuilder::default().build(
            &NotificationEvent::Chat {
                from: Sender::new("carol@example.com"),
                message: ChatMessage {
                    subject: String::new(),
                    body: "hi".to_string(),
                },
            },
            None,
        );
        let body = notify_body(&req);
        assert_eq!(body.dynamic_signature().as_str(), "(susssasa{sv}i)");
        assert_eq!(body.0, "Psi");
        assert_eq!(body.1, 0);
        assert_eq!(body.2, "");
        assert_eq!(body.4, "hi");
        assert!(body.5.is_empty());
        assert_eq!(body.7, -1);
    }

    #[test]
    fn test_bus_errors_are_unreachable() {
        let err = classify(zbus::Error::Address("bogus".to_string()));
        assert!(!err.is_rejection());
    }
}
