/// Liveness tracking and the two service calls
use super::transport::NotificationTransport;
use super::ServiceEndpoint;
use crate::error::{NotifyError, Result};
use crate::request::NotificationRequest;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// What happened to one `Notify` attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Service returned a notification id
    Delivered { id: u32 },
    /// Service answered with an error reply
    Rejected { reason: String },
    /// Call never got an answer (no bus, no owner, timeout)
    Unreachable { reason: String },
}

impl Outcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered { .. })
    }

    fn from_error(err: NotifyError) -> Self {
        if err.is_rejection() {
            Outcome::Rejected {
                reason: err.to_string(),
            }
        } else {
            Outcome::Unreachable {
                reason: err.to_string(),
            }
        }
    }
}

/// The dispatcher's view of the notification service.
///
/// Starts out dead. Only [`NotificationServiceClient::probe`] and a failed
/// [`NotificationServiceClient::send`] write `live`.
#[derive(Debug)]
pub struct ServiceHandle {
    endpoint: ServiceEndpoint,
    live: AtomicBool,
}

impl ServiceHandle {
    pub fn new(endpoint: ServiceEndpoint) -> Self {
        Self {
            endpoint,
            live: AtomicBool::new(false),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::Release);
    }
}

/// Synchronous request/response client for the notification service
pub struct NotificationServiceClient<T> {
    transport: T,
    handle: ServiceHandle,
    call_timeout: Duration,
}

impl<T: NotificationTransport> NotificationServiceClient<T> {
    pub fn new(transport: T, endpoint: ServiceEndpoint, call_timeout: Duration) -> Self {
        Self {
            transport,
            handle: ServiceHandle::new(endpoint),
            call_timeout,
        }
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_live()
    }

    /// Ask the service for its capabilities and record whether it answered.
    ///
    /// Any method return counts, whatever its payload; the capability list is
    /// `None` when it did not decode. Failures come back as
    /// [`NotifyError::ProbeFailed`].
    pub async fn check(&self) -> Result<Option<Vec<String>>> {
        let result = match timeout(self.call_timeout, self.transport.get_capabilities()).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(format!(
                "GetCapabilities after {:?}",
                self.call_timeout
            ))),
        };

        let result = match result {
            Ok(capabilities) => {
                debug!(
                    "Notification service {} is live (capabilities: {:?})",
                    self.handle.endpoint, capabilities
                );
                Ok(capabilities)
            }
            Err(e) => {
                debug!("Notification service {} did not answer: {}", self.handle.endpoint, e);
                Err(NotifyError::ProbeFailed(e.to_string()))
            }
        };
        self.handle.set_live(result.is_ok());
        result
    }

    /// [`check`](Self::check) reduced to liveness
    pub async fn probe(&self) -> bool {
        self.check().await.is_ok()
    }

    /// Send one notification. Never fails: the outcome carries the error.
    pub async fn send(&self, request: &NotificationRequest) -> Outcome {
        let result = match timeout(self.call_timeout, self.transport.notify(request)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(format!("Notify after {:?}", self.call_timeout))),
        };

        match result {
            Ok(id) => {
                info!("Notification {} delivered: {}", id, request.summary);
                Outcome::Delivered { id }
            }
            Err(e) => {
                self.handle.set_live(false);
                let outcome = Outcome::from_error(e);
                warn!("Notification not delivered: {:?}", outcome);
                outcome
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{NotificationEvent, Sender};
    use crate::request::RequestBuilder;
    use crate::service::transport::{ScriptedReply, ScriptedTransport};

    fn client(t: ScriptedTransport) -> NotificationServiceClient<ScriptedTransport> {
        NotificationServiceClient::new(t, ServiceEndpoint::default(), Duration::from_millis(100))
    }

    fn request() -> NotificationRequest {
        RequestBuilder::default().build(
            &NotificationEvent::File {
                from: Sender::new("bob@example.com"),
                file_name: None,
            },
            None,
        )
    }

    #[tokio::test]
    async fn test_starts_dead() {
        let c = client(ScriptedTransport::always(ScriptedReply::Reply));
        assert!(!c.is_live());
    }

    #[tokio::test]
    async fn test_probe_updates_liveness() {
        let t = ScriptedTransport::always(ScriptedReply::Reply);
        t.push_capabilities(ScriptedReply::NoService).await;
        let c = client(t);

        assert!(!c.probe().await);
        assert!(!c.is_live());
        assert!(c.probe().await);
        assert!(c.is_live());
    }

    #[tokio::test]
    async fn test_check_reports_typed_failure() {
        let t = ScriptedTransport::always(ScriptedReply::Reply);
        t.push_capabilities(ScriptedReply::ErrorReply).await;
        let c = client(t);

        let err = c.check().await.unwrap_err();
        assert!(matches!(err, NotifyError::ProbeFailed(_)));
        assert!(!c.is_live());

        let caps = c.check().await.unwrap();
        assert!(caps.is_some());
        assert!(c.is_live());
    }

    #[tokio::test]
    async fn test_probe_error_reply_is_dead() {
        let c = client(ScriptedTransport::always(ScriptedReply::ErrorReply));
        assert!(!c.probe().await);
    }

    #[tokio::test]
    async fn test_probe_timeout_is_dead() {
        let c = client(ScriptedTransport::always(ScriptedReply::Hang));
        assert!(!c.probe().await);
        assert!(!c.is_live());
    }

    #[tokio::test]
    async fn test_send_outcomes() {
        let t = ScriptedTransport::always(ScriptedReply::Reply);
        t.push_notify(ScriptedReply::ErrorReply).await;
        t.push_notify(ScriptedReply::NoService).await;
        t.push_notify(ScriptedReply::Hang).await;
        let c = client(t);
        let req = request();

        assert!(matches!(c.send(&req).await, Outcome::Rejected { .. }));
        assert!(matches!(c.send(&req).await, Outcome::Unreachable { .. }));
        assert!(matches!(c.send(&req).await, Outcome::Unreachable { .. }));
        assert_eq!(c.send(&req).await, Outcome::Delivered { id: 1 });
    }

    #[tokio::test]
    async fn test_failed_send_marks_dead() {
        let t = ScriptedTransport::always(ScriptedReply::Reply);
        t.push_notify(ScriptedReply::ErrorReply).await;
        let c = client(t);

        assert!(c.probe().await);
        assert!(!c.send(&request()).await.is_delivered());
        assert!(!c.is_live());
    }

    #[tokio::test]
    async fn test_successful_send_keeps_state() {
        let c = client(ScriptedTransport::always(ScriptedReply::Reply));
        assert!(c.probe().await);
        assert!(c.send(&request()).await.is_delivered());
        assert!(c.is_live());
    }
}
