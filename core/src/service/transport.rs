/// Call/response seam between the client and the bus
use crate::error::{NotifyError, Result};
use crate::request::NotificationRequest;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The two calls the dispatcher makes on the notification service.
///
/// Implementations report an error reply from the service as
/// [`NotifyError::SendRejected`] and anything that kept the call from being
/// answered as [`NotifyError::SendUnreachable`].
pub trait NotificationTransport: Send + Sync {
    /// `GetCapabilities`. `Ok` for any method return; the capability list is
    /// `None` when the payload did not decode.
    fn get_capabilities(&self) -> impl Future<Output = Result<Option<Vec<String>>>> + Send;

    /// `Notify`. Returns the id the server assigned.
    fn notify(&self, request: &NotificationRequest) -> impl Future<Output = Result<u32>> + Send;
}

impl<T: NotificationTransport> NotificationTransport for Arc<T> {
    fn get_capabilities(&self) -> impl Future<Output = Result<Option<Vec<String>>>> + Send {
        (**self).get_capabilities()
    }

    fn notify(&self, request: &NotificationRequest) -> impl Future<Output = Result<u32>> + Send {
        (**self).notify(request)
    }
}

/// How a scripted call is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Method return
    Reply,
    /// Error reply from the service
    ErrorReply,
    /// Nobody owns the service name
    NoService,
    /// Never answers
    Hang,
}

/// A call seen by [`ScriptedTransport`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetCapabilities,
    Notify(NotificationRequest),
}

#[derive(Debug)]
struct Script {
    capabilities: VecDeque<ScriptedReply>,
    notify: VecDeque<ScriptedReply>,
    capabilities_default: ScriptedReply,
    notify_default: ScriptedReply,
    calls: Vec<Call>,
    next_id: u32,
}

/// In-memory notification service with pre-programmed answers.
///
/// Queued replies are used first, then the default for that call.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new(capabilities_default: ScriptedReply, notify_default: ScriptedReply) -> Self {
        Self {
            script: Mutex::new(Script {
                capabilities: VecDeque::new(),
                notify: VecDeque::new(),
                capabilities_default,
                notify_default,
                calls: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Every call answered the same way
    pub fn always(reply: ScriptedReply) -> Self {
        Self::new(reply, reply)
    }

    pub async fn push_capabilities(&self, reply: ScriptedReply) {
        self.script.lock().await.capabilities.push_back(reply);
    }

    pub async fn push_notify(&self, reply: ScriptedReply) {
        self.script.lock().await.notify.push_back(reply);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.script.lock().await.calls.clone()
    }

    pub async fn probe_count(&self) -> usize {
        self.script
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| matches!(c, Call::GetCapabilities))
            .count()
    }

    pub async fn notify_requests(&self) -> Vec<NotificationRequest> {
        self.script
            .lock()
            .await
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Notify(req) => Some(req.clone()),
                Call::GetCapabilities => None,
            })
            .collect()
    }

    async fn answer<R>(reply: ScriptedReply, ok: R) -> Result<R> {
        match reply {
            ScriptedReply::Reply => Ok(ok),
            ScriptedReply::ErrorReply => Err(NotifyError::SendRejected {
                name: "org.freedesktop.DBus.Error.Failed".to_string(),
                message: "scripted error reply".to_string(),
            }),
            ScriptedReply::NoService => Err(NotifyError::SendUnreachable(format!(
                "The name {} was not provided by any .service files",
                super::NOTIFICATIONS_SERVICE
            ))),
            ScriptedReply::Hang => {
                std::future::pending::<()>().await;
                Ok(ok)
            }
        }
    }
}

impl NotificationTransport for ScriptedTransport {
    async fn get_capabilities(&self) -> Result<Option<Vec<String>>> {
        let reply = {
            let mut script = self.script.lock().await;
            script.calls.push(Call::GetCapabilities);
            let default = script.capabilities_default;
            script.capabilities.pop_front().unwrap_or(default)
        };
        Self::answer(reply, Some(vec!["body".to_string(), "icon-static".to_string()])).await
    }

    async fn notify(&self, request: &NotificationRequest) -> Result<u32> {
        let (reply, id) = {
            let mut script = self.script.lock().await;
            script.calls.push(Call::Notify(request.clone()));
            let default = script.notify_default;
            let reply = script.notify.pop_front().unwrap_or(default);
            let id = script.next_id;
            if reply == ScriptedReply::Reply {
                script.next_id += 1;
            }
            (reply, id)
        };
        Self::answer(reply, id).await
    }
}
