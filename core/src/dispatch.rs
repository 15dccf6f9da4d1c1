/// Notification dispatch: probe, build, send, fall back
use crate::avatar::AvatarResolver;
use crate::config::Config;
use crate::event::{EventKind, NotificationEvent};
use crate::fallback::FallbackSink;
use crate::request::RequestBuilder;
use crate::service::{NotificationServiceClient, NotificationTransport, Outcome, ZbusTransport};
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::debug;

/// Counters for everything the controller has done
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    pub probes: u64,
    pub delivered: u64,
    pub rejected: u64,
    pub unreachable: u64,
    pub fallbacks: u64,
    pub muted: u64,
    pub last_delivered_at: Option<DateTime<Utc>>,
}

/// Delivers host events to the desktop notification service.
///
/// Construct one per process and share it. Each `popup` makes at most one
/// `Notify` attempt; while the service is believed dead every `popup`
/// probes first.
pub struct DispatchController<T> {
    client: NotificationServiceClient<T>,
    builder: RequestBuilder,
    muted: HashSet<EventKind>,
    /// Held for a whole probe/send sequence
    stats: Mutex<DispatchStats>,
}

impl DispatchController<ZbusTransport> {
    /// Controller talking to the session bus
    pub fn session(config: &Config) -> Self {
        Self::new(config, ZbusTransport::new(config.endpoint.clone()))
    }
}

impl<T: NotificationTransport> DispatchController<T> {
    pub fn new(config: &Config, transport: T) -> Self {
        Self {
            client: NotificationServiceClient::new(
                transport,
                config.endpoint.clone(),
                config.call_timeout,
            ),
            builder: RequestBuilder::new(config.app_name.clone()),
            muted: config.muted.iter().copied().collect(),
            stats: Mutex::new(DispatchStats::default()),
        }
    }

    pub fn client(&self) -> &NotificationServiceClient<T> {
        &self.client
    }

    pub fn is_service_live(&self) -> bool {
        self.client.is_live()
    }

    pub fn is_muted(&self, kind: EventKind) -> bool {
        self.muted.contains(&kind)
    }

    pub async fn stats(&self) -> DispatchStats {
        self.stats.lock().await.clone()
    }

    /// Show one event, through the service if possible, locally otherwise.
    ///
    /// The request is built and sent even when the probe failed: the service
    /// may have come up in between. `fallback` is called exactly once for
    /// any outcome other than `Delivered`, with the original event.
    pub async fn popup(
        &self,
        event: &NotificationEvent,
        icon: Option<&DynamicImage>,
        fallback: &dyn FallbackSink,
    ) -> Outcome {
        let mut stats = self.stats.lock().await;

        if !self.client.is_live() {
            stats.probes += 1;
            let live = self.client.probe().await;
            debug!("Re-probed notification service: live={}", live);
        }

        let request = self.builder.build(event, icon);
        let outcome = self.client.send(&request).await;

        match &outcome {
            Outcome::Delivered { .. } => {
                stats.delivered += 1;
                stats.last_delivered_at = Some(Utc::now());
            }
            Outcome::Rejected { .. } => stats.rejected += 1,
            Outcome::Unreachable { .. } => stats.unreachable += 1,
        }

        if !outcome.is_delivered() {
            stats.fallbacks += 1;
            fallback.show(event, icon);
        }
        outcome
    }

    /// Look up the sender's avatar and show the event.
    ///
    /// Returns `None` without touching the service or the fallback when the
    /// event's kind is muted.
    pub async fn notify(
        &self,
        event: &NotificationEvent,
        avatars: &dyn AvatarResolver,
        fallback: &dyn FallbackSink,
    ) -> Option<Outcome> {
        if self.is_muted(event.kind()) {
            debug!("Dropping muted {} notification", event.kind());
            self.stats.lock().await.muted += 1;
            return None;
        }
        let icon = avatars.avatar(&event.sender().address);
        Some(self.popup(event, icon.as_ref(), fallback).await)
    }
}
