//! Best-effort alert delivery. Notification failure must never abort or slow
//! a running watch; callers fire-and-forget.

pub mod ntfy;
pub mod webhook;

use dropwatch_core::{AlertEvent, WatchResult};

enum Sink {
    Webhook(webhook::WebhookNotifier),
    Ntfy(ntfy::NtfyNotifier),
}

/// Fan-out over every configured channel. An unconfigured notifier is a
/// valid no-op; `Scheduler` checks `is_configured` before building events.
pub struct Notifier {
    sinks: Vec<Sink>,
}

impl Notifier {
    pub fn new(
        webhook_urls: Vec<String>,
        ntfy_topic: Option<String>,
        ntfy_server: Option<String>,
    ) -> Self {
        let mut sinks = Vec::new();
        if !webhook_urls.is_empty() {
            sinks.push(Sink::Webhook(webhook::WebhookNotifier::new(webhook_urls)));
        }
        if let Some(topic) = ntfy_topic {
            let n = ntfy::NtfyNotifier::new(topic);
            let n = match ntfy_server {
                Some(server) => n.with_server(server),
                None => n,
            };
            sinks.push(Sink::Ntfy(n));
        }
        Self { sinks }
    }

    pub fn noop() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn is_configured(&self) -> bool {
        !self.sinks.is_empty()
    }

    pub async fn send(&self, event: &AlertEvent) -> WatchResult<()> {
        for sink in &self.sinks {
            match sink {
                Sink::Webhook(wh) => wh.send(event).await?,
                Sink::Ntfy(n) => n.send(event).await?,
            }
        }
        Ok(())
    }
}
