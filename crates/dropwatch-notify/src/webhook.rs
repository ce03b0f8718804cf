use dropwatch_core::{AlertEvent, AlertKind, WatchError, WatchResult};
use tracing::{info, warn};

pub struct WebhookNotifier {
    client: reqwest::Client,
    urls: Vec<String>,
}

impl WebhookNotifier {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            urls,
        }
    }

    /// Generic endpoints get the full event as JSON; Slack hooks get a
    /// message shaped for a channel. Per-URL failures are logged and
    /// skipped; one dead endpoint never starves the others.
    pub async fn send(&self, event: &AlertEvent) -> WatchResult<()> {
        let raw = serde_json::to_value(event).map_err(|e| WatchError::Notify(e.to_string()))?;

        for url in &self.urls {
            let body = if url.contains("hooks.slack.com") {
                format_slack(event)
            } else {
                raw.clone()
            };
            match self.post(url, &body).await {
                Ok(_) => info!(url = %url, event_id = %event.id, "webhook delivered"),
                Err(e) => warn!(url = %url, error = %e, "webhook delivery failed"),
            }
        }
        Ok(())
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> WatchResult<()> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| WatchError::Notify(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(WatchError::Notify(format!(
                "webhook returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

fn format_slack(event: &AlertEvent) -> serde_json::Value {
    let emoji = match &event.kind {
        AlertKind::MatchFound { .. } => ":tada:",
        AlertKind::TargetReached { .. } => ":alarm_clock:",
        AlertKind::GraceExceeded { .. } => ":hourglass_flowing_sand:",
    };

    serde_json::json!({
        "text": format!("{} *{}*\n{}", emoji, event.title, event.detail),
        "unfurl_links": false
    })
}
