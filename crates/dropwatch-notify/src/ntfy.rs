use dropwatch_core::{AlertEvent, AlertKind, AlertSeverity, WatchError, WatchResult};
use tracing::{info, warn};

pub struct NtfyNotifier {
    client: reqwest::Client,
    server: String,
    topic: String,
}

/// ntfy priority header. A found match is the whole point of a watch and
/// rings at max urgency; the informational events stay at or below default.
fn priority_for(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::High => "5",
        AlertSeverity::Medium => "3",
        AlertSeverity::Low => "2",
    }
}

fn tags_for(kind: &AlertKind) -> &'static str {
    match kind {
        AlertKind::MatchFound { .. } => "tada,globe_with_meridians",
        AlertKind::TargetReached { .. } => "alarm_clock",
        AlertKind::GraceExceeded { .. } => "hourglass_flowing_sand",
    }
}

impl NtfyNotifier {
    pub fn new(topic: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            server: "https://ntfy.sh".to_string(),
            topic,
        }
    }

    pub fn with_server(mut self, server: String) -> Self {
        self.server = server;
        self
    }

    pub async fn send(&self, event: &AlertEvent) -> WatchResult<()> {
        let url = format!("{}/{}", self.server, self.topic);
        let resp = self
            .client
            .post(&url)
            .header("Title", &event.title)
            .header("Priority", priority_for(event.severity))
            .header("Tags", tags_for(&event.kind))
            .body(event.detail.clone())
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| WatchError::Notify(e.to_string()))?;

        if resp.status().is_success() {
            info!(topic = %self.topic, event_id = %event.id, "ntfy notification sent");
        } else {
            warn!(
                topic = %self.topic,
                status = %resp.status(),
                "ntfy delivery failed"
            );
        }
        Ok(())
    }
}
