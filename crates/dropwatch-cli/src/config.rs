use dropwatch_core::{WatchError, WatchResult};
use dropwatch_whois::TldServer;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize, Default)]
pub struct DropwatchConfig {
    #[serde(default)]
    pub whois: WhoisConfig,
    /// Extra TLD entries layered over the built-ins, e.g.
    /// `[tld.pizza] server = "whois.nic.pizza"`.
    #[serde(default)]
    pub tld: HashMap<String, TldEntry>,
    pub notify: Option<NotifyConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Deserialize)]
pub struct WhoisConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for WhoisConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct TldEntry {
    pub server: String,
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

#[derive(Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub webhook_urls: Vec<String>,
    pub ntfy_topic: Option<String>,
    pub ntfy_server: Option<String>,
}

#[derive(Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

fn default_timeout() -> u64 {
    30
}
fn default_pattern() -> String {
    "not found".to_string()
}
fn default_state_dir() -> String {
    ".dropwatch".to_string()
}

impl DropwatchConfig {
    /// A missing config file means defaults; a present but malformed one is
    /// a hard error.
    pub fn load(path: &str) -> WatchResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| WatchError::Config(format!("bad config {path}: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn tld_overrides(&self) -> HashMap<String, TldServer> {
        self.tld
            .iter()
            .map(|(tld, entry)| {
                (
                    tld.clone(),
                    TldServer {
                        server: entry.server.clone(),
                        available_pattern: entry.pattern.clone(),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let cfg: DropwatchConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.whois.timeout_secs, 30);
        assert!(cfg.tld.is_empty());
        assert!(cfg.notify.is_none());
    }

    #[test]
    fn tld_entries_become_overrides() {
        let cfg: DropwatchConfig = toml::from_str(
            r#"
[whois]
timeout_secs = 10

[tld.pizza]
server = "whois.nic.pizza"

[tld.com]
server = "whois.example.test"
pattern = "free"

[output]
"#,
        )
        .unwrap();
        assert_eq!(cfg.whois.timeout_secs, 10);
        let overrides = cfg.tld_overrides();
        assert_eq!(overrides["pizza"].available_pattern, "not found");
        assert_eq!(overrides["com"].available_pattern, "free");
        assert_eq!(cfg.output.unwrap().state_dir, ".dropwatch");
    }

    #[test]
    fn missing_file_is_defaults() {
        let cfg = DropwatchConfig::load("/definitely/not/here.toml").unwrap();
        assert!(cfg.output.is_none());
    }
}
