use async_trait::async_trait;
use dropwatch_core::{WatchError, WatchResult};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Seam for the scheduler: real port-43 lookups in production, scripted fakes
/// in tests.
#[async_trait]
pub trait WhoisLookup: Send + Sync {
    async fn query(&self, domain: &str, server: &str) -> WatchResult<String>;
}

const RATE_LIMIT_PHRASES: &[&str] = &[
    "rate limit",
    "ratelimit",
    "quota exceeded",
    "too many requests",
    "excessive queries",
    "look up quota",
];

/// Registries answer rate-limited queries with a normal-looking blob instead
/// of a refused connection, so the body itself has to be checked.
pub fn detect_rate_limit(response: &str) -> Option<&'static str> {
    let lowered = response.to_lowercase();
    RATE_LIMIT_PHRASES
        .iter()
        .find(|p| lowered.contains(**p))
        .copied()
}

/// Plain WHOIS protocol client: connect to port 43, send `domain\r\n`, read
/// to EOF. One timeout covers the whole exchange.
pub struct WhoisClient {
    timeout: Duration,
    port: u16,
}

impl WhoisClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, port: 43 }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    async fn exchange(&self, domain: &str, server: &str) -> std::io::Result<Vec<u8>> {
        let mut stream = TcpStream::connect((server, self.port)).await?;
        stream.write_all(format!("{domain}\r\n").as_bytes()).await?;
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await?;
        Ok(response)
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl WhoisLookup for WhoisClient {
    async fn query(&self, domain: &str, server: &str) -> WatchResult<String> {
        debug!(domain, server, "whois query");
        let bytes = tokio::time::timeout(self.timeout, self.exchange(domain, server))
            .await
            .map_err(|_| {
                WatchError::Transport(format!(
                    "whois query to {server} timed out after {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| WatchError::Transport(format!("whois query to {server} failed: {e}")))?;

        let text = String::from_utf8_lossy(&bytes).into_owned();
        if let Some(phrase) = detect_rate_limit(&text) {
            return Err(WatchError::RateLimited(format!(
                "{server} refused the query ('{phrase}')"
            )));
        }
        Ok(text)
    }
}
