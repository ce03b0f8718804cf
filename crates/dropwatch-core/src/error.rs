use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("date parse error: {0}")]
    DateParse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("whois transport error: {0}")]
    Transport(String),

    #[error("whois rate limited: {0}")]
    RateLimited(String),

    #[error("notify error: {0}")]
    Notify(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type WatchResult<T> = Result<T, WatchError>;
