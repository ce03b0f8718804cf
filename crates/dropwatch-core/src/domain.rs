use crate::error::{WatchError, WatchResult};
use regex::Regex;
use std::sync::OnceLock;

fn hostname_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z][a-z0-9-]{1,62}$")
            .expect("hostname regex")
    })
}

/// Validate a domain name before a session starts. Rejections here are
/// `Validation` errors; the session is never created.
pub fn validate_domain(domain: &str) -> WatchResult<()> {
    if domain.is_empty() || domain.len() > 253 {
        return Err(WatchError::Validation(format!(
            "invalid domain length: '{domain}'"
        )));
    }
    if !hostname_re().is_match(domain) {
        return Err(WatchError::Validation(format!(
            "invalid domain name: '{domain}'"
        )));
    }
    Ok(())
}

/// The suffix WHOIS servers are keyed by, longest first: for
/// `shop.example.co.uk` yields `example.co.uk`, `co.uk`, `uk`.
pub fn suffix_candidates(domain: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = domain;
    while let Some(idx) = rest.find('.') {
        rest = &rest[idx + 1..];
        if !rest.is_empty() {
            out.push(rest);
        }
    }
    out
}
