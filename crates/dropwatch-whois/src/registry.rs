use dropwatch_core::domain::suffix_candidates;
use dropwatch_core::{WatchError, WatchResult};
use std::collections::HashMap;

/// WHOIS server and default availability phrase for one TLD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TldServer {
    pub server: String,
    pub available_pattern: String,
}

/// Resolution result for a concrete domain.
#[derive(Debug, Clone)]
pub struct ResolvedTld {
    pub tld: String,
    pub server: String,
    pub available_pattern: String,
}

/// Immutable TLD→server snapshot for one session: built-ins merged once with
/// user config entries at startup, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TldRegistry {
    entries: HashMap<String, TldServer>,
}

const BUILTINS: &[(&str, &str, &str)] = &[
    ("com", "whois.verisign-grs.com", "no match for"),
    ("net", "whois.verisign-grs.com", "no match for"),
    ("org", "whois.publicinterestregistry.org", "not found"),
    ("info", "whois.nic.info", "not found"),
    ("io", "whois.nic.io", "is available"),
    ("dev", "whois.nic.google", "not found"),
    ("app", "whois.nic.google", "not found"),
    ("co", "whois.nic.co", "not found"),
    ("me", "whois.nic.me", "not found"),
    ("xyz", "whois.nic.xyz", "not found"),
    ("us", "whois.nic.us", "not found"),
    ("uk", "whois.nic.uk", "no match"),
    ("co.uk", "whois.nic.uk", "no match"),
    ("de", "whois.denic.de", "status: free"),
];

impl TldRegistry {
    pub fn builtin() -> Self {
        let entries = BUILTINS
            .iter()
            .map(|(tld, server, pattern)| {
                (
                    (*tld).to_string(),
                    TldServer {
                        server: (*server).to_string(),
                        available_pattern: (*pattern).to_string(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Layer user-configured entries over the built-ins. User entries win.
    pub fn merge_config(mut self, overrides: HashMap<String, TldServer>) -> Self {
        for (tld, entry) in overrides {
            self.entries
                .insert(tld.trim_start_matches('.').to_lowercase(), entry);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Longest configured suffix wins, so `example.co.uk` prefers a `co.uk`
    /// entry over `uk`. Unconfigured TLDs are a configuration error surfaced
    /// before any query is attempted.
    pub fn resolve(&self, domain: &str) -> WatchResult<ResolvedTld> {
        let lowered = domain.to_lowercase();
        for suffix in suffix_candidates(&lowered) {
            if let Some(entry) = self.entries.get(suffix) {
                return Ok(ResolvedTld {
                    tld: suffix.to_string(),
                    server: entry.server.clone(),
                    available_pattern: entry.available_pattern.clone(),
                });
            }
        }
        Err(WatchError::Config(format!(
            "no whois server configured for '{domain}'; add a [tld] entry to the config"
        )))
    }
}
