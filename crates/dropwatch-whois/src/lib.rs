//! WHOIS lookup plumbing: the TLD→server registry and the port-43 client.

mod client;
mod registry;

pub use client::{detect_rate_limit, WhoisClient, WhoisLookup};
pub use registry::{ResolvedTld, TldRegistry, TldServer};
