use crate::registrar::extract_registrar;
use dropwatch_core::{ActivityCode, DomainStatus};
use regex::RegexBuilder;
use tracing::debug;

const AVAILABLE_PHRASES: &[&str] = &[
    "no match for",
    "not found",
    "no entries found",
    "no data found",
    "no object found",
    "status: free",
    "is available",
    "available",
];

const PENDING_DELETE_PHRASES: &[&str] = &["pendingdelete", "pending delete", "pending-delete"];

const HOLD_PHRASES: &[&str] = &["clienthold", "client hold", "serverhold", "server hold"];

const REDEMPTION_PHRASES: &[&str] = &[
    "redemptionperiod",
    "redemption period",
    "redemption-period",
];

const NAMESERVER_PHRASES: &[&str] = &["name server:", "nserver:", "name servers:", "nameservers:"];

const RESERVED_PHRASES: &[&str] = &[
    "reserved by the registry",
    "premium domain",
    "reserved",
];

const EXPIRY_PHRASES: &[&str] = &["expiry", "expiration date", "expires", "paid-until"];

const STATE_PHRASES: &[&str] = &["hold", "lock", "suspend"];

/// Ordered rule table. First match wins; raw WHOIS text routinely satisfies
/// more than one loose pattern, so the order is load-bearing.
const RULES: &[(DomainStatus, &[&str])] = &[
    (DomainStatus::Available, AVAILABLE_PHRASES),
    (DomainStatus::PendingDelete, PENDING_DELETE_PHRASES),
    (DomainStatus::OnHold, HOLD_PHRASES),
    (DomainStatus::Redemption, REDEMPTION_PHRASES),
    (DomainStatus::Registered, NAMESERVER_PHRASES),
    (DomainStatus::Reserved, RESERVED_PHRASES),
];

fn contains_any(lowered: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| lowered.contains(p))
}

/// Map raw WHOIS text to a lifecycle status and a best-effort registrar name.
/// Total: unrecognized text is `Unknown`, never an error.
pub fn classify(raw: &str) -> (DomainStatus, String) {
    let lowered = raw.to_lowercase();
    let registrar = extract_registrar(raw);

    for (status, phrases) in RULES {
        if contains_any(&lowered, phrases) {
            return (*status, registrar);
        }
    }
    (DomainStatus::Unknown, registrar)
}

/// `classify`, with the resolved TLD's availability phrase as a tiebreaker:
/// registries with unusual "not registered" wording (outside the builtin
/// phrase table) still classify as available when their configured pattern
/// appears.
pub fn classify_with_hint(raw: &str, availability_hint: Option<&str>) -> (DomainStatus, String) {
    let (status, registrar) = classify(raw);
    if status == DomainStatus::Unknown {
        if let Some(hint) = availability_hint {
            if !hint.is_empty() && raw.to_lowercase().contains(&hint.to_lowercase()) {
                return (DomainStatus::Available, registrar);
            }
        }
    }
    (status, registrar)
}

/// Decide whether this cycle's response is what the operator is waiting for.
///
/// An explicit pattern always takes precedence over lifecycle inference: it is
/// tested case-insensitively against the raw text (as a regex, or as a plain
/// substring when it does not compile) and the classifier status is ignored.
pub fn matches(raw: &str, expect_pattern: Option<&str>, status: DomainStatus) -> bool {
    match expect_pattern {
        Some(pattern) => {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => re.is_match(raw),
                Err(_) => {
                    debug!(pattern, "expect pattern is not a valid regex, using substring match");
                    raw.to_lowercase().contains(&pattern.to_lowercase())
                }
            }
        }
        None => status == DomainStatus::Available,
    }
}

/// Human-facing tag for what the operator is watching for. Descriptive only.
pub fn activity_code(raw: &str, expect_pattern: Option<&str>) -> ActivityCode {
    if expect_pattern.is_some() {
        return ActivityCode::Ptrn;
    }
    let lowered = raw.to_lowercase();
    if contains_any(&lowered, PENDING_DELETE_PHRASES) {
        ActivityCode::Drop
    } else if contains_any(&lowered, AVAILABLE_PHRASES) {
        ActivityCode::Aval
    } else if contains_any(&lowered, EXPIRY_PHRASES) {
        ActivityCode::Expr
    } else if contains_any(&lowered, STATE_PHRASES) {
        ActivityCode::Stat
    } else {
        ActivityCode::Poll
    }
}
