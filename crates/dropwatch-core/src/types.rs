use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Temporal regime a watch session is in, derived each cycle from the target
/// time. Drives poll cadence; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Poll,
    Heat,
    Grace,
    Cool,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Poll => "POLL",
            Phase::Heat => "HEAT",
            Phase::Grace => "GRACE",
            Phase::Cool => "COOL",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Phase::Poll => "○",
            Phase::Heat => "◉",
            Phase::Grace => "◈",
            Phase::Cool => "◇",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Registry lifecycle state inferred from raw WHOIS text. Classification is
/// total: anything unrecognized is `Unknown`, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainStatus {
    Available,
    PendingDelete,
    OnHold,
    Redemption,
    Registered,
    Reserved,
    Unknown,
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DomainStatus::Available => "AVAILABLE",
            DomainStatus::PendingDelete => "PENDING_DELETE",
            DomainStatus::OnHold => "ON_HOLD",
            DomainStatus::Redemption => "REDEMPTION",
            DomainStatus::Registered => "REGISTERED",
            DomainStatus::Reserved => "RESERVED",
            DomainStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// What the operator is watching for. Purely descriptive, shown in the live
/// line and completion summary; never used for loop control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityCode {
    Drop,
    Aval,
    Expr,
    Stat,
    Ptrn,
    Poll,
}

impl fmt::Display for ActivityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityCode::Drop => "DROP",
            ActivityCode::Aval => "AVAL",
            ActivityCode::Expr => "EXPR",
            ActivityCode::Stat => "STAT",
            ActivityCode::Ptrn => "PTRN",
            ActivityCode::Poll => "POLL",
        };
        f.write_str(s)
    }
}

/// Outcome of one WHOIS query. Immutable once built; owned by the session
/// history in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResult {
    pub at_epoch: i64,
    pub raw_text: String,
    pub status: DomainStatus,
    pub registrar: String,
    pub matched: bool,
    pub activity: ActivityCode,
}

/// Verdict tag for the completion summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchVerdict {
    Pass,
    Fail,
    Watch,
}

impl fmt::Display for WatchVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WatchVerdict::Pass => "PASS",
            WatchVerdict::Fail => "FAIL",
            WatchVerdict::Watch => "WATCH",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub severity: AlertSeverity,
    pub kind: AlertKind,
    pub title: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlertKind {
    MatchFound {
        domain: String,
        status: DomainStatus,
        registrar: String,
    },
    TargetReached {
        domain: String,
        target_epoch: i64,
    },
    GraceExceeded {
        domain: String,
        overshoot_secs: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_is_uppercase_snake() {
        assert_eq!(DomainStatus::PendingDelete.to_string(), "PENDING_DELETE");
        assert_eq!(DomainStatus::OnHold.to_string(), "ON_HOLD");
        assert_eq!(DomainStatus::Available.to_string(), "AVAILABLE");
    }

    #[test]
    fn phase_names() {
        assert_eq!(Phase::Grace.name(), "GRACE");
        assert_eq!(Phase::Cool.to_string(), "COOL");
    }

    #[test]
    fn poll_result_round_trips_through_json() {
        let result = PollResult {
            at_epoch: 1_700_000_000,
            raw_text: "No match for example.com".to_string(),
            status: DomainStatus::Available,
            registrar: "UNKNOWN".to_string(),
            matched: true,
            activity: ActivityCode::Aval,
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: PollResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, DomainStatus::Available);
        assert!(back.matched);
    }
}
