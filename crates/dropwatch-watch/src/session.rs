use dropwatch_core::domain::validate_domain;
use dropwatch_core::timeparse::TimeMode;
use dropwatch_core::{PollResult, WatchError, WatchResult, WatchVerdict};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Operator-facing knobs for one watch run. Validated before the session is
/// created; a rejected option set never issues a query.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub domain: String,
    pub base_interval_secs: u64,
    /// 0 = unlimited.
    pub max_checks: u32,
    pub expect_pattern: Option<String>,
    /// 0 = no target; the session polls flat forever.
    pub target_epoch: i64,
    pub mode: TimeMode,
    /// Pre-authorize continuing past the grace threshold without a prompt.
    pub auto_continue: bool,
    /// Where the transient session snapshot lives; `None` disables it.
    pub state_dir: Option<PathBuf>,
}

impl WatchOptions {
    /// Hard validation plus non-fatal warnings the caller should surface.
    pub fn validate(&self) -> WatchResult<Vec<String>> {
        validate_domain(&self.domain)?;
        if self.base_interval_secs < 1 {
            return Err(WatchError::Validation(
                "poll interval must be at least 1 second".to_string(),
            ));
        }
        let mut warnings = Vec::new();
        if self.base_interval_secs < 10 {
            warnings.push(format!(
                "interval of {}s is aggressive; whois servers may rate-limit you",
                self.base_interval_secs
            ));
        }
        Ok(warnings)
    }
}

/// Terminal state of the poll loop. Each is entered exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndState {
    Matched,
    LimitReached,
    Cancelled,
}

impl EndState {
    pub fn verdict(&self) -> WatchVerdict {
        match self {
            EndState::Matched => WatchVerdict::Pass,
            EndState::LimitReached => WatchVerdict::Fail,
            EndState::Cancelled => WatchVerdict::Watch,
        }
    }
}

/// One monitoring run. History is append-only, most recent last; nothing
/// outside the scheduler mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSession {
    pub domain: String,
    pub target_epoch: i64,
    pub base_interval_secs: u64,
    pub max_checks: u32,
    pub expect_pattern: Option<String>,
    pub check_count: u32,
    pub start_epoch: i64,
    pub history: Vec<PollResult>,
}

impl PollSession {
    pub fn new(opts: &WatchOptions, start_epoch: i64) -> Self {
        Self {
            domain: opts.domain.clone(),
            target_epoch: opts.target_epoch,
            base_interval_secs: opts.base_interval_secs,
            max_checks: opts.max_checks,
            expect_pattern: opts.expect_pattern.clone(),
            check_count: 0,
            start_epoch,
            history: Vec::new(),
        }
    }

    pub fn record(&mut self, result: PollResult) {
        self.history.push(result);
    }

    pub fn last(&self) -> Option<&PollResult> {
        self.history.last()
    }

    pub fn elapsed_secs(&self, now: i64) -> u64 {
        (now - self.start_epoch).max(0) as u64
    }

    /// Path of the transient snapshot for this session.
    pub fn snapshot_path(&self, state_dir: &Path) -> PathBuf {
        state_dir.join(format!(".{}.watch.json", self.domain))
    }

    /// Persist the session as JSON so a concurrent shell can inspect a
    /// long-running watch. Best-effort; the caller logs failures.
    pub fn write_snapshot(&self, state_dir: &Path) -> WatchResult<()> {
        std::fs::create_dir_all(state_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(self.snapshot_path(state_dir), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropwatch_core::{ActivityCode, DomainStatus};

    fn opts() -> WatchOptions {
        WatchOptions {
            domain: "example.com".to_string(),
            base_interval_secs: 60,
            max_checks: 0,
            expect_pattern: None,
            target_epoch: 0,
            mode: TimeMode::Utc,
            auto_continue: false,
            state_dir: None,
        }
    }

    #[test]
    fn sub_second_interval_is_rejected() {
        let mut o = opts();
        o.base_interval_secs = 0;
        assert!(matches!(o.validate(), Err(WatchError::Validation(_))));
    }

    #[test]
    fn short_interval_warns_but_passes() {
        let mut o = opts();
        o.base_interval_secs = 5;
        let warnings = o.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(opts().validate().unwrap().is_empty());
    }

    #[test]
    fn bad_domain_is_rejected() {
        let mut o = opts();
        o.domain = "not a domain".to_string();
        assert!(matches!(o.validate(), Err(WatchError::Validation(_))));
    }

    #[test]
    fn end_state_verdicts() {
        assert_eq!(EndState::Matched.verdict(), WatchVerdict::Pass);
        assert_eq!(EndState::LimitReached.verdict(), WatchVerdict::Fail);
        assert_eq!(EndState::Cancelled.verdict(), WatchVerdict::Watch);
    }

    #[test]
    fn snapshot_round_trips() {
        let dir = std::env::temp_dir().join("dropwatch-session-test");
        let mut session = PollSession::new(&opts(), 1_700_000_000);
        session.record(PollResult {
            at_epoch: 1_700_000_060,
            raw_text: "Name Server: NS1.EXAMPLE.NET".to_string(),
            status: DomainStatus::Registered,
            registrar: "UNKNOWN".to_string(),
            matched: false,
            activity: ActivityCode::Poll,
        });
        session.check_count = 1;
        session.write_snapshot(&dir).unwrap();

        let path = session.snapshot_path(&dir);
        let back: PollSession =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.check_count, 1);
        assert_eq!(back.history.len(), 1);
        std::fs::remove_file(path).unwrap();
    }
}
