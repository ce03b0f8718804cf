//! The poll loop: RUNNING → MATCHED | LIMIT_REACHED | CANCELLED.
//!
//! Each cycle queries WHOIS, classifies, appends to history, checks the
//! match and limit conditions, then sleeps the phase-derived interval with a
//! visible per-second countdown. Cancellation is observed at the two
//! suspension points (the countdown sleep and the grace prompt) and is a
//! normal terminal transition, not a crash. Transport failures are fatal: a
//! broken query stream makes the phase math meaningless.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dropwatch_classify::{activity_code, classify_with_hint, matches};
use dropwatch_core::timeparse::now_epoch;
use dropwatch_core::{
    ActivityCode, AlertEvent, AlertKind, AlertSeverity, DomainStatus, Phase, PollResult,
    WatchResult,
};
use dropwatch_notify::Notifier;
use dropwatch_whois::{ResolvedTld, WhoisLookup};

use crate::phase::{calculate_interval, determine_phase, GRACE_THRESHOLD};
use crate::prompt::{GraceDecision, GracePrompt};
use crate::render::{Completion, Renderer};
use crate::session::{EndState, PollSession, WatchOptions};

#[derive(Debug)]
pub struct WatchOutcome {
    pub end_state: EndState,
    pub session: PollSession,
}

impl WatchOutcome {
    pub fn matched(&self) -> bool {
        self.end_state == EndState::Matched
    }
}

pub struct Scheduler {
    opts: WatchOptions,
    session: PollSession,
    server: ResolvedTld,
    client: Box<dyn WhoisLookup>,
    notifier: Arc<Notifier>,
    renderer: Renderer,
    prompt: Box<dyn GracePrompt>,
    cancel: CancellationToken,
    cleaned_up: bool,
}

impl Scheduler {
    /// Validates the options; a bad option set never issues a query.
    /// Non-fatal warnings (short interval) are surfaced immediately.
    pub fn new(
        opts: WatchOptions,
        server: ResolvedTld,
        client: Box<dyn WhoisLookup>,
        notifier: Arc<Notifier>,
        renderer: Renderer,
        prompt: Box<dyn GracePrompt>,
        cancel: CancellationToken,
    ) -> WatchResult<Self> {
        let warnings = opts.validate()?;
        for w in &warnings {
            warn!("{w}");
            renderer.warn(w);
        }
        let session = PollSession::new(&opts, now_epoch());
        Ok(Self {
            opts,
            session,
            server,
            client,
            notifier,
            renderer,
            prompt,
            cancel,
            cleaned_up: false,
        })
    }

    pub async fn run(mut self) -> WatchResult<WatchOutcome> {
        info!(
            domain = %self.session.domain,
            server = %self.server.server,
            target = self.session.target_epoch,
            interval = self.session.base_interval_secs,
            "watch started"
        );

        let target = self.session.target_epoch;
        let mut base_interval = self.session.base_interval_secs;
        let mut target_announced = false;
        let mut grace_handled = false;

        let end_state = loop {
            self.session.check_count += 1;
            let raw = match self
                .client
                .query(&self.session.domain, &self.server.server)
                .await
            {
                Ok(raw) => raw,
                Err(e) => {
                    // Fatal: no retry, no silent skipped cycle.
                    self.cleanup();
                    return Err(e);
                }
            };

            let now = now_epoch();
            let pattern = self.session.expect_pattern.as_deref();
            let (status, registrar) =
                classify_with_hint(&raw, Some(&self.server.available_pattern));
            let matched = matches(&raw, pattern, status);
            let activity = activity_code(&raw, pattern);
            debug!(check = self.session.check_count, %status, matched, "cycle classified");

            self.session.record(PollResult {
                at_epoch: now,
                raw_text: raw,
                status,
                registrar,
                matched,
                activity,
            });
            self.write_snapshot();

            if matched {
                break EndState::Matched;
            }

            // The cycle did not match; leave its outcome in the trail. This
            // happens before the limit check so the final cycle of a capped
            // session is visible too.
            if let Some(last) = self.session.last() {
                self.renderer.history_line(&self.session.domain, last);
            }

            if self.session.max_checks > 0 && self.session.check_count >= self.session.max_checks {
                break EndState::LimitReached;
            }

            if target != 0 && !target_announced && now >= target {
                self.renderer.target_passed(&self.session.domain, target);
                target_announced = true;
                self.send_alert(
                    AlertSeverity::Medium,
                    AlertKind::TargetReached {
                        domain: self.session.domain.clone(),
                        target_epoch: target,
                    },
                    format!("{}: target time reached", self.session.domain),
                    format!("still {status} after {} checks", self.session.check_count),
                )
                .await;
            }

            let phase = determine_phase(target, now);
            let mut next_interval = calculate_interval(base_interval, phase, target - now);

            if target != 0 && now - target >= GRACE_THRESHOLD && !grace_handled {
                grace_handled = true;
                self.send_alert(
                    AlertSeverity::Low,
                    AlertKind::GraceExceeded {
                        domain: self.session.domain.clone(),
                        overshoot_secs: now - target,
                    },
                    format!("{}: grace window exceeded", self.session.domain),
                    format!("target overshot by {}s, backing off", now - target),
                )
                .await;

                if !self.opts.auto_continue {
                    let decision = tokio::select! {
                        d = self.prompt.decide(&self.session.domain, now - target, next_interval) => d,
                        _ = self.cancel.cancelled() => GraceDecision::Stop,
                    };
                    match decision {
                        GraceDecision::Continue => {}
                        GraceDecision::Stop => break EndState::Cancelled,
                        GraceDecision::NewInterval(secs) => {
                            base_interval = secs;
                            next_interval = calculate_interval(base_interval, phase, target - now);
                        }
                    }
                }
            }

            if self
                .countdown(phase, activity, next_interval, &mut target_announced)
                .await
            {
                break EndState::Cancelled;
            }
        };

        self.cleanup();
        self.finish(end_state).await
    }

    /// Sleep `secs` with a per-second redraw of the live line. Returns true
    /// if cancellation arrived mid-sleep.
    async fn countdown(
        &self,
        phase: Phase,
        activity: ActivityCode,
        secs: u64,
        target_announced: &mut bool,
    ) -> bool {
        let target = self.session.target_epoch;
        for remaining in (1..=secs).rev() {
            let now = now_epoch();
            if target != 0 && !*target_announced && now >= target {
                self.renderer.target_passed(&self.session.domain, target);
                *target_announced = true;
            }
            self.renderer.live_line(
                phase,
                activity,
                remaining,
                now,
                target,
                &self.session.domain,
            );
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                _ = self.cancel.cancelled() => return true,
            }
        }
        false
    }

    async fn finish(self, end_state: EndState) -> WatchResult<WatchOutcome> {
        let now = now_epoch();
        let (status, registrar) = match self.session.last() {
            Some(last) => (last.status, last.registrar.clone()),
            None => (DomainStatus::Unknown, "UNKNOWN".to_string()),
        };

        if end_state == EndState::Matched {
            self.send_alert(
                AlertSeverity::High,
                AlertKind::MatchFound {
                    domain: self.session.domain.clone(),
                    status,
                    registrar: registrar.clone(),
                },
                format!("{}: match found", self.session.domain),
                format!(
                    "status {status} after {} checks",
                    self.session.check_count
                ),
            )
            .await;
        }

        info!(
            domain = %self.session.domain,
            end_state = ?end_state,
            checks = self.session.check_count,
            "watch finished"
        );

        self.renderer.completion(&Completion {
            domain: self.session.domain.clone(),
            at_epoch: now,
            status: status.to_string(),
            registrar,
            elapsed_secs: self.session.elapsed_secs(now),
            checks: self.session.check_count,
            verdict: end_state.verdict(),
            celebrate: end_state == EndState::Matched,
        });

        Ok(WatchOutcome {
            end_state,
            session: self.session,
        })
    }

    /// Fire-and-forget; delivery failure never alters polling.
    async fn send_alert(
        &self,
        severity: AlertSeverity,
        kind: AlertKind,
        title: String,
        detail: String,
    ) {
        if !self.notifier.is_configured() {
            return;
        }
        let event = AlertEvent {
            id: uuid::Uuid::new_v4().to_string(),
            severity,
            kind,
            title,
            detail,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        };
        let _ = self.notifier.send(&event).await;
    }

    fn write_snapshot(&self) {
        if let Some(dir) = &self.opts.state_dir {
            if let Err(e) = self.session.write_snapshot(dir) {
                warn!(error = %e, "could not write session snapshot");
            }
        }
    }

    /// Remove the transient snapshot. Idempotent: a second signal while
    /// cleanup already ran is a no-op.
    fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;
        if let Some(dir) = &self.opts.state_dir {
            let path = self.session.snapshot_path(dir);
            match std::fs::remove_file(&path) {
                Ok(_) => debug!(path = %path.display(), "session snapshot removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(error = %e, "could not remove session snapshot"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dropwatch_core::timeparse::TimeMode;
    use dropwatch_core::WatchError;
    use std::sync::atomic::{AtomicU32, Ordering};

    const REGISTERED: &str = "Registrar: GoDaddy.com, LLC\nName Server: NS1.EXAMPLE.NET";
    const AVAILABLE: &str = "No match for \"EXAMPLE.COM\".";

    /// Scripted lookup: plays responses in order, repeating the last one.
    struct FakeWhois {
        responses: Vec<WatchResult<String>>,
        calls: AtomicU32,
    }

    impl FakeWhois {
        fn always(text: &str) -> Self {
            Self {
                responses: vec![Ok(text.to_string())],
                calls: AtomicU32::new(0),
            }
        }

        fn sequence(responses: Vec<WatchResult<String>>) -> Self {
            Self {
                responses,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl WhoisLookup for FakeWhois {
        async fn query(&self, _domain: &str, _server: &str) -> WatchResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let idx = n.min(self.responses.len() - 1);
            match &self.responses[idx] {
                Ok(s) => Ok(s.clone()),
                Err(WatchError::Transport(m)) => Err(WatchError::Transport(m.clone())),
                Err(WatchError::RateLimited(m)) => Err(WatchError::RateLimited(m.clone())),
                Err(_) => unreachable!("fake only scripts transport errors"),
            }
        }
    }

    fn opts(domain: &str) -> WatchOptions {
        WatchOptions {
            domain: domain.to_string(),
            base_interval_secs: 30,
            max_checks: 0,
            expect_pattern: None,
            target_epoch: 0,
            mode: TimeMode::Utc,
            auto_continue: true,
            state_dir: None,
        }
    }

    fn resolved() -> ResolvedTld {
        ResolvedTld {
            tld: "com".to_string(),
            server: "whois.test.invalid".to_string(),
            available_pattern: "no match for".to_string(),
        }
    }

    fn scheduler(opts: WatchOptions, client: FakeWhois, cancel: CancellationToken) -> Scheduler {
        Scheduler::new(
            opts,
            resolved(),
            Box::new(client),
            Arc::new(Notifier::noop()),
            Renderer::new(TimeMode::Utc).quiet(),
            Box::new(crate::prompt::AutoContinue),
            cancel,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn match_on_first_cycle() {
        let s = scheduler(
            opts("example.com"),
            FakeWhois::always(AVAILABLE),
            CancellationToken::new(),
        );
        let outcome = s.run().await.unwrap();
        assert_eq!(outcome.end_state, EndState::Matched);
        assert!(outcome.matched());
        assert_eq!(outcome.session.check_count, 1);
        assert_eq!(outcome.session.history.len(), 1);
        assert_eq!(outcome.session.history[0].status, DomainStatus::Available);
    }

    #[tokio::test(start_paused = true)]
    async fn limit_reached_after_exactly_three_checks() {
        let mut o = opts("example.com");
        o.max_checks = 3;
        let s = scheduler(o, FakeWhois::always(REGISTERED), CancellationToken::new());
        let outcome = s.run().await.unwrap();
        assert_eq!(outcome.end_state, EndState::LimitReached);
        assert_eq!(outcome.session.check_count, 3);
        assert_eq!(outcome.session.history.len(), 3);
        // Every non-matching cycle still carries its observed status.
        for result in &outcome.session.history {
            assert_eq!(result.status, DomainStatus::Registered);
            assert_eq!(result.registrar, "GoDaddy.com, LLC");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn every_capped_cycle_leaves_a_trail_line() {
        let sink = crate::testutil::CaptureSink::default();
        let mut o = opts("example.com");
        o.max_checks = 2;
        o.base_interval_secs = 1;
        let s = Scheduler::new(
            o,
            resolved(),
            Box::new(FakeWhois::always(REGISTERED)),
            Arc::new(Notifier::noop()),
            Renderer::new(TimeMode::Utc).with_sink(Box::new(sink.clone())),
            Box::new(crate::prompt::AutoContinue),
            CancellationToken::new(),
        )
        .unwrap();
        let outcome = s.run().await.unwrap();
        assert_eq!(outcome.end_state, EndState::LimitReached);
        // Both cycles, the final one included, appear in the trail with
        // their observed status.
        let text = sink.text();
        assert_eq!(text.matches("example.com REGISTERED").count(), 2);
        assert!(text.contains("registrar: GoDaddy.com, LLC"));
    }

    #[tokio::test(start_paused = true)]
    async fn transition_from_registered_to_available() {
        let mut o = opts("example.com");
        o.base_interval_secs = 60;
        let s = scheduler(
            o,
            FakeWhois::sequence(vec![
                Ok(REGISTERED.to_string()),
                Ok(REGISTERED.to_string()),
                Ok(AVAILABLE.to_string()),
            ]),
            CancellationToken::new(),
        );
        let outcome = s.run().await.unwrap();
        assert_eq!(outcome.end_state, EndState::Matched);
        assert_eq!(outcome.session.check_count, 3);
        assert!(!outcome.session.history[0].matched);
        assert!(outcome.session.history[2].matched);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_pattern_overrides_lifecycle() {
        let mut o = opts("example.com");
        o.expect_pattern = Some("godaddy".to_string());
        let s = scheduler(o, FakeWhois::always(REGISTERED), CancellationToken::new());
        let outcome = s.run().await.unwrap();
        assert_eq!(outcome.end_state, EndState::Matched);
        assert_eq!(outcome.session.history[0].activity, ActivityCode::Ptrn);
        assert_eq!(outcome.session.history[0].status, DomainStatus::Registered);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_is_fatal_mid_loop() {
        let s = scheduler(
            opts("example.com"),
            FakeWhois::sequence(vec![
                Ok(REGISTERED.to_string()),
                Err(WatchError::Transport("connection reset".to_string())),
            ]),
            CancellationToken::new(),
        );
        let err = s.run().await.unwrap_err();
        assert!(matches!(err, WatchError::Transport(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_mid_sleep_ends_within_a_tick() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let s = scheduler(opts("example.com"), FakeWhois::always(REGISTERED), cancel);
        let outcome = s.run().await.unwrap();
        // One query happened, then the first countdown tick observed the
        // token and the summary was still produced.
        assert_eq!(outcome.end_state, EndState::Cancelled);
        assert_eq!(outcome.session.history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_file_is_cleaned_up_on_exit() {
        let dir = std::env::temp_dir().join("dropwatch-sched-test");
        let mut o = opts("cleanup-test.com");
        o.max_checks = 1;
        o.state_dir = Some(dir.clone());
        let s = scheduler(o, FakeWhois::always(REGISTERED), CancellationToken::new());
        let outcome = s.run().await.unwrap();
        assert_eq!(outcome.end_state, EndState::LimitReached);
        assert!(!dir.join(".cleanup-test.com.watch.json").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn grace_stop_decision_ends_the_session() {
        struct AlwaysStop;
        #[async_trait]
        impl GracePrompt for AlwaysStop {
            async fn decide(&self, _: &str, _: i64, _: u64) -> GraceDecision {
                GraceDecision::Stop
            }
        }

        let mut o = opts("example.com");
        o.auto_continue = false;
        // Target long past: first cycle is already beyond the grace window.
        o.target_epoch = now_epoch() - GRACE_THRESHOLD - 60;
        let s = Scheduler::new(
            o,
            resolved(),
            Box::new(FakeWhois::always(REGISTERED)),
            Arc::new(Notifier::noop()),
            Renderer::new(TimeMode::Utc).quiet(),
            Box::new(AlwaysStop),
            CancellationToken::new(),
        )
        .unwrap();
        let outcome = s.run().await.unwrap();
        assert_eq!(outcome.end_state, EndState::Cancelled);
        assert_eq!(outcome.session.check_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn grace_custom_interval_replaces_base() {
        struct Repace;
        #[async_trait]
        impl GracePrompt for Repace {
            async fn decide(&self, _: &str, _: i64, _: u64) -> GraceDecision {
                GraceDecision::NewInterval(15)
            }
        }

        let mut o = opts("example.com");
        o.auto_continue = false;
        o.max_checks = 2;
        o.target_epoch = now_epoch() - GRACE_THRESHOLD - 60;
        let s = Scheduler::new(
            o,
            resolved(),
            Box::new(FakeWhois::always(REGISTERED)),
            Arc::new(Notifier::noop()),
            Renderer::new(TimeMode::Utc).quiet(),
            Box::new(Repace),
            CancellationToken::new(),
        )
        .unwrap();
        let outcome = s.run().await.unwrap();
        assert_eq!(outcome.end_state, EndState::LimitReached);
        assert_eq!(outcome.session.check_count, 2);
    }
}
