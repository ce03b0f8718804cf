//! The grace-timeout interaction: once a target has been overshot by the
//! grace threshold the operator chooses to keep going, stop, or re-pace the
//! session. Modeled as an injected decision trait so the scheduler is
//! testable without a real stdin.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::render::format_timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraceDecision {
    Continue,
    Stop,
    NewInterval(u64),
}

#[async_trait]
pub trait GracePrompt: Send + Sync {
    async fn decide(&self, domain: &str, overshoot_secs: i64, current_interval: u64)
        -> GraceDecision;
}

/// Pre-authorized continuation (`-y`): no interaction, keep the cadence.
pub struct AutoContinue;

#[async_trait]
impl GracePrompt for AutoContinue {
    async fn decide(&self, _: &str, _: i64, _: u64) -> GraceDecision {
        GraceDecision::Continue
    }
}

/// Interactive stdin prompt. Any unrecognized answer continues with a
/// warning; bad input never kills a watch that may be hours old.
pub struct StdinPrompt;

#[async_trait]
impl GracePrompt for StdinPrompt {
    async fn decide(
        &self,
        domain: &str,
        overshoot_secs: i64,
        current_interval: u64,
    ) -> GraceDecision {
        println!(
            "\ntarget for {domain} passed {} ago and the grace window is over.",
            format_timer(overshoot_secs.max(0) as u64)
        );
        println!(
            "[c] continue every {}  [s] stop  [NUMBER] new interval in seconds",
            format_timer(current_interval)
        );

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        if reader.read_line(&mut line).await.is_err() {
            warn!("could not read grace response, continuing");
            return GraceDecision::Continue;
        }
        parse_response(line.trim(), current_interval)
    }
}

fn parse_response(answer: &str, current_interval: u64) -> GraceDecision {
    match answer.to_lowercase().as_str() {
        "" | "c" | "continue" | "y" | "yes" => GraceDecision::Continue,
        "s" | "stop" | "q" | "quit" | "n" | "no" => GraceDecision::Stop,
        other => match other.parse::<u64>() {
            Ok(secs) if secs >= 1 => {
                if secs < 10 {
                    warn!(secs, "very short interval; whois servers may rate-limit you");
                }
                GraceDecision::NewInterval(secs)
            }
            Ok(_) => {
                warn!("interval must be at least 1 second, continuing at {current_interval}s");
                GraceDecision::Continue
            }
            Err(_) => {
                warn!(answer = other, "unrecognized response, continuing");
                GraceDecision::Continue
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_answers() {
        assert_eq!(parse_response("c", 60), GraceDecision::Continue);
        assert_eq!(parse_response("", 60), GraceDecision::Continue);
        assert_eq!(parse_response("STOP", 60), GraceDecision::Stop);
        assert_eq!(parse_response("45", 60), GraceDecision::NewInterval(45));
        assert_eq!(parse_response("5", 60), GraceDecision::NewInterval(5));
    }

    #[test]
    fn invalid_input_defaults_to_continue() {
        assert_eq!(parse_response("whatever", 60), GraceDecision::Continue);
        assert_eq!(parse_response("0", 60), GraceDecision::Continue);
        assert_eq!(parse_response("-3", 60), GraceDecision::Continue);
    }
}
