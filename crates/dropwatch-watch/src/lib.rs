//! The watch engine: phase/interval math, the poll scheduler state machine,
//! the grace-timeout prompt, and terminal rendering.

pub mod phase;
pub mod prompt;
pub mod render;
pub mod scheduler;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use phase::{calculate_interval, determine_phase, GRACE_THRESHOLD, HEAT_THRESHOLD};
pub use prompt::{AutoContinue, GraceDecision, GracePrompt, StdinPrompt};
pub use render::{format_delta, format_timer, Completion, Renderer};
pub use scheduler::{Scheduler, WatchOutcome};
pub use session::{EndState, PollSession, WatchOptions};
