//! Terminal output: the in-place live line, muted history trail, target
//! banner, and completion summary. Raw ANSI escapes, suppressed when
//! `NO_COLOR` is set or the renderer is quiet (tests). Output goes through a
//! swappable sink so tests can capture the trail.

use dropwatch_core::timeparse::{format_epoch, TimeMode};
use dropwatch_core::{ActivityCode, Phase, PollResult, WatchVerdict};
use std::io::Write;
use std::sync::Mutex;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GREY: &str = "\x1b[90m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const ERASE_LINE: &str = "\r\x1b[2K";

fn phase_color(phase: Phase) -> &'static str {
    match phase {
        Phase::Poll => BLUE,
        Phase::Heat => RED,
        Phase::Grace => MAGENTA,
        Phase::Cool => CYAN,
    }
}

/// Pick the fewest components that convey magnitude, most significant first.
pub fn format_timer(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}:{:02}", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else {
        let rem = secs % 86400;
        format!(
            "{}d {}:{:02}:{:02}",
            secs / 86400,
            rem / 3600,
            (rem % 3600) / 60,
            rem % 60
        )
    }
}

/// Signed distance to the target: `-` counting down, `+` counting up.
pub fn format_delta(now: i64, target_epoch: i64) -> String {
    let diff = target_epoch - now;
    if diff > 0 {
        format!("-{}", format_timer(diff as u64))
    } else {
        format!("+{}", format_timer((-diff) as u64))
    }
}

/// Everything the completion block needs; the celebration is a rendering
/// variant of the same shape.
pub struct Completion {
    pub domain: String,
    pub at_epoch: i64,
    pub status: String,
    pub registrar: String,
    pub elapsed_secs: u64,
    pub checks: u32,
    pub verdict: WatchVerdict,
    pub celebrate: bool,
}

pub struct Renderer {
    mode: TimeMode,
    color: bool,
    quiet: bool,
    out: Mutex<Box<dyn Write + Send>>,
}

impl Renderer {
    pub fn new(mode: TimeMode) -> Self {
        Self {
            mode,
            color: std::env::var_os("NO_COLOR").is_none(),
            quiet: false,
            out: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    /// Silence all output; state and history still accumulate normally.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Redirect output, colors off. Tests capture the trail this way.
    pub fn with_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.out = Mutex::new(sink);
        self.color = false;
        self
    }

    fn emit(&self, text: &str) {
        if self.quiet {
            return;
        }
        if let Ok(mut out) = self.out.lock() {
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
    }

    fn emitln(&self, text: &str) {
        self.emit(&format!("{text}\n"));
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Redraw the single live status line in place.
    pub fn live_line(
        &self,
        phase: Phase,
        activity: ActivityCode,
        countdown_secs: u64,
        now: i64,
        target_epoch: i64,
        domain: &str,
    ) {
        let phase_tag = self.paint(
            phase_color(phase),
            &format!("{} {}", phase.glyph(), phase.name()),
        );
        let delta = if target_epoch != 0 {
            format!("  {}", format_delta(now, target_epoch))
        } else {
            String::new()
        };
        self.emit(&format!(
            "{ERASE_LINE}{phase_tag}  {activity}  next {}{delta}  {domain}  {}",
            format_timer(countdown_secs),
            self.paint(GREY, self.mode.tag()),
        ));
    }

    /// Muted trail entry for a completed, non-matching cycle. Always carries
    /// the observed lifecycle status; the query's outcome is never discarded.
    pub fn history_line(&self, domain: &str, result: &PollResult) {
        let registrar = if result.registrar == "UNKNOWN" {
            String::new()
        } else {
            format!("  {}", result.registrar)
        };
        let line = format!(
            "{} {} {} {}{}",
            format_epoch(result.at_epoch, self.mode),
            domain,
            result.status,
            result.activity,
            registrar,
        );
        self.emitln(&format!("{ERASE_LINE}{}", self.paint(GREY, &line)));
    }

    /// One-time announcement the first time the target time is observed to
    /// have passed.
    pub fn target_passed(&self, domain: &str, target_epoch: i64) {
        let banner = format!(
            "== target time reached: {} ({}) for {} ==",
            format_epoch(target_epoch, self.mode),
            self.mode.tag(),
            domain,
        );
        self.emitln(&format!(
            "{ERASE_LINE}{}",
            self.paint(&format!("{BOLD}{MAGENTA}"), &banner)
        ));
    }

    pub fn warn(&self, message: &str) {
        self.emitln(&format!("{ERASE_LINE}{}", self.paint(YELLOW, message)));
    }

    /// Final structured block for every terminal state. A celebratory match
    /// gets a louder variant of the same data.
    pub fn completion(&self, c: &Completion) {
        let mut block = String::from(ERASE_LINE);
        if c.celebrate {
            let headline = format!("*** {} — {} ***", c.domain, c.status);
            block.push_str(&self.paint(&format!("{BOLD}{GREEN}"), &headline));
            block.push('\n');
        }
        block.push_str(&format!("--- watch complete: {} ---\n", c.domain));
        block.push_str(&format!(
            "time:      {} {}\n",
            format_epoch(c.at_epoch, self.mode),
            self.mode.tag()
        ));
        block.push_str(&format!("status:    {}\n", c.status));
        block.push_str(&format!("registrar: {}\n", c.registrar));
        block.push_str(&format!("elapsed:   {}\n", format_timer(c.elapsed_secs)));
        block.push_str(&format!("checks:    {}\n", c.checks));
        let verdict = match c.verdict {
            WatchVerdict::Pass => self.paint(GREEN, "PASS"),
            WatchVerdict::Fail => self.paint(RED, "FAIL"),
            WatchVerdict::Watch => self.paint(YELLOW, "WATCH"),
        };
        block.push_str(&format!("verdict:   {verdict}\n"));
        self.emit(&block);
    }
}
