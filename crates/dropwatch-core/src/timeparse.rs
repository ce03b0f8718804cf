//! Epoch access and flexible datetime parsing.
//!
//! Target times arrive as bare epochs or free-form strings like
//! `"2025-12-25 18:00:00 UTC"`. Strict formats are tried first, then a
//! normalized fallback (trailing zone name stripped, whitespace collapsed,
//! anchored UTC) so the same input parses identically on every host.

use crate::error::{WatchError, WatchResult};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Whether naive datetimes are anchored to the host timezone or UTC, and
/// which tag the renderer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    Local,
    Utc,
}

impl TimeMode {
    pub fn tag(&self) -> &'static str {
        match self {
            TimeMode::Local => "LOCAL",
            TimeMode::Utc => "UTC",
        }
    }
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

/// Parse a target-time string into epoch seconds.
///
/// Bare integers are treated as already-epoch. RFC 3339 inputs carry their
/// own offset. Zone-less inputs are anchored per `mode`; the stripped-zone
/// fallback always anchors UTC.
pub fn parse_when(input: &str, mode: TimeMode) -> WatchResult<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WatchError::DateParse("empty datetime".to_string()));
    }

    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed
            .parse::<i64>()
            .map_err(|e| WatchError::DateParse(format!("bad epoch '{trimmed}': {e}")));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp());
    }

    if let Some(epoch) = parse_naive(trimmed, mode) {
        return Ok(epoch);
    }

    let normalized = normalize(trimmed);
    if normalized != trimmed {
        if let Some(epoch) = parse_naive(&normalized, TimeMode::Utc) {
            return Ok(epoch);
        }
    }

    Err(WatchError::DateParse(format!(
        "unrecognized datetime '{input}'"
    )))
}

/// Render an epoch for display in the session's time mode.
pub fn format_epoch(epoch: i64, mode: TimeMode) -> String {
    match Utc.timestamp_opt(epoch, 0).single() {
        Some(utc) => match mode {
            TimeMode::Utc => utc.format("%Y-%m-%d %H:%M:%S").to_string(),
            TimeMode::Local => utc
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        },
        None => epoch.to_string(),
    }
}

fn parse_naive(s: &str, mode: TimeMode) -> Option<i64> {
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return anchor(ndt, mode);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return anchor(date.and_hms_opt(0, 0, 0)?, mode);
    }
    None
}

fn anchor(ndt: NaiveDateTime, mode: TimeMode) -> Option<i64> {
    match mode {
        TimeMode::Utc => Some(Utc.from_utc_datetime(&ndt).timestamp()),
        TimeMode::Local => Local
            .from_local_datetime(&ndt)
            .earliest()
            .map(|dt| dt.timestamp()),
    }
}

/// Drop a trailing alphabetic zone token ("UTC", "GMT", "Z", ...) and collapse
/// runs of whitespace.
fn normalize(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    if tokens.len() > 1 {
        if let Some(last) = tokens.last() {
            if last.chars().all(|c| c.is_ascii_alphabetic()) {
                tokens.pop();
            }
        }
    }
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_integer_is_epoch() {
        assert_eq!(parse_when("1766685600", TimeMode::Utc).unwrap(), 1766685600);
    }

    #[test]
    fn rfc3339_carries_offset() {
        let epoch = parse_when("2025-12-25T18:00:00Z", TimeMode::Local).unwrap();
        assert_eq!(epoch, 1766685600);
    }

    #[test]
    fn naive_utc_anchoring() {
        let epoch = parse_when("2025-12-25 18:00:00", TimeMode::Utc).unwrap();
        assert_eq!(epoch, 1766685600);
    }

    #[test]
    fn trailing_zone_name_is_stripped() {
        let epoch = parse_when("2025-12-25 18:00:00 UTC", TimeMode::Local).unwrap();
        assert_eq!(epoch, 1766685600);
    }

    #[test]
    fn collapsed_whitespace_in_fallback() {
        let epoch = parse_when("2025-12-25   18:00:00   GMT", TimeMode::Utc).unwrap();
        assert_eq!(epoch, 1766685600);
    }

    #[test]
    fn date_only_is_midnight() {
        let epoch = parse_when("2025-12-25", TimeMode::Utc).unwrap();
        assert_eq!(epoch, 1766620800);
    }

    #[test]
    fn garbage_fails() {
        assert!(matches!(
            parse_when("next tuesday-ish", TimeMode::Utc),
            Err(WatchError::DateParse(_))
        ));
        assert!(parse_when("", TimeMode::Utc).is_err());
    }

    #[test]
    fn format_epoch_utc() {
        assert_eq!(
            format_epoch(1766685600, TimeMode::Utc),
            "2025-12-25 18:00:00"
        );
    }
}
