//! Pure phase and interval math. The thresholds below are the whole of the
//! "intelligent" cadence behavior; boundary directions are exact and tested.

use dropwatch_core::Phase;

/// Within this many seconds of the target the session runs hot.
pub const HEAT_THRESHOLD: i64 = 1800;
/// High-frequency window after the target passes.
pub const GRACE_THRESHOLD: i64 = 10800;
/// Fixed cadence inside HEAT's tightest band and all of GRACE.
pub const SNIPE_INTERVAL: u64 = 10;
/// HEAT cadence between 300s and 1800s out.
pub const APPROACH_INTERVAL: u64 = 30;
/// COOL backoff ceiling.
pub const COOL_CAP: u64 = 3600;

/// Map "now vs. target" to a phase. `target_epoch == 0` means no target was
/// set and the session polls flat forever.
pub fn determine_phase(target_epoch: i64, now: i64) -> Phase {
    if target_epoch == 0 {
        return Phase::Poll;
    }
    let to_target = target_epoch - now;
    if to_target >= HEAT_THRESHOLD {
        Phase::Poll
    } else if to_target > 0 {
        Phase::Heat
    } else if now - target_epoch < GRACE_THRESHOLD {
        Phase::Grace
    } else {
        Phase::Cool
    }
}

/// Next-poll spacing for a phase. HEAT checks the tightest band first; COOL
/// doubles the *original* base each evaluation (no compounding) and caps at
/// an hour so a restarted session lands on the same cadence.
pub fn calculate_interval(base_interval: u64, phase: Phase, seconds_to_target: i64) -> u64 {
    match phase {
        Phase::Poll => base_interval,
        Phase::Heat => {
            if seconds_to_target <= 300 {
                SNIPE_INTERVAL
            } else if seconds_to_target <= HEAT_THRESHOLD {
                APPROACH_INTERVAL
            } else {
                base_interval
            }
        }
        Phase::Grace => SNIPE_INTERVAL,
        Phase::Cool => base_interval.saturating_mul(2).min(COOL_CAP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_target_is_always_poll() {
        for now in [0, 1, 1_700_000_000, i64::MAX / 2] {
            assert_eq!(determine_phase(0, now), Phase::Poll);
        }
    }

    #[test]
    fn heat_boundary_is_exclusive() {
        let target = 1_700_000_000;
        assert_eq!(determine_phase(target, target - 1801), Phase::Poll);
        assert_eq!(determine_phase(target, target - 1800), Phase::Poll);
        assert_eq!(determine_phase(target, target - 1799), Phase::Heat);
        assert_eq!(determine_phase(target, target - 1), Phase::Heat);
    }

    #[test]
    fn grace_starts_at_target_and_ends_at_threshold() {
        let target = 1_700_000_000;
        assert_eq!(determine_phase(target, target), Phase::Grace);
        assert_eq!(determine_phase(target, target + 10799), Phase::Grace);
        assert_eq!(determine_phase(target, target + 10800), Phase::Cool);
    }

    #[test]
    fn heat_interval_ramps_down() {
        assert_eq!(calculate_interval(300, Phase::Heat, 2000), 300);
        assert_eq!(calculate_interval(300, Phase::Heat, 1800), 30);
        assert_eq!(calculate_interval(300, Phase::Heat, 301), 30);
        assert_eq!(calculate_interval(300, Phase::Heat, 300), 10);
        assert_eq!(calculate_interval(300, Phase::Heat, 5), 10);
    }

    #[test]
    fn heat_is_monotonically_non_increasing() {
        let mut last = u64::MAX;
        for stt in (1..=2400).rev() {
            let interval = calculate_interval(120, Phase::Heat, stt);
            assert!(interval <= last, "interval grew at {stt}s to target");
            last = interval;
        }
    }

    #[test]
    fn grace_is_fixed() {
        assert_eq!(calculate_interval(600, Phase::Grace, -5), 10);
    }

    #[test]
    fn cool_doubles_base_without_compounding() {
        assert_eq!(calculate_interval(300, Phase::Cool, -20000), 600);
        // Recomputed from the original base: same answer every cycle.
        assert_eq!(calculate_interval(300, Phase::Cool, -90000), 600);
        assert_eq!(calculate_interval(3000, Phase::Cool, -20000), 3600);
    }

    #[test]
    fn poll_passes_base_through() {
        assert_eq!(calculate_interval(42, Phase::Poll, 100_000), 42);
    }
}
