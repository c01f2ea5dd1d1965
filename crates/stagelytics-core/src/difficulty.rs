//! Per-level difficulty curve.
//!
//! Telemetry has no "entered level N" event, so traffic per level is
//! estimated: every `try` is assumed to reach every level, then each fail at
//! level `L` is taken to have never reached `L + 1..=max`. The estimate is
//! exact only when each try ends in exactly one clear or fail; treat the
//! `attempts` column as an approximation. Explicit level-entry telemetry,
//! if it ever exists, should replace this.

use std::collections::BTreeMap;

use crate::analytics::{percent, DifficultySpike, SignificantSpike, MAX_LEVEL};
use crate::event::Event;

/// Fail rate above which a level counts as a spike.
pub const SPIKE_FAIL_RATE: f64 = 20.0;
/// Minimum rise in percentage points over the previous level.
pub const SPIKE_MIN_INCREASE: f64 = 10.0;

pub fn difficulty_curve(events: &[Event]) -> Vec<DifficultySpike> {
    difficulty_curve_with_max(events, MAX_LEVEL)
}

/// [`difficulty_curve`] over levels `1..=max_level`.
pub fn difficulty_curve_with_max(events: &[Event], max_level: u32) -> Vec<DifficultySpike> {
    let max = i64::from(max_level);
    let tries = events.iter().filter(|e| e.is_try()).count() as u64;

    // index 0 unused so that level L lives at attempts[L]
    let mut attempts = vec![tries; max_level as usize + 1];
    let mut fails: BTreeMap<i64, u64> = BTreeMap::new();

    for level in events.iter().filter_map(Event::fail_level) {
        *fails.entry(level).or_default() += 1;
        let first_unreached = level.saturating_add(1).max(1);
        for later in first_unreached..=max {
            let slot = &mut attempts[later as usize];
            *slot = slot.saturating_sub(1);
        }
    }

    let curve: Vec<DifficultySpike> = (1..=max_level)
        .map(|level| {
            let reached = attempts[level as usize];
            let fail_count = fails.get(&i64::from(level)).copied().unwrap_or(0);
            DifficultySpike {
                level,
                attempts: reached,
                fail_count,
                fail_rate: percent(fail_count, reached),
            }
        })
        .collect();
    tracing::debug!(events = events.len(), tries, "built difficulty curve");
    curve
}

/// Levels whose fail rate exceeds [`SPIKE_FAIL_RATE`] and jumped by more than
/// [`SPIKE_MIN_INCREASE`] points over the level before.
pub fn significant_spikes(curve: &[DifficultySpike]) -> Vec<SignificantSpike> {
    curve
        .windows(2)
        .filter_map(|pair| {
            let (prev, cur) = (&pair[0], &pair[1]);
            let increase = cur.fail_rate - prev.fail_rate;
            (cur.fail_rate > SPIKE_FAIL_RATE && increase > SPIKE_MIN_INCREASE).then(|| {
                SignificantSpike {
                    level: cur.level,
                    fail_rate: cur.fail_rate,
                    increase,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::test_support::{event, fail_at};
    use crate::event::EventAction;

    #[test]
    fn curve_always_spans_every_level() {
        let curve = difficulty_curve(&[]);
        assert_eq!(curve.len(), MAX_LEVEL as usize);
        assert!(curve.iter().all(|s| s.attempts == 0 && s.fail_rate == 0.0));
        assert_eq!(curve[0].level, 1);
        assert_eq!(curve[19].level, 20);
    }

    #[test]
    fn fails_remove_traffic_from_later_levels() {
        let mut events = vec![event(EventAction::Try, "2001"); 10];
        events.push(fail_at("2001", 3));
        events.push(fail_at("2001", 3));
        events.push(fail_at("2001", 5));
        let curve = difficulty_curve(&events);

        assert_eq!(curve[2].attempts, 10); // level 3
        assert_eq!(curve[2].fail_count, 2);
        assert!((curve[2].fail_rate - 20.0).abs() < 1e-9);
        assert_eq!(curve[3].attempts, 8); // level 4
        assert_eq!(curve[4].attempts, 8); // level 5
        assert_eq!(curve[5].attempts, 7); // level 6
        assert_eq!(curve[19].attempts, 7);
    }

    #[test]
    fn decrement_floors_at_zero_regardless_of_row_order() {
        let events = vec![
            fail_at("2001", 1),
            fail_at("2001", 1),
            event(EventAction::Try, "2001"),
        ];
        let curve = difficulty_curve(&events);
        assert_eq!(curve[0].attempts, 1);
        assert_eq!(curve[1].attempts, 0);
        assert_eq!(curve[1].fail_rate, 0.0);
    }

    #[test]
    fn first_fail_variant_counts() {
        let mut first = event(EventAction::FailIsFirst, "2001");
        first.properties.last_level = Some(2);
        let curve = difficulty_curve(&[event(EventAction::Try, "2001"), first]);
        assert_eq!(curve[1].fail_count, 1);
        assert!((curve[1].fail_rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_levels_are_not_reported() {
        let curve = difficulty_curve_with_max(
            &[event(EventAction::Try, "2001"), fail_at("2001", 25)],
            5,
        );
        assert_eq!(curve.len(), 5);
        assert!(curve.iter().all(|s| s.fail_count == 0 && s.attempts == 1));
    }

    #[test]
    fn extreme_levels_do_not_overflow() {
        let events = vec![
            event(EventAction::Try, "2001"),
            event(EventAction::Try, "2001"),
            fail_at("2001", i64::MAX),
            fail_at("2001", i64::MIN),
        ];
        let curve = difficulty_curve(&events);
        // i64::MAX never reached any reported level; i64::MIN stopped before level 1
        assert_eq!(curve[0].attempts, 1);
        assert_eq!(curve[19].attempts, 1);
        assert!(curve.iter().all(|s| s.fail_count == 0));
    }

    fn spike(level: u32, fail_rate: f64) -> DifficultySpike {
        DifficultySpike {
            level,
            attempts: 100,
            fail_count: fail_rate as u64,
            fail_rate,
        }
    }

    #[test]
    fn spikes_need_both_threshold_and_jump() {
        let curve = vec![
            spike(1, 25.0),  // first level never flagged
            spike(2, 30.0),  // +5 only
            spike(3, 45.0),  // flagged
            spike(4, 15.0),  // below threshold
            spike(5, 26.0),  // +11 and above 20, flagged
        ];
        let spikes = significant_spikes(&curve);
        let levels: Vec<u32> = spikes.iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![3, 5]);
        assert!((spikes[0].increase - 15.0).abs() < 1e-9);
    }
}
