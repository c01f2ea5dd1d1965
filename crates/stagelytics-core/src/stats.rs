//! Per-stage statistics and dashboard headline metrics.

use std::collections::{BTreeMap, HashSet};

use crate::analytics::{
    percent, CountryOption, DashboardSummary, StageStats, VoluntaryExitRank,
};
use crate::event::Event;
use crate::stage::group_by_stage;

fn stats_for_stage(stage_id: &str, events: &[&Event]) -> StageStats {
    let mut tries = 0u64;
    let mut clears = 0u64;
    let mut fails = 0u64;
    let mut voluntary_exits = 0u64;
    let mut repeat_plays = 0u64;
    let mut fails_by_level: BTreeMap<i64, u64> = BTreeMap::new();
    let mut level_sum = 0i128;
    let mut levelled_fails = 0u64;

    for event in events {
        if event.is_try() {
            tries += 1;
        } else if event.is_clear() {
            clears += 1;
        } else if event.is_fail() {
            fails += 1;
            if event.is_voluntary_exit() {
                voluntary_exits += 1;
            }
            if let Some(level) = event.fail_level() {
                *fails_by_level.entry(level).or_default() += 1;
                level_sum += i128::from(level);
                levelled_fails += 1;
            }
        }
        if event.is_repeat_play() {
            repeat_plays += 1;
        }
    }

    // Some sources never log `try`; fall back to clears + fails.
    let total_attempts = tries.max(clears + fails);
    let average_fail_level = if levelled_fails > 0 {
        level_sum as f64 / levelled_fails as f64
    } else {
        0.0
    };

    StageStats {
        stage_id: stage_id.to_string(),
        tries,
        total_attempts,
        clears,
        fails,
        voluntary_exits,
        repeat_plays,
        clear_rate: percent(clears, total_attempts),
        voluntary_exit_rate: percent(voluntary_exits, fails),
        average_fail_level,
        fails_by_level,
    }
}

/// One [`StageStats`] per distinct stage label, in stage order.
pub fn stage_stats(events: &[Event]) -> Vec<StageStats> {
    let stats: Vec<StageStats> = group_by_stage(events)
        .into_iter()
        .map(|(stage_id, group)| stats_for_stage(stage_id, &group))
        .collect();
    tracing::debug!(events = events.len(), stages = stats.len(), "computed stage stats");
    stats
}

/// Clear rate across every stage, with the same attempt fallback as
/// [`stage_stats`].
pub fn overall_clear_rate(events: &[Event]) -> f64 {
    let tries = events.iter().filter(|e| e.is_try()).count() as u64;
    let clears = events.iter().filter(|e| e.is_clear()).count() as u64;
    let fails = events.iter().filter(|e| e.is_fail()).count() as u64;
    percent(clears, tries.max(clears + fails))
}

/// Share of fails that were voluntary exits. Callers pass the unfiltered set.
pub fn voluntary_exit_rate(events: &[Event]) -> f64 {
    let fails = events.iter().filter(|e| e.is_fail()).count() as u64;
    percent(count_voluntary_exits(events), fails)
}

pub fn count_voluntary_exits(events: &[Event]) -> u64 {
    events.iter().filter(|e| e.is_voluntary_exit()).count() as u64
}

pub fn unique_user_count(events: &[Event]) -> u64 {
    events
        .iter()
        .filter_map(|e| e.user_id.as_deref())
        .collect::<HashSet<_>>()
        .len() as u64
}

/// Length of the voluntary-exit ranking.
pub const MAX_VOLUNTARY_EXIT_RANKS: usize = 10;

/// Stages with at least one fail, by share of fails that were voluntary
/// exits, highest first. Ties keep stage order.
pub fn voluntary_exit_ranking(stats: &[StageStats]) -> Vec<VoluntaryExitRank> {
    let mut ranks: Vec<VoluntaryExitRank> = stats
        .iter()
        .filter(|s| s.fails > 0)
        .map(|s| VoluntaryExitRank {
            stage_id: s.stage_id.clone(),
            fails: s.fails,
            voluntary_exits: s.voluntary_exits,
            voluntary_exit_rate: s.voluntary_exit_rate,
        })
        .collect();
    ranks.sort_by(|a, b| b.voluntary_exit_rate.total_cmp(&a.voluntary_exit_rate));
    ranks.truncate(MAX_VOLUNTARY_EXIT_RANKS);
    ranks
}

/// Headline metrics. `all_events` is the raw set, `filtered` the output of
/// [`crate::filter::apply_filters`].
pub fn dashboard_summary(all_events: &[Event], filtered: &[Event]) -> DashboardSummary {
    let total_stages = filtered
        .iter()
        .map(|e| e.label.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;
    DashboardSummary {
        total_events: filtered.len() as u64,
        overall_clear_rate: overall_clear_rate(filtered),
        voluntary_exit_rate: voluntary_exit_rate(all_events),
        excluded_voluntary_exits: count_voluntary_exits(all_events),
        total_stages,
        unique_users: unique_user_count(filtered),
    }
}

/// Distinct countries present in `events`, for the allow-list picker.
pub fn available_countries(events: &[Event]) -> Vec<CountryOption> {
    let mut counts: BTreeMap<(Option<&str>, Option<&str>), u64> = BTreeMap::new();
    for event in events {
        let key = (event.country_code.as_deref(), event.country_name.as_deref());
        if key == (None, None) {
            continue;
        }
        *counts.entry(key).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((code, name), event_count)| CountryOption {
            code: code.map(str::to_string),
            name: name.map(str::to_string),
            event_count,
        })
        .collect()
}
