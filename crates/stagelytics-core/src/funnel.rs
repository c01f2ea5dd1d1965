//! Level funnel reconstructed backwards from clears and fail levels.
//!
//! A run is presumed to have reached level `L` if it cleared the stage or
//! failed at `L` or later. `reached` is therefore not monotone in general:
//! clears contribute the same amount at every level, while a fail-level
//! histogram with gaps can leave neighbouring levels equal.

use std::collections::BTreeMap;

use crate::analytics::{percent, FunnelData, FunnelSummary, MAX_LEVEL};
use crate::event::Event;

/// Drop rate above which a level is reported as a critical drop-off.
pub const CRITICAL_DROP_RATE: f64 = 15.0;

pub fn funnel(events: &[Event]) -> Vec<FunnelData> {
    funnel_with_max(events, MAX_LEVEL)
}

/// [`funnel`] restricted to one stage label.
pub fn stage_funnel(events: &[Event], stage_id: &str) -> Vec<FunnelData> {
    let stage_events: Vec<Event> = events
        .iter()
        .filter(|e| e.label == stage_id)
        .cloned()
        .collect();
    funnel(&stage_events)
}

pub fn funnel_with_max(events: &[Event], max_level: u32) -> Vec<FunnelData> {
    let clears = events.iter().filter(|e| e.is_clear()).count() as u64;
    let mut fails_by_level: BTreeMap<i64, u64> = BTreeMap::new();
    for level in events.iter().filter_map(Event::fail_level) {
        *fails_by_level.entry(level).or_default() += 1;
    }

    let mut rows: Vec<FunnelData> = Vec::with_capacity(max_level as usize);
    // Walk from the top level down so that each step adds one histogram bucket.
    let mut failed_here_or_later = 0u64;
    for level in (1..=max_level).rev() {
        let dropped = fails_by_level.get(&i64::from(level)).copied().unwrap_or(0);
        failed_here_or_later += dropped;
        let reached = clears + failed_here_or_later;
        rows.push(FunnelData {
            level,
            reached,
            remaining: reached - dropped,
            dropped,
            drop_rate: percent(dropped, reached),
            retention_rate: 0.0,
        });
    }
    rows.reverse();

    let base = rows.first().map(|r| r.remaining).unwrap_or(0);
    for row in &mut rows {
        row.retention_rate = percent(row.remaining, base);
    }
    tracing::debug!(events = events.len(), clears, "built level funnel");
    rows
}

/// Players are counted as level 1's `remaining`, the same base the per-level
/// `retention_rate` uses.
pub fn funnel_summary(funnel: &[FunnelData]) -> FunnelSummary {
    let total_players = funnel.first().map(|r| r.remaining).unwrap_or(0);
    let finishers = funnel.last().map(|r| r.remaining).unwrap_or(0);
    let mut critical_dropoffs: Vec<FunnelData> = funnel
        .iter()
        .filter(|r| r.drop_rate > CRITICAL_DROP_RATE)
        .cloned()
        .collect();
    critical_dropoffs.sort_by(|a, b| b.drop_rate.total_cmp(&a.drop_rate));
    FunnelSummary {
        total_players,
        finishers,
        overall_retention: percent(finishers, total_players),
        critical_dropoffs,
    }
}
