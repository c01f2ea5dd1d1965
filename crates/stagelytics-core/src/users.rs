use std::collections::HashMap;

use crate::analytics::{mean, percent, ratio, UserStageStats, UserStageSummary};
use crate::event::Event;
use crate::stage::group_by_stage;

#[derive(Debug, Default)]
struct UserTally {
    tries: u64,
    clears: u64,
    fails: u64,
    voluntary_exit: bool,
    repeat_play: bool,
}

/// Per-stage statistics scoped to identified users.
///
/// Try counts and clear/fail counts are tallied separately per user because
/// `try` logging is unreliable; `total_attempts` is built from clears and
/// fails only. Anonymous events are skipped, and a stage with no identified
/// user is omitted.
pub fn user_stage_stats(events: &[Event]) -> Vec<UserStageStats> {
    let mut out = Vec::new();
    for (stage_id, group) in group_by_stage(events) {
        let mut tallies: HashMap<&str, UserTally> = HashMap::new();
        for event in group {
            let Some(user) = event.user_id.as_deref() else {
                continue;
            };
            let tally = tallies.entry(user).or_default();
            if event.is_try() {
                tally.tries += 1;
            } else if event.is_clear() {
                tally.clears += 1;
            } else if event.is_fail() {
                tally.fails += 1;
            }
            tally.voluntary_exit |= event.is_voluntary_exit();
            tally.repeat_play |= event.is_repeat_play();
        }
        if tallies.is_empty() {
            continue;
        }

        let unique_users = tallies.len() as u64;
        let sum = |f: fn(&UserTally) -> u64| tallies.values().map(f).sum::<u64>();
        let count = |f: fn(&UserTally) -> bool| tallies.values().filter(|t| f(t)).count() as u64;

        let total_tries = sum(|t| t.tries);
        let total_clears = sum(|t| t.clears);
        let total_fails = sum(|t| t.fails);
        let total_attempts = total_clears + total_fails;
        let users_cleared = count(|t| t.clears > 0);

        out.push(UserStageStats {
            stage_id: stage_id.to_string(),
            unique_users,
            total_tries,
            total_attempts,
            total_clears,
            total_fails,
            users_cleared,
            users_failed: count(|t| t.fails > 0),
            user_clear_rate: percent(users_cleared, unique_users),
            clear_probability: percent(total_clears, total_attempts),
            average_attempts_per_user: ratio(total_attempts, unique_users),
            users_with_voluntary_exit: count(|t| t.voluntary_exit),
            users_with_repeat_play: count(|t| t.repeat_play),
        });
    }
    tracing::debug!(stages = out.len(), "computed user stage stats");
    out
}

/// Length of each clear-rate extreme list in [`UserStageSummary`].
pub const CLEAR_RATE_EXTREMES: usize = 5;

pub fn user_stage_summary(stats: &[UserStageStats]) -> UserStageSummary {
    let mut top_clear_rate_stages = stats.to_vec();
    top_clear_rate_stages.sort_by(|a, b| b.user_clear_rate.total_cmp(&a.user_clear_rate));
    top_clear_rate_stages.truncate(CLEAR_RATE_EXTREMES);

    // a stage nobody cleared says more about logging than about difficulty
    let mut lowest_clear_rate_stages: Vec<UserStageStats> = stats
        .iter()
        .filter(|s| s.user_clear_rate > 0.0)
        .cloned()
        .collect();
    lowest_clear_rate_stages.sort_by(|a, b| a.user_clear_rate.total_cmp(&b.user_clear_rate));
    lowest_clear_rate_stages.truncate(CLEAR_RATE_EXTREMES);

    UserStageSummary {
        stage_count: stats.len() as u64,
        average_user_clear_rate: mean(stats.iter().map(|s| s.user_clear_rate)),
        average_clear_probability: mean(stats.iter().map(|s| s.clear_probability)),
        average_attempts_per_user: mean(stats.iter().map(|s| s.average_attempts_per_user)),
        top_clear_rate_stages,
        lowest_clear_rate_stages,
    }
}
