//! How many tries users needed before their first clear of a stage.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::analytics::{percent, ratio, FirstClearByTryCount, FirstClearStageData, FirstClearSummary};
use crate::event::Event;
use crate::stage::group_by_stage;

fn distribution(stage_id: &str, events: &[&Event]) -> FirstClearStageData {
    let mut tries: HashMap<&str, u64> = HashMap::new();
    let mut first_clear_users: HashSet<&str> = HashSet::new();
    for event in events {
        let Some(user) = event.user_id.as_deref() else {
            continue;
        };
        if event.is_try() {
            *tries.entry(user).or_default() += 1;
        } else if event.is_first_clear() {
            first_clear_users.insert(user);
        }
    }

    let mut buckets: BTreeMap<u64, u64> = BTreeMap::new();
    for user in &first_clear_users {
        // A clear with no logged try still took one attempt.
        let try_count = tries.get(user).copied().unwrap_or(0).max(1);
        *buckets.entry(try_count).or_default() += 1;
    }

    FirstClearStageData {
        stage_id: stage_id.to_string(),
        total_first_clear_users: first_clear_users.len() as u64,
        by_try_count: buckets
            .into_iter()
            .map(|(try_count, user_count)| FirstClearByTryCount {
                try_count,
                user_count,
            })
            .collect(),
    }
}

/// Try-count distribution for one stage. A stage without first clears
/// yields an empty distribution rather than an error.
pub fn first_clear_by_try_count(events: &[Event], stage_id: &str) -> FirstClearStageData {
    let stage_events: Vec<&Event> = events.iter().filter(|e| e.label == stage_id).collect();
    distribution(stage_id, &stage_events)
}

/// Distributions for every stage that has at least one first clear, in
/// stage order.
pub fn first_clear_all_stages(events: &[Event]) -> Vec<FirstClearStageData> {
    group_by_stage(events)
        .into_iter()
        .map(|(stage_id, group)| distribution(stage_id, &group))
        .filter(|data| data.total_first_clear_users > 0)
        .collect()
}

pub fn first_clear_summary(data: &FirstClearStageData) -> FirstClearSummary {
    let total_users = data.total_first_clear_users;
    let total_tries: u64 = data
        .by_try_count
        .iter()
        .map(|b| b.try_count * b.user_count)
        .sum();
    let one_shot_users = data
        .by_try_count
        .iter()
        .find(|b| b.try_count == 1)
        .map(|b| b.user_count)
        .unwrap_or(0);
    let (max_try_count, max_try_count_users) = data
        .by_try_count
        .last()
        .map(|b| (b.try_count, b.user_count))
        .unwrap_or((0, 0));

    FirstClearSummary {
        total_users,
        average_try_count: ratio(total_tries, total_users),
        one_shot_users,
        one_shot_percent: percent(one_shot_users, total_users),
        max_try_count,
        max_try_count_users,
    }
}
