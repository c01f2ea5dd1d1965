//! Aggregate record types returned to the dashboard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Highest level of a stage run. Level-indexed aggregates cover `1..=MAX_LEVEL`.
pub const MAX_LEVEL: u32 = 20;

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// Arithmetic mean, or 0 for no values.
pub(crate) fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0u64), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

pub(crate) fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageStats {
    pub stage_id: String,
    /// Raw count of `try` events.
    pub tries: u64,
    /// `max(tries, clears + fails)`.
    pub total_attempts: u64,
    pub clears: u64,
    pub fails: u64,
    pub voluntary_exits: u64,
    pub repeat_plays: u64,
    pub clear_rate: f64,
    /// Share of fails that were voluntary exits.
    pub voluntary_exit_rate: f64,
    pub average_fail_level: f64,
    pub fails_by_level: BTreeMap<i64, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoluntaryExitRank {
    pub stage_id: String,
    pub fails: u64,
    pub voluntary_exits: u64,
    pub voluntary_exit_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultySpike {
    pub level: u32,
    /// Estimated runs that reached this level.
    pub attempts: u64,
    pub fail_count: u64,
    pub fail_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificantSpike {
    pub level: u32,
    pub fail_rate: f64,
    /// Percentage-point rise over the previous level.
    pub increase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelData {
    pub level: u32,
    pub reached: u64,
    pub remaining: u64,
    pub dropped: u64,
    pub drop_rate: f64,
    /// `remaining` relative to level 1's `remaining`, 0–100.
    pub retention_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelSummary {
    pub total_players: u64,
    pub finishers: u64,
    pub overall_retention: f64,
    /// Levels whose drop rate exceeds the critical threshold, worst first.
    pub critical_dropoffs: Vec<FunnelData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageAttritionData {
    pub stage_id: String,
    pub attempts: u64,
    pub attrition_count: u64,
    pub attrition_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAttritionData {
    pub stage_id: String,
    pub unique_users: u64,
    pub user_attrition_count: u64,
    pub user_attrition_rate: f64,
    /// Users lost since the first stage.
    pub cumulative_users: u64,
    pub cumulative_attrition_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttritionSummary {
    /// Stage with the largest attempt loss; the earliest wins a tie.
    pub highest_attrition: Option<StageAttritionData>,
    pub average_attrition_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAttritionSummary {
    pub initial_users: u64,
    pub remaining_users: u64,
    pub users_lost: u64,
    /// Users lost between the first and last stage, relative to the first.
    pub overall_attrition_rate: f64,
    /// Stages that lost users, worst first.
    pub top_attrition_stages: Vec<UserAttritionData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStageStats {
    pub stage_id: String,
    pub unique_users: u64,
    /// Sum of per-user `try` counts, kept apart because try logging is unreliable.
    pub total_tries: u64,
    /// `total_clears + total_fails`.
    pub total_attempts: u64,
    pub total_clears: u64,
    pub total_fails: u64,
    pub users_cleared: u64,
    pub users_failed: u64,
    /// Share of users who ever cleared.
    pub user_clear_rate: f64,
    /// Share of individual attempts that cleared.
    pub clear_probability: f64,
    pub average_attempts_per_user: f64,
    pub users_with_voluntary_exit: u64,
    pub users_with_repeat_play: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStageSummary {
    pub stage_count: u64,
    /// Unweighted means over stages.
    pub average_user_clear_rate: f64,
    pub average_clear_probability: f64,
    pub average_attempts_per_user: f64,
    pub top_clear_rate_stages: Vec<UserStageStats>,
    /// Lowest non-zero user clear rates, lowest first.
    pub lowest_clear_rate_stages: Vec<UserStageStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstClearByTryCount {
    pub try_count: u64,
    pub user_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstClearStageData {
    pub stage_id: String,
    pub total_first_clear_users: u64,
    pub by_try_count: Vec<FirstClearByTryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstClearSummary {
    pub total_users: u64,
    pub average_try_count: f64,
    pub one_shot_users: u64,
    pub one_shot_percent: f64,
    pub max_try_count: u64,
    pub max_try_count_users: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_events: u64,
    pub overall_clear_rate: f64,
    /// Computed over the unfiltered event set.
    pub voluntary_exit_rate: f64,
    /// Voluntary-exit fails in the unfiltered set.
    pub excluded_voluntary_exits: u64,
    pub total_stages: u64,
    pub unique_users: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryOption {
    pub code: Option<String>,
    pub name: Option<String>,
    pub event_count: u64,
}
