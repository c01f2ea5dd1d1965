use serde::{Deserialize, Serialize};

use super::catalog::{describe_step, is_special_step, is_text_step, short_step_label};
use super::{
    funnel_from_stats, tutorial_step_stats, tutorial_unique_user_count, TutorialEvent,
    TutorialFunnelData, TutorialStepStats,
};
use crate::analytics::percent;

/// A raw step with this drop-off or worse is treated as a logging gap.
pub const GAP_DROPOFF_RATE: f64 = 95.0;
/// A raw step with more than this many times the previous step's users is
/// treated as a logging gap.
pub const GAP_GROWTH_FACTOR: u64 = 10;
/// Behaviour steps losing more than this share of users are flagged.
pub const DANGER_DROPOFF_RATE: f64 = 10.0;
pub const MAX_DANGER_STEPS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviourStep {
    #[serde(flatten)]
    pub funnel: TutorialFunnelData,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialReport {
    pub total_unique_users: u64,
    pub step_stats: Vec<TutorialStepStats>,
    /// Every step, including text taps and special steps.
    pub funnel: Vec<TutorialFunnelData>,
    /// Player actions only, with suspected logging gaps removed.
    pub behaviour_funnel: Vec<BehaviourStep>,
    pub danger_steps: Vec<BehaviourStep>,
    pub special_steps: Vec<TutorialStepStats>,
    /// Users at the last behaviour step relative to the first, 0–100.
    pub completion_rate: f64,
    /// Behaviour steps dropped as suspected logging gaps.
    pub filtered_out_steps: u64,
}

fn is_behaviour_step(step_id: &str) -> bool {
    !is_text_step(step_id) && !is_special_step(step_id)
}

/// Gap rules look at the raw funnel, so a text step can still be the
/// "previous step" a behaviour step is compared against.
fn looks_like_gap(funnel: &[TutorialFunnelData], idx: usize) -> bool {
    if idx == 0 {
        return false;
    }
    let cur = &funnel[idx];
    let prev = &funnel[idx - 1];
    cur.dropoff_rate >= GAP_DROPOFF_RATE
        || cur.unique_users > prev.unique_users.saturating_mul(GAP_GROWTH_FACTOR)
}

impl TutorialReport {
    pub fn build(events: &[TutorialEvent]) -> Self {
        let step_stats = tutorial_step_stats(events);
        let funnel = funnel_from_stats(&step_stats);

        let behaviour_candidates = funnel
            .iter()
            .filter(|f| is_behaviour_step(&f.step_id))
            .count() as u64;
        let behaviour_funnel: Vec<BehaviourStep> = funnel
            .iter()
            .enumerate()
            .filter(|(idx, f)| is_behaviour_step(&f.step_id) && !looks_like_gap(&funnel, *idx))
            .map(|(_, f)| BehaviourStep {
                label: short_step_label(&f.step_id),
                description: describe_step(&f.step_id),
                funnel: f.clone(),
            })
            .collect();

        let mut danger_steps: Vec<BehaviourStep> = behaviour_funnel
            .iter()
            .filter(|s| s.funnel.dropoff_rate > DANGER_DROPOFF_RATE)
            .cloned()
            .collect();
        danger_steps.sort_by(|a, b| b.funnel.dropoff_rate.total_cmp(&a.funnel.dropoff_rate));
        danger_steps.truncate(MAX_DANGER_STEPS);

        let completion_rate = match (behaviour_funnel.first(), behaviour_funnel.last()) {
            (Some(first), Some(last)) => {
                percent(last.funnel.unique_users, first.funnel.unique_users)
            }
            _ => 0.0,
        };

        let special_steps = step_stats
            .iter()
            .filter(|s| is_special_step(&s.step_id))
            .cloned()
            .collect();

        let filtered_out_steps = behaviour_candidates - behaviour_funnel.len() as u64;
        tracing::debug!(
            steps = step_stats.len(),
            behaviour_steps = behaviour_funnel.len(),
            filtered_out_steps,
            "built tutorial report"
        );

        TutorialReport {
            total_unique_users: tutorial_unique_user_count(events),
            step_stats,
            funnel,
            behaviour_funnel,
            danger_steps,
            special_steps,
            completion_rate,
            filtered_out_steps,
        }
    }
}
