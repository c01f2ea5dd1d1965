//! Loss between consecutive stages, by attempts and by distinct users.

use std::collections::HashSet;

use crate::analytics::{
    mean, percent, AttritionSummary, StageAttritionData, StageStats, UserAttritionData,
    UserAttritionSummary,
};
use crate::event::Event;
use crate::stage::group_by_stage;
use crate::stats::stage_stats;

/// One link of an ordered chain of counts, compared to its predecessor and to
/// the head of the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ChainLink {
    pub count: u64,
    pub lost: u64,
    pub lost_rate: f64,
    pub lost_since_first: u64,
    pub cumulative_rate: f64,
}

/// Shared by the stage, user and tutorial-step chains. The first link never
/// loses anything; a later link that grew reports zero loss.
pub(crate) fn chain_attrition(counts: &[u64]) -> Vec<ChainLink> {
    let first = counts.first().copied().unwrap_or(0);
    let mut prev: Option<u64> = None;
    counts
        .iter()
        .map(|&count| {
            let (lost, lost_rate) = match prev {
                Some(p) => {
                    let lost = p.saturating_sub(count);
                    (lost, percent(lost, p))
                }
                None => (0, 0.0),
            };
            prev = Some(count);
            let lost_since_first = first.saturating_sub(count);
            ChainLink {
                count,
                lost,
                lost_rate,
                lost_since_first,
                cumulative_rate: percent(lost_since_first, first),
            }
        })
        .collect()
}

pub fn stage_attrition(events: &[Event]) -> Vec<StageAttritionData> {
    stage_attrition_from_stats(&stage_stats(events))
}

/// Attempt attrition over already computed, stage-ordered stats.
pub fn stage_attrition_from_stats(stats: &[StageStats]) -> Vec<StageAttritionData> {
    let counts: Vec<u64> = stats.iter().map(|s| s.total_attempts).collect();
    stats
        .iter()
        .zip(chain_attrition(&counts))
        .map(|(s, link)| StageAttritionData {
            stage_id: s.stage_id.clone(),
            attempts: link.count,
            attrition_count: link.lost,
            attrition_rate: link.lost_rate,
        })
        .collect()
}

/// Distinct-user attrition. Events without a user id are ignored, so a stage
/// seen only anonymously does not appear in the chain.
pub fn user_attrition(events: &[Event]) -> Vec<UserAttritionData> {
    let per_stage: Vec<(&str, u64)> = group_by_stage(events)
        .into_iter()
        .filter_map(|(stage_id, group)| {
            let users = group
                .iter()
                .filter_map(|e| e.user_id.as_deref())
                .collect::<HashSet<_>>()
                .len() as u64;
            (users > 0).then_some((stage_id, users))
        })
        .collect();

    let counts: Vec<u64> = per_stage.iter().map(|(_, n)| *n).collect();
    let rows: Vec<UserAttritionData> = per_stage
        .iter()
        .zip(chain_attrition(&counts))
        .map(|((stage_id, _), link)| UserAttritionData {
            stage_id: stage_id.to_string(),
            unique_users: link.count,
            user_attrition_count: link.lost,
            user_attrition_rate: link.lost_rate,
            cumulative_users: link.lost_since_first,
            cumulative_attrition_rate: link.cumulative_rate,
        })
        .collect();
    tracing::debug!(stages = rows.len(), "computed user attrition");
    rows
}

/// Length of [`UserAttritionSummary::top_attrition_stages`].
pub const TOP_ATTRITION_STAGES: usize = 5;

pub fn attrition_summary(rows: &[StageAttritionData]) -> AttritionSummary {
    let highest_attrition = rows
        .iter()
        .fold(None::<&StageAttritionData>, |best, row| match best {
            Some(b) if b.attrition_count >= row.attrition_count => Some(b),
            _ => Some(row),
        })
        .cloned();
    AttritionSummary {
        highest_attrition,
        average_attrition_rate: mean(rows.iter().map(|r| r.attrition_rate)),
    }
}

/// Overall loss compares the first and last stage of the chain, not the sum
/// of per-stage losses.
pub fn user_attrition_summary(rows: &[UserAttritionData]) -> UserAttritionSummary {
    let initial_users = rows.first().map(|r| r.unique_users).unwrap_or(0);
    let remaining_users = rows.last().map(|r| r.unique_users).unwrap_or(0);
    let users_lost = initial_users.saturating_sub(remaining_users);

    let mut top_attrition_stages: Vec<UserAttritionData> = rows
        .iter()
        .filter(|r| r.user_attrition_rate > 0.0)
        .cloned()
        .collect();
    top_attrition_stages.sort_by(|a, b| b.user_attrition_rate.total_cmp(&a.user_attrition_rate));
    top_attrition_stages.truncate(TOP_ATTRITION_STAGES);

    UserAttritionSummary {
        initial_users,
        remaining_users,
        users_lost,
        overall_attrition_rate: percent(users_lost, initial_users),
        top_attrition_stages,
    }
}
