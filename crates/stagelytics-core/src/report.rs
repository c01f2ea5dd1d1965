//! Everything the main dashboard renders, computed in one pass over a
//! filter configuration.

use serde::{Deserialize, Serialize};

use crate::analytics::{
    AttritionSummary, DashboardSummary, DifficultySpike, FunnelData, FunnelSummary,
    SignificantSpike, StageAttritionData, StageStats, UserAttritionData,
    UserAttritionSummary, UserStageStats, UserStageSummary, VoluntaryExitRank,
};
use crate::attrition::{
    attrition_summary, stage_attrition_from_stats, user_attrition, user_attrition_summary,
};
use crate::difficulty::{difficulty_curve, significant_spikes};
use crate::event::Event;
use crate::filter::{apply_filters, FilterConfig};
use crate::funnel::{funnel, funnel_summary};
use crate::stats::{dashboard_summary, stage_stats, voluntary_exit_ranking};
use crate::users::{user_stage_stats, user_stage_summary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub filter: FilterConfig,
    pub summary: DashboardSummary,
    pub stage_stats: Vec<StageStats>,
    pub voluntary_exit_ranking: Vec<VoluntaryExitRank>,
    pub difficulty_curve: Vec<DifficultySpike>,
    pub significant_spikes: Vec<SignificantSpike>,
    pub funnel: Vec<FunnelData>,
    pub funnel_summary: FunnelSummary,
    pub stage_attrition: Vec<StageAttritionData>,
    pub attrition_summary: AttritionSummary,
    pub user_attrition: Vec<UserAttritionData>,
    pub user_attrition_summary: UserAttritionSummary,
    pub user_stage_stats: Vec<UserStageStats>,
    pub user_stage_summary: UserStageSummary,
}

impl DashboardReport {
    /// `all_events` must be the unfiltered set; the voluntary-exit rate in the
    /// summary is read from it, every other aggregate from the filtered set.
    pub fn build(all_events: &[Event], filter: &FilterConfig) -> Self {
        let filtered = apply_filters(all_events, filter);
        let stage_stats = stage_stats(&filtered);
        let difficulty_curve = difficulty_curve(&filtered);
        let funnel = funnel(&filtered);
        let stage_attrition = stage_attrition_from_stats(&stage_stats);
        let user_attrition = user_attrition(&filtered);
        let user_stage_stats = user_stage_stats(&filtered);

        DashboardReport {
            filter: filter.clone(),
            summary: dashboard_summary(all_events, &filtered),
            voluntary_exit_ranking: voluntary_exit_ranking(&stage_stats),
            significant_spikes: significant_spikes(&difficulty_curve),
            funnel_summary: funnel_summary(&funnel),
            attrition_summary: attrition_summary(&stage_attrition),
            user_attrition_summary: user_attrition_summary(&user_attrition),
            user_stage_summary: user_stage_summary(&user_stage_stats),
            stage_stats,
            difficulty_curve,
            funnel,
            stage_attrition,
            user_attrition,
            user_stage_stats,
        }
    }
}
