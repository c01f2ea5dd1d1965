//! Tutorial step funnel.
//!
//! Same shape as the stage pipeline, keyed by the step number embedded in
//! the `Event Category` column (`"tutorial_02 (App)"` is step `02`). When a
//! step has no identified users its event count stands in for the user count.

pub mod catalog;
pub mod files;
pub mod report;

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::attrition::chain_attrition;
use crate::ingest::{optional_cell, RawRow, COL_ACTION, COL_CATEGORY, COL_USER_ID};

pub use catalog::{describe_step, short_step_label, TutorialStep, SPECIAL_STEPS, TEXT_STEPS};
pub use files::{list_data_files, parse_data_file_name, DataFileInfo};
pub use report::{BehaviourStep, TutorialReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialEvent {
    /// Zero-padded step id as written in the category, e.g. `"02"`.
    pub step_id: String,
    pub step_number: u32,
    pub category: String,
    pub action: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialStepStats {
    pub step_id: String,
    pub step_number: u32,
    pub total_events: u64,
    pub unique_users: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialFunnelData {
    pub step_id: String,
    pub step_number: u32,
    pub unique_users: u64,
    pub dropoff_count: u64,
    pub dropoff_rate: f64,
    pub cumulative_dropoff_rate: f64,
}

/// Which occurrence [`dedupe_user_steps`] keeps for a repeated (user, step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepOccurrence {
    #[default]
    First,
    Last,
}

impl KeepOccurrence {
    pub fn parse(raw: Option<&str>) -> anyhow::Result<Option<Self>> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some("first") => Ok(Some(Self::First)),
            Some("last") => Ok(Some(Self::Last)),
            Some(_) => Err(anyhow::anyhow!("dedupe must be one of: first, last")),
        }
    }
}

fn step_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)tutorial_(\d+)").ok())
        .as_ref()
}

fn step_of(category: &str) -> Option<(String, u32)> {
    let caps = step_pattern()?.captures(category)?;
    let id = caps.get(1)?.as_str();
    let number = id.parse().ok()?;
    Some((id.to_string(), number))
}

/// Rows whose category carries no tutorial step are skipped, never an error.
pub fn parse_tutorial_rows(rows: &[RawRow]) -> Vec<TutorialEvent> {
    let events: Vec<TutorialEvent> = rows
        .iter()
        .filter_map(|row| {
            let category = optional_cell(row, COL_CATEGORY)?;
            let (step_id, step_number) = step_of(&category)?;
            Some(TutorialEvent {
                step_id,
                step_number,
                action: row.get(COL_ACTION).cloned().unwrap_or_default(),
                user_id: optional_cell(row, COL_USER_ID),
                category,
            })
        })
        .collect();
    let skipped = rows.len() - events.len();
    if skipped > 0 {
        tracing::warn!(skipped, kept = events.len(), "rows without a tutorial step were skipped");
    }
    events
}

fn compare_steps(a: (&str, u32), b: (&str, u32)) -> Ordering {
    a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0))
}

/// One event per (user, step). The kept event sits at the position of the
/// pair's first occurrence. Anonymous events cannot be told apart and are all
/// kept.
pub fn dedupe_user_steps(events: &[TutorialEvent], keep: KeepOccurrence) -> Vec<TutorialEvent> {
    let mut slots: Vec<&TutorialEvent> = Vec::with_capacity(events.len());
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
    for event in events {
        let Some(user) = event.user_id.as_deref() else {
            slots.push(event);
            continue;
        };
        match seen.get(&(user, event.step_id.as_str())) {
            Some(&idx) => {
                if keep == KeepOccurrence::Last {
                    slots[idx] = event;
                }
            }
            None => {
                seen.insert((user, event.step_id.as_str()), slots.len());
                slots.push(event);
            }
        }
    }
    slots.into_iter().cloned().collect()
}

pub fn tutorial_step_stats(events: &[TutorialEvent]) -> Vec<TutorialStepStats> {
    let mut steps: BTreeMap<(u32, &str), (u64, HashSet<&str>)> = BTreeMap::new();
    for event in events {
        let entry = steps
            .entry((event.step_number, event.step_id.as_str()))
            .or_default();
        entry.0 += 1;
        if let Some(user) = event.user_id.as_deref() {
            entry.1.insert(user);
        }
    }
    // keyed by (number, id) so iteration is already step order
    steps
        .into_iter()
        .map(|((step_number, step_id), (total_events, users))| TutorialStepStats {
            step_id: step_id.to_string(),
            step_number,
            total_events,
            unique_users: if users.is_empty() {
                total_events
            } else {
                users.len() as u64
            },
        })
        .collect()
}

/// Drop-off between consecutive steps and versus the first step.
pub fn tutorial_funnel(events: &[TutorialEvent]) -> Vec<TutorialFunnelData> {
    funnel_from_stats(&tutorial_step_stats(events))
}

pub(crate) fn funnel_from_stats(stats: &[TutorialStepStats]) -> Vec<TutorialFunnelData> {
    let counts: Vec<u64> = stats.iter().map(|s| s.unique_users).collect();
    stats
        .iter()
        .zip(chain_attrition(&counts))
        .map(|(s, link)| TutorialFunnelData {
            step_id: s.step_id.clone(),
            step_number: s.step_number,
            unique_users: link.count,
            dropoff_count: link.lost,
            dropoff_rate: link.lost_rate,
            cumulative_dropoff_rate: link.cumulative_rate,
        })
        .collect()
}

/// Distinct identified users, or the event count when nobody is identified.
pub fn tutorial_unique_user_count(events: &[TutorialEvent]) -> u64 {
    let users: HashSet<&str> = events.iter().filter_map(|e| e.user_id.as_deref()).collect();
    if users.is_empty() {
        events.len() as u64
    } else {
        users.len() as u64
    }
}

pub fn tutorial_step_ids(events: &[TutorialEvent]) -> Vec<String> {
    let ids: HashSet<(&str, u32)> = events
        .iter()
        .map(|e| (e.step_id.as_str(), e.step_number))
        .collect();
    let mut ids: Vec<(&str, u32)> = ids.into_iter().collect();
    ids.sort_by(|a, b| compare_steps(*a, *b));
    ids.into_iter().map(|(id, _)| id.to_string()).collect()
}
