//! Stage identifiers: numeric ordering and type bands.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Type band a stage id falls into. Ids outside every band are `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    Normal,
    Elite,
    Luck,
    Mass,
}

impl StageType {
    pub fn of(stage_id: &str) -> Self {
        match stage_number(stage_id) {
            Some(2001..=2999) => StageType::Normal,
            Some(3001..=3999) => StageType::Elite,
            Some(4001..=4999) => StageType::Luck,
            Some(5001..=5999) => StageType::Mass,
            _ => StageType::Normal,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageType::Normal => "Normal",
            StageType::Elite => "Elite",
            StageType::Luck => "Luck",
            StageType::Mass => "Mass",
        }
    }
}

/// The `stage_type` toggle of the filter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageTypeFilter {
    #[default]
    All,
    Normal,
    Elite,
    Luck,
    Mass,
}

impl StageTypeFilter {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Ok(Self::All),
            Some("normal") => Ok(Self::Normal),
            Some("elite") => Ok(Self::Elite),
            Some("luck") => Ok(Self::Luck),
            Some("mass") => Ok(Self::Mass),
            Some(_) => Err(anyhow!(
                "stage_type must be one of: all, normal, elite, luck, mass"
            )),
        }
    }

    pub fn admits(&self, stage_id: &str) -> bool {
        let ty = StageType::of(stage_id);
        match self {
            StageTypeFilter::All => true,
            StageTypeFilter::Normal => ty == StageType::Normal,
            StageTypeFilter::Elite => ty == StageType::Elite,
            StageTypeFilter::Luck => ty == StageType::Luck,
            StageTypeFilter::Mass => ty == StageType::Mass,
        }
    }
}

pub fn stage_number(stage_id: &str) -> Option<u64> {
    stage_id.trim().parse().ok()
}

/// Numeric order for numeric ids (`2015 < 2100`); numeric ids sort before
/// anything non-numeric, which falls back to string order.
pub fn compare_stage_ids(a: &str, b: &str) -> Ordering {
    match (stage_number(a), stage_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Distinct stage ids present in `events`, in stage order.
pub fn stage_ids(events: &[Event]) -> Vec<String> {
    let mut ids: Vec<String> = events
        .iter()
        .map(|e| e.label.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    ids.sort_by(|a, b| compare_stage_ids(a, b));
    ids
}

/// Events partitioned by stage label, groups in stage order, events within a
/// group in input order.
pub(crate) fn group_by_stage(events: &[Event]) -> Vec<(&str, Vec<&Event>)> {
    let mut groups: HashMap<&str, Vec<&Event>> = HashMap::new();
    for event in events {
        groups.entry(event.label.as_str()).or_default().push(event);
    }
    let mut groups: Vec<_> = groups.into_iter().collect();
    groups.sort_by(|(a, _), (b, _)| compare_stage_ids(a, b));
    groups
}

/// Display label such as `"Elite 3015"`.
pub fn format_stage_id(stage_id: &str) -> String {
    format!("{} {}", StageType::of(stage_id).label(), stage_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::test_support::event;
    use crate::event::EventAction;

    #[test]
    fn bands_map_to_types() {
        assert_eq!(StageType::of("2001"), StageType::Normal);
        assert_eq!(StageType::of("2999"), StageType::Normal);
        assert_eq!(StageType::of("3001"), StageType::Elite);
        assert_eq!(StageType::of("4500"), StageType::Luck);
        assert_eq!(StageType::of("5999"), StageType::Mass);
    }

    #[test]
    fn out_of_band_defaults_to_normal() {
        for id in ["1", "3000", "6000", "abc", ""] {
            assert_eq!(StageType::of(id), StageType::Normal, "{id}");
        }
    }

    #[test]
    fn numeric_order_not_lexical() {
        let mut ids = vec!["2100", "2015", "999", "tutorial", "3001"];
        ids.sort_by(|a, b| compare_stage_ids(a, b));
        assert_eq!(ids, vec!["999", "2015", "2100", "3001", "tutorial"]);
    }

    #[test]
    fn stage_ids_are_distinct_and_sorted() {
        let events = vec![
            event(EventAction::Try, "2100"),
            event(EventAction::Try, "2015"),
            event(EventAction::Clear, "2100"),
        ];
        assert_eq!(stage_ids(&events), vec!["2015", "2100"]);
    }

    #[test]
    fn filter_parse_rejects_unknown() {
        assert_eq!(StageTypeFilter::parse(None).expect("none"), StageTypeFilter::All);
        assert_eq!(
            StageTypeFilter::parse(Some(" elite ")).expect("elite"),
            StageTypeFilter::Elite
        );
        assert!(StageTypeFilter::parse(Some("boss")).is_err());
    }

    #[test]
    fn format_uses_band_label() {
        assert_eq!(format_stage_id("3015"), "Elite 3015");
        assert_eq!(format_stage_id("7000"), "Normal 7000");
    }
}
