use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::stage::StageTypeFilter;

/// Dashboard exclusion toggles. Every active toggle must pass for an event to
/// survive; the default configuration admits everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub exclude_voluntary_exits: bool,
    pub exclude_repeat_plays: bool,
    pub stage_type: StageTypeFilter,
    /// Country codes or names to keep. Empty means no restriction.
    pub countries: BTreeSet<String>,
}

impl FilterConfig {
    pub fn matches(&self, event: &Event) -> bool {
        if self.exclude_voluntary_exits && event.is_voluntary_exit() {
            return false;
        }
        if self.exclude_repeat_plays && event.is_repeat_play() {
            return false;
        }
        if !self.stage_type.admits(&event.label) {
            return false;
        }
        if !self.countries.is_empty() && !self.admits_country(event) {
            return false;
        }
        true
    }

    fn admits_country(&self, event: &Event) -> bool {
        [&event.country_code, &event.country_name]
            .into_iter()
            .flatten()
            .any(|c| self.countries.contains(c))
    }

    pub fn is_noop(&self) -> bool {
        *self == FilterConfig::default()
    }
}

/// New subset of `events` that pass `config`, in input order.
pub fn apply_filters(events: &[Event], config: &FilterConfig) -> Vec<Event> {
    if config.is_noop() {
        return events.to_vec();
    }
    let kept: Vec<Event> = events
        .iter()
        .filter(|e| config.matches(e))
        .cloned()
        .collect();
    tracing::debug!(
        input = events.len(),
        kept = kept.len(),
        "applied dashboard filters"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::test_support::{event, fail_at};
    use crate::event::{EventAction, ExitType};

    fn voluntary_fail(label: &str) -> Event {
        let mut e = fail_at(label, 3);
        e.properties.exit_type = Some(ExitType::VoluntaryExit);
        e
    }

    #[test]
    fn default_config_keeps_everything() {
        let events = vec![voluntary_fail("2001"), event(EventAction::Try, "9000")];
        assert_eq!(apply_filters(&events, &FilterConfig::default()), events);
    }

    #[test]
    fn voluntary_exit_toggle_drops_only_voluntary_fails() {
        let events = vec![
            voluntary_fail("2001"),
            fail_at("2001", 4),
            event(EventAction::Try, "2001"),
        ];
        let config = FilterConfig {
            exclude_voluntary_exits: true,
            ..Default::default()
        };
        let kept = apply_filters(&events, &config);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|e| !e.is_voluntary_exit()));
    }

    #[test]
    fn repeat_play_toggle_drops_any_action() {
        let mut repeat_try = event(EventAction::Try, "2001");
        repeat_try.properties.is_repeat_play = Some(true);
        let mut first_try = event(EventAction::Try, "2001");
        first_try.properties.is_repeat_play = Some(false);
        let config = FilterConfig {
            exclude_repeat_plays: true,
            ..Default::default()
        };
        let kept = apply_filters(&[repeat_try, first_try.clone()], &config);
        assert_eq!(kept, vec![first_try]);
    }

    #[test]
    fn country_list_matches_code_or_name_and_drops_unknown() {
        let mut kr = event(EventAction::Try, "2001");
        kr.country_code = Some("KR".to_string());
        let mut jp = event(EventAction::Try, "2001");
        jp.country_name = Some("Japan".to_string());
        let unknown = event(EventAction::Try, "2001");
        let config = FilterConfig {
            countries: ["KR", "Japan"].iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let kept = apply_filters(&[kr, jp, unknown], &config);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn toggles_are_anded() {
        let mut elite_repeat = event(EventAction::Try, "3002");
        elite_repeat.properties.is_repeat_play = Some(true);
        let elite = event(EventAction::Try, "3002");
        let normal = event(EventAction::Try, "2002");
        let config = FilterConfig {
            exclude_repeat_plays: true,
            stage_type: StageTypeFilter::Elite,
            ..Default::default()
        };
        assert_eq!(
            apply_filters(&[elite_repeat, elite.clone(), normal], &config),
            vec![elite]
        );
    }
}
