use stagelytics_core::attrition::{stage_attrition, user_attrition};
use stagelytics_core::difficulty::difficulty_curve;
use stagelytics_core::event::{Event, EventAction, EventProperties, ExitType};
use stagelytics_core::filter::FilterConfig;
use stagelytics_core::first_clear::first_clear_all_stages;
use stagelytics_core::funnel::{funnel, stage_funnel};
use stagelytics_core::report::DashboardReport;
use stagelytics_core::stats::stage_stats;
use stagelytics_core::users::user_stage_stats;

use proptest::prelude::*;

const ACTIONS: [EventAction; 5] = [
    EventAction::Try,
    EventAction::Clear,
    EventAction::Fail,
    EventAction::ClearIsFirst,
    EventAction::FailIsFirst,
];

const STAGES: [&str; 5] = ["2001", "2002", "2010", "3001", "4005"];

fn event_strategy() -> impl Strategy<Value = Event> {
    (
        0..ACTIONS.len(),
        0..STAGES.len(),
        0i64..=22,
        proptest::option::of(0u8..40),
        any::<bool>(),
        proptest::option::of(any::<bool>()),
        any::<bool>(),
    )
        .prop_map(|(action, stage, level, user, quit, repeat, korea)| {
            let action = ACTIONS[action];
            Event {
                category: "stage".to_string(),
                action,
                label: STAGES[stage].to_string(),
                value: String::new(),
                properties: EventProperties {
                    last_level: action.is_fail().then_some(level),
                    exit_type: (action.is_fail() && quit).then_some(ExitType::VoluntaryExit),
                    is_repeat_play: repeat,
                },
                user_id: user.map(|u| format!("user-{u}")),
                country_code: Some(if korea { "KR" } else { "US" }.to_string()),
                country_name: None,
            }
        })
}

fn events_strategy() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec(event_strategy(), 0..200)
}

/// Pairs every fail with a preceding try, the shape a source that logs tries
/// always produces.
fn with_paired_tries(events: Vec<Event>) -> Vec<Event> {
    events
        .into_iter()
        .filter(|e| !e.is_try())
        .flat_map(|e| {
            let mut attempt = e.clone();
            attempt.action = EventAction::Try;
            attempt.properties.last_level = None;
            if e.is_fail() {
                vec![attempt, e]
            } else {
                vec![e]
            }
        })
        .collect()
}

fn in_percent_range(v: f64) -> bool {
    (0.0..=100.0).contains(&v)
}

proptest! {
    #[test]
    fn aggregates_are_idempotent(events in events_strategy(), repeat in any::<bool>()) {
        let filter = FilterConfig {
            exclude_repeat_plays: repeat,
            ..Default::default()
        };
        prop_assert_eq!(
            DashboardReport::build(&events, &filter),
            DashboardReport::build(&events, &filter)
        );
        prop_assert_eq!(first_clear_all_stages(&events), first_clear_all_stages(&events));
    }

    #[test]
    fn attempts_never_below_clears_plus_fails(events in events_strategy()) {
        for s in stage_stats(&events) {
            prop_assert!(s.total_attempts >= s.clears + s.fails, "{}", s.stage_id);
            if s.tries < s.clears + s.fails {
                prop_assert_eq!(s.total_attempts, s.clears + s.fails);
            }
        }
    }

    #[test]
    fn rates_stay_in_bounds(events in events_strategy()) {
        for s in stage_stats(&events) {
            prop_assert!(in_percent_range(s.clear_rate));
            prop_assert!(in_percent_range(s.voluntary_exit_rate));
        }
        for f in funnel(&events) {
            prop_assert!(in_percent_range(f.drop_rate));
            prop_assert!(in_percent_range(f.retention_rate));
        }
        for a in stage_attrition(&events) {
            prop_assert!(in_percent_range(a.attrition_rate));
        }
        for u in user_attrition(&events) {
            prop_assert!(in_percent_range(u.user_attrition_rate));
            prop_assert!(in_percent_range(u.cumulative_attrition_rate));
        }
        for u in user_stage_stats(&events) {
            prop_assert!(in_percent_range(u.user_clear_rate));
            prop_assert!(in_percent_range(u.clear_probability));
        }
    }

    /// The difficulty estimate only bounds its fail rate when every fail has a
    /// matching try.
    #[test]
    fn difficulty_rate_bounded_when_tries_cover_fails(events in events_strategy()) {
        for d in difficulty_curve(&with_paired_tries(events)) {
            prop_assert!(in_percent_range(d.fail_rate), "level {}", d.level);
        }
    }

    #[test]
    fn funnel_conserves_runs(events in events_strategy()) {
        for stage in STAGES {
            for f in stage_funnel(&events, stage) {
                prop_assert!(f.dropped <= f.reached);
                prop_assert_eq!(f.remaining, f.reached - f.dropped);
            }
        }
    }

    #[test]
    fn attrition_first_link_is_zero(events in events_strategy()) {
        if let Some(first) = stage_attrition(&events).first() {
            prop_assert_eq!(first.attrition_count, 0);
            prop_assert_eq!(first.attrition_rate, 0.0);
        }
        if let Some(first) = user_attrition(&events).first() {
            prop_assert_eq!(first.user_attrition_count, 0);
            prop_assert_eq!(first.cumulative_attrition_rate, 0.0);
        }
    }
}

#[test]
fn empty_input_never_fails() {
    let report = DashboardReport::build(&[], &FilterConfig::default());
    assert_eq!(report.summary.total_events, 0);
    assert!(report.user_stage_stats.is_empty());
    assert!(first_clear_all_stages(&[]).is_empty());
}
