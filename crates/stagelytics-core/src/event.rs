use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The action column of a telemetry row.
///
/// `ClearIsFirst` / `FailIsFirst` are first-occurrence markers. They count as
/// clears / fails everywhere; the first-clear variant additionally feeds the
/// first-clear try-count distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventAction {
    #[serde(rename = "try")]
    Try,
    #[serde(rename = "clear")]
    Clear,
    #[serde(rename = "fail")]
    Fail,
    #[serde(rename = "clearIsFirst")]
    ClearIsFirst,
    #[serde(rename = "failIsFirst")]
    FailIsFirst,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Try => "try",
            EventAction::Clear => "clear",
            EventAction::Fail => "fail",
            EventAction::ClearIsFirst => "clearIsFirst",
            EventAction::FailIsFirst => "failIsFirst",
        }
    }

    pub fn is_try(self) -> bool {
        matches!(self, EventAction::Try)
    }

    pub fn is_clear(self) -> bool {
        matches!(self, EventAction::Clear | EventAction::ClearIsFirst)
    }

    pub fn is_fail(self) -> bool {
        matches!(self, EventAction::Fail | EventAction::FailIsFirst)
    }

    pub fn is_first_clear(self) -> bool {
        matches!(self, EventAction::ClearIsFirst)
    }
}

impl FromStr for EventAction {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "try" => Ok(EventAction::Try),
            "clear" => Ok(EventAction::Clear),
            "fail" => Ok(EventAction::Fail),
            "clearIsFirst" => Ok(EventAction::ClearIsFirst),
            "failIsFirst" => Ok(EventAction::FailIsFirst),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run ended early. Only `voluntary_exit` carries meaning for the
/// aggregates; any other value is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExitType {
    VoluntaryExit,
    Other(String),
}

impl From<String> for ExitType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "voluntary_exit" | "voluntaryExit" => ExitType::VoluntaryExit,
            _ => ExitType::Other(raw),
        }
    }
}

impl From<ExitType> for String {
    fn from(exit: ExitType) -> Self {
        match exit {
            ExitType::VoluntaryExit => "voluntary_exit".to_string(),
            ExitType::Other(raw) => raw,
        }
    }
}

/// Decoded `Custom Event Properties` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventProperties {
    /// Level the run ended on. Only meaningful on fail events.
    #[serde(default, alias = "lastLevel", skip_serializing_if = "Option::is_none")]
    pub last_level: Option<i64>,
    #[serde(default, alias = "exitType", skip_serializing_if = "Option::is_none")]
    pub exit_type: Option<ExitType>,
    #[serde(default, alias = "isRepeatPlay", skip_serializing_if = "Option::is_none")]
    pub is_repeat_play: Option<bool>,
}

/// One telemetry row after ingestion. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub category: String,
    pub action: EventAction,
    /// Stage identifier, numeric-coded (e.g. "2015").
    pub label: String,
    /// Opaque passthrough; no aggregate reads it.
    pub value: String,
    pub properties: EventProperties,
    pub user_id: Option<String>,
    pub country_code: Option<String>,
    pub country_name: Option<String>,
}

impl Event {
    pub fn is_try(&self) -> bool {
        self.action.is_try()
    }

    pub fn is_clear(&self) -> bool {
        self.action.is_clear()
    }

    pub fn is_fail(&self) -> bool {
        self.action.is_fail()
    }

    pub fn is_first_clear(&self) -> bool {
        self.action.is_first_clear()
    }

    pub fn is_voluntary_exit(&self) -> bool {
        self.is_fail() && matches!(self.properties.exit_type, Some(ExitType::VoluntaryExit))
    }

    pub fn is_repeat_play(&self) -> bool {
        self.properties.is_repeat_play == Some(true)
    }

    /// `last_level` of a fail event; `None` for every other action.
    pub fn fail_level(&self) -> Option<i64> {
        if self.is_fail() {
            self.properties.last_level
        } else {
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    const ALL: [EventAction; 5] = [
        EventAction::Try,
        EventAction::Clear,
        EventAction::Fail,
        EventAction::ClearIsFirst,
        EventAction::FailIsFirst,
    ];

    #[test]
    fn exactly_one_class_per_action() {
        for action in ALL {
            let hits = [action.is_try(), action.is_clear(), action.is_fail()]
                .iter()
                .filter(|b| **b)
                .count();
            assert_eq!(hits, 1, "{action} must fall in exactly one class");
            if action.is_first_clear() {
                assert!(action.is_clear());
            }
        }
    }

    #[test]
    fn first_variants_count_as_their_base_class() {
        assert!(EventAction::ClearIsFirst.is_clear());
        assert!(EventAction::FailIsFirst.is_fail());
        assert!(!EventAction::Clear.is_first_clear());
        assert!(!EventAction::FailIsFirst.is_first_clear());
    }

    #[test]
    fn action_parses_wire_names() {
        for action in ALL {
            assert_eq!(action.as_str().parse::<EventAction>(), Ok(action));
        }
        assert_eq!("retry".parse::<EventAction>(), Err("retry".to_string()));
    }

    #[test]
    fn voluntary_exit_requires_fail_action() {
        let mut clear = event(EventAction::Clear, "2001");
        clear.properties.exit_type = Some(ExitType::VoluntaryExit);
        assert!(!clear.is_voluntary_exit());

        let mut fail = event(EventAction::FailIsFirst, "2001");
        fail.properties.exit_type = Some(ExitType::VoluntaryExit);
        assert!(fail.is_voluntary_exit());
    }

    #[test]
    fn fail_level_only_on_fails() {
        assert_eq!(fail_at("2001", 7).fail_level(), Some(7));
        let mut clear = event(EventAction::Clear, "2001");
        clear.properties.last_level = Some(20);
        assert_eq!(clear.fail_level(), None);
    }

    #[test]
    fn unknown_exit_type_is_preserved() {
        let props: EventProperties =
            serde_json::from_str(r#"{"last_level":3,"exit_type":"timeout"}"#).expect("parse");
        assert_eq!(props.exit_type, Some(ExitType::Other("timeout".to_string())));
        let back = serde_json::to_string(&props).expect("serialize");
        assert!(back.contains("\"timeout\""));
    }
}
