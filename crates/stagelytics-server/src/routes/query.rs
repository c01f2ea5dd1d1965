use std::collections::BTreeSet;

use serde::Deserialize;

use stagelytics_core::filter::FilterConfig;
use stagelytics_core::stage::StageTypeFilter;
use stagelytics_core::tutorial::KeepOccurrence;

use crate::error::AppError;

/// Dashboard filter toggles as they arrive on the query string.
///
/// Everything is optional; an absent parameter leaves the matching toggle
/// off, so a bare request sees the unfiltered dataset.
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub exclude_voluntary_exits: Option<String>,
    pub exclude_repeat_plays: Option<String>,
    pub stage_type: Option<String>,
    /// Comma-separated country codes or names.
    pub countries: Option<String>,
}

impl FilterParams {
    pub fn to_filter(&self) -> Result<FilterConfig, AppError> {
        let stage_type = StageTypeFilter::parse(self.stage_type.as_deref()).map_err(|e| {
            AppError::InvalidField {
                field: "stage_type",
                message: e.to_string(),
            }
        })?;
        Ok(FilterConfig {
            exclude_voluntary_exits: parse_flag(
                self.exclude_voluntary_exits.as_deref(),
                "exclude_voluntary_exits",
            )?,
            exclude_repeat_plays: parse_flag(
                self.exclude_repeat_plays.as_deref(),
                "exclude_repeat_plays",
            )?,
            stage_type,
            countries: parse_list(self.countries.as_deref()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StageParams {
    pub stage_id: Option<String>,
}

impl StageParams {
    /// The trimmed stage id, treating an empty value as absent.
    pub fn stage_id(&self) -> Option<&str> {
        self.stage_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DedupeParams {
    pub dedupe: Option<String>,
}

impl DedupeParams {
    pub fn keep(&self) -> Result<Option<KeepOccurrence>, AppError> {
        KeepOccurrence::parse(self.dedupe.as_deref()).map_err(|e| AppError::InvalidField {
            field: "dedupe",
            message: e.to_string(),
        })
    }
}

pub(crate) fn parse_flag(value: Option<&str>, field: &'static str) -> Result<bool, AppError> {
    let Some(raw) = value else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "" | "false" | "0" => Ok(false),
        _ => Err(AppError::InvalidField {
            field,
            message: format!("{field} must be one of: true, false, 1, 0"),
        }),
    }
}

pub(crate) fn parse_list(value: Option<&str>) -> BTreeSet<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_query_is_noop() {
        let filter = FilterParams::default().to_filter().expect("filter");
        assert!(filter.is_noop());
    }

    #[test]
    fn flags_and_countries_parse() {
        let params = FilterParams {
            exclude_voluntary_exits: Some("true".into()),
            exclude_repeat_plays: Some("0".into()),
            stage_type: Some("elite".into()),
            countries: Some(" JP, ,US ".into()),
        };
        let filter = params.to_filter().expect("filter");
        assert!(filter.exclude_voluntary_exits);
        assert!(!filter.exclude_repeat_plays);
        assert_eq!(filter.stage_type, StageTypeFilter::Elite);
        assert_eq!(
            filter.countries.into_iter().collect::<Vec<_>>(),
            vec!["JP".to_string(), "US".to_string()]
        );
    }

    #[test]
    fn bad_values_name_their_field() {
        let params = FilterParams {
            stage_type: Some("boss".into()),
            ..Default::default()
        };
        match params.to_filter() {
            Err(AppError::InvalidField { field, .. }) => assert_eq!(field, "stage_type"),
            other => panic!("unexpected: {other:?}"),
        }
        match parse_flag(Some("maybe"), "exclude_repeat_plays") {
            Err(AppError::InvalidField { field, .. }) => {
                assert_eq!(field, "exclude_repeat_plays")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn blank_stage_id_is_absent() {
        let params = StageParams {
            stage_id: Some("  ".into()),
        };
        assert_eq!(params.stage_id(), None);
    }
}
