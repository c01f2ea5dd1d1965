//! Raw row → [`Event`] normalisation.
//!
//! This is the only place that touches the untyped, string-keyed row shape
//! produced by the CSV collaborator. Everything downstream works on `Event`.

use std::collections::HashMap;

use crate::error::{CoreError, Result};
use crate::event::{Event, EventAction, EventProperties};

/// One CSV data row keyed by header name.
pub type RawRow = HashMap<String, String>;

pub const COL_CATEGORY: &str = "Event Category";
pub const COL_ACTION: &str = "Event Action";
pub const COL_LABEL: &str = "Event Label";
pub const COL_VALUE: &str = "Event Value";
pub const COL_PROPERTIES: &str = "Custom Event Properties";
pub const COL_USER_ID: &str = "User ID";
pub const COL_COUNTRY_NAME: &str = "Client IP Country";
pub const COL_COUNTRY_CODE: &str = "Client IP Country Code";

/// Decode a properties cell. Blank cells yield empty properties.
pub fn parse_properties(raw: &str) -> serde_json::Result<EventProperties> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(EventProperties::default());
    }
    serde_json::from_str(trimmed)
}

/// Non-empty cell value, or `None` when the column is absent or blank.
pub(crate) fn optional_cell(row: &RawRow, column: &str) -> Option<String> {
    row.get(column)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required_cell(row: &RawRow, column: &'static str, row_no: usize) -> Result<String> {
    optional_cell(row, column).ok_or(CoreError::MissingColumn {
        row: row_no,
        column,
    })
}

/// Normalise a single row. `row_no` is 1-based and only used for error context.
pub fn normalize_row(row: &RawRow, row_no: usize) -> Result<Event> {
    let raw_action = required_cell(row, COL_ACTION, row_no)?;
    let action = raw_action
        .parse::<EventAction>()
        .map_err(|value| CoreError::UnknownAction { row: row_no, value })?;
    let label = required_cell(row, COL_LABEL, row_no)?;

    let properties = match row.get(COL_PROPERTIES) {
        Some(raw) => parse_properties(raw)
            .map_err(|source| CoreError::InvalidProperties { row: row_no, source })?,
        None => EventProperties::default(),
    };

    Ok(Event {
        category: row.get(COL_CATEGORY).cloned().unwrap_or_default(),
        action,
        label,
        value: row.get(COL_VALUE).cloned().unwrap_or_default(),
        properties,
        user_id: optional_cell(row, COL_USER_ID),
        country_code: optional_cell(row, COL_COUNTRY_CODE),
        country_name: optional_cell(row, COL_COUNTRY_NAME),
    })
}

/// Normalise every row, preserving input order.
///
/// Fails on the first bad row; no row is ever silently dropped.
pub fn normalize_rows(rows: &[RawRow]) -> Result<Vec<Event>> {
    let events = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| normalize_row(row, idx + 1))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(rows = rows.len(), "normalised telemetry rows");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ExitType;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_full_row() {
        let r = row(&[
            (COL_CATEGORY, "stage"),
            (COL_ACTION, "failIsFirst"),
            (COL_LABEL, "3004"),
            (COL_VALUE, "x"),
            (
                COL_PROPERTIES,
                r#"{"last_level": 12, "exit_type": "voluntary_exit", "is_repeat_play": true}"#,
            ),
            (COL_USER_ID, "u-1"),
            (COL_COUNTRY_NAME, "Korea"),
            (COL_COUNTRY_CODE, "KR"),
        ]);
        let event = normalize_row(&r, 1).expect("row");
        assert_eq!(event.action, EventAction::FailIsFirst);
        assert_eq!(event.label, "3004");
        assert_eq!(event.properties.last_level, Some(12));
        assert_eq!(event.properties.exit_type, Some(ExitType::VoluntaryExit));
        assert!(event.is_repeat_play());
        assert_eq!(event.user_id.as_deref(), Some("u-1"));
        assert_eq!(event.country_code.as_deref(), Some("KR"));
        assert_eq!(event.country_name.as_deref(), Some("Korea"));
    }

    #[test]
    fn blank_optional_columns_are_absent() {
        let r = row(&[
            (COL_ACTION, "try"),
            (COL_LABEL, "2001"),
            (COL_PROPERTIES, ""),
            (COL_USER_ID, "  "),
        ]);
        let event = normalize_row(&r, 1).expect("row");
        assert_eq!(event.user_id, None);
        assert_eq!(event.country_code, None);
        assert_eq!(event.properties, EventProperties::default());
        assert_eq!(event.category, "");
    }

    #[test]
    fn camel_case_property_keys_are_accepted() {
        let props = parse_properties(r#"{"lastLevel": 4, "isRepeatPlay": false}"#).expect("props");
        assert_eq!(props.last_level, Some(4));
        assert_eq!(props.is_repeat_play, Some(false));
    }

    #[test]
    fn malformed_properties_fail_the_whole_call() {
        let rows = vec![
            row(&[(COL_ACTION, "try"), (COL_LABEL, "2001")]),
            row(&[
                (COL_ACTION, "fail"),
                (COL_LABEL, "2001"),
                (COL_PROPERTIES, "{last_level: 3"),
            ]),
        ];
        let err = normalize_rows(&rows).expect_err("must fail");
        assert!(matches!(err, CoreError::InvalidProperties { row: 2, .. }));
        assert_eq!(err.row(), Some(2));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let r = row(&[(COL_ACTION, "retry"), (COL_LABEL, "2001")]);
        match normalize_row(&r, 9) {
            Err(CoreError::UnknownAction { row, value }) => {
                assert_eq!(row, 9);
                assert_eq!(value, "retry");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_label_is_rejected() {
        let r = row(&[(COL_ACTION, "try")]);
        assert!(matches!(
            normalize_row(&r, 1),
            Err(CoreError::MissingColumn {
                column: COL_LABEL,
                ..
            })
        ));
    }

    #[test]
    fn output_order_matches_input() {
        let rows: Vec<RawRow> = ["2003", "2001", "2002", "2001"]
            .iter()
            .map(|label| row(&[(COL_ACTION, "try"), (COL_LABEL, label)]))
            .collect();
        let labels: Vec<String> = normalize_rows(&rows)
            .expect("rows")
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(labels, vec!["2003", "2001", "2002", "2001"]);
    }
}
