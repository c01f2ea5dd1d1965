//! Names of exported tutorial data files.
//!
//! Exports are named
//! `<project>_<YYYY-MM-DD>_HH_mm_ss+00_00-<YYYY-MM-DD>_HH_mm_ss+00_00_<rest>.csv`.
//! Only names of that shape are ever listed or opened, which also keeps path
//! separators out of anything the server joins onto its data directory.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFileInfo {
    pub file_name: String,
    pub project: String,
    /// `"<start> ~ <end>"`.
    pub display_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn file_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^([^_/\\]+)_(\d{4}-\d{2}-\d{2})_\d{2}_\d{2}_\d{2}\+\d{2}_\d{2}-(\d{4}-\d{2}-\d{2})_\d{2}_\d{2}_\d{2}\+\d{2}_\d{2}_[^/\\]*\.csv$",
            )
            .ok()
        })
        .as_ref()
}

pub fn parse_data_file_name(file_name: &str) -> Result<DataFileInfo> {
    let invalid = || CoreError::InvalidFileName(file_name.to_string());
    let caps = file_pattern()
        .and_then(|re| re.captures(file_name))
        .ok_or_else(invalid)?;
    let date = |idx: usize| -> Result<(String, NaiveDate)> {
        let raw = caps.get(idx).ok_or_else(invalid)?.as_str();
        let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
        Ok((raw.to_string(), parsed))
    };
    let (start_raw, start_date) = date(2)?;
    let (end_raw, end_date) = date(3)?;
    let project = caps.get(1).ok_or_else(invalid)?.as_str().to_string();

    Ok(DataFileInfo {
        file_name: file_name.to_string(),
        project,
        display_name: format!("{start_raw} ~ {end_raw}"),
        start_date,
        end_date,
    })
}

/// Recognised data files among `names`, newest start date first. Anything
/// that does not parse is dropped.
pub fn list_data_files<I, S>(names: I) -> Vec<DataFileInfo>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut files: Vec<DataFileInfo> = names
        .into_iter()
        .filter_map(|name| parse_data_file_name(name.as_ref()).ok())
        .collect();
    files.sort_by(|a, b| {
        b.start_date
            .cmp(&a.start_date)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    files
}
