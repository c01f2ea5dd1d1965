//! CSV bodies → raw rows.

use std::io::Read;

use stagelytics_core::error::CoreError;
use stagelytics_core::ingest::RawRow;

/// Decode a header-row CSV into rows keyed by header name.
///
/// Blank lines and rows whose cells are all empty are skipped. Short rows are
/// accepted; the missing trailing columns are simply absent from the row.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RawRow>, CoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| CoreError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| CoreError::Csv(e.to_string()))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }
    tracing::debug!(rows = rows.len(), columns = headers.len(), "decoded csv");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_keyed_by_header() {
        let body = "Event Category,Event Action,Event Label,Custom Event Properties\n\
                    stage,fail,2001,\"{\"\"last_level\"\": 3}\"\n\
                    \n\
                    stage,try,2002\n";
        let rows = read_csv(body.as_bytes()).expect("csv");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Event Action"], "fail");
        assert_eq!(rows[0]["Custom Event Properties"], r#"{"last_level": 3}"#);
        assert_eq!(rows[1]["Event Label"], "2002");
        assert!(!rows[1].contains_key("Custom Event Properties"));
    }

    #[test]
    fn empty_body_has_no_rows() {
        assert!(read_csv("".as_bytes()).expect("csv").is_empty());
        assert!(read_csv("Event Action,Event Label\n".as_bytes())
            .expect("csv")
            .is_empty());
    }

    #[test]
    fn all_blank_rows_are_skipped() {
        let rows = read_csv("a,b\n,\n1,2\n".as_bytes()).expect("csv");
        assert_eq!(rows.len(), 1);
    }
}
