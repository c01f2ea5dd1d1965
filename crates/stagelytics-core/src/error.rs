use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The `Custom Event Properties` cell held something other than a JSON object.
    /// `row` is 1-based and counts data rows only (the header is not a row).
    #[error("row {row}: malformed properties JSON: {source}")]
    InvalidProperties {
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("row {row}: missing required column '{column}'")]
    MissingColumn { row: usize, column: &'static str },

    #[error("row {row}: unknown event action '{value}'")]
    UnknownAction { row: usize, value: String },

    #[error("csv error: {0}")]
    Csv(String),

    #[error("unrecognised data file name: {0}")]
    InvalidFileName(String),
}

impl CoreError {
    /// Data row the error refers to, when it came from ingestion.
    pub fn row(&self) -> Option<usize> {
        match self {
            CoreError::InvalidProperties { row, .. }
            | CoreError::MissingColumn { row, .. }
            | CoreError::UnknownAction { row, .. } => Some(*row),
            _ => None,
        }
    }
}
