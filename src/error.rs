//! Error types for ingestion

use thiserror::Error;

/// Hard failures that stop an import.
///
/// Row-level problems (empty names, duplicates, orphans, cycles) are not
/// errors here; they accumulate in the import report instead.
#[derive(Error, Debug)]
pub enum ImportError {
    /// No column could be recognised as holding employee names
    #[error("could not identify a name column: {analysis}")]
    NoNameColumn { analysis: String },

    /// The source contained no rows at all
    #[error("the uploaded data is empty")]
    EmptyGrid,

    #[error("failed to read delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read JSON grid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Create a missing name column error carrying the normalizer's analysis
    pub fn no_name_column(analysis: impl Into<String>) -> Self {
        Self::NoNameColumn {
            analysis: analysis.into(),
        }
    }

    /// Message suitable for showing to the person who uploaded the file
    pub fn user_message(&self) -> String {
        match self {
            ImportError::NoNameColumn { .. } => {
                "Could not identify a name column. Add a header such as \"Name\" or \"Employee Name\" and upload again.".to_string()
            }
            ImportError::EmptyGrid => "The uploaded file contains no rows.".to_string(),
            other => format!("The uploaded file could not be read: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_name_column_display() {
        let err = ImportError::no_name_column("no header matched");
        assert!(err.to_string().contains("could not identify a name column"));
        assert!(err.to_string().contains("no header matched"));
    }

    #[test]
    fn test_user_message_is_actionable() {
        let err = ImportError::no_name_column("x");
        assert!(err.user_message().contains("name column"));
        assert!(ImportError::EmptyGrid.user_message().contains("no rows"));
    }
}
