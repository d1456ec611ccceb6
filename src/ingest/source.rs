//! Reading uploaded files into a [`Grid`]
//!
//! Delimited text (comma, semicolon, or tab separated) and JSON
//! array-of-arrays documents both end up as the same grid shape.

use std::path::Path;

use tracing::debug;

use crate::error::ImportError;
use crate::model::{CellValue, Grid};

const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Source encodings understood by [`read_grid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Json,
}

impl SourceFormat {
    /// Pick a format from a file extension; anything unknown is delimited text
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => SourceFormat::Json,
            _ => SourceFormat::Delimited,
        }
    }
}

/// Read a file into a grid, choosing the decoder by extension
pub fn read_grid(path: &Path) -> Result<Grid, ImportError> {
    let text = std::fs::read_to_string(path)?;
    parse_grid(&text, SourceFormat::from_path(path))
}

pub fn parse_grid(text: &str, format: SourceFormat) -> Result<Grid, ImportError> {
    let grid = match format {
        SourceFormat::Delimited => grid_from_delimited(text)?,
        SourceFormat::Json => grid_from_json(text)?,
    };
    if grid.is_empty() {
        return Err(ImportError::EmptyGrid);
    }
    Ok(grid)
}

/// Parse delimited text; ragged rows are kept as they are
pub fn grid_from_delimited(text: &str) -> Result<Grid, ImportError> {
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(text);
    debug!(delimiter = %(delimiter as char).escape_default(), "reading delimited text");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(CellValue::from).collect());
    }
    Ok(Grid::new(rows))
}

/// Parse a JSON document shaped as an array of row arrays
pub fn grid_from_json(text: &str) -> Result<Grid, ImportError> {
    Ok(serde_json::from_str(text)?)
}

/// The candidate delimiter that occurs most often in the first line
fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or_default();
    let mut best = b',';
    let mut best_count = 0;
    for candidate in CANDIDATE_DELIMITERS {
        let count = first_line.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_separated() {
        let grid = grid_from_delimited("Name,Manager\nAda,\nBob,Ada\n").expect("valid csv");
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.cell_text(2, 1), "Ada");
        assert!(grid.rows()[1][1].is_blank());
    }

    #[test]
    fn test_semicolon_and_tab_sniffed() {
        let grid = grid_from_delimited("Name;Manager\nBob;Ada\n").expect("valid");
        assert_eq!(grid.cell_text(1, 1), "Ada");
        let grid = grid_from_delimited("Name\tManager\nBob\tAda\n").expect("valid");
        assert_eq!(grid.cell_text(1, 1), "Ada");
    }

    #[test]
    fn test_quoted_fields_and_bom() {
        let grid = grid_from_delimited("\u{feff}Name,Title\n\"Lovelace, Ada\",Eng\n")
            .expect("valid");
        assert_eq!(grid.cell_text(0, 0), "Name");
        assert_eq!(grid.cell_text(1, 0), "Lovelace, Ada");
    }

    #[test]
    fn test_ragged_rows_accepted() {
        let grid = grid_from_delimited("Name,Manager,Team\nAda\nBob,Ada,Core\n").expect("valid");
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.cell_text(1, 2), "");
    }

    #[test]
    fn test_json_grid() {
        let grid = parse_grid(r#"[["Name","Age"],["Ada",36]]"#, SourceFormat::Json)
            .expect("valid json");
        assert_eq!(grid.cell_text(1, 1), "36");
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = parse_grid("", SourceFormat::Delimited);
        assert!(matches!(result, Err(ImportError::EmptyGrid)));
        let result = parse_grid("[]", SourceFormat::Json);
        assert!(matches!(result, Err(ImportError::EmptyGrid)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = parse_grid("{not json", SourceFormat::Json);
        assert!(matches!(result, Err(ImportError::Json(_))));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("org.JSON")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("org.csv")), SourceFormat::Delimited);
        assert_eq!(SourceFormat::from_path(Path::new("org")), SourceFormat::Delimited);
    }
}
