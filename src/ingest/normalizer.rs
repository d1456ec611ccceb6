//! Column inference for uploaded spreadsheets
//!
//! Works out which column holds the employee name, which holds the manager's
//! name, and which holds the job title. Header names are tried first; when a
//! header gives no answer the first few data rows are scored for how much
//! they look like person names.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Grid;

const HEADER_MATCH_CONFIDENCE: f64 = 0.4;
const CONTENT_MATCH_CONFIDENCE: f64 = 0.2;
const BOTH_COLUMNS_BONUS: f64 = 0.2;
const REPETITION_BONUS: f64 = 0.3;

/// Settings for column inference
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Case-insensitive header names that mark the name column, in priority order
    pub name_patterns: Vec<String>,
    /// Header names that mark the manager column
    pub manager_patterns: Vec<String>,
    /// Header names that mark the title column
    pub title_patterns: Vec<String>,
    /// Number of data rows sampled by the content fallback
    pub sample_rows: usize,
    /// Unique/total ratio below which a column counts as repeating
    pub repetition_ratio: f64,
    /// Minimum content score for a name column
    pub name_threshold: f64,
    /// Minimum content score for a manager column
    pub manager_threshold: f64,
    /// Share of a candidate manager column's values that must be employee names
    pub manager_match_ratio: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            name_patterns: owned(&[
                "name",
                "employee name",
                "full name",
                "employee",
                "person",
                "staff name",
            ]),
            manager_patterns: owned(&[
                "manager",
                "supervisor",
                "reports to",
                "manager name",
                "reporting manager",
                "line manager",
                "boss",
            ]),
            title_patterns: owned(&["title", "role", "position", "job title", "designation"]),
            sample_rows: 5,
            repetition_ratio: 0.8,
            name_threshold: 0.5,
            manager_threshold: 0.8,
            manager_match_ratio: 0.5,
        }
    }
}

/// Result of column inference
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnIdentification {
    pub name_column: Option<usize>,
    pub manager_column: Option<usize>,
    pub title_column: Option<usize>,
    /// Overall confidence in [0, 1]
    pub confidence: f64,
    /// Human-readable rationale
    pub analysis: String,
}

impl ColumnIdentification {
    fn unidentified(analysis: impl Into<String>) -> Self {
        Self {
            name_column: None,
            manager_column: None,
            title_column: None,
            confidence: 0.0,
            analysis: analysis.into(),
        }
    }
}

/// Infer the name, manager, and title columns of a grid.
///
/// Never fails. A grid without headers or data rows yields no columns, zero
/// confidence, and an analysis saying why.
pub fn identify_columns(grid: &Grid, config: &NormalizerConfig) -> ColumnIdentification {
    if grid.is_empty() || grid.column_count() == 0 {
        return ColumnIdentification::unidentified("No headers found in the uploaded data");
    }
    if grid.data_row_count() == 0 {
        return ColumnIdentification::unidentified("No data rows found below the header row");
    }

    let headers = grid.headers();
    let mut assigned: HashSet<usize> = HashSet::new();
    let mut notes: Vec<String> = Vec::new();
    let mut confidence: f64 = 0.0;

    let mut header_pass = |patterns: &[String], field: &str| -> Option<usize> {
        let col = match_header(&headers, patterns, &assigned)?;
        assigned.insert(col);
        confidence += HEADER_MATCH_CONFIDENCE;
        notes.push(format!(
            "{} column '{}' matched by header",
            field, headers[col]
        ));
        Some(col)
    };

    let mut name_column = header_pass(&config.name_patterns, "Name");
    let mut manager_column = header_pass(&config.manager_patterns, "Manager");
    let title_column = header_pass(&config.title_patterns, "Title");

    if name_column.is_none() || manager_column.is_none() {
        let samples = sample_columns(grid, config.sample_rows, &assigned);

        if name_column.is_none() {
            if let Some((col, score)) = best_column(&samples, name_score, config.name_threshold) {
                name_column = Some(col);
                assigned.insert(col);
                confidence += CONTENT_MATCH_CONFIDENCE;
                notes.push(format!(
                    "Name column '{}' inferred from content (score {:.2})",
                    headers[col], score
                ));
            }
        }

        if let (None, Some(name_col)) = (manager_column, name_column) {
            let known = column_values(grid, name_col);
            let remaining: Vec<(usize, Vec<String>)> = samples
                .into_iter()
                .filter(|(col, _)| !assigned.contains(col))
                .filter(|(col, values)| {
                    let share = reference_share(values, &known);
                    if share <= config.manager_match_ratio {
                        debug!(column = %headers[*col], share, "values are not employee names");
                        return false;
                    }
                    true
                })
                .collect();
            let ratio = config.repetition_ratio;
            if let Some((col, score)) = best_column(
                &remaining,
                |values| manager_score(values, ratio),
                config.manager_threshold,
            ) {
                manager_column = Some(col);
                confidence += CONTENT_MATCH_CONFIDENCE;
                notes.push(format!(
                    "Manager column '{}' inferred from content (score {:.2})",
                    headers[col], score
                ));
            }
        }
    }

    if name_column.is_some() && manager_column.is_some() {
        confidence += BOTH_COLUMNS_BONUS;
    }
    if name_column.is_none() {
        notes.push("No name column could be identified".to_string());
    }
    if manager_column.is_none() {
        notes.push(
            "No manager column identified; every employee will be treated as a root".to_string(),
        );
    }
    if title_column.is_none() {
        notes.push("No title column identified".to_string());
    }

    let result = ColumnIdentification {
        name_column,
        manager_column,
        title_column,
        confidence: confidence.clamp(0.0, 1.0),
        analysis: notes.join("; "),
    };
    debug!(
        name = ?result.name_column,
        manager = ?result.manager_column,
        title = ?result.title_column,
        confidence = result.confidence,
        "identified columns"
    );
    result
}

/// First header, scanning left to right, equal to any pattern
fn match_header(headers: &[String], patterns: &[String], taken: &HashSet<usize>) -> Option<usize> {
    headers.iter().enumerate().find_map(|(col, header)| {
        if taken.contains(&col) {
            return None;
        }
        let header = header.trim().to_lowercase();
        patterns
            .iter()
            .any(|p| p.trim().to_lowercase() == header)
            .then_some(col)
    })
}

/// Non-empty values of the first `limit` data rows for each unassigned column
fn sample_columns(
    grid: &Grid,
    limit: usize,
    taken: &HashSet<usize>,
) -> Vec<(usize, Vec<String>)> {
    let last_row = grid.data_row_count().min(limit);
    (0..grid.column_count())
        .filter(|col| !taken.contains(col))
        .map(|col| {
            let values = (1..=last_row)
                .map(|row| grid.cell_text(row, col))
                .filter(|v| !v.is_empty())
                .collect();
            (col, values)
        })
        .collect()
}

/// Every non-empty value of a column below the header
fn column_values(grid: &Grid, col: usize) -> HashSet<String> {
    (1..=grid.data_row_count())
        .map(|row| grid.cell_text(row, col))
        .filter(|v| !v.is_empty())
        .collect()
}

/// Fraction of values that name someone in `known`
fn reference_share(values: &[String], known: &HashSet<String>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let hits = values.iter().filter(|v| known.contains(*v)).count();
    hits as f64 / values.len() as f64
}

/// Highest-scoring column above the threshold; ties go to the leftmost
fn best_column<F>(
    samples: &[(usize, Vec<String>)],
    score: F,
    threshold: f64,
) -> Option<(usize, f64)>
where
    F: Fn(&[String]) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for (col, values) in samples {
        let s = score(values);
        if s <= threshold {
            continue;
        }
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((*col, s));
        }
    }
    best
}

fn name_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\p{L}\s'\-]+$").expect("name pattern is valid"))
}

/// Average per-value score of how much a column looks like person names
pub fn name_score(values: &[String]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: f64 = values.iter().map(|v| value_name_score(v)).sum();
    total / values.len() as f64
}

fn value_name_score(value: &str) -> f64 {
    let mut score = 0.0;
    if name_value_pattern().is_match(value) {
        score += 1.0;
    }
    if value.split_whitespace().count() >= 2 {
        score += 0.5;
    }
    if value.chars().any(|c| c.is_ascii_digit()) {
        score -= 1.0;
    }
    if value
        .chars()
        .any(|c| c.is_ascii_punctuation() && c != '\'' && c != '-')
    {
        score -= 0.5;
    }
    score
}

/// Name score plus a bonus when values repeat, as manager names do
pub fn manager_score(values: &[String], repetition_ratio: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&String> = values.iter().collect();
    let ratio = unique.len() as f64 / values.len() as f64;
    let bonus = if ratio < repetition_ratio {
        REPETITION_BONUS
    } else {
        0.0
    };
    name_score(values) + bonus
}
