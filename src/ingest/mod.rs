//! Ingestion: from an uploaded grid to a validated, name-keyed hierarchy
//!
//! The pipeline is grid → [`normalizer::identify_columns`] →
//! [`builder::build_hierarchy`] → batch validation, assembled into an
//! [`ImportReport`]. Persisting the result goes through
//! [`resolve::resolve_employees`].

pub mod builder;
pub mod normalizer;
pub mod resolve;
pub mod source;

pub use builder::{build_hierarchy, ColumnSelection, HierarchicalStructure, HierarchyEntry};
pub use normalizer::{identify_columns, ColumnIdentification, NormalizerConfig};
pub use resolve::{resolve_employees, ResolvedImport};
pub use source::{parse_grid, read_grid, SourceFormat};

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::error::ImportError;
use crate::model::{Grid, ParsedEmployee};
use crate::validate::batch::{check_consistency, ValidationSummary};

/// Counts shown alongside an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatistics {
    pub total_employees: usize,
    pub root_employees: usize,
    pub orphaned_employees: usize,
    pub total_errors: usize,
}

/// Complete result of importing one grid
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub employees: Vec<ParsedEmployee>,
    pub hierarchy: BTreeMap<String, HierarchyEntry>,
    pub root_employees: Vec<ParsedEmployee>,
    pub orphaned_employees: Vec<ParsedEmployee>,
    pub column_identification: ColumnIdentification,
    pub validation: ValidationSummary,
    pub statistics: ImportStatistics,
}

/// Run column inference, tree building, and batch validation over `grid`.
///
/// Only a missing name column is fatal. Every other problem ends up in
/// `validation.issues` next to whatever structure could be recovered.
pub fn import(grid: &Grid, config: &NormalizerConfig) -> Result<ImportReport, ImportError> {
    let columns = identify_columns(grid, config);
    let selection = ColumnSelection::from_identification(&columns)
        .ok_or_else(|| ImportError::no_name_column(columns.analysis.clone()))?;

    let structure = build_hierarchy(grid, &selection);

    let mut issues = structure.errors.clone();
    issues.extend(check_consistency(&structure.hierarchy));
    let validation = ValidationSummary::from_issues(issues);

    let statistics = ImportStatistics {
        total_employees: structure.employees.len(),
        root_employees: structure.root_employees.len(),
        orphaned_employees: structure.orphaned_employees.len(),
        total_errors: validation.issues.len(),
    };
    info!(
        employees = statistics.total_employees,
        roots = statistics.root_employees,
        orphans = statistics.orphaned_employees,
        errors = statistics.total_errors,
        "import complete"
    );

    let HierarchicalStructure {
        employees,
        hierarchy,
        root_employees,
        orphaned_employees,
        ..
    } = structure;

    Ok(ImportReport {
        employees,
        hierarchy,
        root_employees,
        orphaned_employees,
        column_identification: columns,
        validation,
        statistics,
    })
}
