//! Tree construction from normalized rows
//!
//! Turns grid rows into [`ParsedEmployee`] records, links each one to its
//! manager by name, and partitions them into roots and subordinates. Bad rows
//! never abort the build; they are skipped and described in `errors`.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{Grid, ParsedEmployee};
use crate::validate::batch::cycle_errors;

use super::normalizer::ColumnIdentification;

/// Resolved column indices used to read a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSelection {
    pub name_column: usize,
    /// `None` means the sheet has no manager column and every row is a root
    pub manager_column: Option<usize>,
    pub title_column: Option<usize>,
}

impl ColumnSelection {
    pub fn new(name_column: usize) -> Self {
        Self {
            name_column,
            manager_column: None,
            title_column: None,
        }
    }

    pub fn with_manager(mut self, column: usize) -> Self {
        self.manager_column = Some(column);
        self
    }

    pub fn with_title(mut self, column: usize) -> Self {
        self.title_column = Some(column);
        self
    }

    /// Selection from inferred columns; `None` without a name column
    pub fn from_identification(columns: &ColumnIdentification) -> Option<Self> {
        Some(Self {
            name_column: columns.name_column?,
            manager_column: columns.manager_column,
            title_column: columns.title_column,
        })
    }

    fn is_reserved(&self, col: usize) -> bool {
        col == self.name_column
            || self.manager_column == Some(col)
            || self.title_column == Some(col)
    }
}

/// One node of the name-keyed hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEntry {
    pub employee: ParsedEmployee,
    /// Names of direct reports, in row order
    pub direct_reports: Vec<String>,
    /// Declared manager name, whether or not it resolves
    pub manager_id: Option<String>,
}

/// Everything the builder produces
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalStructure {
    pub employees: Vec<ParsedEmployee>,
    pub hierarchy: BTreeMap<String, HierarchyEntry>,
    pub root_employees: Vec<ParsedEmployee>,
    /// Employees whose declared manager is unknown; they are also roots
    pub orphaned_employees: Vec<ParsedEmployee>,
    pub errors: Vec<String>,
}

/// Build a hierarchy from the data rows of `grid`.
///
/// Row numbers in error messages are 1-based with the header as row 1.
pub fn build_hierarchy(grid: &Grid, columns: &ColumnSelection) -> HierarchicalStructure {
    let mut structure = HierarchicalStructure::default();
    let headers = grid.headers();
    let mut seen: HashSet<String> = HashSet::new();

    for row in 1..grid.row_count() {
        let row_number = row + 1;
        let name = grid.cell_text(row, columns.name_column);
        if name.is_empty() {
            structure
                .errors
                .push(format!("Row {}: Empty employee name", row_number));
            continue;
        }
        if !seen.insert(name.clone()) {
            structure.errors.push(format!(
                "Row {}: Duplicate employee name \"{}\"",
                row_number, name
            ));
            continue;
        }

        let manager_name = columns
            .manager_column
            .map(|col| grid.cell_text(row, col))
            .filter(|m| !m.is_empty());
        let title = columns
            .title_column
            .map(|col| grid.cell_text(row, col))
            .unwrap_or_default();

        let custom_fields = headers
            .iter()
            .enumerate()
            .filter(|(col, header)| !columns.is_reserved(*col) && !header.is_empty())
            .filter_map(|(col, header)| {
                let value = grid.cell_text(row, col);
                (!value.is_empty()).then(|| (header.clone(), value))
            })
            .collect();

        structure.employees.push(ParsedEmployee {
            name,
            title,
            manager_name,
            custom_fields,
            row: row_number,
        });
    }

    link_managers(&mut structure);

    let order: Vec<String> = structure.employees.iter().map(|e| e.name.clone()).collect();
    let cycles = cycle_errors(&structure.hierarchy, &order);
    for error in &cycles {
        warn!("{}", error);
    }
    structure.errors.extend(cycles);

    debug!(
        employees = structure.employees.len(),
        roots = structure.root_employees.len(),
        orphans = structure.orphaned_employees.len(),
        errors = structure.errors.len(),
        "built hierarchy"
    );
    structure
}

/// Group employees under their managers and classify roots and orphans
fn link_managers(structure: &mut HierarchicalStructure) {
    for employee in &structure.employees {
        structure.hierarchy.insert(
            employee.name.clone(),
            HierarchyEntry {
                employee: employee.clone(),
                direct_reports: Vec::new(),
                manager_id: employee.manager_name.clone(),
            },
        );
    }

    for employee in &structure.employees {
        match &employee.manager_name {
            None => structure.root_employees.push(employee.clone()),
            Some(manager) => match structure.hierarchy.get_mut(manager) {
                Some(entry) => entry.direct_reports.push(employee.name.clone()),
                None => {
                    warn!(employee = %employee.name, manager = %manager, "manager not found");
                    structure.errors.push(format!(
                        "Row {}: Manager \"{}\" not found for employee \"{}\"",
                        employee.row, manager, employee.name
                    ));
                    structure.root_employees.push(employee.clone());
                    structure.orphaned_employees.push(employee.clone());
                }
            },
        }
    }
}
