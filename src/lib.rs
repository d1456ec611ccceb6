//! Orgchart Engine - hierarchy ingestion, validation, and layout
//!
//! This library turns an uploaded spreadsheet grid into a validated reporting
//! hierarchy, guards manager changes against cycles, and lays the resulting
//! forest out for rendering.
//!
//! # Example
//!
//! ```rust
//! use orgchart_engine::{import_grid, Grid};
//!
//! let grid = Grid::from_strings(vec![
//!     vec!["Name", "Title", "Manager"],
//!     vec!["CEO", "Chief", ""],
//!     vec!["VP", "Lead", "CEO"],
//! ]);
//! let report = import_grid(&grid).unwrap();
//! assert_eq!(report.statistics.total_employees, 2);
//! assert_eq!(report.hierarchy["CEO"].direct_reports, vec!["VP"]);
//! ```

pub mod config;
pub mod edit;
pub mod error;
pub mod ingest;
pub mod layout;
pub mod model;
pub mod validate;

pub use config::{ConfigError, EngineConfig};
pub use edit::{add_employee, commit_move, InMemoryDirectory, MoveResponse, SaveFlow, SaveState};
pub use error::ImportError;
pub use ingest::{ImportReport, ResolvedImport};
pub use layout::{CollapseState, LayoutConfig, LayoutError, LayoutResult, Viewport};
pub use model::{Employee, EmployeeId, Grid, OrgForest, Organization, OrganizationId, Principal};
pub use validate::{validate_move, EditErrorCode, EditRejection, MoveRequest};

use thiserror::Error;

/// Errors that can occur in the import-and-layout pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Error while importing the grid
    #[error("import error: {0}")]
    Import(#[from] ImportError),

    /// Error during layout
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
}

/// Import a grid with default configuration
///
/// This is the main ingestion entry point. It identifies columns, builds the
/// name-keyed hierarchy, and runs batch validation.
pub fn import_grid(grid: &Grid) -> Result<ImportReport, ImportError> {
    import_grid_with_config(grid, &EngineConfig::default())
}

/// Import a grid with custom configuration
///
/// # Example
///
/// ```rust
/// use orgchart_engine::{import_grid_with_config, EngineConfig, Grid};
/// use orgchart_engine::ingest::NormalizerConfig;
///
/// let config = EngineConfig::new().with_normalizer(NormalizerConfig {
///     sample_rows: 10,
///     ..NormalizerConfig::default()
/// });
/// let grid = Grid::from_strings(vec![vec!["Name"], vec!["Ada"]]);
/// let report = import_grid_with_config(&grid, &config).unwrap();
/// assert!(report.validation.is_valid);
/// ```
pub fn import_grid_with_config(
    grid: &Grid,
    config: &EngineConfig,
) -> Result<ImportReport, ImportError> {
    ingest::import(grid, &config.normalizer)
}

/// A grid imported into one organization and laid out
#[derive(Debug, Clone)]
pub struct Chart {
    pub report: ImportReport,
    pub resolved: ResolvedImport,
    pub layout: LayoutResult,
}

/// Import a grid, assign ids within `organization_id`, and compute the first
/// layout with large hierarchies pre-collapsed
pub fn chart_grid(
    grid: &Grid,
    organization_id: OrganizationId,
    config: &EngineConfig,
) -> Result<Chart, PipelineError> {
    let report = import_grid_with_config(grid, config)?;
    let resolved = ingest::resolve_employees(&report.employees, organization_id);

    let forest = OrgForest::new(&resolved.employees);
    let collapsed = CollapseState::initial(&forest, config.layout.large_hierarchy_threshold);
    let layout = layout::compute(&forest, &collapsed, &config.layout)?;

    Ok(Chart {
        report,
        resolved,
        layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scenario_grid() -> Grid {
        Grid::from_strings(vec![
            vec!["Name", "Title", "Manager"],
            vec!["CEO", "Chief", ""],
            vec!["VP", "Lead", "CEO"],
            vec!["IC", "Dev", "VP"],
        ])
    }

    #[test]
    fn test_import_scenario() {
        let report = import_grid(&scenario_grid()).unwrap();

        assert_eq!(report.statistics.total_employees, 3);
        assert_eq!(report.statistics.root_employees, 1);
        assert_eq!(report.statistics.orphaned_employees, 0);
        assert_eq!(report.statistics.total_errors, 0);
        assert_eq!(report.root_employees[0].name, "CEO");
        assert_eq!(report.hierarchy["CEO"].direct_reports, vec!["VP".to_string()]);
    }

    #[test]
    fn test_move_ceo_under_ic_is_circular() {
        let report = import_grid(&scenario_grid()).unwrap();
        let org = OrganizationId::generate();
        let resolved = ingest::resolve_employees(&report.employees, org);
        let directory = InMemoryDirectory::new()
            .with_organization(Organization {
                id: org,
                name: "Acme".into(),
                owner_id: "owner".into(),
                member_ids: vec![],
            })
            .with_employees(resolved.employees.clone());

        let request = MoveRequest::new(
            resolved.id_of("CEO").unwrap(),
            resolved.id_of("IC").unwrap(),
        );
        let err = validate_move(&directory, &Principal::new("owner"), &request).unwrap_err();
        assert_eq!(err.code, EditErrorCode::CircularRelationship);
    }

    #[test]
    fn test_chart_grid_lays_out_every_employee() {
        let chart = chart_grid(
            &scenario_grid(),
            OrganizationId::generate(),
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(chart.layout.nodes.len(), 3);
        assert_eq!(chart.layout.connectors.len(), 2);
        assert!(chart.resolved.severed.is_empty());
    }

    #[test]
    fn test_chart_grid_without_name_column() {
        let grid = Grid::from_strings(vec![vec!["Cost", "Qty"], vec!["12", "3"]]);
        let err = chart_grid(&grid, OrganizationId::generate(), &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Import(ImportError::NoNameColumn { .. })));
    }
}
