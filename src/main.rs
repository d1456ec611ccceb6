//! Orgchart CLI
//!
//! Usage:
//!   orgchart [OPTIONS] <COMMAND>
//!
//! Commands:
//!   import <FILE>       Import a CSV/TSV or JSON grid and print the report
//!   layout <FILE>       Import a grid and print the computed layout
//!   check-move <FILE>   Check whether one manager change would be accepted
//!
//! Options:
//!   -c, --config <FILE>  Engine configuration (TOML format)
//!   -v, --verbose        Log debug detail to stderr
//!   -h, --help           Print help

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use orgchart_engine::ingest::read_grid;
use orgchart_engine::layout::{self, lint};
use orgchart_engine::validate::EditValidation;
use orgchart_engine::{
    chart_grid, validate_move, CollapseState, EngineConfig, Grid, InMemoryDirectory, MoveRequest,
    OrgForest, Organization, OrganizationId, Principal, Viewport,
};

/// Principal that owns the throwaway organization used by `check-move`
const CLI_USER: &str = "cli";

#[derive(Parser)]
#[command(name = "orgchart")]
#[command(about = "Import, validate, and lay out reporting hierarchies")]
struct Cli {
    /// Engine configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a grid and print the import report as JSON
    Import {
        /// CSV/TSV file, or a .json array of rows
        file: PathBuf,
    },

    /// Import a grid and print node positions and connectors as JSON
    Layout {
        file: PathBuf,

        /// Only print what a WIDTHxHEIGHT viewport can see
        #[arg(long, value_parser = parse_size)]
        viewport: Option<(f64, f64)>,

        /// Zoom factor applied to the viewport
        #[arg(long, default_value_t = 1.0)]
        zoom: f64,

        /// Pan offset as X,Y in screen pixels
        #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
        pan: Option<(f64, f64)>,

        /// Expand every node even for large hierarchies
        #[arg(long)]
        expand_all: bool,
    },

    /// Check whether moving EMPLOYEE under MANAGER would be accepted
    CheckMove {
        file: PathBuf,

        /// Name of the employee to move
        #[arg(long)]
        employee: String,

        /// Name of the new manager
        #[arg(long)]
        manager: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Import { file } => {
            let grid = load_grid(&file);
            match orgchart_engine::import_grid_with_config(&grid, &config) {
                Ok(report) => print_json(&report),
                Err(e) => {
                    eprintln!("Error: {}", e.user_message());
                    process::exit(1);
                }
            }
        }
        Command::Layout {
            file,
            viewport,
            zoom,
            pan,
            expand_all,
        } => run_layout(&file, &config, viewport, zoom, pan, expand_all),
        Command::CheckMove {
            file,
            employee,
            manager,
        } => run_check_move(&file, &config, &employee, &manager),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run_layout(
    file: &Path,
    config: &EngineConfig,
    viewport: Option<(f64, f64)>,
    zoom: f64,
    pan: Option<(f64, f64)>,
    expand_all: bool,
) {
    let grid = load_grid(file);
    let chart = match chart_grid(&grid, OrganizationId::generate(), config) {
        Ok(chart) => chart,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = if expand_all {
        let forest = OrgForest::new(&chart.resolved.employees);
        match layout::compute(&forest, &CollapseState::new(), &config.layout) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    } else {
        chart.layout
    };

    for warning in lint::check(&result) {
        eprintln!("warning: {}", warning);
    }

    match viewport {
        Some((width, height)) => {
            let (pan_x, pan_y) = pan.unwrap_or((0.0, 0.0));
            let view = Viewport::new(width, height)
                .with_pan(pan_x, pan_y)
                .with_zoom(zoom);
            match layout::cull(&result, &view, &config.layout) {
                Ok(visible) => print_json(&visible),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        None => print_json(&result),
    }
}

fn run_check_move(file: &Path, config: &EngineConfig, employee: &str, manager: &str) {
    let grid = load_grid(file);
    let organization_id = OrganizationId::generate();
    let chart = match chart_grid(&grid, organization_id, config) {
        Ok(chart) => chart,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let directory = InMemoryDirectory::new()
        .with_organization(Organization {
            id: organization_id,
            name: file.display().to_string(),
            owner_id: CLI_USER.to_string(),
            member_ids: Vec::new(),
        })
        .with_employees(chart.resolved.employees);

    let lookup = |name: &str| match directory.find_by_name(name) {
        Some(e) => e.id,
        None => {
            let suggestions = directory.similar_names(name, 2);
            if suggestions.is_empty() {
                eprintln!("Error: no employee named '{}'", name);
            } else {
                eprintln!(
                    "Error: no employee named '{}' (did you mean: {}?)",
                    name,
                    suggestions.join(", ")
                );
            }
            process::exit(1);
        }
    };
    let request = MoveRequest::new(lookup(employee), lookup(manager));

    let result = validate_move(&directory, &Principal::new(CLI_USER), &request);
    print_json(&EditValidation::from(&result));
    if result.is_err() {
        process::exit(1);
    }
}

fn load_grid(path: &Path) -> Grid {
    match read_grid(path) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e.user_message());
            process::exit(1);
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: failed to encode output: {}", e);
            process::exit(1);
        }
    }
}

/// Parse `WIDTHxHEIGHT`
fn parse_size(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    Ok((parse_number(w)?, parse_number(h)?))
}

/// Parse `X,Y`
fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    Ok((parse_number(x)?, parse_number(y)?))
}

fn parse_number(s: &str) -> Result<f64, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s.trim()))
}
