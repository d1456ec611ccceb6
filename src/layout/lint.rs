//! Lint engine for detecting defects in a computed layout.
//!
//! Runs after placement to check for mechanical issues: overlapping subtree
//! extents within a row, overlapping cards anywhere, and connectors whose
//! endpoints are not laid out.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::model::EmployeeId;

use super::types::{LayoutNode, LayoutResult};

/// Tolerance for touching edges
const EPSILON: f64 = 0.5;

/// A lint warning about a layout defect
#[derive(Debug, Clone, PartialEq)]
pub struct LintWarning {
    pub category: LintCategory,
    pub message: String,
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Category of lint defect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintCategory {
    Overlap,
    Connector,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::Overlap => write!(f, "overlap"),
            LintCategory::Connector => write!(f, "connector"),
        }
    }
}

/// Run all lint checks on a completed layout.
pub fn check(result: &LayoutResult) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    check_row_extents(result, &mut warnings);
    check_cards(result, &mut warnings);
    check_connectors(result, &mut warnings);
    warnings
}

// ── Row extents ───────────────────────────────────────────────────

/// Siblings sharing a wrapped row (and roots, which share the top row) must
/// not reserve overlapping horizontal space.
fn check_row_extents(result: &LayoutResult, warnings: &mut Vec<LintWarning>) {
    let mut rows: BTreeMap<(Option<EmployeeId>, usize), Vec<&LayoutNode>> = BTreeMap::new();
    for node in &result.nodes {
        rows.entry((node.parent, node.row)).or_default().push(node);
    }

    for siblings in rows.values_mut() {
        siblings.sort_by(|a, b| a.x.total_cmp(&b.x));
        for pair in siblings.windows(2) {
            let (_, left_end) = pair[0].subtree_extent();
            let (right_start, _) = pair[1].subtree_extent();
            if left_end - right_start > EPSILON {
                warnings.push(LintWarning {
                    category: LintCategory::Overlap,
                    message: format!(
                        "subtrees of \"{}\" and \"{}\" overlap by {:.1}",
                        pair[0].name,
                        pair[1].name,
                        left_end - right_start
                    ),
                });
            }
        }
    }
}

// ── Cards ─────────────────────────────────────────────────────────

fn check_cards(result: &LayoutResult, warnings: &mut Vec<LintWarning>) {
    let mut nodes: Vec<&LayoutNode> = result.nodes.iter().collect();
    nodes.sort_by(|a, b| a.bounds().x.total_cmp(&b.bounds().x));

    for (i, a) in nodes.iter().enumerate() {
        let a_box = a.bounds();
        for b in &nodes[i + 1..] {
            let b_box = b.bounds();
            if b_box.x >= a_box.right() - EPSILON {
                break;
            }
            let vertical = a_box.bottom().min(b_box.bottom()) - a_box.y.max(b_box.y);
            if vertical > EPSILON {
                warnings.push(LintWarning {
                    category: LintCategory::Overlap,
                    message: format!("cards \"{}\" and \"{}\" overlap", a.name, b.name),
                });
            }
        }
    }
}

// ── Connectors ────────────────────────────────────────────────────

fn check_connectors(result: &LayoutResult, warnings: &mut Vec<LintWarning>) {
    let laid_out: HashSet<EmployeeId> = result.nodes.iter().map(|n| n.id).collect();
    for connector in &result.connectors {
        for end in [connector.from, connector.to] {
            if !laid_out.contains(&end) {
                warnings.push(LintWarning {
                    category: LintCategory::Connector,
                    message: format!(
                        "connector {} -> {} references {} which is not laid out",
                        connector.from, connector.to, end
                    ),
                });
            }
        }
        if connector.path.len() < 2 {
            warnings.push(LintWarning {
                category: LintCategory::Connector,
                message: format!(
                    "connector {} -> {} has no drawable path",
                    connector.from, connector.to
                ),
            });
        }
    }
}
