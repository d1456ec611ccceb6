//! Tree layout: subtree measurement and two-pass placement
//!
//! Wide fan-outs wrap into rows of at most `max_children_per_row` children.
//! A wrapped row starts below the deepest subtree of the row above it, so a
//! node's height in levels is `1 +` the sum of each row's tallest child.
//!
//! All traversals are iterative and carry a visited set, so a malformed
//! forest cannot recurse without bound.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::model::{EmployeeId, OrgForest};

use super::collapse::CollapseState;
use super::config::LayoutConfig;
use super::error::LayoutError;
use super::types::{Connector, LayoutNode, LayoutResult};

/// Measured size of one visible subtree
#[derive(Debug, Clone, Copy, PartialEq)]
struct Extent {
    width: f64,
    levels: usize,
}

/// Visible shape of the forest after collapsing
struct VisibleTree {
    /// Pre-order, roots in forest order
    order: Vec<EmployeeId>,
    roots: Vec<EmployeeId>,
    children: HashMap<EmployeeId, Vec<EmployeeId>>,
}

impl VisibleTree {
    fn children(&self, id: &EmployeeId) -> &[EmployeeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Where a node sits relative to its parent
#[derive(Debug, Clone, Copy)]
struct Slot {
    level: usize,
    row: usize,
    parent: Option<EmployeeId>,
    /// Extra vertical offset from wrapped rows above this node
    offset: f64,
}

/// Compute positions for every visible node and the connectors between them.
///
/// Employees that no root reaches (members of a manager cycle) are left out.
pub fn compute(
    forest: &OrgForest<'_>,
    collapsed: &CollapseState,
    config: &LayoutConfig,
) -> Result<LayoutResult, LayoutError> {
    config.validate()?;

    let tree = visible_tree(forest, collapsed);
    if tree.order.len() < forest.len() {
        let hidden = forest.unreachable().len();
        if hidden > 0 {
            warn!(count = hidden, "employees outside any tree were not laid out");
        }
    }

    let extents = measure(&tree, config);
    let slots = assign_slots(&tree, &extents, config);
    let centers = assign_x(&tree, &extents, config);

    let mut nodes = Vec::with_capacity(tree.order.len());
    for id in &tree.order {
        let (Some(employee), Some(slot), Some(extent), Some(&x)) = (
            forest.get(id),
            slots.get(id),
            extents.get(id),
            centers.get(id),
        ) else {
            continue;
        };
        let has_children = forest.has_children(id);
        nodes.push(LayoutNode {
            id: *id,
            name: employee.name.clone(),
            x,
            y: config.base_y + slot.level as f64 * config.level_height + slot.offset,
            level: slot.level,
            collapsed: has_children && collapsed.is_collapsed(id),
            has_children,
            parent: slot.parent,
            row: slot.row,
            width: config.node_width,
            height: config.node_height,
            subtree_width: extent.width,
            subtree_levels: extent.levels,
        });
    }

    let connectors = connect(&nodes, config);
    debug!(
        nodes = nodes.len(),
        connectors = connectors.len(),
        "layout computed"
    );
    Ok(LayoutResult::new(nodes, connectors))
}

/// Walk down from the roots, stopping below collapsed nodes
fn visible_tree(forest: &OrgForest<'_>, collapsed: &CollapseState) -> VisibleTree {
    let mut order = Vec::with_capacity(forest.len());
    let mut children: HashMap<EmployeeId, Vec<EmployeeId>> = HashMap::new();
    let mut seen: HashSet<EmployeeId> = HashSet::new();

    let mut stack: Vec<EmployeeId> = forest.roots().iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        order.push(id);
        if collapsed.is_collapsed(&id) {
            continue;
        }
        let kids: Vec<EmployeeId> = forest
            .children(&id)
            .iter()
            .copied()
            .filter(|c| !seen.contains(c))
            .collect();
        stack.extend(kids.iter().rev().copied());
        if !kids.is_empty() {
            children.insert(id, kids);
        }
    }

    VisibleTree {
        order,
        roots: forest.roots().to_vec(),
        children,
    }
}

/// Subtree width and height, children before parents
fn measure(tree: &VisibleTree, config: &LayoutConfig) -> HashMap<EmployeeId, Extent> {
    let mut extents: HashMap<EmployeeId, Extent> = HashMap::with_capacity(tree.order.len());

    for id in tree.order.iter().rev() {
        let kids = tree.children(id);
        if kids.is_empty() {
            extents.insert(
                *id,
                Extent {
                    width: config.node_width,
                    levels: 1,
                },
            );
            continue;
        }

        let child = |c: &EmployeeId| {
            extents.get(c).copied().unwrap_or(Extent {
                width: config.node_width,
                levels: 1,
            })
        };
        let mut width = config.node_width;
        let mut levels = 1;
        for row in kids.chunks(config.max_children_per_row) {
            width = width.max(row_width(row.iter().map(|c| child(c).width), config));
            levels += row.iter().map(|c| child(c).levels).max().unwrap_or(1);
        }

        extents.insert(*id, Extent { width, levels });
    }

    extents
}

fn row_width(widths: impl Iterator<Item = f64>, config: &LayoutConfig) -> f64 {
    let (sum, count) = widths.fold((0.0, 0usize), |(sum, count), w| (sum + w, count + 1));
    sum + config.sibling_spacing * count.saturating_sub(1) as f64
}

/// Pass 1: level, wrapped row, and vertical offset of every node
fn assign_slots(
    tree: &VisibleTree,
    extents: &HashMap<EmployeeId, Extent>,
    config: &LayoutConfig,
) -> HashMap<EmployeeId, Slot> {
    let levels_of = |id: &EmployeeId| extents.get(id).map_or(1, |e| e.levels);
    let mut slots: HashMap<EmployeeId, Slot> = HashMap::with_capacity(tree.order.len());
    for root in &tree.roots {
        slots.insert(
            *root,
            Slot {
                level: 0,
                row: 0,
                parent: None,
                offset: 0.0,
            },
        );
    }

    // Pre-order guarantees the parent slot exists before its children.
    for id in &tree.order {
        let Some(&slot) = slots.get(id) else {
            continue;
        };
        // Levels taken by the rows already placed under this parent
        let mut shift = 0;
        for (row, chunk) in tree.children(id).chunks(config.max_children_per_row).enumerate() {
            for child in chunk {
                slots.insert(
                    *child,
                    Slot {
                        level: slot.level + 1,
                        row,
                        parent: Some(*id),
                        offset: slot.offset + shift as f64 * config.level_height,
                    },
                );
            }
            shift += chunk.iter().map(levels_of).max().unwrap_or(1);
        }
    }
    slots
}

/// Pass 2: horizontal centre of every node
fn assign_x(
    tree: &VisibleTree,
    extents: &HashMap<EmployeeId, Extent>,
    config: &LayoutConfig,
) -> HashMap<EmployeeId, f64> {
    let width_of = |id: &EmployeeId| extents.get(id).map_or(config.node_width, |e| e.width);
    let mut centers: HashMap<EmployeeId, f64> = HashMap::with_capacity(tree.order.len());

    let mut cursor = config.base_x;
    for root in &tree.roots {
        let width = width_of(root);
        centers.insert(*root, cursor + width / 2.0);
        cursor += width + config.root_spacing;
    }

    for id in &tree.order {
        let Some(&center) = centers.get(id) else {
            continue;
        };
        for row in tree.children(id).chunks(config.max_children_per_row) {
            let total = row_width(row.iter().map(width_of), config);
            let mut left = center - total / 2.0;
            for child in row {
                let width = width_of(child);
                centers.insert(*child, left + width / 2.0);
                left += width + config.sibling_spacing;
            }
        }
    }
    centers
}

/// One connector per visible parent/child pair, bending halfway into the gap
/// above the child
fn connect(nodes: &[LayoutNode], config: &LayoutConfig) -> Vec<Connector> {
    let by_id: HashMap<EmployeeId, &LayoutNode> = nodes.iter().map(|n| (n.id, n)).collect();
    let gap = (config.level_height - config.node_height) / 2.0;

    nodes
        .iter()
        .filter_map(|child| {
            let parent = by_id.get(&child.parent?)?;
            Some(Connector::between(parent, child, child.y - gap))
        })
        .collect()
}
