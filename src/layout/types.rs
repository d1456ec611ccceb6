//! Core types for the layout engine

use std::collections::HashMap;

use serde::Serialize;

use crate::model::EmployeeId;

/// A 2D point in the coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in model coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a zero-sized bounding box at the origin
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Right edge x-coordinate
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if this bounding box contains a point
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Check if this bounding box intersects another
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Compute the union of two bounding boxes (smallest box containing both)
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(x, y, right - x, bottom - y)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::zero()
    }
}

/// A positioned employee card.
///
/// `x` is the horizontal centre of the card, `y` its top edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: EmployeeId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Depth below the root, roots are level 0
    pub level: usize,
    /// Children are hidden from the layout
    pub collapsed: bool,
    pub has_children: bool,
    pub parent: Option<EmployeeId>,
    /// Row this node occupies among its parent's wrapped children
    pub row: usize,
    pub width: f64,
    pub height: f64,
    /// Horizontal space reserved for the node and everything shown below it
    pub subtree_width: f64,
    /// Levels used by the node and everything shown below it
    pub subtree_levels: usize,
}

impl LayoutNode {
    /// Card rectangle
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.x - self.width / 2.0, self.y, self.width, self.height)
    }

    /// Horizontal span reserved for this subtree, as `(left, right)`
    pub fn subtree_extent(&self) -> (f64, f64) {
        let half = self.subtree_width / 2.0;
        (self.x - half, self.x + half)
    }

    /// Where connectors leave the card
    pub fn bottom_center(&self) -> Point {
        Point::new(self.x, self.y + self.height)
    }

    /// Where connectors enter the card
    pub fn top_center(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Orthogonal line from a manager down to one report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    pub from: EmployeeId,
    pub to: EmployeeId,
    pub path: Vec<Point>,
}

impl Connector {
    /// Route down from `parent`, across at `mid_y`, and down into `child`
    pub fn between(parent: &LayoutNode, child: &LayoutNode, mid_y: f64) -> Self {
        let start = parent.bottom_center();
        let end = child.top_center();
        Self {
            from: parent.id,
            to: child.id,
            path: vec![
                start,
                Point::new(start.x, mid_y),
                Point::new(end.x, mid_y),
                end,
            ],
        }
    }
}

/// Positioned nodes and connectors for one collapsed-set snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutResult {
    pub nodes: Vec<LayoutNode>,
    pub connectors: Vec<Connector>,
    pub bounds: BoundingBox,
    #[serde(skip)]
    index: HashMap<EmployeeId, usize>,
}

impl LayoutResult {
    pub fn new(nodes: Vec<LayoutNode>, connectors: Vec<Connector>) -> Self {
        let bounds = nodes
            .iter()
            .map(LayoutNode::bounds)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_default();
        let index = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        Self {
            nodes,
            connectors,
            bounds,
            index,
        }
    }

    /// Find a node by employee id
    pub fn node(&self, id: &EmployeeId) -> Option<&LayoutNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
