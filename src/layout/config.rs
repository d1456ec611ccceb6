//! Configuration for the layout engine

use serde::Deserialize;

use super::error::LayoutError;

/// Spacing constants for layout computation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of every node card
    pub node_width: f64,

    /// Height of every node card
    pub node_height: f64,

    /// Vertical distance between the tops of consecutive levels
    pub level_height: f64,

    /// Horizontal gap between sibling subtrees
    pub sibling_spacing: f64,

    /// Horizontal gap between root subtrees
    pub root_spacing: f64,

    /// Children per row before a fan-out wraps
    pub max_children_per_row: usize,

    /// Left edge of the first root subtree
    pub base_x: f64,

    /// Top of the root level
    pub base_y: f64,

    /// Margin added around the visible area when culling
    pub viewport_buffer: f64,

    /// Employee count above which parents start collapsed
    pub large_hierarchy_threshold: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 200.0,
            node_height: 80.0,
            level_height: 150.0,
            sibling_spacing: 20.0,
            root_spacing: 60.0,
            max_children_per_row: 4,
            base_x: 40.0,
            base_y: 40.0,
            viewport_buffer: 200.0,
            large_hierarchy_threshold: 100,
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the node card size
    pub fn with_node_size(mut self, width: f64, height: f64) -> Self {
        self.node_width = width;
        self.node_height = height;
        self
    }

    pub fn with_level_height(mut self, height: f64) -> Self {
        self.level_height = height;
        self
    }

    pub fn with_sibling_spacing(mut self, spacing: f64) -> Self {
        self.sibling_spacing = spacing;
        self
    }

    pub fn with_root_spacing(mut self, spacing: f64) -> Self {
        self.root_spacing = spacing;
        self
    }

    /// Set how many children fit on one row
    pub fn with_max_children_per_row(mut self, count: usize) -> Self {
        self.max_children_per_row = count;
        self
    }

    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.base_x = x;
        self.base_y = y;
        self
    }

    pub fn with_viewport_buffer(mut self, buffer: f64) -> Self {
        self.viewport_buffer = buffer;
        self
    }

    pub fn with_large_hierarchy_threshold(mut self, threshold: usize) -> Self {
        self.large_hierarchy_threshold = threshold;
        self
    }

    /// Reject settings the engine cannot lay out with
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.max_children_per_row == 0 {
            return Err(LayoutError::invalid_config(
                "max_children_per_row",
                "must be at least 1",
            ));
        }
        for (field, value) in [("node_width", self.node_width), ("node_height", self.node_height)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LayoutError::invalid_config(field, "must be a positive number"));
            }
        }
        for (field, value) in [
            ("sibling_spacing", self.sibling_spacing),
            ("root_spacing", self.root_spacing),
            ("viewport_buffer", self.viewport_buffer),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LayoutError::invalid_config(field, "must not be negative"));
            }
        }
        // Rows must not overlap the row above them.
        if !(self.level_height.is_finite() && self.level_height >= self.node_height) {
            return Err(LayoutError::invalid_config(
                "level_height",
                "must be at least node_height",
            ));
        }
        Ok(())
    }
}
