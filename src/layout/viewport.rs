//! Viewport culling
//!
//! Maps the screen-space viewport back into model coordinates and keeps only
//! what falls inside it, so render cost follows the viewport and not the size
//! of the hierarchy.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::EmployeeId;

use super::config::LayoutConfig;
use super::error::LayoutError;
use super::types::{BoundingBox, Connector, LayoutNode, LayoutResult};

/// Pan, zoom, and screen size of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Screen-space translation applied after scaling
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Unpanned, unzoomed viewport of the given screen size
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
            width,
            height,
        }
    }

    pub fn with_pan(mut self, x: f64, y: f64) -> Self {
        self.pan_x = x;
        self.pan_y = y;
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    /// Visible rectangle in model coordinates, grown by `buffer` on each side
    pub fn visible_area(&self, buffer: f64) -> Result<BoundingBox, LayoutError> {
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(LayoutError::invalid_viewport("zoom must be positive"));
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(LayoutError::invalid_viewport(
                "width and height must be positive",
            ));
        }

        let x = -self.pan_x / self.zoom - buffer;
        let y = -self.pan_y / self.zoom - buffer;
        Ok(BoundingBox::new(
            x,
            y,
            self.width / self.zoom + 2.0 * buffer,
            self.height / self.zoom + 2.0 * buffer,
        ))
    }
}

/// The part of a layout worth rendering for one viewport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleLayout {
    pub nodes: Vec<LayoutNode>,
    pub connectors: Vec<Connector>,
    /// Model-space area that was tested against
    pub area: BoundingBox,
}

/// Keep nodes whose card intersects the visible area, and connectors with at
/// least one visible end
pub fn cull(
    layout: &LayoutResult,
    viewport: &Viewport,
    config: &LayoutConfig,
) -> Result<VisibleLayout, LayoutError> {
    let area = viewport.visible_area(config.viewport_buffer)?;

    let nodes: Vec<LayoutNode> = layout
        .nodes
        .iter()
        .filter(|n| n.bounds().intersects(&area))
        .cloned()
        .collect();
    let visible: HashSet<EmployeeId> = nodes.iter().map(|n| n.id).collect();
    let connectors = layout
        .connectors
        .iter()
        .filter(|c| visible.contains(&c.from) || visible.contains(&c.to))
        .cloned()
        .collect();

    Ok(VisibleLayout {
        nodes,
        connectors,
        area,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_area_with_pan_and_zoom() {
        let area = Viewport::new(800.0, 600.0)
            .with_pan(-400.0, -200.0)
            .with_zoom(2.0)
            .visible_area(0.0)
            .unwrap();
        assert_eq!(area, BoundingBox::new(200.0, 100.0, 400.0, 300.0));

        let buffered = Viewport::new(800.0, 600.0).visible_area(200.0).unwrap();
        assert_eq!(buffered, BoundingBox::new(-200.0, -200.0, 1200.0, 1000.0));
    }

    #[test]
    fn test_rejects_degenerate_viewport() {
        assert!(Viewport::new(800.0, 600.0).with_zoom(0.0).visible_area(0.0).is_err());
        assert!(Viewport::new(0.0, 600.0).visible_area(0.0).is_err());
    }
}
