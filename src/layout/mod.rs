//! Layout engine for positioning employee cards
//!
//! This module takes a persisted forest plus the live collapsed set and
//! computes card positions and connectors, producing a [`LayoutResult`].
//! [`cull`] then narrows a result down to what one viewport can see.
//! Layout is presentation only and never changes the hierarchy.

pub mod collapse;
pub mod config;
pub mod engine;
pub mod error;
pub mod lint;
pub mod types;
pub mod viewport;

pub use collapse::CollapseState;
pub use config::LayoutConfig;
pub use engine::compute;
pub use error::LayoutError;
pub use lint::{LintCategory, LintWarning};
pub use types::*;
pub use viewport::{cull, Viewport, VisibleLayout};
