//! The live set of collapsed nodes
//!
//! Collapsing hides a node's reports from the layout without touching the
//! hierarchy itself.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::model::{EmployeeId, OrgForest};

/// Ids of nodes whose children are currently hidden
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CollapseState {
    collapsed: BTreeSet<EmployeeId>,
}

impl CollapseState {
    /// Everything expanded
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a first load: above `threshold` employees every node with
    /// reports starts collapsed, otherwise everything is expanded.
    pub fn initial(forest: &OrgForest<'_>, threshold: usize) -> Self {
        if forest.len() > threshold {
            debug!(
                employees = forest.len(),
                threshold, "large hierarchy, collapsing all parents"
            );
            Self::collapsed_parents(forest)
        } else {
            Self::new()
        }
    }

    fn collapsed_parents(forest: &OrgForest<'_>) -> Self {
        Self {
            collapsed: forest
                .employees()
                .iter()
                .map(|e| e.id)
                .filter(|id| forest.has_children(id))
                .collect(),
        }
    }

    pub fn is_collapsed(&self, id: &EmployeeId) -> bool {
        self.collapsed.contains(id)
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    pub fn collapse(&mut self, id: EmployeeId) {
        self.collapsed.insert(id);
    }

    pub fn expand(&mut self, id: &EmployeeId) {
        self.collapsed.remove(id);
    }

    /// Flip one node; returns whether it is now collapsed
    pub fn toggle(&mut self, id: EmployeeId) -> bool {
        if self.collapsed.remove(&id) {
            false
        } else {
            self.collapsed.insert(id);
            true
        }
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    pub fn collapse_all(&mut self, forest: &OrgForest<'_>) {
        *self = Self::collapsed_parents(forest);
    }

    /// Expand every manager above `id` so that it becomes visible
    pub fn reveal(&mut self, forest: &OrgForest<'_>, id: &EmployeeId) {
        for ancestor in forest.ancestors(id) {
            self.collapsed.remove(&ancestor);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmployeeId> {
        self.collapsed.iter()
    }
}

impl FromIterator<EmployeeId> for CollapseState {
    fn from_iter<T: IntoIterator<Item = EmployeeId>>(iter: T) -> Self {
        Self {
            collapsed: iter.into_iter().collect(),
        }
    }
}
