//! Batch validation of a whole hierarchy
//!
//! Runs after an import, or over a persisted employee set, and reports every
//! problem found instead of stopping at the first one.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use serde::Serialize;

use crate::ingest::builder::HierarchyEntry;
use crate::model::{Employee, EmployeeId};

/// Outcome of a batch validation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

impl ValidationSummary {
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            is_valid: issues.is_empty(),
            issues,
        }
    }
}

/// Find every cycle in a manager-of relation.
///
/// Walks upward from each node in `nodes` order. A node met again while still
/// on the current walk closes a cycle; a node finished by an earlier walk is
/// not walked again, so the whole pass is linear. Each returned path starts
/// and ends with the same node.
pub fn find_cycles<K, F>(nodes: &[K], mut manager_of: F) -> Vec<Vec<K>>
where
    K: Clone + Eq + Hash,
    F: FnMut(&K) -> Option<K>,
{
    let mut visited: HashSet<K> = HashSet::new();
    let mut cycles = Vec::new();

    for start in nodes {
        if visited.contains(start) {
            continue;
        }
        let mut path: Vec<K> = Vec::new();
        let mut on_path: HashMap<K, usize> = HashMap::new();
        let mut current = Some(start.clone());

        while let Some(node) = current {
            if let Some(&pos) = on_path.get(&node) {
                let mut cycle = path[pos..].to_vec();
                cycle.push(node);
                cycles.push(cycle);
                break;
            }
            if !visited.insert(node.clone()) {
                break;
            }
            on_path.insert(node.clone(), path.len());
            path.push(node.clone());
            current = manager_of(&node);
        }
    }

    cycles
}

/// Format a cycle as `A -> B -> A`
pub fn describe_cycle(path: &[String]) -> String {
    format!(
        "Circular reporting relationship detected: {}",
        path.join(" -> ")
    )
}

/// Cycle errors for a name-keyed hierarchy, one per cycle.
///
/// `order` fixes the walk order so repeated runs report identical paths.
pub fn cycle_errors(hierarchy: &BTreeMap<String, HierarchyEntry>, order: &[String]) -> Vec<String> {
    find_cycles(order, |name| {
        hierarchy
            .get(name)
            .and_then(|entry| entry.manager_id.clone())
            .filter(|manager| hierarchy.contains_key(manager))
    })
    .iter()
    .map(|path| describe_cycle(path))
    .collect()
}

/// Check that manager links and direct-report lists mirror each other
pub fn check_consistency(hierarchy: &BTreeMap<String, HierarchyEntry>) -> Vec<String> {
    let mut issues = Vec::new();

    for (name, entry) in hierarchy {
        if let Some(manager) = &entry.manager_id {
            if let Some(manager_entry) = hierarchy.get(manager) {
                if !manager_entry.direct_reports.contains(name) {
                    issues.push(format!(
                        "Inconsistent hierarchy: \"{}\" reports to \"{}\" but is missing from their direct reports",
                        name, manager
                    ));
                }
            }
        }

        for report in &entry.direct_reports {
            let mirrored = hierarchy
                .get(report)
                .is_some_and(|child| child.manager_id.as_deref() == Some(name.as_str()));
            if !mirrored {
                issues.push(format!(
                    "Inconsistent hierarchy: \"{}\" lists \"{}\" as a direct report but \"{}\" does not report to them",
                    name, report, report
                ));
            }
        }
    }

    issues
}

/// Validate a persisted employee set: dangling managers, cross-organization
/// links, and cycles (self-management included).
pub fn validate_employees(employees: &[Employee]) -> ValidationSummary {
    let by_id: HashMap<EmployeeId, &Employee> = employees.iter().map(|e| (e.id, e)).collect();
    let mut issues = Vec::new();

    for employee in employees {
        let Some(manager_id) = employee.manager_id else {
            continue;
        };
        match by_id.get(&manager_id) {
            None => issues.push(format!(
                "Employee \"{}\" references unknown manager {}",
                employee.name, manager_id
            )),
            Some(manager) if manager.organization_id != employee.organization_id => {
                issues.push(format!(
                    "Employee \"{}\" reports to \"{}\" in a different organization",
                    employee.name, manager.name
                ))
            }
            Some(_) => {}
        }
    }

    let order: Vec<EmployeeId> = employees.iter().map(|e| e.id).collect();
    let cycles = find_cycles(&order, |id| {
        by_id
            .get(id)
            .and_then(|e| e.manager_id)
            .filter(|m| by_id.contains_key(m))
    });
    for cycle in cycles {
        let names: Vec<String> = cycle
            .iter()
            .map(|id| by_id.get(id).map(|e| e.name.clone()).unwrap_or_else(|| id.to_string()))
            .collect();
        issues.push(describe_cycle(&names));
    }

    ValidationSummary::from_issues(issues)
}
