//! Name to identifier resolution
//!
//! Parsed employees reference managers by name. Before anything is persisted
//! each one gets a generated [`EmployeeId`] and manager names are swapped for
//! ids through a lookup table that lives only for this call.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::model::{Employee, EmployeeId, OrganizationId, ParsedEmployee};
use crate::validate::batch::find_cycles;

/// Persistable employees plus the name table used to build them
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    pub employees: Vec<Employee>,
    pub ids_by_name: HashMap<String, EmployeeId>,
    /// Names whose manager link was cut because it closed a cycle
    pub severed: Vec<String>,
    /// Repeated names that were skipped; the first occurrence is kept
    pub duplicates: Vec<String>,
}

impl ResolvedImport {
    pub fn id_of(&self, name: &str) -> Option<EmployeeId> {
        self.ids_by_name.get(name).copied()
    }
}

/// Assign ids and resolve manager names for one organization.
///
/// Names are the lookup key, so a repeated name keeps only its first row and
/// the rest are reported in `duplicates`. Dangling manager names become
/// `None`, so orphans persist as roots. For each cycle the link that closes it
/// is dropped, leaving the stored set a forest.
pub fn resolve_employees(parsed: &[ParsedEmployee], organization_id: OrganizationId) -> ResolvedImport {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    let unique: Vec<&ParsedEmployee> = parsed
        .iter()
        .filter(|p| {
            if seen.insert(p.name.as_str()) {
                return true;
            }
            warn!(employee = %p.name, row = p.row, "skipping repeated employee name");
            duplicates.push(p.name.clone());
            false
        })
        .collect();

    let ids_by_name: HashMap<String, EmployeeId> = unique
        .iter()
        .map(|p| (p.name.clone(), EmployeeId::generate()))
        .collect();

    let manager_names: HashMap<&str, &str> = unique
        .iter()
        .copied()
        .filter_map(|p| {
            let manager = p.manager_name.as_deref()?;
            ids_by_name
                .contains_key(manager)
                .then_some((p.name.as_str(), manager))
        })
        .collect();

    let order: Vec<&str> = unique.iter().map(|p| p.name.as_str()).collect();
    let cycles = find_cycles(&order, |name| manager_names.get(name).copied());
    let severed: Vec<String> = cycles
        .iter()
        .filter_map(|path| path.len().checked_sub(2).map(|i| path[i].to_string()))
        .collect();
    for name in &severed {
        warn!(employee = %name, "dropping manager link that closes a reporting cycle");
    }

    let employees: Vec<Employee> = unique
        .iter()
        .map(|p| {
            let manager_id = if severed.contains(&p.name) {
                None
            } else {
                manager_names
                    .get(p.name.as_str())
                    .and_then(|m| ids_by_name.get(*m))
                    .copied()
            };
            Employee {
                id: ids_by_name[&p.name],
                name: p.name.clone(),
                title: p.title.clone(),
                organization_id,
                manager_id,
                custom_fields: p.custom_fields.clone(),
            }
        })
        .collect();

    debug!(
        employees = employees.len(),
        severed = severed.len(),
        duplicates = duplicates.len(),
        "resolved employee identifiers"
    );
    ResolvedImport {
        employees,
        ids_by_name,
        severed,
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn parsed(name: &str, manager: Option<&str>, row: usize) -> ParsedEmployee {
        ParsedEmployee {
            name: name.to_string(),
            title: String::new(),
            manager_name: manager.map(str::to_string),
            custom_fields: BTreeMap::new(),
            row,
        }
    }

    #[test]
    fn test_managers_resolved_to_ids() {
        let org = OrganizationId::generate();
        let resolved = resolve_employees(
            &[parsed("CEO", None, 2), parsed("VP", Some("CEO"), 3)],
            org,
        );
        let ceo = resolved.id_of("CEO").expect("ceo id");
        assert_eq!(resolved.employees[1].manager_id, Some(ceo));
        assert_eq!(resolved.employees[0].manager_id, None);
        assert!(resolved.employees.iter().all(|e| e.organization_id == org));
        assert!(resolved.severed.is_empty());
    }

    #[test]
    fn test_dangling_manager_dropped() {
        let resolved = resolve_employees(
            &[parsed("Ada", Some("Ghost"), 2)],
            OrganizationId::generate(),
        );
        assert_eq!(resolved.employees[0].manager_id, None);
    }

    #[test]
    fn test_cycle_closing_link_severed() {
        let resolved = resolve_employees(
            &[
                parsed("A", Some("B"), 2),
                parsed("B", Some("C"), 3),
                parsed("C", Some("A"), 4),
            ],
            OrganizationId::generate(),
        );
        assert_eq!(resolved.severed, vec!["C".to_string()]);
        let c = resolved.employees.iter().find(|e| e.name == "C").expect("C");
        assert_eq!(c.manager_id, None);
        let a = resolved.employees.iter().find(|e| e.name == "A").expect("A");
        assert_eq!(a.manager_id, resolved.id_of("B"));
    }

    #[test]
    fn test_self_reference_severed() {
        let resolved = resolve_employees(
            &[parsed("Solo", Some("Solo"), 2)],
            OrganizationId::generate(),
        );
        assert_eq!(resolved.severed, vec!["Solo".to_string()]);
        assert_eq!(resolved.employees[0].manager_id, None);
    }

    #[test]
    fn test_repeated_names_keep_first_row() {
        let resolved = resolve_employees(
            &[
                parsed("Ada", None, 2),
                parsed("Bob", Some("Ada"), 3),
                parsed("Ada", Some("Bob"), 4),
            ],
            OrganizationId::generate(),
        );
        assert_eq!(resolved.employees.len(), 2);
        assert_eq!(resolved.duplicates, vec!["Ada".to_string()]);
        assert_eq!(resolved.employees[0].manager_id, None);
        assert!(resolved.severed.is_empty());

        let ids: HashSet<EmployeeId> = resolved.employees.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 2);
    }
}
