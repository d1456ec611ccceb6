//! Integration tests for batch and edge validation

use std::collections::BTreeMap;

use orgchart_engine::validate::{
    check_consistency, find_cycles, precheck_move, validate_employees, EditValidation,
};
use orgchart_engine::{
    validate_move, EditErrorCode, Employee, EmployeeId, InMemoryDirectory, MoveRequest,
    OrgForest, Organization, OrganizationId, Principal,
};
use pretty_assertions::assert_eq;

struct Org {
    id: OrganizationId,
    employees: Vec<Employee>,
}

impl Org {
    fn new() -> Self {
        Self {
            id: OrganizationId::generate(),
            employees: Vec::new(),
        }
    }

    fn hire(&mut self, name: &str, manager: Option<EmployeeId>) -> EmployeeId {
        let id = EmployeeId::generate();
        self.employees.push(Employee {
            id,
            name: name.to_string(),
            title: String::new(),
            organization_id: self.id,
            manager_id: manager,
            custom_fields: BTreeMap::new(),
        });
        id
    }

    fn directory(&self, owner: &str) -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_organization(Organization {
                id: self.id,
                name: "Acme".to_string(),
                owner_id: owner.to_string(),
                member_ids: vec!["member".to_string()],
            })
            .with_employees(self.employees.clone())
    }
}

#[test]
fn test_indirect_cycle_detected_by_edge_and_precheck() {
    let mut org = Org::new();
    let ceo = org.hire("CEO", None);
    let vp = org.hire("VP", Some(ceo));
    let ic = org.hire("IC", Some(vp));
    let dir = org.directory("owner");

    let request = MoveRequest::new(ceo, ic);
    let err = validate_move(&dir, &Principal::new("member"), &request).unwrap_err();
    assert_eq!(err.code, EditErrorCode::CircularRelationship);
    assert!(err.message.contains("\"CEO\""));

    let forest = OrgForest::new(&org.employees);
    let err = precheck_move(&forest, &ceo, &ic).unwrap_err();
    assert_eq!(err.code, EditErrorCode::CircularRelationship);
}

#[test]
fn test_no_false_cycles_for_sideways_moves() {
    let mut org = Org::new();
    let ceo = org.hire("CEO", None);
    let vp_a = org.hire("VP A", Some(ceo));
    let vp_b = org.hire("VP B", Some(ceo));
    let ic = org.hire("IC", Some(vp_a));
    let dir = org.directory("owner");
    let owner = Principal::new("owner");

    assert_eq!(validate_move(&dir, &owner, &MoveRequest::new(ic, vp_b)), Ok(()));
    assert_eq!(validate_move(&dir, &owner, &MoveRequest::new(vp_a, vp_b)), Ok(()));
    assert!(validate_employees(&org.employees).is_valid);
}

#[test]
fn test_self_management_whatever_the_data() {
    let org = Org::new();
    let dir = org.directory("owner");
    let stranger = Principal::new("stranger");
    let ghost = EmployeeId::generate();

    let result = validate_move(&dir, &stranger, &MoveRequest::new(ghost, ghost));
    let shape = EditValidation::from(&result);
    assert_eq!(
        shape,
        EditValidation {
            is_valid: false,
            error: Some("An employee cannot be their own manager".to_string()),
            error_code: Some(EditErrorCode::SelfManagement),
        }
    );
}

#[test]
fn test_scope_checks_run_in_order() {
    let mut org = Org::new();
    let a = org.hire("A", None);
    let b = org.hire("B", None);
    let mut other = Org::new();
    let x = other.hire("X", None);

    let dir = org
        .directory("owner")
        .with_employees(other.employees.clone());

    let intruder = Principal::new("intruder");
    assert_eq!(
        validate_move(&dir, &intruder, &MoveRequest::new(a, x)).unwrap_err().code,
        EditErrorCode::DifferentOrganizations
    );
    assert_eq!(
        validate_move(&dir, &intruder, &MoveRequest::new(a, b)).unwrap_err().code,
        EditErrorCode::UnauthorizedAccess
    );
    assert_eq!(
        validate_move(&dir, &intruder, &MoveRequest::new(EmployeeId::generate(), b))
            .unwrap_err()
            .code,
        EditErrorCode::EmployeeNotFound
    );
}

#[test]
fn test_batch_validation_is_idempotent() {
    let mut org = Org::new();
    let a = org.hire("A", None);
    let b = org.hire("B", Some(a));
    org.employees[0].manager_id = Some(b);
    let self_managed = org.hire("Solo", None);
    org.employees[2].manager_id = Some(self_managed);

    let first = validate_employees(&org.employees);
    let second = validate_employees(&org.employees);

    assert_eq!(first, second);
    assert_eq!(
        first.issues,
        vec![
            "Circular reporting relationship detected: A -> B -> A".to_string(),
            "Circular reporting relationship detected: Solo -> Solo".to_string(),
        ]
    );
}

#[test]
fn test_find_cycles_over_plain_keys() {
    let managers: BTreeMap<u32, u32> = [(1, 2), (2, 3), (3, 1), (4, 1), (5, 6)].into_iter().collect();
    let nodes: Vec<u32> = (1..=6).collect();
    let cycles = find_cycles(&nodes, |n| managers.get(n).copied());
    assert_eq!(cycles, vec![vec![1, 2, 3, 1]]);
}

#[test]
fn test_consistency_of_imported_hierarchy() {
    let grid = orgchart_engine::Grid::from_strings(vec![
        vec!["Name", "Manager"],
        vec!["Root", ""],
        vec!["Leaf", "Root"],
    ]);
    let mut report = orgchart_engine::import_grid(&grid).expect("Should import");
    assert!(check_consistency(&report.hierarchy).is_empty());

    if let Some(root) = report.hierarchy.get_mut("Root") {
        root.direct_reports.clear();
    }
    let issues = check_consistency(&report.hierarchy);
    assert_eq!(issues.len(), 1);
    assert!(issues[0].contains("\"Leaf\" reports to \"Root\""));
}
