//! Committing edits and tracking their save state
//!
//! [`commit_move`] and [`add_employee`] are the server-side operations: they
//! validate against a [`DirectoryMut`] and then write. [`SaveFlow`] is the
//! client-side state machine around a single optimistic move:
//!
//! ```text
//! Idle --begin--> Saving --finish(Ok)--> Applied
//!                   |
//!                   +----finish(Err)--> Reverted --retry--> Saving
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{Employee, EmployeeId, OrgForest, Organization, OrganizationId, Principal};
use crate::validate::edge::{
    check_access, validate_move, AccessFailure, Directory, DirectoryError, EditRejection,
    MoveRequest,
};
use crate::validate::precheck::precheck_move;

/// Write access on top of [`Directory`]
pub trait DirectoryMut: Directory {
    fn set_manager(
        &mut self,
        id: &EmployeeId,
        manager_id: Option<EmployeeId>,
    ) -> Result<(), DirectoryError>;

    fn insert_employee(&mut self, employee: Employee) -> Result<(), DirectoryError>;
}

/// Successful move response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub success: bool,
    pub employee_id: EmployeeId,
    pub new_manager_id: EmployeeId,
    pub previous_manager_id: Option<EmployeeId>,
}

/// Validate a move and, if it passes, write it.
///
/// A write that fails after validation passed is reported as
/// [`crate::validate::EditErrorCode::InternalError`].
pub fn commit_move<D>(
    directory: &mut D,
    principal: &Principal,
    request: &MoveRequest,
) -> Result<MoveResponse, EditRejection>
where
    D: DirectoryMut + ?Sized,
{
    validate_move(directory, principal, request)?;

    let previous_manager_id = directory
        .employee(&request.employee_id)
        .map_err(|e| EditRejection::internal(format!("Failed to reload employee: {}", e)))?
        .ok_or_else(|| EditRejection::employee_not_found(&request.employee_id))?
        .manager_id;

    directory
        .set_manager(&request.employee_id, Some(request.new_manager_id))
        .map_err(|e| {
            warn!(error = %e, employee = %request.employee_id, "failed to store new manager");
            EditRejection::internal(format!("Failed to save the change: {}", e))
        })?;

    info!(
        employee = %request.employee_id,
        manager = %request.new_manager_id,
        "manager changed"
    );
    Ok(MoveResponse {
        success: true,
        employee_id: request.employee_id,
        new_manager_id: request.new_manager_id,
        previous_manager_id,
    })
}

/// Fields for a new employee
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub name: String,
    pub title: String,
    pub organization_id: OrganizationId,
    pub manager_id: Option<EmployeeId>,
    pub custom_fields: BTreeMap<String, String>,
}

impl NewEmployee {
    pub fn new(name: impl Into<String>, organization_id: OrganizationId) -> Self {
        Self {
            name: name.into(),
            title: String::new(),
            organization_id,
            manager_id: None,
            custom_fields: BTreeMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_manager(mut self, manager_id: EmployeeId) -> Self {
        self.manager_id = Some(manager_id);
        self
    }
}

/// Add an employee, as a root or under an existing manager in the same scope.
///
/// A fresh id cannot close a cycle, so only existence, scope, and access are
/// checked. A failing directory read or write is rejected as
/// `INTERNAL_ERROR`.
pub fn add_employee<D>(
    directory: &mut D,
    principal: &Principal,
    new: NewEmployee,
) -> Result<Employee, EditRejection>
where
    D: DirectoryMut + ?Sized,
{
    let unverifiable = |e: DirectoryError| {
        warn!(error = %e, "could not load data for new employee, rejecting");
        EditRejection::internal(format!("Failed to load organization data: {}", e))
    };

    match check_access(directory, principal, &new.organization_id) {
        Ok(()) => {}
        Err(AccessFailure::Denied) => return Err(EditRejection::unauthorized()),
        Err(AccessFailure::Fault(e)) => return Err(unverifiable(e)),
    }

    if let Some(manager_id) = new.manager_id {
        let manager = directory
            .employee(&manager_id)
            .map_err(unverifiable)?
            .ok_or_else(|| EditRejection::manager_not_found(&manager_id))?;
        if manager.organization_id != new.organization_id {
            return Err(EditRejection::different_organizations());
        }
    }

    let employee = Employee {
        id: EmployeeId::generate(),
        name: new.name,
        title: new.title,
        organization_id: new.organization_id,
        manager_id: new.manager_id,
        custom_fields: new.custom_fields,
    };
    directory
        .insert_employee(employee.clone())
        .map_err(|e| EditRejection::internal(format!("Failed to save the employee: {}", e)))?;

    info!(employee = %employee.id, name = %employee.name, "employee added");
    Ok(employee)
}

// ============================================
// In-memory directory
// ============================================

/// A [`DirectoryMut`] held entirely in memory, in insertion order
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    organizations: HashMap<OrganizationId, Organization>,
    employees: Vec<Employee>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_organization(mut self, organization: Organization) -> Self {
        self.organizations.insert(organization.id, organization);
        self
    }

    pub fn with_employees(mut self, employees: impl IntoIterator<Item = Employee>) -> Self {
        self.employees.extend(employees);
        self
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.name == name)
    }

    /// Up to three names within `max_distance` edits of `name`, closest first
    pub fn similar_names(&self, name: &str, max_distance: usize) -> Vec<String> {
        let mut candidates: Vec<(&str, usize)> = self
            .employees
            .iter()
            .filter_map(|e| {
                let dist = levenshtein_distance(&e.name, name);
                (dist > 0 && dist <= max_distance).then_some((e.name.as_str(), dist))
            })
            .collect();

        candidates.sort_by_key(|(_, d)| *d);
        candidates
            .into_iter()
            .map(|(name, _)| name.to_string())
            .take(3)
            .collect()
    }
}

/// Compute Levenshtein edit distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

impl Directory for InMemoryDirectory {
    fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, DirectoryError> {
        Ok(self.employees.iter().find(|e| e.id == *id).cloned())
    }

    fn organization(&self, id: &OrganizationId) -> Result<Option<Organization>, DirectoryError> {
        Ok(self.organizations.get(id).cloned())
    }
}

impl DirectoryMut for InMemoryDirectory {
    fn set_manager(
        &mut self,
        id: &EmployeeId,
        manager_id: Option<EmployeeId>,
    ) -> Result<(), DirectoryError> {
        let employee = self
            .employees
            .iter_mut()
            .find(|e| e.id == *id)
            .ok_or_else(|| DirectoryError::Missing(id.to_string()))?;
        employee.manager_id = manager_id;
        Ok(())
    }

    fn insert_employee(&mut self, employee: Employee) -> Result<(), DirectoryError> {
        self.employees.push(employee);
        Ok(())
    }
}

// ============================================
// Save state machine
// ============================================

/// Where a single optimistic move currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum SaveState {
    Idle,
    /// Applied locally, waiting on the server
    Saving {
        request: MoveRequest,
        previous_manager_id: Option<EmployeeId>,
    },
    /// Confirmed by the server
    Applied { response: MoveResponse },
    /// Rolled back locally; the same request may be retried
    Reverted {
        request: MoveRequest,
        error: EditRejection,
    },
}

/// Illegal transitions of [`SaveFlow`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaveFlowError {
    #[error("a save is already in flight")]
    AlreadySaving,
    #[error("no save is in flight")]
    NotSaving,
    #[error("there is no failed save to retry")]
    NothingToRetry,
    #[error("employee {0} is not in the local snapshot")]
    UnknownEmployee(EmployeeId),
    #[error("move rejected before sending: {0}")]
    Rejected(EditRejection),
}

/// Drives one optimistic move through `idle → saving → {applied | reverted}`.
///
/// The caller owns the employee snapshot and the transport; this type only
/// mutates the snapshot and records state.
#[derive(Debug, Clone)]
pub struct SaveFlow {
    state: SaveState,
}

impl Default for SaveFlow {
    fn default() -> Self {
        Self {
            state: SaveState::Idle,
        }
    }
}

impl SaveFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.state, SaveState::Saving { .. })
    }

    /// Precheck the move, apply it to the snapshot, and enter `Saving`.
    ///
    /// A precheck failure leaves the snapshot untouched and moves to
    /// `Reverted` so the error can be shown next to the drag target.
    pub fn begin(
        &mut self,
        employees: &mut [Employee],
        request: MoveRequest,
    ) -> Result<(), SaveFlowError> {
        if self.is_saving() {
            return Err(SaveFlowError::AlreadySaving);
        }

        let precheck = {
            let forest = OrgForest::new(employees);
            precheck_move(&forest, &request.employee_id, &request.new_manager_id)
        };
        if let Err(error) = precheck {
            self.state = SaveState::Reverted {
                request,
                error: error.clone(),
            };
            return Err(SaveFlowError::Rejected(error));
        }

        let employee = find_mut(employees, &request.employee_id)?;
        let previous_manager_id = employee.manager_id;
        employee.manager_id = Some(request.new_manager_id);

        self.state = SaveState::Saving {
            request,
            previous_manager_id,
        };
        Ok(())
    }

    /// Record the server's answer; on failure the snapshot is rolled back
    pub fn finish(
        &mut self,
        employees: &mut [Employee],
        outcome: Result<MoveResponse, EditRejection>,
    ) -> Result<&SaveState, SaveFlowError> {
        let SaveState::Saving {
            request,
            previous_manager_id,
        } = self.state.clone()
        else {
            return Err(SaveFlowError::NotSaving);
        };

        self.state = match outcome {
            Ok(response) => SaveState::Applied { response },
            Err(error) => {
                find_mut(employees, &request.employee_id)?.manager_id = previous_manager_id;
                SaveState::Reverted { request, error }
            }
        };
        Ok(&self.state)
    }

    /// Start the last failed request again, returning it for resending
    pub fn retry(&mut self, employees: &mut [Employee]) -> Result<MoveRequest, SaveFlowError> {
        let SaveState::Reverted { request, .. } = &self.state else {
            return Err(SaveFlowError::NothingToRetry);
        };
        let request = *request;
        self.begin(employees, request)?;
        Ok(request)
    }

    /// Return to `Idle` once a result has been shown
    pub fn reset(&mut self) -> Result<(), SaveFlowError> {
        if self.is_saving() {
            return Err(SaveFlowError::AlreadySaving);
        }
        self.state = SaveState::Idle;
        Ok(())
    }
}

fn find_mut<'a>(
    employees: &'a mut [Employee],
    id: &EmployeeId,
) -> Result<&'a mut Employee, SaveFlowError> {
    employees
        .iter_mut()
        .find(|e| e.id == *id)
        .ok_or(SaveFlowError::UnknownEmployee(*id))
}
