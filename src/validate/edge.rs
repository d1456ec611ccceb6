//! Edge-mode validation of a single proposed manager change
//!
//! Runs against the persisted employee set, reached through a [`Directory`],
//! before a reparent is committed. Checks run in a fixed order and stop at
//! the first failure. Any fault while loading data rejects the change as
//! circular rather than letting an unchecked edit through.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{Employee, EmployeeId, Organization, OrganizationId, Principal};

/// Machine-readable reason a change was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditErrorCode {
    EmployeeNotFound,
    ManagerNotFound,
    DifferentOrganizations,
    UnauthorizedAccess,
    SelfManagement,
    CircularRelationship,
    InternalError,
}

impl EditErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditErrorCode::EmployeeNotFound => "EMPLOYEE_NOT_FOUND",
            EditErrorCode::ManagerNotFound => "MANAGER_NOT_FOUND",
            EditErrorCode::DifferentOrganizations => "DIFFERENT_ORGANIZATIONS",
            EditErrorCode::UnauthorizedAccess => "UNAUTHORIZED_ACCESS",
            EditErrorCode::SelfManagement => "SELF_MANAGEMENT",
            EditErrorCode::CircularRelationship => "CIRCULAR_RELATIONSHIP",
            EditErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// How a transport layer should classify this code
    pub fn outcome(&self) -> EditOutcome {
        match self {
            EditErrorCode::UnauthorizedAccess => EditOutcome::AccessDenied,
            EditErrorCode::InternalError => EditOutcome::Internal,
            _ => EditOutcome::RejectedInput,
        }
    }
}

impl fmt::Display for EditErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a rejection for the caller's status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    AccessDenied,
    RejectedInput,
    Internal,
}

/// A rejected edit: code plus a message fit for the user
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{code}: {message}")]
pub struct EditRejection {
    pub code: EditErrorCode,
    pub message: String,
}

impl EditRejection {
    pub fn new(code: EditErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn employee_not_found(id: &EmployeeId) -> Self {
        Self::new(
            EditErrorCode::EmployeeNotFound,
            format!("Employee {} was not found", id),
        )
    }

    pub fn manager_not_found(id: &EmployeeId) -> Self {
        Self::new(
            EditErrorCode::ManagerNotFound,
            format!("Manager {} was not found", id),
        )
    }

    pub fn different_organizations() -> Self {
        Self::new(
            EditErrorCode::DifferentOrganizations,
            "Employee and manager belong to different organizations",
        )
    }

    pub fn unauthorized() -> Self {
        Self::new(
            EditErrorCode::UnauthorizedAccess,
            "You do not have access to this organization",
        )
    }

    pub fn self_management() -> Self {
        Self::new(
            EditErrorCode::SelfManagement,
            "An employee cannot be their own manager",
        )
    }

    pub fn circular(employee: &str, manager: &str) -> Self {
        Self::new(
            EditErrorCode::CircularRelationship,
            format!(
                "Moving \"{}\" under \"{}\" would create a circular reporting relationship",
                employee, manager
            ),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(EditErrorCode::InternalError, message)
    }

    fn unverifiable() -> Self {
        Self::new(
            EditErrorCode::CircularRelationship,
            "The reporting chain could not be verified, so the change was rejected",
        )
    }
}

/// The `{isValid, error, errorCode}` shape handed to transports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditValidation {
    pub is_valid: bool,
    pub error: Option<String>,
    pub error_code: Option<EditErrorCode>,
}

impl From<&Result<(), EditRejection>> for EditValidation {
    fn from(result: &Result<(), EditRejection>) -> Self {
        match result {
            Ok(()) => Self {
                is_valid: true,
                error: None,
                error_code: None,
            },
            Err(rejection) => Self {
                is_valid: false,
                error: Some(rejection.message.clone()),
                error_code: Some(rejection.code),
            },
        }
    }
}

/// A request to give `employee_id` a new manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub employee_id: EmployeeId,
    pub new_manager_id: EmployeeId,
}

impl MoveRequest {
    pub fn new(employee_id: EmployeeId, new_manager_id: EmployeeId) -> Self {
        Self {
            employee_id,
            new_manager_id,
        }
    }
}

/// Failure to read from the backing store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
    #[error("record {0} not found")]
    Missing(String),
}

/// Read access to persisted employees and organizations
pub trait Directory {
    fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, DirectoryError>;
    fn organization(&self, id: &OrganizationId) -> Result<Option<Organization>, DirectoryError>;
}

/// Why a check stopped: a real rejection, or a fault reading data
enum CheckFailure {
    Rejected(EditRejection),
    Fault(DirectoryError),
}

impl From<EditRejection> for CheckFailure {
    fn from(rejection: EditRejection) -> Self {
        CheckFailure::Rejected(rejection)
    }
}

impl From<DirectoryError> for CheckFailure {
    fn from(err: DirectoryError) -> Self {
        CheckFailure::Fault(err)
    }
}

/// Validate a proposed move against the persisted set.
///
/// Equal ids are rejected as [`EditErrorCode::SelfManagement`] before any
/// data is read, so that answer does not depend on what the store holds.
pub fn validate_move<D>(
    directory: &D,
    principal: &Principal,
    request: &MoveRequest,
) -> Result<(), EditRejection>
where
    D: Directory + ?Sized,
{
    if request.employee_id == request.new_manager_id {
        return Err(EditRejection::self_management());
    }

    match check_move(directory, principal, request) {
        Ok(()) => {
            debug!(
                employee = %request.employee_id,
                manager = %request.new_manager_id,
                "move validated"
            );
            Ok(())
        }
        Err(CheckFailure::Rejected(rejection)) => {
            debug!(code = %rejection.code, "move rejected");
            Err(rejection)
        }
        Err(CheckFailure::Fault(err)) => {
            warn!(error = %err, "could not load data for move validation, rejecting");
            Err(EditRejection::unverifiable())
        }
    }
}

fn check_move<D>(
    directory: &D,
    principal: &Principal,
    request: &MoveRequest,
) -> Result<(), CheckFailure>
where
    D: Directory + ?Sized,
{
    let employee = directory
        .employee(&request.employee_id)?
        .ok_or_else(|| EditRejection::employee_not_found(&request.employee_id))?;
    let manager = directory
        .employee(&request.new_manager_id)?
        .ok_or_else(|| EditRejection::manager_not_found(&request.new_manager_id))?;

    if employee.organization_id != manager.organization_id {
        return Err(EditRejection::different_organizations().into());
    }

    check_access(directory, principal, &employee.organization_id)?;

    // Walk upward from the new manager; reaching the employee means the
    // manager already sits somewhere below them.
    let mut visited: HashSet<EmployeeId> = HashSet::new();
    let mut current = Some(manager.clone());
    while let Some(node) = current {
        if !visited.insert(node.id) {
            break;
        }
        current = match node.manager_id {
            Some(next) if next == employee.id => {
                return Err(EditRejection::circular(&employee.name, &manager.name).into());
            }
            Some(next) => directory.employee(&next)?,
            None => None,
        };
    }

    Ok(())
}

/// Access check shared by every edit on an organization.
///
/// A missing organization record and a principal without access both come
/// back as [`EditErrorCode::UnauthorizedAccess`]; the log keeps them apart.
pub(crate) fn check_access<D>(
    directory: &D,
    principal: &Principal,
    organization_id: &OrganizationId,
) -> Result<(), AccessFailure>
where
    D: Directory + ?Sized,
{
    match directory.organization(organization_id) {
        Err(err) => Err(AccessFailure::Fault(err)),
        Ok(None) => {
            debug!(organization = %organization_id, "organization record missing");
            Err(AccessFailure::Denied)
        }
        Ok(Some(org)) if !org.grants_access(principal) => {
            debug!(
                organization = %organization_id,
                user = %principal.user_id,
                "principal lacks access"
            );
            Err(AccessFailure::Denied)
        }
        Ok(Some(_)) => Ok(()),
    }
}

/// Result of [`check_access`] that callers fold into their own error type
pub(crate) enum AccessFailure {
    Denied,
    Fault(DirectoryError),
}

impl From<AccessFailure> for CheckFailure {
    fn from(failure: AccessFailure) -> Self {
        match failure {
            AccessFailure::Denied => CheckFailure::Rejected(EditRejection::unauthorized()),
            AccessFailure::Fault(err) => CheckFailure::Fault(err),
        }
    }
}
