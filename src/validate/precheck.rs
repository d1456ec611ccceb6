//! Cheap in-memory check run before a drag-and-drop move is sent.
//!
//! Uses the employee set the client already holds, so it needs no round trip.
//! It never replaces [`super::edge::validate_move`], which still runs before
//! the change is committed.

use crate::model::{EmployeeId, OrgForest};

use super::edge::EditRejection;

/// Reject moves that are obviously invalid given the local snapshot
pub fn precheck_move(
    forest: &OrgForest<'_>,
    employee_id: &EmployeeId,
    new_manager_id: &EmployeeId,
) -> Result<(), EditRejection> {
    if employee_id == new_manager_id {
        return Err(EditRejection::self_management());
    }
    let employee = forest
        .get(employee_id)
        .ok_or_else(|| EditRejection::employee_not_found(employee_id))?;
    let manager = forest
        .get(new_manager_id)
        .ok_or_else(|| EditRejection::manager_not_found(new_manager_id))?;

    if forest.ancestors(new_manager_id).contains(employee_id) {
        return Err(EditRejection::circular(&employee.name, &manager.name));
    }
    Ok(())
}
