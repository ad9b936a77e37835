use crate::leave::error::StateConflict;
use crate::model::{employee::Employee, leave_request::LeaveStatus, role::Role};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Route {
    pub status: LeaveStatus,
    /// Stored as the request's `manager_id`.
    pub approver_id: u64,
}

/// Entry state and first approver for a new request.
pub fn resolve(requester: &Employee, auto_approve: bool) -> Result<Route, StateConflict> {
    if auto_approve {
        return Ok(Route { status: LeaveStatus::Approved, approver_id: requester.id });
    }

    match (requester.role, requester.manager_id) {
        // Department head: no peer manager to ask, HR of the department decides.
        (Role::Manager, None) => Ok(Route { status: LeaveStatus::PendingHr, approver_id: requester.id }),
        (_, Some(manager_id)) => Ok(Route { status: LeaveStatus::PendingManager, approver_id: manager_id }),
        (_, None) => Err(StateConflict::NoManagerAssigned),
    }
}
