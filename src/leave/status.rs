//! The request state machine. Submission picks the entry state (see
//! `routing`); every later move goes through [`transition`].

use crate::leave::error::StateConflict;
use crate::model::{leave_audit::AuditAction, leave_request::LeaveStatus};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LeaveEvent {
    ManagerApprove,
    ManagerReject,
    HrApprove,
    HrReject,
    Cancel,
}

impl LeaveEvent {
    pub fn manager(approve: bool) -> Self {
        if approve { LeaveEvent::ManagerApprove } else { LeaveEvent::ManagerReject }
    }

    pub fn hr(approve: bool) -> Self {
        if approve { LeaveEvent::HrApprove } else { LeaveEvent::HrReject }
    }

    pub fn audit_action(self) -> AuditAction {
        match self {
            LeaveEvent::ManagerApprove => AuditAction::ManagerApproved,
            LeaveEvent::ManagerReject => AuditAction::ManagerRejected,
            LeaveEvent::HrApprove => AuditAction::HrApproved,
            LeaveEvent::HrReject => AuditAction::HrRejected,
            LeaveEvent::Cancel => AuditAction::Cancelled,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            LeaveEvent::ManagerApprove | LeaveEvent::ManagerReject => "act as manager",
            LeaveEvent::HrApprove | LeaveEvent::HrReject => "act as HR",
            LeaveEvent::Cancel => "cancel",
        }
    }
}

pub fn transition(current: LeaveStatus, event: LeaveEvent) -> Result<LeaveStatus, StateConflict> {
    use LeaveEvent::*;
    use LeaveStatus::*;

    match (current, event) {
        (PendingManager, ManagerApprove) => Ok(PendingHr),
        (PendingManager, ManagerReject) => Ok(Rejected),
        (PendingHr, HrApprove) => Ok(Approved),
        (PendingHr, HrReject) => Ok(Rejected),
        (PendingManager | PendingHr, Cancel) => Ok(Cancelled),
        (status, event) => Err(StateConflict::InvalidStatus { status, action: event.verb() }),
    }
}
