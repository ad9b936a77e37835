use chrono::{DateTime, Utc};

use crate::model::{
    leave_audit::{AuditAction, LeaveAuditLogEntry, NewAuditEntry},
    leave_request::LeaveStatus,
};
use crate::store::{LeaveTx, StoreError};

pub const AUTO_APPROVAL_COMMENT: &str = "Auto-approved by system policy";

/// Appends exactly one entry for a status transition.
pub async fn record(
    tx: &mut dyn LeaveTx,
    leave_request_id: u64,
    actor_id: u64,
    action: AuditAction,
    resulting_status: LeaveStatus,
    comment: Option<String>,
    at: DateTime<Utc>,
) -> Result<LeaveAuditLogEntry, StoreError> {
    tx.append_audit(NewAuditEntry {
        leave_request_id,
        actor_id,
        action,
        resulting_status,
        comment,
        created_at: at,
    })
    .await
}

/// Oldest first; entries sharing a timestamp keep insertion order.
pub fn chronological(mut entries: Vec<LeaveAuditLogEntry>) -> Vec<LeaveAuditLogEntry> {
    entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    entries
}
