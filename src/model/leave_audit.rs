use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::leave_request::LeaveStatus;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    Submitted,
    ManagerApproved,
    ManagerRejected,
    HrApproved,
    HrRejected,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveAuditLogEntry {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub leave_request_id: u64,
    #[schema(example = 7)]
    pub actor_id: u64,
    pub action: AuditAction,
    pub resulting_status: LeaveStatus,
    pub comment: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub leave_request_id: u64,
    pub actor_id: u64,
    pub action: AuditAction,
    pub resulting_status: LeaveStatus,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    pub fn into_entry(self, id: u64) -> LeaveAuditLogEntry {
        LeaveAuditLogEntry {
            id,
            leave_request_id: self.leave_request_id,
            actor_id: self.actor_id,
            action: self.action,
            resulting_status: self.resulting_status,
            comment: self.comment,
            created_at: self.created_at,
        }
    }
}
