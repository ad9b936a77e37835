use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::leave_type::LeaveType;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    PendingManager,
    PendingHr,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn is_pending(self) -> bool {
        matches!(self, LeaveStatus::PendingManager | LeaveStatus::PendingHr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    /// Current approver. Holds the manager while `PendingManager`; the
    /// requester's own id once routed straight to HR or auto-approved.
    #[schema(example = 7)]
    pub manager_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    pub number_of_days: i32,
    pub status: LeaveStatus,
    pub notes: Option<String>,
    pub attachment_path: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Balance partition: the calendar year the leave starts in.
    pub fn fiscal_year(&self) -> i32 {
        self.start_date.year()
    }

    /// Inclusive on both ends.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

/// A request about to be persisted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub manager_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_days: i32,
    pub status: LeaveStatus,
    pub notes: Option<String>,
    pub attachment_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewLeaveRequest {
    pub fn into_request(self, id: u64) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: self.employee_id,
            manager_id: self.manager_id,
            leave_type: self.leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            number_of_days: self.number_of_days,
            status: self.status,
            notes: self.notes,
            attachment_path: self.attachment_path,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Calendar days from `start` to `end`, both included.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i32 {
    (end - start).num_days() as i32 + 1
}
