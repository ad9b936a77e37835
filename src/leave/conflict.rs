use chrono::NaiveDate;

use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::store::{LeaveTx, StoreError};

const SELF_BLOCKING: [LeaveStatus; 3] = [LeaveStatus::PendingManager, LeaveStatus::PendingHr, LeaveStatus::Approved];
const MANAGER_STAGE_BLOCKING: [LeaveStatus; 2] = [LeaveStatus::PendingHr, LeaveStatus::Approved];
const HR_STAGE_BLOCKING: [LeaveStatus; 1] = [LeaveStatus::Approved];

/// Which existing requests may block a date range. Each lifecycle stage
/// checks a different set of statuses; keep them distinct.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictScope {
    /// New submission: the requester's own live requests, then approved
    /// leave of colleagues reporting to the same manager.
    Submission { employee_id: u64, manager_id: Option<u64> },
    /// Manager approving `request_id`: anything under the same manager
    /// that already passed the manager stage.
    ManagerApproval { request_id: u64, manager_id: u64 },
    /// HR approving `request_id`: approved leave under the same manager.
    HrApproval { request_id: u64, manager_id: u64 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Party {
    Own,
    Colleague,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictCheck {
    pub has_conflict: bool,
    /// "You" for a self-overlap, the colleague's name otherwise.
    pub conflicting_name: Option<String>,
    pub message: String,
}

impl ConflictCheck {
    pub fn clear() -> Self {
        Self {
            has_conflict: false,
            conflicting_name: None,
            message: "No conflicts found".to_string(),
        }
    }
}

fn blocking<'a>(scope: ConflictScope, candidates: &'a [LeaveRequest]) -> Option<(&'a LeaveRequest, Party)> {
    match scope {
        ConflictScope::Submission { employee_id, manager_id } => candidates
            .iter()
            .find(|r| r.employee_id == employee_id && SELF_BLOCKING.contains(&r.status))
            .map(|r| (r, Party::Own))
            .or_else(|| {
                candidates
                    .iter()
                    .find(|r| {
                        r.employee_id != employee_id
                            && Some(r.manager_id) == manager_id
                            && r.status == LeaveStatus::Approved
                    })
                    .map(|r| (r, Party::Colleague))
            }),
        ConflictScope::ManagerApproval { request_id, manager_id } => candidates
            .iter()
            .find(|r| r.id != request_id && r.manager_id == manager_id && MANAGER_STAGE_BLOCKING.contains(&r.status))
            .map(|r| (r, Party::Colleague)),
        ConflictScope::HrApproval { request_id, manager_id } => candidates
            .iter()
            .find(|r| r.id != request_id && r.manager_id == manager_id && HR_STAGE_BLOCKING.contains(&r.status))
            .map(|r| (r, Party::Colleague)),
    }
}

/// Pure part of the check; `name_of` resolves a colleague's display name.
pub fn find_conflict(
    scope: ConflictScope,
    start: NaiveDate,
    end: NaiveDate,
    candidates: &[LeaveRequest],
    name_of: impl FnOnce(u64) -> String,
) -> ConflictCheck {
    let overlapping: Vec<LeaveRequest> = candidates.iter().filter(|r| r.overlaps(start, end)).cloned().collect();

    let Some((existing, party)) = blocking(scope, &overlapping) else {
        return ConflictCheck::clear();
    };

    match party {
        Party::Own => ConflictCheck {
            has_conflict: true,
            conflicting_name: Some("You".to_string()),
            message: format!(
                "You already have a {} leave request from {} to {}",
                existing.status, existing.start_date, existing.end_date
            ),
        },
        Party::Colleague => {
            let name = name_of(existing.employee_id);
            let message = match scope {
                ConflictScope::Submission { .. } => format!(
                    "{} from your team is already on approved leave from {} to {}",
                    name, existing.start_date, existing.end_date
                ),
                _ => format!(
                    "{} has overlapping {} leave from {} to {}",
                    name, existing.status, existing.start_date, existing.end_date
                ),
            };
            ConflictCheck { has_conflict: true, conflicting_name: Some(name), message }
        }
    }
}

/// Loads the overlapping requests through `tx` and runs [`find_conflict`].
pub async fn detect(
    tx: &mut dyn LeaveTx,
    scope: ConflictScope,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ConflictCheck, StoreError> {
    let candidates = tx.overlapping_requests(start, end).await?;

    // Resolve the colleague up front; the pure check stays synchronous.
    let colleague = blocking(scope, &candidates)
        .filter(|(_, party)| *party == Party::Colleague)
        .map(|(r, _)| r.employee_id);
    let colleague_name = match colleague {
        Some(id) => tx.employee(id).await?.map(|e| e.display_name()),
        None => None,
    };

    Ok(find_conflict(scope, start, end, &candidates, |id| {
        colleague_name.unwrap_or_else(|| format!("Employee #{id}"))
    }))
}
