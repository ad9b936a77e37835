use crate::leave::error::{LeaveError, StateConflict};
use crate::model::{
    leave_balance::{BalanceKey, LeaveBalance},
    leave_request::LeaveRequest,
};
use crate::store::{LeaveTx, StoreError};

/// Snapshot of what a capacity check saw.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Capacity {
    pub remaining: i32,
    pub pending: i32,
}

impl Capacity {
    pub fn effective_remaining(&self) -> i32 {
        self.remaining - self.pending
    }
}

/// Days still awaiting approval on `key`, ignoring `exclude_id`.
pub fn pending_reservation(requests: &[LeaveRequest], key: BalanceKey, exclude_id: Option<u64>) -> i32 {
    requests
        .iter()
        .filter(|r| Some(r.id) != exclude_id)
        .filter(|r| r.employee_id == key.employee_id && r.leave_type == key.leave_type)
        .filter(|r| r.fiscal_year() == key.year && r.status.is_pending())
        .map(|r| r.number_of_days)
        .sum()
}

pub fn check_capacity(
    balance: Option<&LeaveBalance>,
    key: BalanceKey,
    pending: i32,
    requested: i32,
) -> Result<Capacity, StateConflict> {
    let balance = balance.ok_or(StateConflict::NoBalanceRecord {
        leave_type: key.leave_type,
        year: key.year,
    })?;

    let capacity = Capacity { remaining: balance.remaining_days(), pending };
    if capacity.effective_remaining() < requested {
        return Err(StateConflict::InsufficientBalance {
            leave_type: key.leave_type,
            remaining: capacity.remaining,
            pending,
            requested,
        });
    }
    Ok(capacity)
}

/// Verifies `requested` days fit into the balance after pending
/// reservations. Reads only; nothing is reserved in storage.
pub async fn check_and_reserve(
    tx: &mut dyn LeaveTx,
    key: BalanceKey,
    requested: i32,
    exclude_id: Option<u64>,
) -> Result<Capacity, LeaveError> {
    let balance = tx.balance(key).await?;
    let requests = tx.employee_requests(key.employee_id, key.leave_type).await?;
    let pending = pending_reservation(&requests, key, exclude_id);

    let capacity = check_capacity(balance.as_ref(), key, pending, requested)?;
    tracing::debug!(
        employee_id = key.employee_id,
        leave_type = %key.leave_type,
        year = key.year,
        remaining = capacity.remaining,
        pending,
        requested,
        "Balance capacity verified"
    );
    Ok(capacity)
}

/// Caller has already verified capacity and calls this once per approval.
pub async fn debit(tx: &mut dyn LeaveTx, key: BalanceKey, days: i32) -> Result<(), StoreError> {
    tx.debit_balance(key, days).await?;
    tracing::info!(
        employee_id = key.employee_id,
        leave_type = %key.leave_type,
        year = key.year,
        days,
        "Leave balance debited"
    );
    Ok(())
}
