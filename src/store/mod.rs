use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{
    employee::Employee,
    leave_audit::{LeaveAuditLogEntry, NewAuditEntry},
    leave_balance::{BalanceKey, LeaveBalance},
    leave_request::{LeaveRequest, NewLeaveRequest},
    leave_type::{LeaveType, LeaveTypeConfig},
};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlLeaveStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("missing record: {0}")]
    Missing(String),
}

/// Entry point to the shared request/balance store.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Opens a unit of work. Everything read through it stays consistent
    /// with what is written through it until `commit`; dropping it
    /// without committing discards every write.
    async fn begin(&self) -> Result<Box<dyn LeaveTx>, StoreError>;
}

/// One serializable read/verify/write cycle against the store.
///
/// Writers serialize on employee rows: a submission locks the requester
/// and then its manager, a stage decision locks the request and then its
/// approver. Range reads taken after those locks see the latest committed
/// state without locking it. Balance rows are locked when read.
#[async_trait]
pub trait LeaveTx: Send {
    /// Exclusive lock on one employee row until commit or rollback.
    async fn lock_employee(&mut self, id: u64) -> Result<(), StoreError>;

    async fn employee(&mut self, id: u64) -> Result<Option<Employee>, StoreError>;

    /// HR-role employees belonging to `department_id`.
    async fn hr_in_department(&mut self, department_id: Option<u64>) -> Result<Vec<Employee>, StoreError>;

    async fn leave_type_config(&mut self, leave_type: LeaveType) -> Result<Option<LeaveTypeConfig>, StoreError>;

    async fn request(&mut self, id: u64) -> Result<Option<LeaveRequest>, StoreError>;

    /// Every request, in any status, whose range touches `[start, end]`.
    async fn overlapping_requests(&mut self, start: NaiveDate, end: NaiveDate)
    -> Result<Vec<LeaveRequest>, StoreError>;

    async fn employee_requests(
        &mut self,
        employee_id: u64,
        leave_type: LeaveType,
    ) -> Result<Vec<LeaveRequest>, StoreError>;

    async fn insert_request(&mut self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError>;

    async fn update_request(&mut self, request: &LeaveRequest) -> Result<(), StoreError>;

    async fn balance(&mut self, key: BalanceKey) -> Result<Option<LeaveBalance>, StoreError>;

    async fn balances(&mut self, employee_id: u64, year: i32) -> Result<Vec<LeaveBalance>, StoreError>;

    async fn insert_balance(&mut self, balance: &LeaveBalance) -> Result<(), StoreError>;

    async fn debit_balance(&mut self, key: BalanceKey, days: i32) -> Result<(), StoreError>;

    async fn append_audit(&mut self, entry: NewAuditEntry) -> Result<LeaveAuditLogEntry, StoreError>;

    async fn audit_entries(&mut self, leave_request_id: u64) -> Result<Vec<LeaveAuditLogEntry>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
