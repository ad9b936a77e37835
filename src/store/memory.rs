use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LeaveStore, LeaveTx, StoreError};
use crate::model::{
    employee::Employee,
    leave_audit::{LeaveAuditLogEntry, NewAuditEntry},
    leave_balance::{BalanceKey, LeaveBalance},
    leave_request::{LeaveRequest, NewLeaveRequest},
    leave_type::{LeaveType, LeaveTypeConfig},
    role::Role,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    employees: HashMap<u64, Employee>,
    configs: HashMap<LeaveType, LeaveTypeConfig>,
    requests: BTreeMap<u64, LeaveRequest>,
    balances: HashMap<BalanceKey, LeaveBalance>,
    audit: Vec<LeaveAuditLogEntry>,
    last_request_id: u64,
    last_audit_id: u64,
}

/// Process-local store. A single lock is held for the whole life of a
/// transaction, so units of work run one at a time.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_employee(&self, employee: Employee) {
        self.state.lock().await.employees.insert(employee.id, employee);
    }

    pub async fn put_balance(&self, balance: LeaveBalance) {
        self.state.lock().await.balances.insert(balance.key(), balance);
    }

    pub async fn put_leave_type_config(&self, config: LeaveTypeConfig) {
        self.state.lock().await.configs.insert(config.leave_type, config);
    }

    /// Seeds a request as-is, whatever its status.
    pub async fn put_request(&self, request: LeaveRequest) {
        let mut state = self.state.lock().await;
        state.last_request_id = state.last_request_id.max(request.id);
        state.requests.insert(request.id, request);
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LeaveTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

#[async_trait]
impl LeaveTx for MemoryTx {
    // The store-wide guard is already held.
    async fn lock_employee(&mut self, _id: u64) -> Result<(), StoreError> {
        Ok(())
    }

    async fn employee(&mut self, id: u64) -> Result<Option<Employee>, StoreError> {
        Ok(self.work.employees.get(&id).cloned())
    }

    async fn hr_in_department(&mut self, department_id: Option<u64>) -> Result<Vec<Employee>, StoreError> {
        let mut hr: Vec<Employee> = self
            .work
            .employees
            .values()
            .filter(|e| e.role == Role::Hr && e.department_id == department_id)
            .cloned()
            .collect();
        hr.sort_by_key(|e| e.id);
        Ok(hr)
    }

    async fn leave_type_config(&mut self, leave_type: LeaveType) -> Result<Option<LeaveTypeConfig>, StoreError> {
        Ok(self.work.configs.get(&leave_type).cloned())
    }

    async fn request(&mut self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self.work.requests.get(&id).cloned())
    }

    async fn overlapping_requests(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        Ok(self
            .work
            .requests
            .values()
            .filter(|r| r.overlaps(start, end))
            .cloned()
            .collect())
    }

    async fn employee_requests(
        &mut self,
        employee_id: u64,
        leave_type: LeaveType,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        Ok(self
            .work
            .requests
            .values()
            .filter(|r| r.employee_id == employee_id && r.leave_type == leave_type)
            .cloned()
            .collect())
    }

    async fn insert_request(&mut self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        self.work.last_request_id += 1;
        let request = request.into_request(self.work.last_request_id);
        self.work.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn update_request(&mut self, request: &LeaveRequest) -> Result<(), StoreError> {
        match self.work.requests.get_mut(&request.id) {
            Some(stored) => {
                *stored = request.clone();
                Ok(())
            }
            None => Err(StoreError::Missing(format!("leave request {}", request.id))),
        }
    }

    async fn balance(&mut self, key: BalanceKey) -> Result<Option<LeaveBalance>, StoreError> {
        Ok(self.work.balances.get(&key).cloned())
    }

    async fn balances(&mut self, employee_id: u64, year: i32) -> Result<Vec<LeaveBalance>, StoreError> {
        let mut balances: Vec<LeaveBalance> = self
            .work
            .balances
            .values()
            .filter(|b| b.employee_id == employee_id && b.year == year)
            .cloned()
            .collect();
        balances.sort_by(|a, b| a.leave_type.as_ref().cmp(b.leave_type.as_ref()));
        Ok(balances)
    }

    async fn insert_balance(&mut self, balance: &LeaveBalance) -> Result<(), StoreError> {
        self.work.balances.insert(balance.key(), balance.clone());
        Ok(())
    }

    async fn debit_balance(&mut self, key: BalanceKey, days: i32) -> Result<(), StoreError> {
        match self.work.balances.get_mut(&key) {
            Some(balance) => {
                balance.used_days += days;
                Ok(())
            }
            None => Err(StoreError::Missing(format!(
                "{} balance of employee {} for {}",
                key.leave_type, key.employee_id, key.year
            ))),
        }
    }

    async fn append_audit(&mut self, entry: NewAuditEntry) -> Result<LeaveAuditLogEntry, StoreError> {
        self.work.last_audit_id += 1;
        let entry = entry.into_entry(self.work.last_audit_id);
        self.work.audit.push(entry.clone());
        Ok(entry)
    }

    async fn audit_entries(&mut self, leave_request_id: u64) -> Result<Vec<LeaveAuditLogEntry>, StoreError> {
        Ok(self
            .work
            .audit
            .iter()
            .filter(|e| e.leave_request_id == leave_request_id)
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}
