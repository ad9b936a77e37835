#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use tokio::sync::mpsc::UnboundedReceiver;

use hrm_leave::leave::{
    attachment::{AttachmentStore, AttachmentUpload},
    clock::ManualClock,
    notify::{Notification, NotificationQueue},
    service::LeaveService,
};
use hrm_leave::model::{
    employee::Employee,
    leave_balance::{BalanceKey, LeaveBalance},
    leave_type::LeaveType,
    role::Role,
};
use hrm_leave::store::MemoryStore;

pub const HR: u64 = 1;
pub const MANAGER: u64 = 3;
pub const EMPLOYEE: u64 = 10;
pub const TEAMMATE: u64 = 11;

pub struct NoAttachments;

#[async_trait]
impl AttachmentStore for NoAttachments {
    async fn save(&self, upload: &AttachmentUpload) -> std::io::Result<String> {
        Ok(format!("test://{}", upload.filename))
    }

    async fn remove(&self, _reference: &str) -> std::io::Result<()> {
        Ok(())
    }
}

pub struct Org {
    pub service: LeaveService,
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub outbox: UnboundedReceiver<Notification>,
}

fn employee(id: u64, first_name: &str, role: Role, manager_id: Option<u64>) -> Employee {
    Employee {
        id,
        employee_code: format!("E{id}"),
        first_name: first_name.to_string(),
        last_name: "Doe".to_string(),
        email: format!("{}@example.com", first_name.to_lowercase()),
        role,
        department_id: Some(1),
        manager_id,
    }
}

/// HR, a manager and two reports in one department, each report holding
/// ten annual days for 2026.
pub async fn org() -> Org {
    let store = MemoryStore::new();
    store.put_employee(employee(HR, "Hannah", Role::Hr, None)).await;
    store.put_employee(employee(MANAGER, "Max", Role::Manager, None)).await;
    store.put_employee(employee(EMPLOYEE, "Erin", Role::Employee, Some(MANAGER))).await;
    store.put_employee(employee(TEAMMATE, "Tom", Role::Employee, Some(MANAGER))).await;
    for id in [EMPLOYEE, TEAMMATE] {
        let key = BalanceKey { employee_id: id, leave_type: LeaveType::Annual, year: 2026 };
        store.put_balance(LeaveBalance::new(key, 10)).await;
    }

    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap()));
    let (queue, outbox) = NotificationQueue::channel();
    let service = LeaveService::new(Arc::new(store.clone()), clock.clone(), Arc::new(NoAttachments), queue);

    Org { service, store, clock, outbox }
}

impl Org {
    pub fn tick(&self) {
        self.clock.advance(Duration::minutes(5));
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.outbox.try_recv() {
            out.push(n);
        }
        out
    }
}
