use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::leave_type::LeaveType;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BalanceKey {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalance {
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 21)]
    pub total_days: i32,
    #[schema(example = 4)]
    pub used_days: i32,
}

impl LeaveBalance {
    pub fn new(key: BalanceKey, total_days: i32) -> Self {
        Self {
            employee_id: key.employee_id,
            leave_type: key.leave_type,
            year: key.year,
            total_days,
            used_days: 0,
        }
    }

    pub fn key(&self) -> BalanceKey {
        BalanceKey {
            employee_id: self.employee_id,
            leave_type: self.leave_type,
            year: self.year,
        }
    }

    pub fn remaining_days(&self) -> i32 {
        self.total_days - self.used_days
    }
}
