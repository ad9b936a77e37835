use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    Manager = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::Manager),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// HR and Admin may act on the HR stage and see every request.
    pub fn is_hr_or_admin(self) -> bool {
        matches!(self, Role::Hr | Role::Admin)
    }
}
