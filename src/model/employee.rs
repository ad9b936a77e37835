use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// An employee as seen by the leave engine. Records are provisioned and
/// mutated elsewhere; the engine only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "role": "employee",
        "department_id": 10,
        "manager_id": 7
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    pub role: Role,

    #[schema(example = 10, nullable = true)]
    pub department_id: Option<u64>,

    /// Direct manager; `None` at the top of a reporting tree.
    #[schema(example = 7, nullable = true)]
    pub manager_id: Option<u64>,
}

impl Employee {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// A manager nobody reports upward from.
    pub fn is_department_head(&self) -> bool {
        self.role == Role::Manager && self.manager_id.is_none()
    }
}
