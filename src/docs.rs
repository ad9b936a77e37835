use crate::api::balance::{BalanceQuery, BalanceResponse, ProvisionBalances};
use crate::api::leave_request::{CreateLeave, DecisionBody};
use crate::model::{
    leave_audit::{AuditAction, LeaveAuditLogEntry},
    leave_request::{LeaveRequest, LeaveStatus},
    leave_type::LeaveType,
};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave API",
        version = "1.0.0",
        description = r#"
## Leave Request Lifecycle

Employees submit leave, their line manager approves first and HR gives the
final approval. Approved days are debited from the employee's yearly balance.

### Key Features
- **Submission** with overlap detection against own and team leave
- **Pending reservations**: unapproved requests hold their days
- **Auto-approval** of short requests when the leave type allows it
- **Audit trail** of every status change

### Security
All endpoints require a **JWT Bearer** access token.
HR decisions and balance provisioning are restricted to **HR** and **Admin**.

### Errors
Failures return `{"message": "..."}` with 400 (invalid input), 403 (not allowed),
404 (unknown request) or 409 (state conflict: overlap, balance, wrong stage).
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::leave_audit,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::manager_decision,
        crate::api::leave_request::hr_decision,

        crate::api::balance::list_balances,
        crate::api::balance::provision_balances
    ),
    components(
        schemas(
            CreateLeave,
            DecisionBody,
            LeaveRequest,
            LeaveStatus,
            LeaveType,
            LeaveAuditLogEntry,
            AuditAction,
            BalanceResponse,
            BalanceQuery,
            ProvisionBalances
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request lifecycle APIs"),
        (name = "Balance", description = "Leave balance APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
