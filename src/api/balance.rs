use crate::auth::auth::AuthUser;
use crate::leave::service::LeaveService;
use crate::model::{leave_balance::LeaveBalance, leave_type::LeaveType};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    #[schema(example = 2026)]
    /// Fiscal year; defaults to the current year
    pub year: Option<i32>,
    #[schema(example = 1000)]
    /// Another employee's balances (HR/Admin only)
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct ProvisionBalances {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 2026)]
    pub year: i32,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 21)]
    pub total_days: i32,
    #[schema(example = 4)]
    pub used_days: i32,
    /// total_days - used_days; pending requests are not subtracted
    #[schema(example = 17)]
    pub remaining_days: i32,
}

impl From<LeaveBalance> for BalanceResponse {
    fn from(balance: LeaveBalance) -> Self {
        Self {
            remaining_days: balance.remaining_days(),
            employee_id: balance.employee_id,
            leave_type: balance.leave_type,
            year: balance.year,
            total_days: balance.total_days,
            used_days: balance.used_days,
        }
    }
}

fn to_response(balances: Vec<LeaveBalance>) -> Vec<BalanceResponse> {
    balances.into_iter().map(BalanceResponse::from).collect()
}

/// Leave balances for one fiscal year
#[utoipa::path(
    get,
    path = "/api/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Balances for the year", body = [BalanceResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn list_balances(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let own_id = auth.require_employee();
    let employee_id = match (query.employee_id, own_id) {
        (Some(other), Ok(own)) if other == own => own,
        (Some(other), _) => {
            auth.require_hr_or_admin()?;
            other
        }
        (None, own) => own?,
    };
    let year = query.year.unwrap_or_else(|| service.current_year());

    let balances = service.balances(employee_id, year).await?;
    Ok(HttpResponse::Ok().json(to_response(balances)))
}

/* =========================
Provision balances (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/balance/provision",
    request_body(content = ProvisionBalances, content_type = "application/json"),
    responses(
        (status = 200, description = "All balances of the employee for the year", body = [BalanceResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn provision_balances(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<ProvisionBalances>,
) -> actix_web::Result<impl Responder> {
    // Admin accounts often have no employee record, so only the role counts.
    let balances = service
        .provision_balances(auth.role, payload.employee_id, payload.year)
        .await?;
    Ok(HttpResponse::Ok().json(to_response(balances)))
}
