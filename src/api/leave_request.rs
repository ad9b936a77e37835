use std::str::FromStr;

use crate::auth::auth::AuthUser;
use crate::leave::{
    attachment::{AttachmentUpload, MAX_ATTACHMENT_BYTES},
    error::LeaveError,
    service::{Decision, LeaveService, SubmitLeave},
};
use crate::model::{leave_audit::LeaveAuditLogEntry, leave_request::LeaveRequest, leave_type::LeaveType};
use actix_multipart::{Field, Multipart};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use futures::TryStreamExt;
use serde::Deserialize;
use utoipa::ToSchema;

/// Multipart form accepted by `POST /leave`. Documentation only; the
/// handler reads the parts as they stream in.
#[derive(ToSchema)]
pub struct CreateLeave {
    #[schema(example = "annual")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub notes: Option<String>,
    /// Supporting document: jpg, jpeg, png, pdf, doc or docx, at most 5 MB
    #[schema(value_type = Option<String>, format = Binary)]
    pub file: Option<Vec<u8>>,
}

// Text parts are short; anything bigger is not a date or a note.
const MAX_TEXT_PART_BYTES: usize = 4 * 1024;

async fn read_part(field: &mut Field, limit: usize, too_large: &str) -> actix_web::Result<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if data.len() + chunk.len() > limit {
            return Err(LeaveError::Validation(too_large.to_string()).into());
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, LeaveError> {
    value.ok_or_else(|| LeaveError::Validation(format!("{name} is required")))
}

fn parse_date(value: &str, name: &str) -> Result<NaiveDate, LeaveError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| LeaveError::Validation(format!("{name} must be a date (YYYY-MM-DD)")))
}

async fn read_leave_form(mut payload: Multipart) -> actix_web::Result<SubmitLeave> {
    let mut leave_type = None;
    let mut start_date = None;
    let mut end_date = None;
    let mut notes = None;
    let mut attachment = None;

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or_default()
                .to_string();
            let bytes = read_part(&mut field, MAX_ATTACHMENT_BYTES, "Attachment exceeds the 5 MB limit").await?;
            // Browsers send an empty part when no file was chosen.
            if !(filename.is_empty() && bytes.is_empty()) {
                attachment = Some(AttachmentUpload { filename, bytes });
            }
            continue;
        }

        let raw = read_part(&mut field, MAX_TEXT_PART_BYTES, &format!("{name} is too long")).await?;
        let value = String::from_utf8(raw).map_err(|_| LeaveError::Validation(format!("{name} must be text")))?;
        match name.as_str() {
            "leave_type" => {
                let parsed = LeaveType::from_str(value.trim())
                    .map_err(|_| LeaveError::Validation(format!("Unknown leave type `{}`", value.trim())))?;
                leave_type = Some(parsed);
            }
            "start_date" => start_date = Some(parse_date(&value, "start_date")?),
            "end_date" => end_date = Some(parse_date(&value, "end_date")?),
            "notes" if !value.trim().is_empty() => notes = Some(value),
            _ => {}
        }
    }

    Ok(SubmitLeave {
        leave_type: required(leave_type, "leave_type")?,
        start_date: required(start_date, "start_date")?,
        end_date: required(end_date, "end_date")?,
        notes,
        attachment,
    })
}

#[derive(Deserialize, ToSchema)]
pub struct DecisionBody {
    #[schema(example = true)]
    pub approve: bool,
    #[schema(example = "Enjoy your time off")]
    pub comment: Option<String>,
}

impl From<DecisionBody> for Decision {
    fn from(body: DecisionBody) -> Self {
        Decision { approve: body.approve, comment: body.comment }
    }
}

/* =========================
Create leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request form with an optional supporting document",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid form, dates or attachment", body = Object, example = json!({
            "message": "End date cannot be before start date"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Conflicting leave, insufficient balance or no approver", body = Object, example = json!({
            "message": "Insufficient annual balance. Remaining: 2, Pending: 1, Requested: 3"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: Multipart,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let form = read_leave_form(payload).await?;

    let request = service.submit(employee_id, form).await?;

    Ok(HttpResponse::Ok().json(request))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the requester, approver or HR"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request 42 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor_id = auth.require_employee()?;
    let request = service.get_request(actor_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Every status change of a leave request, oldest first
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}/audit",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    responses(
        (status = 200, description = "Audit trail", body = [LeaveAuditLogEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the requester, approver or HR"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_audit(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor_id = auth.require_employee()?;
    let trail = service.audit_trail(actor_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(trail))
}

/* =========================
Cancel leave (requester)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the requester can cancel"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request is no longer pending", body = Object, example = json!({
            "message": "Leave request is approved; cannot cancel"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor_id = auth.require_employee()?;
    let request = service.cancel(actor_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Manager decision
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/manager",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body(content = DecisionBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Decision recorded", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the recorded approver, or own request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Wrong stage or team conflict")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn manager_decision(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<DecisionBody>,
) -> actix_web::Result<impl Responder> {
    let manager_id = auth.require_employee()?;
    let request = service
        .manager_action(manager_id, path.into_inner(), payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
HR decision (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/hr",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body(content = DecisionBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Decision recorded", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only, or own request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Wrong stage, team conflict or insufficient balance")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn hr_decision(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<DecisionBody>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let hr_id = auth.require_employee()?;

    let request = service
        .hr_action(hr_id, path.into_inner(), payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(request))
}
