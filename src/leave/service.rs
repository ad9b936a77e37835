use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use strum::IntoEnumIterator;
use tracing::{info, instrument, warn};

use crate::leave::{
    attachment::{self, AttachmentStore, AttachmentUpload},
    audit::{self, AUTO_APPROVAL_COMMENT},
    balance,
    clock::Clock,
    conflict::{self, ConflictScope},
    error::{LeaveError, StateConflict},
    notify::{Notification, NotificationQueue},
    policy, routing,
    status::{self, LeaveEvent},
};
use crate::model::{
    employee::Employee,
    leave_audit::{AuditAction, LeaveAuditLogEntry},
    leave_balance::{BalanceKey, LeaveBalance},
    leave_request::{inclusive_days, LeaveRequest, LeaveStatus, NewLeaveRequest},
    leave_type::{LeaveType, LeaveTypeConfig},
    role::Role,
};
use crate::store::{LeaveStore, LeaveTx};

#[derive(Debug, Clone)]
pub struct SubmitLeave {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub attachment: Option<AttachmentUpload>,
}

#[derive(Debug, Clone, Default)]
pub struct Decision {
    pub approve: bool,
    pub comment: Option<String>,
}

impl Decision {
    pub fn approve(comment: Option<&str>) -> Self {
        Self { approve: true, comment: comment.map(str::to_string) }
    }

    pub fn reject(comment: Option<&str>) -> Self {
        Self { approve: false, comment: comment.map(str::to_string) }
    }
}

/// Orchestrates the request lifecycle. Every operation runs as one
/// store transaction; notifications are queued only after it commits.
pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    clock: Arc<dyn Clock>,
    attachments: Arc<dyn AttachmentStore>,
    notifications: NotificationQueue,
}

fn describe(request: &LeaveRequest) -> String {
    format!(
        "{} day(s) of {} leave from {} to {}",
        request.number_of_days, request.leave_type, request.start_date, request.end_date
    )
}

async fn load_request(tx: &mut dyn LeaveTx, request_id: u64) -> Result<LeaveRequest, LeaveError> {
    tx.request(request_id)
        .await?
        .ok_or_else(|| LeaveError::NotFound(format!("Leave request {request_id} not found")))
}

async fn hr_notifications(
    tx: &mut dyn LeaveTx,
    department_id: Option<u64>,
    subject: &str,
    body: &str,
) -> Result<Vec<Notification>, LeaveError> {
    let hr = tx.hr_in_department(department_id).await?;
    if hr.is_empty() {
        warn!(?department_id, "No HR user in department to notify");
    }
    Ok(hr.into_iter().map(|h| Notification::new(h.id, subject, body)).collect())
}

fn can_view(actor: &Employee, request: &LeaveRequest) -> bool {
    actor.id == request.employee_id || actor.id == request.manager_id || actor.role.is_hr_or_admin()
}

async fn ensure_visible(tx: &mut dyn LeaveTx, actor_id: u64, request: &LeaveRequest) -> Result<(), LeaveError> {
    match tx.employee(actor_id).await? {
        Some(actor) if can_view(&actor, request) => Ok(()),
        _ => Err(LeaveError::forbidden("You cannot view this leave request")),
    }
}

impl LeaveService {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        clock: Arc<dyn Clock>,
        attachments: Arc<dyn AttachmentStore>,
        notifications: NotificationQueue,
    ) -> Self {
        Self { store, clock, attachments, notifications }
    }

    #[instrument(
        name = "leave_submit",
        skip(self, dto),
        fields(leave_type = %dto.leave_type, start = %dto.start_date, end = %dto.end_date)
    )]
    pub async fn submit(&self, employee_id: u64, dto: SubmitLeave) -> Result<LeaveRequest, LeaveError> {
        if dto.end_date < dto.start_date {
            return Err(LeaveError::Validation("End date cannot be before start date".to_string()));
        }
        if let Some(upload) = &dto.attachment {
            attachment::validate(upload)?;
        }
        let days = inclusive_days(dto.start_date, dto.end_date);

        let mut tx = self.store.begin().await?;

        // Requester first, then its manager: the same order a manager's own
        // submission uses one level up.
        tx.lock_employee(employee_id).await?;
        let employee = tx
            .employee(employee_id)
            .await?
            .ok_or_else(|| LeaveError::NotFound(format!("Employee {employee_id} not found")))?;
        if let Some(manager_id) = employee.manager_id {
            tx.lock_employee(manager_id).await?;
        }

        let config = tx
            .leave_type_config(dto.leave_type)
            .await?
            .unwrap_or_else(|| LeaveTypeConfig::fallback(dto.leave_type));
        let decision = policy::evaluate(&config, days);

        if !decision.bypass_conflict {
            let scope = ConflictScope::Submission { employee_id, manager_id: employee.manager_id };
            let check = conflict::detect(tx.as_mut(), scope, dto.start_date, dto.end_date).await?;
            if check.has_conflict {
                info!(message = %check.message, "Submission blocked by conflict");
                return Err(StateConflict::Scheduling(check.message).into());
            }
        }

        let key = BalanceKey {
            employee_id,
            leave_type: dto.leave_type,
            year: dto.start_date.year(),
        };
        balance::check_and_reserve(tx.as_mut(), key, days, None).await?;

        let route = routing::resolve(&employee, decision.auto_approve)?;

        if decision.auto_approve {
            balance::debit(tx.as_mut(), key, days).await?;
        }

        let attachment_path = match &dto.attachment {
            Some(upload) => Some(self.attachments.save(upload).await?),
            None => None,
        };

        let now = self.clock.now();
        let new_request = NewLeaveRequest {
            employee_id,
            manager_id: route.approver_id,
            leave_type: dto.leave_type,
            start_date: dto.start_date,
            end_date: dto.end_date,
            number_of_days: days,
            status: route.status,
            notes: dto.notes,
            attachment_path: attachment_path.clone(),
            created_at: now,
        };

        let persisted = async {
            let request = tx.insert_request(new_request).await?;

            let (action, comment) = if decision.auto_approve {
                (AuditAction::HrApproved, Some(AUTO_APPROVAL_COMMENT.to_string()))
            } else {
                (AuditAction::Submitted, None)
            };
            audit::record(tx.as_mut(), request.id, employee_id, action, request.status, comment, now).await?;

            let summary = format!("{} requested {}", employee.display_name(), describe(&request));
            let outbound = match request.status {
                LeaveStatus::PendingManager => {
                    vec![Notification::new(request.manager_id, "New Leave Request", summary)]
                }
                LeaveStatus::PendingHr => {
                    hr_notifications(tx.as_mut(), employee.department_id, "Leave Request Awaiting HR Approval", &summary)
                        .await?
                }
                _ => vec![Notification::new(
                    employee_id,
                    "Leave Request Auto-Approved",
                    format!("Your request for {} was approved automatically", describe(&request)),
                )],
            };

            tx.commit().await?;
            Ok::<_, LeaveError>((request, outbound))
        }
        .await;

        let (request, outbound) = match persisted {
            Ok(done) => done,
            Err(err) => {
                if let Some(path) = &attachment_path {
                    self.discard_attachment(path).await;
                }
                return Err(err);
            }
        };
        self.notifications.enqueue_all(outbound);

        info!(request_id = request.id, employee_id, status = %request.status, "Leave request submitted");
        Ok(request)
    }

    #[instrument(name = "leave_cancel", skip(self))]
    pub async fn cancel(&self, actor_id: u64, request_id: u64) -> Result<LeaveRequest, LeaveError> {
        let mut tx = self.store.begin().await?;
        let mut request = load_request(tx.as_mut(), request_id).await?;

        if request.employee_id != actor_id {
            return Err(LeaveError::forbidden("Only the requester can cancel a leave request"));
        }
        request.status = status::transition(request.status, LeaveEvent::Cancel)?;

        let now = self.clock.now();
        request.updated_at = now;
        tx.update_request(&request).await?;
        audit::record(tx.as_mut(), request.id, actor_id, AuditAction::Cancelled, request.status, None, now).await?;
        tx.commit().await?;

        self.notifications.enqueue(Notification::new(
            request.employee_id,
            "Leave Request Cancelled",
            format!("Your request for {} was cancelled", describe(&request)),
        ));
        info!(request_id, "Leave request cancelled");
        Ok(request)
    }

    #[instrument(name = "leave_manager_action", skip(self, decision), fields(approve = decision.approve))]
    pub async fn manager_action(
        &self,
        manager_id: u64,
        request_id: u64,
        decision: Decision,
    ) -> Result<LeaveRequest, LeaveError> {
        let mut tx = self.store.begin().await?;
        let mut request = load_request(tx.as_mut(), request_id).await?;

        if request.employee_id == manager_id {
            return Err(LeaveError::forbidden("You cannot act on your own leave request"));
        }
        if request.manager_id != manager_id {
            return Err(LeaveError::forbidden("You are not the approver of this leave request"));
        }
        tx.lock_employee(request.manager_id).await?;
        let event = LeaveEvent::manager(decision.approve);
        let next = status::transition(request.status, event)?;

        if decision.approve {
            let scope = ConflictScope::ManagerApproval { request_id, manager_id: request.manager_id };
            let check = conflict::detect(tx.as_mut(), scope, request.start_date, request.end_date).await?;
            if check.has_conflict {
                info!(message = %check.message, "Manager approval blocked by conflict");
                return Err(StateConflict::Scheduling(check.message).into());
            }
        }

        let now = self.clock.now();
        request.status = next;
        request.updated_at = now;
        tx.update_request(&request).await?;
        audit::record(tx.as_mut(), request.id, manager_id, event.audit_action(), next, decision.comment.clone(), now)
            .await?;

        let mut outbound = Vec::new();
        let outcome = if decision.approve { "Approved by Manager" } else { "Rejected by Manager" };
        outbound.push(Notification::new(
            request.employee_id,
            format!("Leave Request {outcome}"),
            with_comment(format!("Your request for {} was {}", describe(&request), outcome.to_lowercase()), &decision),
        ));

        if decision.approve {
            let manager = tx.employee(manager_id).await?;
            let department_id = manager.and_then(|m| m.department_id);
            let body = format!("Leave request #{} for {} is awaiting HR approval", request.id, describe(&request));
            outbound.extend(hr_notifications(tx.as_mut(), department_id, "Leave Request Awaiting HR Approval", &body).await?);
        }

        tx.commit().await?;
        self.notifications.enqueue_all(outbound);

        info!(request_id, status = %request.status, "Manager decision recorded");
        Ok(request)
    }

    #[instrument(name = "leave_hr_action", skip(self, decision), fields(approve = decision.approve))]
    pub async fn hr_action(&self, hr_id: u64, request_id: u64, decision: Decision) -> Result<LeaveRequest, LeaveError> {
        let mut tx = self.store.begin().await?;
        let mut request = load_request(tx.as_mut(), request_id).await?;
        // Siblings share the approver row, so their decisions queue here.
        tx.lock_employee(request.manager_id).await?;

        let actor = tx.employee(hr_id).await?;
        if !actor.is_some_and(|a| a.role.is_hr_or_admin()) {
            return Err(LeaveError::forbidden("HR/Admin only"));
        }
        if request.employee_id == hr_id {
            return Err(LeaveError::forbidden("You cannot act on your own leave request"));
        }
        let event = LeaveEvent::hr(decision.approve);
        let next = status::transition(request.status, event)?;

        if decision.approve {
            let scope = ConflictScope::HrApproval { request_id, manager_id: request.manager_id };
            let check = conflict::detect(tx.as_mut(), scope, request.start_date, request.end_date).await?;
            if check.has_conflict {
                info!(message = %check.message, "HR approval blocked by conflict");
                return Err(StateConflict::Scheduling(check.message).into());
            }

            let key = BalanceKey {
                employee_id: request.employee_id,
                leave_type: request.leave_type,
                year: request.fiscal_year(),
            };
            balance::check_and_reserve(tx.as_mut(), key, request.number_of_days, Some(request.id)).await?;
            balance::debit(tx.as_mut(), key, request.number_of_days).await?;
        }

        let now = self.clock.now();
        request.status = next;
        request.updated_at = now;
        tx.update_request(&request).await?;
        audit::record(tx.as_mut(), request.id, hr_id, event.audit_action(), next, decision.comment.clone(), now).await?;
        tx.commit().await?;

        let outcome = if decision.approve { "Final Approved" } else { "Rejected by HR" };
        self.notifications.enqueue(Notification::new(
            request.employee_id,
            format!("Leave Request {outcome}"),
            with_comment(format!("Your request for {} was {}", describe(&request), outcome.to_lowercase()), &decision),
        ));

        info!(request_id, status = %request.status, "HR decision recorded");
        Ok(request)
    }

    pub async fn get_request(&self, actor_id: u64, request_id: u64) -> Result<LeaveRequest, LeaveError> {
        let mut tx = self.store.begin().await?;
        let request = load_request(tx.as_mut(), request_id).await?;
        ensure_visible(tx.as_mut(), actor_id, &request).await?;
        Ok(request)
    }

    /// Every transition of the request, oldest first.
    pub async fn audit_trail(&self, actor_id: u64, request_id: u64) -> Result<Vec<LeaveAuditLogEntry>, LeaveError> {
        let mut tx = self.store.begin().await?;
        let request = load_request(tx.as_mut(), request_id).await?;
        ensure_visible(tx.as_mut(), actor_id, &request).await?;
        Ok(audit::chronological(tx.audit_entries(request_id).await?))
    }

    /// Fiscal year the service clock is currently in.
    pub fn current_year(&self) -> i32 {
        self.clock.now().year()
    }

    pub async fn balances(&self, employee_id: u64, year: i32) -> Result<Vec<LeaveBalance>, LeaveError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.balances(employee_id, year).await?)
    }

    /// Creates whichever of the employee's per-type balances for `year`
    /// are missing, sized by each type's default. Existing ones are kept.
    ///
    /// `actor_role` is the caller's authenticated role; Admin accounts
    /// need no employee record of their own.
    #[instrument(name = "leave_provision_balances", skip(self))]
    pub async fn provision_balances(
        &self,
        actor_role: Role,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, LeaveError> {
        if !actor_role.is_hr_or_admin() {
            return Err(LeaveError::forbidden("HR/Admin only"));
        }
        let mut tx = self.store.begin().await?;

        if tx.employee(employee_id).await?.is_none() {
            return Err(LeaveError::NotFound(format!("Employee {employee_id} not found")));
        }

        let mut created = 0;
        for leave_type in LeaveType::iter() {
            let key = BalanceKey { employee_id, leave_type, year };
            if tx.balance(key).await?.is_some() {
                continue;
            }
            let config = tx
                .leave_type_config(leave_type)
                .await?
                .unwrap_or_else(|| LeaveTypeConfig::fallback(leave_type));
            tx.insert_balance(&LeaveBalance::new(key, config.default_balance)).await?;
            created += 1;
        }

        let balances = tx.balances(employee_id, year).await?;
        tx.commit().await?;

        info!(employee_id, year, created, "Leave balances provisioned");
        Ok(balances)
    }

    async fn discard_attachment(&self, path: &str) {
        match self.attachments.remove(path).await {
            Ok(()) => info!(path, "Removed attachment of failed submission"),
            Err(e) => warn!(path, error = %e, "Failed to remove orphaned attachment"),
        }
    }
}

fn with_comment(body: String, decision: &Decision) -> String {
    match decision.comment.as_deref() {
        Some(comment) if !comment.is_empty() => format!("{body}. Comment: {comment}"),
        _ => body,
    }
}
