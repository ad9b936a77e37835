use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

use super::{LeaveStore, LeaveTx, StoreError};
use crate::model::{
    employee::Employee,
    leave_audit::{LeaveAuditLogEntry, NewAuditEntry},
    leave_balance::{BalanceKey, LeaveBalance},
    leave_request::{LeaveRequest, NewLeaveRequest},
    leave_type::{LeaveType, LeaveTypeConfig},
    role::Role,
};

const REQUEST_COLUMNS: &str = r#"
    id, employee_id, manager_id, leave_type, start_date, end_date,
    number_of_days, status, notes, attachment_path, created_at, updated_at
"#;

/// MySQL-backed store. Each unit of work is an InnoDB transaction at
/// READ COMMITTED (see `db::init_db`), so range reads take no gap locks.
/// Employee, request and balance rows are locked with `FOR UPDATE`.
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn begin(&self) -> Result<Box<dyn LeaveTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlLeaveTx { tx }))
    }
}

struct MySqlLeaveTx {
    tx: Transaction<'static, MySql>,
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::Decode(format!("{column}: unexpected value `{value}`")))
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    employee_code: String,
    first_name: String,
    last_name: String,
    email: String,
    role_id: u8,
    department_id: Option<u64>,
    manager_id: Option<u64>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let role = Role::from_id(row.role_id)
            .ok_or_else(|| StoreError::Decode(format!("role_id: unknown role {}", row.role_id)))?;
        Ok(Employee {
            id: row.id,
            employee_code: row.employee_code,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            role,
            department_id: row.department_id,
            manager_id: row.manager_id,
        })
    }
}

#[derive(FromRow)]
struct LeaveTypeConfigRow {
    leave_type: String,
    default_balance: i32,
    auto_approve_enabled: bool,
    auto_approve_threshold_days: i32,
    bypass_conflict_check: bool,
}

impl TryFrom<LeaveTypeConfigRow> for LeaveTypeConfig {
    type Error = StoreError;

    fn try_from(row: LeaveTypeConfigRow) -> Result<Self, Self::Error> {
        Ok(LeaveTypeConfig {
            leave_type: parse_column("leave_type", &row.leave_type)?,
            default_balance: row.default_balance,
            auto_approve_enabled: row.auto_approve_enabled,
            auto_approve_threshold_days: row.auto_approve_threshold_days,
            bypass_conflict_check: row.bypass_conflict_check,
        })
    }
}

#[derive(FromRow)]
struct LeaveRequestRow {
    id: u64,
    employee_id: u64,
    manager_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    number_of_days: i32,
    status: String,
    notes: Option<String>,
    attachment_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            manager_id: row.manager_id,
            leave_type: parse_column("leave_type", &row.leave_type)?,
            start_date: row.start_date,
            end_date: row.end_date,
            number_of_days: row.number_of_days,
            status: parse_column("status", &row.status)?,
            notes: row.notes,
            attachment_path: row.attachment_path,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct LeaveBalanceRow {
    employee_id: u64,
    leave_type: String,
    fiscal_year: i32,
    total_days: i32,
    used_days: i32,
}

impl TryFrom<LeaveBalanceRow> for LeaveBalance {
    type Error = StoreError;

    fn try_from(row: LeaveBalanceRow) -> Result<Self, Self::Error> {
        Ok(LeaveBalance {
            employee_id: row.employee_id,
            leave_type: parse_column("leave_type", &row.leave_type)?,
            year: row.fiscal_year,
            total_days: row.total_days,
            used_days: row.used_days,
        })
    }
}

#[derive(FromRow)]
struct AuditRow {
    id: u64,
    leave_request_id: u64,
    actor_id: u64,
    action: String,
    resulting_status: String,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for LeaveAuditLogEntry {
    type Error = StoreError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        Ok(LeaveAuditLogEntry {
            id: row.id,
            leave_request_id: row.leave_request_id,
            actor_id: row.actor_id,
            action: parse_column("action", &row.action)?,
            resulting_status: parse_column("resulting_status", &row.resulting_status)?,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl LeaveTx for MySqlLeaveTx {
    async fn lock_employee(&mut self, id: u64) -> Result<(), StoreError> {
        sqlx::query("SELECT id FROM employees WHERE id = ? FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn employee(&mut self, id: u64) -> Result<Option<Employee>, StoreError> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, employee_code, first_name, last_name, email,
                   role_id, department_id, manager_id
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Employee::try_from).transpose()
    }

    async fn hr_in_department(&mut self, department_id: Option<u64>) -> Result<Vec<Employee>, StoreError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, employee_code, first_name, last_name, email,
                   role_id, department_id, manager_id
            FROM employees
            WHERE role_id = ? AND department_id <=> ?
            ORDER BY id
            "#,
        )
        .bind(Role::Hr.id())
        .bind(department_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    async fn leave_type_config(&mut self, leave_type: LeaveType) -> Result<Option<LeaveTypeConfig>, StoreError> {
        let row = sqlx::query_as::<_, LeaveTypeConfigRow>(
            r#"
            SELECT leave_type, default_balance, auto_approve_enabled,
                   auto_approve_threshold_days, bypass_conflict_check
            FROM leave_type_configs
            WHERE leave_type = ?
            "#,
        )
        .bind(leave_type.as_ref())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(LeaveTypeConfig::try_from).transpose()
    }

    async fn request(&mut self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE");
        let row = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(LeaveRequest::try_from).transpose()
    }

    async fn overlapping_requests(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE start_date <= ? AND end_date >= ? ORDER BY id"
        );
        let rows = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(end)
            .bind(start)
            .fetch_all(&mut *self.tx)
            .await?;

        convert_all(rows)
    }

    async fn employee_requests(
        &mut self,
        employee_id: u64,
        leave_type: LeaveType,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE employee_id = ? AND leave_type = ? ORDER BY id"
        );
        let rows = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(employee_id)
            .bind(leave_type.as_ref())
            .fetch_all(&mut *self.tx)
            .await?;

        convert_all(rows)
    }

    async fn insert_request(&mut self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, manager_id, leave_type, start_date, end_date,
                 number_of_days, status, notes, attachment_path, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.manager_id)
        .bind(request.leave_type.as_ref())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.number_of_days)
        .bind(request.status.as_ref())
        .bind(request.notes.as_deref())
        .bind(request.attachment_path.as_deref())
        .bind(request.created_at)
        .bind(request.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(request.into_request(result.last_insert_id()))
    }

    async fn update_request(&mut self, request: &LeaveRequest) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET manager_id = ?, status = ?, attachment_path = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(request.manager_id)
        .bind(request.status.as_ref())
        .bind(request.attachment_path.as_deref())
        .bind(request.updated_at)
        .bind(request.id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("leave request {}", request.id)));
        }
        Ok(())
    }

    async fn balance(&mut self, key: BalanceKey) -> Result<Option<LeaveBalance>, StoreError> {
        let row = sqlx::query_as::<_, LeaveBalanceRow>(
            r#"
            SELECT employee_id, leave_type, fiscal_year, total_days, used_days
            FROM leave_balances
            WHERE employee_id = ? AND leave_type = ? AND fiscal_year = ?
            FOR UPDATE
            "#,
        )
        .bind(key.employee_id)
        .bind(key.leave_type.as_ref())
        .bind(key.year)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(LeaveBalance::try_from).transpose()
    }

    async fn balances(&mut self, employee_id: u64, year: i32) -> Result<Vec<LeaveBalance>, StoreError> {
        let rows = sqlx::query_as::<_, LeaveBalanceRow>(
            r#"
            SELECT employee_id, leave_type, fiscal_year, total_days, used_days
            FROM leave_balances
            WHERE employee_id = ? AND fiscal_year = ?
            ORDER BY leave_type
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    async fn insert_balance(&mut self, balance: &LeaveBalance) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO leave_balances
                (employee_id, leave_type, fiscal_year, total_days, used_days)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(balance.employee_id)
        .bind(balance.leave_type.as_ref())
        .bind(balance.year)
        .bind(balance.total_days)
        .bind(balance.used_days)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn debit_balance(&mut self, key: BalanceKey, days: i32) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_balances
            SET used_days = used_days + ?
            WHERE employee_id = ? AND leave_type = ? AND fiscal_year = ?
            "#,
        )
        .bind(days)
        .bind(key.employee_id)
        .bind(key.leave_type.as_ref())
        .bind(key.year)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!(
                "{} balance of employee {} for {}",
                key.leave_type, key.employee_id, key.year
            )));
        }
        Ok(())
    }

    async fn append_audit(&mut self, entry: NewAuditEntry) -> Result<LeaveAuditLogEntry, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_audit_logs
                (leave_request_id, actor_id, action, resulting_status, comment, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.leave_request_id)
        .bind(entry.actor_id)
        .bind(entry.action.as_ref())
        .bind(entry.resulting_status.as_ref())
        .bind(entry.comment.as_deref())
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(entry.into_entry(result.last_insert_id()))
    }

    async fn audit_entries(&mut self, leave_request_id: u64) -> Result<Vec<LeaveAuditLogEntry>, StoreError> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, leave_request_id, actor_id, action, resulting_status, comment, created_at
            FROM leave_audit_logs
            WHERE leave_request_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(leave_request_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
