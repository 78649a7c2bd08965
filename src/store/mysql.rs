use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;

use crate::error::StoreError;
use crate::model::department::Department;
use crate::model::device::DeviceCredential;
use crate::model::employee::RosterEntry;
use crate::model::ledger::{LedgerRecord, UpsertOutcome};
use crate::store::{DepartmentDirectory, DeviceDirectory, EmployeeDirectory, LedgerStore};

/// All four data sources on one MySQL pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceDirectory for MySqlStore {
    async fn list_credentials(&self) -> Result<Vec<DeviceCredential>, StoreError> {
        let devices = sqlx::query_as::<_, DeviceCredential>(
            r#"
            SELECT ip, username, password
            FROM devices
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(devices)
    }

    async fn lookup_credential(&self, id: u64) -> Result<DeviceCredential, StoreError> {
        sqlx::query_as::<_, DeviceCredential>(
            r#"
            SELECT ip, username, password
            FROM devices
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("device {id}")))
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn by_department(&self, department_id: u64) -> Result<Vec<RosterEntry>, StoreError> {
        let roster = sqlx::query_as::<_, RosterEntry>(
            r#"
            SELECT CAST(attendance_code AS CHAR) AS employee_id,
                   employee_no,
                   full_name AS name
            FROM employees
            WHERE department_id = ?
            ORDER BY attendance_code
            "#,
        )
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roster)
    }
}

#[async_trait]
impl DepartmentDirectory for MySqlStore {
    async fn list_departments(&self) -> Result<Vec<Department>, StoreError> {
        let departments =
            sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(departments)
    }
}

#[async_trait]
impl LedgerStore for MySqlStore {
    async fn find_by_employee_and_date(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<LedgerRecord>, StoreError> {
        let record = sqlx::query_as::<_, LedgerRecord>(
            r#"
            SELECT id, employee_id, name, work_date, time_in, time_out, is_late, is_early
            FROM attendance_ledger
            WHERE employee_id = ? AND work_date = ?
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn upsert(&self, record: &LedgerRecord) -> Result<UpsertOutcome, StoreError> {
        if let Some(id) = record.id {
            // rows_affected is 0 for an unchanged row, so it says nothing here
            sqlx::query(
                r#"
                UPDATE attendance_ledger
                SET name = ?, time_in = ?, time_out = ?, is_late = ?, is_early = ?
                WHERE id = ?
                "#,
            )
            .bind(&record.name)
            .bind(record.time_in)
            .bind(record.time_out)
            .bind(record.is_late)
            .bind(record.is_early)
            .bind(id)
            .execute(&self.pool)
            .await?;

            return Ok(UpsertOutcome::Updated);
        }

        // UNIQUE (employee_id, work_date) turns a concurrent second insert into an update
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_ledger
                (employee_id, name, work_date, time_in, time_out, is_late, is_early)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                time_in = VALUES(time_in),
                time_out = VALUES(time_out),
                is_late = VALUES(is_late),
                is_early = VALUES(is_early)
            "#,
        )
        .bind(&record.employee_id)
        .bind(&record.name)
        .bind(record.work_date)
        .bind(record.time_in)
        .bind(record.time_out)
        .bind(record.is_late)
        .bind(record.is_early)
        .execute(&self.pool)
        .await?;

        // MySQL reports 1 for a fresh row, 2 for a changed row, 0 for an unchanged one
        Ok(if result.rows_affected() == 1 {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn find_by_name_and_range(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LedgerRecord>, StoreError> {
        let pattern = format!("%{}%", escape_like(name));

        let records = sqlx::query_as::<_, LedgerRecord>(
            r#"
            SELECT id, employee_id, name, work_date, time_in, time_out, is_late, is_early
            FROM attendance_ledger
            WHERE name LIKE ?
            AND work_date BETWEEN ? AND ?
            ORDER BY work_date, employee_id
            "#,
        )
        .bind(pattern)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
