pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::model::department::Department;
use crate::model::device::DeviceCredential;
use crate::model::employee::RosterEntry;
use crate::model::ledger::{LedgerRecord, UpsertOutcome};

#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    async fn list_credentials(&self) -> Result<Vec<DeviceCredential>, StoreError>;

    /// `StoreError::NotFound` when no device has this id.
    async fn lookup_credential(&self, id: u64) -> Result<DeviceCredential, StoreError>;
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn by_department(&self, department_id: u64) -> Result<Vec<RosterEntry>, StoreError>;
}

#[async_trait]
pub trait DepartmentDirectory: Send + Sync {
    async fn list_departments(&self) -> Result<Vec<Department>, StoreError>;
}

/// Late/early ledger. Rows are keyed by (`employee_id`, `work_date`).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn find_by_employee_and_date(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<LedgerRecord>, StoreError>;

    /// With `record.id` set, overwrite name, times and flags of that row.
    /// Otherwise insert, falling back to an update when a row with the same
    /// key was written since it was looked up.
    async fn upsert(&self, record: &LedgerRecord) -> Result<UpsertOutcome, StoreError>;

    /// Rows whose name contains `name`, with `start <= work_date <= end`.
    async fn find_by_name_and_range(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LedgerRecord>, StoreError>;
}
