use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::attendance::clock::Clock;
use crate::attendance::fetcher::{DeviceBreaker, EventFetcher};
use crate::attendance::reconciler::reconcile;
use crate::device::DeviceGateway;
use crate::error::StoreError;
use crate::model::attendance::{AttendanceWindow, DailyAttendance};
use crate::model::employee::name_sort_key;
use crate::model::ledger::LedgerRecord;
use crate::store::{DeviceDirectory, EmployeeDirectory, LedgerStore};

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct DepartmentAttendance {
    pub records: Vec<DailyAttendance>,
    #[schema(example = json!(["192.168.1.65"]))]
    pub disconnected_devices: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceStatus {
    #[schema(example = 3)]
    pub device_id: u64,
    #[schema(example = "192.168.1.64")]
    pub ip: String,
    pub connected: bool,
}

/// Attendance queries behind the HTTP layer and the daily rollup.
#[derive(Clone)]
pub struct AttendanceService {
    devices: Arc<dyn DeviceDirectory>,
    employees: Arc<dyn EmployeeDirectory>,
    ledger: Arc<dyn LedgerStore>,
    gateway: Arc<dyn DeviceGateway>,
    fetcher: EventFetcher,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl AttendanceService {
    pub fn new(
        devices: Arc<dyn DeviceDirectory>,
        employees: Arc<dyn EmployeeDirectory>,
        ledger: Arc<dyn LedgerStore>,
        gateway: Arc<dyn DeviceGateway>,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher: EventFetcher::new(gateway.clone(), concurrency),
            devices,
            employees,
            ledger,
            gateway,
            clock,
            offset,
        }
    }

    /// Live first-in/last-out for one department, straight from the devices.
    ///
    /// `date` defaults to today. An unknown or empty department gives an
    /// empty result rather than an error.
    pub async fn fetch_attendance(
        &self,
        department_id: u64,
        date: Option<NaiveDate>,
    ) -> Result<DepartmentAttendance, StoreError> {
        self.fetch_attendance_with(department_id, date, &DeviceBreaker::default())
            .await
    }

    /// Same as [`Self::fetch_attendance`], but devices tripped in `breaker`
    /// by an earlier department are reported disconnected without a call.
    pub async fn fetch_attendance_with(
        &self,
        department_id: u64,
        date: Option<NaiveDate>,
        breaker: &DeviceBreaker,
    ) -> Result<DepartmentAttendance, StoreError> {
        if department_id == 0 {
            return Ok(DepartmentAttendance::default());
        }

        let date = date.unwrap_or_else(|| self.clock.today());

        let roster = self.employees.by_department(department_id).await?;
        if roster.is_empty() {
            info!(department_id, "No employees found for department");
            return Ok(DepartmentAttendance::default());
        }

        let devices = self.devices.list_credentials().await?;
        let window = AttendanceWindow::for_day(date, self.offset);

        let outcome = self.fetcher.fetch(&devices, &roster, &window, breaker).await;
        let records = reconcile(&outcome.events, &roster, date);

        Ok(DepartmentAttendance {
            records,
            disconnected_devices: outcome.disconnected,
        })
    }

    /// Persisted ledger rows for employees whose name contains `name`.
    ///
    /// Never touches the devices. `start > end` or a blank name gives an
    /// empty list. Rows come ordered by date, then by last name token.
    pub async fn fetch_attendance_range(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LedgerRecord>, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }
        if start > end {
            warn!(%start, %end, "Rejecting attendance range with start after end");
            return Ok(Vec::new());
        }

        let mut records = self.ledger.find_by_name_and_range(name, start, end).await?;
        records.sort_by(|a, b| {
            a.work_date
                .cmp(&b.work_date)
                .then_with(|| name_sort_key(&a.name).cmp(name_sort_key(&b.name)))
        });

        Ok(records)
    }

    pub async fn device_status(&self, device_id: u64) -> Result<DeviceStatus, StoreError> {
        let device = self.devices.lookup_credential(device_id).await?;
        let connected = self.gateway.is_reachable(&device).await;

        Ok(DeviceStatus {
            device_id,
            ip: device.ip,
            connected,
        })
    }
}
