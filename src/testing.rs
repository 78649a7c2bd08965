//! In-memory fakes for the device and store seams.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};

use crate::attendance::clock::Clock;
use crate::device::DeviceGateway;
use crate::error::{AuthError, FetchError, StoreError};
use crate::model::attendance::{AttendanceWindow, DailyAttendance, RawEvent};
use crate::model::department::Department;
use crate::model::device::DeviceCredential;
use crate::model::employee::RosterEntry;
use crate::model::ledger::{LedgerRecord, UpsertOutcome};
use crate::store::{DepartmentDirectory, DeviceDirectory, EmployeeDirectory, LedgerStore};

pub fn offset() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).unwrap()
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 9).unwrap()
}

pub fn window() -> AttendanceWindow {
    AttendanceWindow::for_day(day(), offset())
}

/// `hhmm` on the fixture day at +07:00.
pub fn local(hhmm: &str) -> DateTime<FixedOffset> {
    let time = NaiveTime::parse_from_str(hhmm, "%H:%M").unwrap();
    offset()
        .from_local_datetime(&day().and_time(time))
        .single()
        .unwrap()
}

pub fn at(employee_id: &str, name: &str, hhmm: &str) -> RawEvent {
    RawEvent::new(employee_id, name, local(hhmm))
}

pub fn attendance(first_in: Option<&str>, last_out: Option<&str>) -> DailyAttendance {
    DailyAttendance {
        employee_id: "1".to_string(),
        employee_no: None,
        name: "Nguyen Van An".to_string(),
        date: day(),
        first_in: first_in.map(local),
        last_out: last_out.map(local),
    }
}

pub fn ledger_row(employee_id: &str, name: &str, date: NaiveDate) -> LedgerRecord {
    LedgerRecord {
        id: None,
        employee_id: employee_id.to_string(),
        name: name.to_string(),
        work_date: date,
        time_in: date.and_hms_opt(7, 0, 0),
        time_out: date.and_hms_opt(17, 0, 0),
        is_late: false,
        is_early: false,
    }
}

pub struct FixedClock(Mutex<NaiveDate>);

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self(Mutex::new(today))
    }

    pub fn set(&self, today: NaiveDate) {
        *self.0.lock().unwrap() = today;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.0.lock().unwrap()
    }
}

#[derive(Debug, Clone)]
pub enum FakeReply {
    Events(Vec<RawEvent>),
    Malformed,
    Unreachable,
    Unsupported,
}

/// Scripted terminals keyed by ip. Unscripted pairs answer with no events.
#[derive(Default)]
pub struct FakeGateway {
    offline: HashSet<String>,
    replies: HashMap<(String, String), FakeReply>,
    probes: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn offline(mut self, ip: &str) -> Self {
        self.offline.insert(ip.to_string());
        self
    }

    pub fn reply(mut self, ip: &str, employee_id: &str, reply: FakeReply) -> Self {
        self.replies
            .insert((ip.to_string(), employee_id.to_string()), reply);
        self
    }

    pub fn queries_for(&self, ip: &str) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.as_str() == ip)
            .count()
    }

    pub fn total_queries(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn total_probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceGateway for FakeGateway {
    async fn is_reachable(&self, device: &DeviceCredential) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        !self.offline.contains(&device.ip)
    }

    async fn query_events(
        &self,
        device: &DeviceCredential,
        employee_id: &str,
        _window: &AttendanceWindow,
    ) -> Result<Vec<RawEvent>, FetchError> {
        self.queries.lock().unwrap().push(device.ip.clone());

        let key = (device.ip.clone(), employee_id.to_string());
        match self.replies.get(&key).cloned() {
            None => Ok(Vec::new()),
            Some(FakeReply::Events(events)) => Ok(events),
            Some(FakeReply::Malformed) => {
                Err(FetchError::MalformedResponse("unexpected body".into()))
            }
            Some(FakeReply::Unreachable) => {
                Err(AuthError::Unreachable("connection refused".into()).into())
            }
            Some(FakeReply::Unsupported) => {
                Err(AuthError::AuthSchemeUnsupported("Basic".into()).into())
            }
        }
    }
}

/// All four directories backed by vectors.
#[derive(Default)]
pub struct MemoryStore {
    devices: Vec<DeviceCredential>,
    departments: Vec<Department>,
    rosters: HashMap<u64, Vec<RosterEntry>>,
    ledger: Mutex<Vec<LedgerRecord>>,
    ledger_reads: AtomicUsize,
    fail_departments: AtomicBool,
}

impl MemoryStore {
    /// Device ids are assigned from 1 in insertion order.
    pub fn with_device(mut self, device: DeviceCredential) -> Self {
        self.devices.push(device);
        self
    }

    pub fn with_roster(mut self, department_id: u64, roster: Vec<RosterEntry>) -> Self {
        self.departments.push(Department {
            id: department_id,
            name: format!("Department {department_id}"),
        });
        self.rosters.insert(department_id, roster);
        self
    }

    pub fn seed_ledger(&self, record: LedgerRecord) {
        let mut ledger = self.ledger.lock().unwrap();
        let id = ledger.len() as u64 + 1;
        ledger.push(LedgerRecord {
            id: Some(id),
            ..record
        });
    }

    pub fn ledger(&self) -> Vec<LedgerRecord> {
        self.ledger.lock().unwrap().clone()
    }

    pub fn ledger_reads(&self) -> usize {
        self.ledger_reads.load(Ordering::SeqCst)
    }

    pub fn fail_departments(&self, fail: bool) {
        self.fail_departments.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeviceDirectory for MemoryStore {
    async fn list_credentials(&self) -> Result<Vec<DeviceCredential>, StoreError> {
        Ok(self.devices.clone())
    }

    async fn lookup_credential(&self, id: u64) -> Result<DeviceCredential, StoreError> {
        id.checked_sub(1)
            .and_then(|i| self.devices.get(i as usize))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("device {id}")))
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn by_department(&self, department_id: u64) -> Result<Vec<RosterEntry>, StoreError> {
        Ok(self.rosters.get(&department_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DepartmentDirectory for MemoryStore {
    async fn list_departments(&self) -> Result<Vec<Department>, StoreError> {
        if self.fail_departments.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.departments.clone())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn find_by_employee_and_date(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<LedgerRecord>, StoreError> {
        Ok(self
            .ledger
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.employee_id == employee_id && r.work_date == date)
            .cloned())
    }

    async fn upsert(&self, record: &LedgerRecord) -> Result<UpsertOutcome, StoreError> {
        let mut ledger = self.ledger.lock().unwrap();

        let existing = match record.id {
            Some(id) => ledger.iter_mut().find(|r| r.id == Some(id)),
            None => ledger
                .iter_mut()
                .find(|r| r.employee_id == record.employee_id && r.work_date == record.work_date),
        };
        if let Some(existing) = existing {
            existing.name = record.name.clone();
            existing.time_in = record.time_in;
            existing.time_out = record.time_out;
            existing.is_late = record.is_late;
            existing.is_early = record.is_early;
            return Ok(UpsertOutcome::Updated);
        }

        let id = ledger.len() as u64 + 1;
        ledger.push(LedgerRecord {
            id: Some(id),
            ..record.clone()
        });
        Ok(UpsertOutcome::Inserted)
    }

    async fn find_by_name_and_range(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LedgerRecord>, StoreError> {
        self.ledger_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .ledger
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.name.contains(name) && r.work_date >= start && r.work_date <= end)
            .cloned()
            .collect())
    }
}
