use chrono::NaiveTime;

use crate::model::attendance::DailyAttendance;
use crate::model::ledger::LedgerRecord;

/// Office hours used to flag late arrivals and early departures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkSchedule {
    pub late_after: NaiveTime,
    pub early_before: NaiveTime,
}

impl Default for WorkSchedule {
    fn default() -> Self {
        Self {
            late_after: NaiveTime::from_hms_opt(7, 30, 0).unwrap_or_default(),
            early_before: NaiveTime::from_hms_opt(16, 30, 0).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Punctuality {
    pub is_late: bool,
    pub is_early: bool,
}

impl WorkSchedule {
    /// A missing punch counts against the employee: no first-in is late,
    /// no last-out is early. Times are compared on the device's wall clock.
    pub fn assess(&self, attendance: &DailyAttendance) -> Punctuality {
        Punctuality {
            is_late: attendance
                .first_in
                .is_none_or(|t| t.time() > self.late_after),
            is_early: attendance
                .last_out
                .is_none_or(|t| t.time() < self.early_before),
        }
    }

    /// Ledger row for `attendance`, or `None` when there is no punch at all.
    pub fn ledger_record(&self, attendance: &DailyAttendance) -> Option<LedgerRecord> {
        if !attendance.has_punch() {
            return None;
        }

        let Punctuality { is_late, is_early } = self.assess(attendance);

        Some(LedgerRecord {
            id: None,
            employee_id: attendance.employee_id.clone(),
            name: attendance.name.clone(),
            work_date: attendance.date,
            time_in: attendance.first_in.map(|t| t.naive_local()),
            time_out: attendance.last_out.map(|t| t.naive_local()),
            is_late,
            is_early,
        })
    }
}
