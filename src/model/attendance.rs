use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One access event reported by a terminal. Never stored as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub employee_id: String,
    pub name: String,
    pub timestamp: DateTime<FixedOffset>,
}

impl RawEvent {
    pub fn new(
        employee_id: impl Into<String>,
        name: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            name: name.into(),
            timestamp,
        }
    }
}

/// Closed time range sent to the terminals, `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl AttendanceWindow {
    /// `date 00:00:00` to `date 23:59:59` in `offset`.
    pub fn for_day(date: NaiveDate, offset: FixedOffset) -> Self {
        let at = |h, m, s| {
            let naive = date.and_time(NaiveTime::from_hms_opt(h, m, s).unwrap_or_default());
            offset.from_utc_datetime(&(naive - offset))
        };
        Self {
            start: at(0, 0, 0),
            end: at(23, 59, 59),
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.start.date_naive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "1024",
        "employee_no": "NV-0042",
        "name": "Nguyen Van An",
        "date": "2025-10-09",
        "first_in": "2025-10-09T07:21:05+07:00",
        "last_out": "2025-10-09T17:02:44+07:00"
    })
)]
pub struct DailyAttendance {
    /// device attendance code
    #[schema(example = "1024")]
    pub employee_id: String,

    /// HR staff number, display only
    #[schema(example = "NV-0042", nullable = true)]
    pub employee_no: Option<String>,

    #[schema(example = "Nguyen Van An")]
    pub name: String,

    #[schema(example = "2025-10-09", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub first_in: Option<DateTime<FixedOffset>>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_out: Option<DateTime<FixedOffset>>,
}

impl DailyAttendance {
    pub fn has_punch(&self) -> bool {
        self.first_in.is_some() || self.last_out.is_some()
    }
}
