use crate::attendance::scheduler::RollupSummary;
use crate::attendance::service::{DepartmentAttendance, DeviceStatus};
use crate::model::attendance::DailyAttendance;
use crate::model::employee::RosterEntry;
use crate::model::ledger::LedgerRecord;
use crate::models::{
    AttendanceRangeReq, DepartmentAttendanceReq, DepartmentAttendanceResponse, RollupReq,
};
use crate::utils::pagination::PageQuery;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Access Control Attendance API",
        version = "1.0.0",
        description = r#"
## Access Control Attendance

Reads check-in/out events from access-control terminals over HTTP Digest
authentication and turns them into daily first-in/last-out attendance.

### Key Features
- **Live Attendance**
  - Query every terminal for one department and day, with disconnected terminals reported
- **Ledger**
  - A background job persists yesterday's late/early flags once per day
  - Search persisted rows by employee name and date range
- **Devices**
  - Check whether a terminal is reachable

### Response Format
- JSON-based RESTful responses
- Pagination supported for the department endpoint

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::department_attendance,
        crate::api::attendance::attendance_range,
        crate::api::attendance::rollup,
        crate::api::attendance::device_status
    ),
    components(
        schemas(
            DepartmentAttendanceReq,
            DepartmentAttendanceResponse,
            DepartmentAttendance,
            DailyAttendance,
            AttendanceRangeReq,
            LedgerRecord,
            RollupReq,
            RollupSummary,
            DeviceStatus,
            RosterEntry,
            PageQuery
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance and ledger APIs"),
        (name = "Device", description = "Terminal connectivity APIs"),
    )
)]
pub struct ApiDoc;
