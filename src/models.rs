use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::DailyAttendance;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DepartmentAttendanceReq {
    #[schema(example = 3)]
    pub department_id: u64,
    /// defaults to today in the attendance offset
    #[schema(example = "2025-10-09", value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceRangeReq {
    #[schema(example = "Van An")]
    pub employee_name: String,
    #[schema(example = "2025-10-01", value_type = String, format = "date")]
    pub start_time: NaiveDate,
    #[schema(example = "2025-10-09", value_type = String, format = "date")]
    pub end_time: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RollupReq {
    #[schema(example = "2025-10-08", value_type = String, format = "date")]
    pub date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct DepartmentAttendanceResponse {
    pub data: Vec<DailyAttendance>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 15)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: usize,
    #[schema(example = 3)]
    pub total_pages: u32,
    #[schema(example = json!(["192.168.1.65"]))]
    pub disconnected_devices: Vec<String>,
}
