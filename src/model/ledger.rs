use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

/// Persisted late/early row, unique on (`employee_id`, `work_date`).
///
/// `time_in` / `time_out` hold the terminal's wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 17,
        "employee_id": "1024",
        "name": "Nguyen Van An",
        "work_date": "2025-10-09",
        "time_in": "2025-10-09T07:41:12",
        "time_out": "2025-10-09T16:58:03",
        "is_late": true,
        "is_early": false
    })
)]
pub struct LedgerRecord {
    #[schema(example = 17, nullable = true)]
    pub id: Option<u64>,

    #[schema(example = "1024")]
    pub employee_id: String,

    #[schema(example = "Nguyen Van An")]
    pub name: String,

    #[schema(example = "2025-10-09", value_type = String, format = "date")]
    pub work_date: NaiveDate,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub time_in: Option<NaiveDateTime>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub time_out: Option<NaiveDateTime>,

    pub is_late: bool,
    pub is_early: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
