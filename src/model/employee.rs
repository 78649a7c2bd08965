use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row of a department roster.
///
/// `employee_id` is the attendance code enrolled on the terminals. It is the
/// value sent as `employeeNoString` and echoed back in every event, so it is
/// the only key used for reconciliation and for the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "1024",
        "employee_no": "NV-0042",
        "name": "Nguyen Van An"
    })
)]
pub struct RosterEntry {
    #[schema(example = "1024")]
    pub employee_id: String,

    #[schema(example = "NV-0042", nullable = true)]
    pub employee_no: Option<String>,

    #[schema(example = "Nguyen Van An")]
    pub name: String,
}

impl RosterEntry {
    pub fn new(employee_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            employee_no: None,
            name: name.into(),
        }
    }
}

/// Last whitespace-delimited token of a display name ("Nguyen Van An" -> "An").
pub fn name_sort_key(name: &str) -> &str {
    name.split_whitespace().next_back().unwrap_or(name)
}
