//! ISAPI `AcsEvent` search: request body, response envelope and the
//! gateway that runs it through [`DigestAuthClient`].

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::device::DeviceGateway;
use crate::device::client::DigestAuthClient;
use crate::error::FetchError;
use crate::model::attendance::{AttendanceWindow, RawEvent};
use crate::model::device::DeviceCredential;

pub const ACS_EVENT_PATH: &str = "/ISAPI/AccessControl/AcsEvent?format=json";

/// Access-control event class and "authenticated via card/face/fingerprint" subtype.
pub const MAJOR_ACCESS_EVENT: u32 = 5;
pub const MINOR_AUTHENTICATED: u32 = 75;

pub const DEFAULT_MAX_RESULTS: u32 = 48;

const NO_MATCH: &str = "NO MATCH";

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

#[derive(Debug, Serialize)]
pub struct AcsEventRequest {
    #[serde(rename = "AcsEventCond")]
    pub cond: AcsEventCond,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcsEventCond {
    pub search_id: String,
    pub search_result_position: u32,
    pub max_results: u32,
    pub major: u32,
    pub minor: u32,
    pub start_time: String,
    pub end_time: String,
    pub employee_no_string: String,
}

impl AcsEventRequest {
    pub fn for_employee(employee_id: &str, window: &AttendanceWindow, max_results: u32) -> Self {
        Self {
            cond: AcsEventCond {
                search_id: Uuid::new_v4().to_string(),
                search_result_position: 0,
                max_results,
                major: MAJOR_ACCESS_EVENT,
                minor: MINOR_AUTHENTICATED,
                start_time: format_time(&window.start),
                end_time: format_time(&window.end),
                employee_no_string: employee_id.to_string(),
            },
        }
    }
}

pub fn format_time(t: &DateTime<FixedOffset>) -> String {
    t.format(TIME_FORMAT).to_string()
}

#[derive(Debug, Deserialize)]
struct AcsEventEnvelope {
    #[serde(rename = "AcsEvent")]
    acs_event: Option<AcsEventBody>,
}

#[derive(Debug, Deserialize)]
struct AcsEventBody {
    #[serde(rename = "responseStatusStrg")]
    status: Option<String>,
    #[serde(rename = "InfoList")]
    info_list: Option<Vec<InfoRecord>>,
}

#[derive(Debug, Deserialize)]
struct InfoRecord {
    #[serde(rename = "employeeNoString")]
    employee_no: Option<String>,
    name: Option<String>,
    time: Option<String>,
}

/// Events from a search response.
///
/// `NO MATCH` is an empty result. Any other status but `OK` is an error for
/// the whole response. Single entries without an employee number or with an
/// unreadable time are dropped.
pub fn parse_events(body: &str) -> Result<Vec<RawEvent>, FetchError> {
    let envelope: AcsEventEnvelope = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("invalid json: {e}")))?;

    let acs_event = envelope
        .acs_event
        .ok_or_else(|| FetchError::MalformedResponse("missing AcsEvent".into()))?;

    match acs_event.status.as_deref() {
        Some(status) if status.eq_ignore_ascii_case("ok") => {}
        Some(status) if status.eq_ignore_ascii_case(NO_MATCH) => return Ok(Vec::new()),
        other => {
            return Err(FetchError::MalformedResponse(format!(
                "responseStatusStrg = {}",
                other.unwrap_or("<missing>")
            )));
        }
    }

    // terminals leave InfoList out when nothing matched
    let info_list = acs_event.info_list.unwrap_or_default();

    let events = info_list
        .into_iter()
        .filter_map(|info| {
            let employee_id = info.employee_no.filter(|id| !id.trim().is_empty())?;
            let raw_time = info.time?;
            match DateTime::parse_from_rfc3339(&raw_time) {
                Ok(timestamp) => Some(RawEvent::new(
                    employee_id.trim(),
                    info.name.unwrap_or_default(),
                    timestamp,
                )),
                Err(e) => {
                    debug!(employee_id = %employee_id, time = %raw_time, error = %e, "Dropping event with bad time");
                    None
                }
            }
        })
        .collect();

    Ok(events)
}

/// Talks to Hikvision terminals over ISAPI.
#[derive(Clone)]
pub struct HikvisionGateway {
    client: DigestAuthClient,
    max_results: u32,
}

impl HikvisionGateway {
    pub fn new(client: DigestAuthClient, max_results: u32) -> Self {
        Self {
            client,
            max_results,
        }
    }
}

#[async_trait]
impl DeviceGateway for HikvisionGateway {
    async fn is_reachable(&self, device: &DeviceCredential) -> bool {
        self.client.probe(device).await
    }

    async fn query_events(
        &self,
        device: &DeviceCredential,
        employee_id: &str,
        window: &AttendanceWindow,
    ) -> Result<Vec<RawEvent>, FetchError> {
        let request = AcsEventRequest::for_employee(employee_id, window, self.max_results);
        let body = serde_json::to_string(&request)
            .map_err(|e| FetchError::MalformedResponse(format!("cannot encode request: {e}")))?;

        let response = self.client.call(device, ACS_EVENT_PATH, &body).await?;
        debug!(device = %device, employee_id, status = response.status, "AcsEvent search answered");
        parse_events(&response.body)
    }
}
