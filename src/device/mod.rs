pub mod client;
pub mod digest;
pub mod hikvision;
pub mod tls;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::attendance::{AttendanceWindow, RawEvent};
use crate::model::device::DeviceCredential;

/// Event source behind the fan-out. One implementation per terminal vendor.
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    async fn is_reachable(&self, device: &DeviceCredential) -> bool;

    /// Events of one employee inside `window`.
    async fn query_events(
        &self,
        device: &DeviceCredential,
        employee_id: &str,
        window: &AttendanceWindow,
    ) -> Result<Vec<RawEvent>, FetchError>;
}
