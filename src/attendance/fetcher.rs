use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::device::DeviceGateway;
use crate::model::attendance::{AttendanceWindow, RawEvent};
use crate::model::device::DeviceCredential;
use crate::model::employee::RosterEntry;

/// Everything one fan-out managed to collect.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub events: Vec<RawEvent>,
    /// Devices that failed the probe or were tripped during the pass.
    pub disconnected: Vec<String>,
    pub failed_pairs: usize,
}

/// Devices tripped so far in one pass, keyed by ip.
///
/// A rollup shares one breaker across every department it fetches, so a
/// broken terminal costs one probe and at most one failing call per pass.
#[derive(Debug, Default)]
pub struct DeviceBreaker {
    tripped: Mutex<HashSet<String>>,
}

impl DeviceBreaker {
    fn tripped(&self) -> MutexGuard<'_, HashSet<String>> {
        self.tripped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_tripped(&self, ip: &str) -> bool {
        self.tripped().contains(ip)
    }

    /// `true` only for the call that trips `ip`.
    pub fn trip(&self, ip: &str) -> bool {
        self.tripped().insert(ip.to_string())
    }
}

enum PairResult {
    Events(Vec<RawEvent>),
    Failed,
    Skipped,
}

/// Queries every (device, employee) pair for one window.
///
/// A failing pair never aborts the fan-out. A device that is unreachable,
/// times out or refuses digest auth is tripped in `breaker` and neither
/// probed nor queried again while that breaker lives.
#[derive(Clone)]
pub struct EventFetcher {
    gateway: Arc<dyn DeviceGateway>,
    concurrency: usize,
}

impl EventFetcher {
    pub fn new(gateway: Arc<dyn DeviceGateway>, concurrency: usize) -> Self {
        Self {
            gateway,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn fetch(
        &self,
        devices: &[DeviceCredential],
        employees: &[RosterEntry],
        window: &AttendanceWindow,
        breaker: &DeviceBreaker,
    ) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();

        for device in devices {
            if breaker.is_tripped(&device.ip) {
                debug!(device = %device, "Device already tripped in this pass");
                outcome.disconnected.push(device.ip.clone());
                continue;
            }

            if !self.gateway.is_reachable(device).await {
                warn!(device = %device, "Skipping device as it's not responding");
                breaker.trip(&device.ip);
                outcome.disconnected.push(device.ip.clone());
                continue;
            }

            let results: Vec<PairResult> = stream::iter(
                employees
                    .iter()
                    .filter(|e| !e.employee_id.trim().is_empty()),
            )
            .map(|employee| self.query_pair(device, employee, window, breaker))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

            for result in results {
                match result {
                    PairResult::Events(events) => outcome.events.extend(events),
                    PairResult::Failed => outcome.failed_pairs += 1,
                    PairResult::Skipped => {}
                }
            }

            if breaker.is_tripped(&device.ip) {
                outcome.disconnected.push(device.ip.clone());
            }
        }

        info!(
            day = %window.day(),
            devices = devices.len(),
            employees = employees.len(),
            events = outcome.events.len(),
            disconnected = outcome.disconnected.len(),
            failed_pairs = outcome.failed_pairs,
            "Event fan-out finished"
        );

        outcome
    }

    async fn query_pair(
        &self,
        device: &DeviceCredential,
        employee: &RosterEntry,
        window: &AttendanceWindow,
        breaker: &DeviceBreaker,
    ) -> PairResult {
        if breaker.is_tripped(&device.ip) {
            return PairResult::Skipped;
        }

        match self
            .gateway
            .query_events(device, &employee.employee_id, window)
            .await
        {
            Ok(events) => PairResult::Events(events),
            Err(e) if e.trips_device() => {
                if breaker.trip(&device.ip) {
                    warn!(device = %device, error = %e, "Device failed, skipping it for the rest of this pass");
                }
                PairResult::Failed
            }
            Err(e) => {
                warn!(
                    device = %device,
                    employee_id = %employee.employee_id,
                    error = %e,
                    "Error processing results for employee"
                );
                PairResult::Failed
            }
        }
    }
}
