use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

use crate::attendance::clock::Clock;
use crate::attendance::fetcher::DeviceBreaker;
use crate::attendance::punctuality::WorkSchedule;
use crate::attendance::service::AttendanceService;
use crate::error::RollupError;
use crate::model::ledger::UpsertOutcome;
use crate::store::{DepartmentDirectory, LedgerStore};

/// Once-per-day gate. Owned by the scheduler and only touched under its lock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RollupState {
    pub ran_today: bool,
    pub last_run_date: Option<NaiveDate>,
}

impl RollupState {
    /// Clears the flag once the calendar date moves past the last run.
    pub fn roll_over(&mut self, today: NaiveDate) {
        if self.last_run_date != Some(today) {
            self.ran_today = false;
        }
    }

    pub fn mark_done(&mut self, today: NaiveDate) {
        self.ran_today = true;
        self.last_run_date = Some(today);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RollupSummary {
    /// attendance rows looked at
    #[schema(example = 42)]
    pub processed: usize,
    #[schema(example = 30)]
    pub inserted: usize,
    #[schema(example = 4)]
    pub updated: usize,
    /// rows without any punch, never persisted
    #[schema(example = 8)]
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// another pass holds the runner lock
    Busy,
    AlreadyRan,
    Completed(RollupSummary),
    Failed,
}

/// Background job persisting yesterday's late/early ledger once per day.
pub struct DailyRollupScheduler {
    service: AttendanceService,
    departments: Arc<dyn DepartmentDirectory>,
    ledger: Arc<dyn LedgerStore>,
    schedule: WorkSchedule,
    interval: Duration,
    clock: Arc<dyn Clock>,
    shutdown: watch::Receiver<bool>,
    state: Mutex<RollupState>,
}

impl DailyRollupScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        service: AttendanceService,
        departments: Arc<dyn DepartmentDirectory>,
        ledger: Arc<dyn LedgerStore>,
        schedule: WorkSchedule,
        interval: Duration,
        clock: Arc<dyn Clock>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            service,
            departments,
            ledger,
            schedule,
            interval,
            clock,
            shutdown,
            state: Mutex::new(RollupState::default()),
        }
    }

    pub async fn state(&self) -> RollupState {
        *self.state.lock().await
    }

    /// One timer firing. Never waits for a pass already in flight.
    pub async fn tick(&self) -> TickOutcome {
        let Ok(mut state) = self.state.try_lock() else {
            debug!("Rollup still running, skipping tick");
            return TickOutcome::Busy;
        };

        let today = self.clock.today();
        state.roll_over(today);
        if state.ran_today {
            return TickOutcome::AlreadyRan;
        }

        let Some(target) = today.pred_opt() else {
            return TickOutcome::Failed;
        };

        match self.run_pass(target).await {
            Ok(summary) => {
                state.mark_done(today);
                TickOutcome::Completed(summary)
            }
            Err(e) => {
                error!(error = %e, %target, "Rollup pass failed, retrying on next tick");
                TickOutcome::Failed
            }
        }
    }

    /// Manual re-run for `date`. Serialized with the timer but leaves the
    /// daily flag alone.
    pub async fn run_once(&self, date: NaiveDate) -> Result<RollupSummary, RollupError> {
        let _runner = self.state.lock().await;
        self.run_pass(date).await
    }

    #[instrument(skip_all, fields(date = %date))]
    async fn run_pass(&self, date: NaiveDate) -> Result<RollupSummary, RollupError> {
        let departments = self.departments.list_departments().await?;
        let breaker = DeviceBreaker::default();
        let mut summary = RollupSummary::default();

        for department in departments {
            if *self.shutdown.borrow() {
                return Err(RollupError::Cancelled);
            }

            let attendance = self
                .service
                .fetch_attendance_with(department.id, Some(date), &breaker)
                .await?;

            for row in &attendance.records {
                summary.processed += 1;

                let Some(mut record) = self.schedule.ledger_record(row) else {
                    summary.skipped += 1;
                    continue;
                };

                // an existing id turns the save into an update of that row
                record.id = self
                    .ledger
                    .find_by_employee_and_date(&record.employee_id, record.work_date)
                    .await?
                    .and_then(|existing| existing.id);

                let outcome = self.ledger.upsert(&record).await?;
                debug!(employee_id = %record.employee_id, %outcome, "Ledger row saved");
                match outcome {
                    UpsertOutcome::Inserted => summary.inserted += 1,
                    UpsertOutcome::Updated => summary.updated += 1,
                }
            }

            debug!(
                department = %department.name,
                rows = attendance.records.len(),
                disconnected = attendance.disconnected_devices.len(),
                "Department rolled up"
            );
        }

        info!(
            processed = summary.processed,
            inserted = summary.inserted,
            updated = summary.updated,
            skipped = summary.skipped,
            "Rollup pass finished"
        );

        Ok(summary)
    }

    /// Ticks every `interval` until the shutdown channel flips to `true` or
    /// its sender is dropped. A pass interrupted by shutdown never sets the
    /// daily flag.
    pub async fn run(self: Arc<Self>) {
        let mut shutdown = self.shutdown.clone();
        info!(interval_secs = self.interval.as_secs_f64(), "Rollup scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                outcome = self.tick() => debug!(?outcome, "Rollup tick"),
                _ = shutdown.changed() => break,
            }

            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("Rollup scheduler stopped");
    }
}
