//! Daily trigger for the whole pipeline.
//!
//! A thin caller of [`Pipeline`]: sleeps until the configured local hour,
//! runs every stage with retries, and repeats. A failed day is logged and
//! the loop waits for the next trigger.

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use telecom_core::error::{EtlError, Result};
use telecom_core::stage::StageContext;
use tracing::{error, info};

use crate::pipeline::Pipeline;
use crate::retry::RetryPolicy;

// ── DailySchedule ─────────────────────────────────────────────────────────────

/// Fires once a day at `HH:00:00` local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(hour: u32) -> Result<Self> {
        let at = NaiveTime::from_hms_opt(hour, 0, 0)
            .ok_or_else(|| EtlError::Config(format!("invalid trigger hour: {}", hour)))?;
        Ok(Self { at })
    }

    /// Midnight, the default daily trigger.
    pub fn midnight() -> Self {
        Self {
            at: NaiveTime::MIN,
        }
    }

    /// First trigger strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            today + TimeDelta::days(1)
        }
    }
}

// ── DailyRunner ───────────────────────────────────────────────────────────────

/// Owns everything needed to run the pipeline on a daily trigger.
pub struct DailyRunner {
    pipeline: Pipeline,
    ctx: StageContext,
    schedule: DailySchedule,
    policy: RetryPolicy,
}

impl DailyRunner {
    pub fn new(
        pipeline: Pipeline,
        ctx: StageContext,
        schedule: DailySchedule,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            pipeline,
            ctx,
            schedule,
            policy,
        }
    }

    /// Spawn the trigger loop on the tokio runtime.
    pub fn start(self) -> DailyHandle {
        let handle = tokio::spawn(async move {
            self.run_loop().await;
        });
        DailyHandle { handle }
    }

    async fn run_loop(self) {
        loop {
            let now = Local::now().naive_local();
            let next = self.schedule.next_after(now);
            info!("Next pipeline run scheduled at {}", next);

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            match self.policy.run_pipeline(&self.pipeline, &self.ctx).await {
                Ok(reports) => info!("Scheduled run finished ({} stages)", reports.len()),
                Err(e) => error!("Scheduled run failed: {}", e),
            }
        }
    }
}

/// Handle to the spawned trigger loop.
pub struct DailyHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl DailyHandle {
    /// Stop the loop immediately.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
