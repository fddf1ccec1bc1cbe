//! Ordered stage list with barrier semantics.
//!
//! Every stage runs to completion before the next one starts, and the first
//! fatal error stops the run.

use telecom_core::error::{EtlError, Result};
use telecom_core::stage::{Stage, StageContext, StageReport};
use telecom_stages::{
    BillingAggregator, CustomerCleanser, InputValidator, ReportComposer, UsageDeduplicator,
};
use tracing::{error, info};

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// validate → clean_customers → dedupe_usage → aggregate_billing → final_report
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(InputValidator),
            Box::new(CustomerCleanser),
            Box::new(UsageDeduplicator),
            Box::new(BillingAggregator),
            Box::new(ReportComposer),
        ])
    }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn stages(&self) -> impl Iterator<Item = &dyn Stage> {
        self.stages.iter().map(|s| s.as_ref())
    }

    /// Look up a stage by its task name.
    pub fn stage(&self, name: &str) -> Result<&dyn Stage> {
        self.stages()
            .find(|s| s.name() == name)
            .ok_or_else(|| EtlError::UnknownStage(name.to_string()))
    }

    /// Run a single stage by name.
    pub fn run_stage(&self, name: &str, ctx: &StageContext) -> Result<StageReport> {
        run_logged(self.stage(name)?, ctx)
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run_all(&self, ctx: &StageContext) -> Result<Vec<StageReport>> {
        info!("Starting ETL pipeline");
        let mut reports = Vec::with_capacity(self.stages.len());
        for stage in self.stages() {
            reports.push(run_logged(stage, ctx)?);
        }
        info!("ETL pipeline completed");
        Ok(reports)
    }
}

/// Run `stage`, logging its start, outcome and counters.
pub fn run_logged(stage: &dyn Stage, ctx: &StageContext) -> Result<StageReport> {
    info!("Stage {} started", stage.name());
    match stage.run(ctx) {
        Ok(report) => {
            info!("Stage {} finished: {}", stage.name(), report);
            Ok(report)
        }
        Err(e) => {
            error!("Stage {} failed: {}", stage.name(), e);
            Err(e)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
