//! Uniform contract shared by every pipeline stage.

use std::fmt;
use std::path::PathBuf;

use crate::config::EtlConfig;
use crate::error::Result;
use crate::models::{AggregateStats, CleanseStats, DedupeStats, ReportStats};

/// Stage names, matching the task ids the external scheduler invokes.
pub mod stage_names {
    pub const VALIDATE: &str = "validate";
    pub const CLEAN_CUSTOMERS: &str = "clean_customers";
    pub const DEDUPE_USAGE: &str = "dedupe_usage";
    pub const AGGREGATE_BILLING: &str = "aggregate_billing";
    pub const FINAL_REPORT: &str = "final_report";
}

/// Everything a stage may touch during a run.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub config: EtlConfig,
}

impl StageContext {
    pub fn new(config: EtlConfig) -> Self {
        Self { config }
    }
}

/// Counters returned by a successful stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageReport {
    Validated { files: usize },
    Cleansed(CleanseStats),
    Deduplicated(DedupeStats),
    Aggregated(AggregateStats),
    Reported { path: PathBuf, stats: ReportStats },
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageReport::Validated { files } => write!(f, "{} input files validated", files),
            StageReport::Cleansed(s) => write!(
                f,
                "Input: {}, Output: {}, Rejected: {}",
                s.input, s.cleaned, s.rejected
            ),
            StageReport::Deduplicated(s) => write!(
                f,
                "Input: {}, Output: {}, Removed: {}",
                s.input_count,
                s.output_count,
                s.duplicates_removed()
            ),
            StageReport::Aggregated(s) => {
                write!(f, "{} rows summarised for {} customers", s.rows, s.customers)
            }
            StageReport::Reported { path, .. } => write!(f, "report written to {}", path.display()),
        }
    }
}

/// A single batch step. A stage reads its whole input and writes its whole
/// output before returning.
pub trait Stage: Send + Sync {
    /// Scheduler task name, one of [`stage_names`].
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &StageContext) -> Result<StageReport>;
}
