use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::EtlConfig;
use crate::error::Result;
use crate::stage::stage_names;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Daily telecom extract ETL
#[derive(Parser, Debug, Clone)]
#[command(
    name = "telecom-etl",
    about = "Daily telecom extract ETL: validate, cleanse, dedupe, aggregate, report",
    version
)]
pub struct Settings {
    /// Base directory for the default sample_data/temp/output/logs layout
    #[arg(long, global = true, default_value = ".")]
    pub base_dir: PathBuf,

    /// JSON configuration file with directory overrides
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the input extracts
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Scratch directory for intermediate files
    #[arg(long, global = true)]
    pub temp_dir: Option<PathBuf>,

    /// Directory receiving the daily report
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Directory receiving the daily log file
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// One entry point per pipeline operation, plus whole-pipeline drivers.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check that the three input extracts exist and are readable
    Validate,
    /// Cleanse the customer extract into cleaned and rejected files
    #[command(alias = "clean_customers")]
    CleanCustomers,
    /// Remove exact duplicate lines from the usage extract
    #[command(alias = "dedupe_usage")]
    DedupeUsage,
    /// Summarise billing line items per customer
    #[command(alias = "aggregate_billing")]
    AggregateBilling,
    /// Compose the daily report from the stage outputs
    #[command(alias = "final_report")]
    FinalReport,
    /// Run every stage in order, retrying failed stages
    Run(RetryArgs),
    /// Run the whole pipeline once a day
    Schedule {
        #[command(flatten)]
        retry: RetryArgs,

        /// Local hour of day (0-23) at which the pipeline is triggered
        #[arg(long, default_value = "0", value_parser = clap::value_parser!(u32).range(0..=23))]
        at_hour: u32,
    },
}

/// Bounded retry parameters for whole-pipeline runs.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RetryArgs {
    /// Extra attempts per stage after a failure
    #[arg(long, default_value = "1")]
    pub retries: u32,

    /// Seconds to wait between attempts
    #[arg(long, default_value = "180")]
    pub retry_delay_secs: u64,
}

impl Command {
    /// Pipeline stage name for single-stage commands, `None` for drivers.
    pub fn stage_name(&self) -> Option<&'static str> {
        match self {
            Command::Validate => Some(stage_names::VALIDATE),
            Command::CleanCustomers => Some(stage_names::CLEAN_CUSTOMERS),
            Command::DedupeUsage => Some(stage_names::DEDUPE_USAGE),
            Command::AggregateBilling => Some(stage_names::AGGREGATE_BILLING),
            Command::FinalReport => Some(stage_names::FINAL_REPORT),
            Command::Run(_) | Command::Schedule { .. } => None,
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process command line.
    pub fn load() -> Self {
        Self::parse()
    }

    /// Build the run configuration: config file (or the default layout under
    /// `--base-dir`), then any directory flags given on the command line.
    pub fn resolve_config(&self) -> Result<EtlConfig> {
        let mut config = match &self.config {
            Some(path) => EtlConfig::load_from(path)?,
            None => EtlConfig::rooted_at(&self.base_dir),
        };

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.temp_dir {
            config.temp_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = dir.clone();
        }

        Ok(config)
    }

    /// Log level after applying `--debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
