//! Directory configuration shared by every stage.
//!
//! One [`EtlConfig`] is built per process and handed to each stage through
//! the stage context; nothing in the pipeline reads paths from globals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EtlError, Result};

// ── File names ────────────────────────────────────────────────────────────────

pub const CUSTOMER_INPUT: &str = "customer_data.csv";
pub const USAGE_INPUT: &str = "usage_data.txt";
pub const BILLING_INPUT: &str = "billing_records.txt";

pub const CLEANED_CUSTOMERS: &str = "customer_data_cleaned.csv";
pub const REJECTED_CUSTOMERS: &str = "customer_data_rejected.csv";
pub const DEDUPED_USAGE: &str = "usage_data_deduped.txt";
pub const AGGREGATED_BILLING: &str = "billing_aggregated.txt";

// ── EtlConfig ─────────────────────────────────────────────────────────────────

/// Input, scratch, output and log directories for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Directory holding the day's three extracts.
    pub data_dir: PathBuf,
    /// Scratch directory for intermediate stage outputs.
    pub temp_dir: PathBuf,
    /// Directory receiving the dated report.
    pub output_dir: PathBuf,
    /// Directory receiving the dated append log.
    pub log_dir: PathBuf,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self::rooted_at(Path::new("."))
    }
}

impl EtlConfig {
    /// Standard layout under `base`: `sample_data/`, `temp/`, `output/`, `logs/`.
    pub fn rooted_at(base: &Path) -> Self {
        Self {
            data_dir: base.join("sample_data"),
            temp_dir: base.join("temp"),
            output_dir: base.join("output"),
            log_dir: base.join("logs"),
        }
    }

    /// Load a JSON config file. Keys absent from the file keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| EtlError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    // ── Inputs ────────────────────────────────────────────────────────────

    pub fn customer_input(&self) -> PathBuf {
        self.data_dir.join(CUSTOMER_INPUT)
    }

    pub fn usage_input(&self) -> PathBuf {
        self.data_dir.join(USAGE_INPUT)
    }

    pub fn billing_input(&self) -> PathBuf {
        self.data_dir.join(BILLING_INPUT)
    }

    /// The three extracts checked by the input validator, in check order.
    pub fn required_inputs(&self) -> [PathBuf; 3] {
        [
            self.customer_input(),
            self.usage_input(),
            self.billing_input(),
        ]
    }

    // ── Intermediates ─────────────────────────────────────────────────────

    pub fn cleaned_customers(&self) -> PathBuf {
        self.temp_dir.join(CLEANED_CUSTOMERS)
    }

    pub fn rejected_customers(&self) -> PathBuf {
        self.temp_dir.join(REJECTED_CUSTOMERS)
    }

    pub fn deduped_usage(&self) -> PathBuf {
        self.temp_dir.join(DEDUPED_USAGE)
    }

    pub fn aggregated_billing(&self) -> PathBuf {
        self.temp_dir.join(AGGREGATED_BILLING)
    }

    // ── Outputs ───────────────────────────────────────────────────────────

    /// `telecom_daily_report_YYYYMMDD.txt` in the output directory.
    pub fn report_path(&self, date: NaiveDate) -> PathBuf {
        self.output_dir.join(format!(
            "telecom_daily_report_{}.txt",
            date.format("%Y%m%d")
        ))
    }

    /// `telecom_etl_YYYY_MM_DD.log` in the log directory.
    pub fn log_file_name(date: NaiveDate) -> String {
        format!("telecom_etl_{}.log", date.format("%Y_%m_%d"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
