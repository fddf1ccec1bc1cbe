use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use telecom_core::config::EtlConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Create the scratch, output and log directories if absent.
///
/// The data directory is left alone: a missing input directory is reported
/// by the validator like any other missing extract.
pub fn ensure_directories(config: &EtlConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.temp_dir)?;
    std::fs::create_dir_all(&config.output_dir)?;
    std::fs::create_dir_all(&config.log_dir)?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name onto an `EnvFilter` directive.
fn level_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

// ── Dated log file ─────────────────────────────────────────────────────────────

/// Append-only writer over `telecom_etl_YYYY_MM_DD.log` that moves to the
/// next day's file once the local date changes.
#[derive(Debug)]
pub struct DatedLogFile {
    dir: PathBuf,
    date: NaiveDate,
    file: File,
}

impl DatedLogFile {
    /// Open (or create) the log file for `date` in `dir`.
    pub fn open(dir: &Path, date: NaiveDate) -> io::Result<Self> {
        let file = open_append(dir, date)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            date,
            file,
        })
    }

    pub fn current_path(&self) -> PathBuf {
        self.dir.join(EtlConfig::log_file_name(self.date))
    }

    /// Write `buf` into the file for `date`, switching files first if needed.
    fn write_dated(&mut self, date: NaiveDate, buf: &[u8]) -> io::Result<usize> {
        if date != self.date {
            self.file = open_append(&self.dir, date)?;
            self.date = date;
        }
        self.file.write(buf)
    }
}

impl Write for DatedLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_dated(Local::now().date_naive(), buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(dir: &Path, date: NaiveDate) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(EtlConfig::log_file_name(date)))
}

/// Initialise the global `tracing` subscriber.
///
/// Records go both to stdout and to the dated log file in the log directory,
/// appending when the file already exists. A long-running `schedule` process
/// moves to a new file each local day. The returned guard flushes the file
/// writer on drop and must outlive the run.
pub fn setup_logging(log_level: &str, config: &EtlConfig) -> anyhow::Result<WorkerGuard> {
    let filter = EnvFilter::try_new(level_directive(log_level))?;

    let log_file = DatedLogFile::open(&config.log_dir, Local::now().date_naive())
        .with_context(|| format!("cannot open log file in {}", config.log_dir.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(log_file);

    let timer = ChronoLocal::new(TIMESTAMP_FORMAT.to_string());

    let console_layer = fmt::layer()
        .with_target(false)
        .with_timer(timer.clone())
        .with_writer(std::io::stdout);

    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
