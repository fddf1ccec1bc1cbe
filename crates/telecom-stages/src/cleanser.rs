//! Customer extract cleansing.
//!
//! Each data row of `customer_data.csv` is defaulted, validated and
//! normalised. Rows that fail validation are kept verbatim for manual review
//! in `customer_data_rejected.csv`; they never stop the stage.

use std::borrow::Cow;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Terminator, Writer, WriterBuilder};
use telecom_core::error::{EtlError, Result};
use telecom_core::models::{
    or_sentinel, CleanseStats, CustomerRecord, RejectReason, RowOutcome, UNKNOWN_CREDIT_LIMIT,
    UNKNOWN_CUSTOMER_ID, UNKNOWN_EMAIL, UNKNOWN_NAME, UNKNOWN_PHONE, UNKNOWN_REGISTRATION_DATE,
    UNKNOWN_STATUS,
};
use telecom_core::stage::{stage_names, Stage, StageContext, StageReport};
use tracing::{debug, info};

const PHONE_LENGTH: usize = 10;

// ── Row rules ─────────────────────────────────────────────────────────────────

/// `true` when `phone` is exactly ten ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == PHONE_LENGTH && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Rewrite an eight-digit `YYYYMMDD` date as `YYYY-MM-DD`.
///
/// Any other shape is returned untouched; no calendar validation is done.
pub fn normalize_registration_date(date: &str) -> Cow<'_, str> {
    if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) {
        Cow::Owned(format!("{}-{}-{}", &date[0..4], &date[4..6], &date[6..8]))
    } else {
        Cow::Borrowed(date)
    }
}

/// Default, validate and normalise one customer row.
pub fn cleanse_row<S: AsRef<str>>(fields: &[S]) -> RowOutcome {
    let [customer_id, name, phone, email, registration_date, status, credit_limit] = fields else {
        return RowOutcome::Rejected(RejectReason::FieldCount {
            found: fields.len(),
        });
    };

    let phone = or_sentinel(phone.as_ref(), UNKNOWN_PHONE);
    if !is_valid_phone(phone) {
        return RowOutcome::Rejected(RejectReason::InvalidPhone(phone.to_string()));
    }

    let registration_date = or_sentinel(registration_date.as_ref(), UNKNOWN_REGISTRATION_DATE);

    RowOutcome::Clean(CustomerRecord {
        customer_id: or_sentinel(customer_id.as_ref(), UNKNOWN_CUSTOMER_ID).to_string(),
        name: or_sentinel(name.as_ref(), UNKNOWN_NAME).to_string(),
        phone: phone.to_string(),
        email: or_sentinel(email.as_ref(), UNKNOWN_EMAIL).to_string(),
        registration_date: normalize_registration_date(registration_date).into_owned(),
        status: or_sentinel(status.as_ref(), UNKNOWN_STATUS).to_string(),
        credit_limit: or_sentinel(credit_limit.as_ref(), UNKNOWN_CREDIT_LIMIT).to_string(),
    })
}

// ── File driver ───────────────────────────────────────────────────────────────

/// Cleanse `input` into `cleaned_path`, writing `rejected_path` only when at
/// least one row is rejected.
pub fn cleanse_customers(
    input: &Path,
    cleaned_path: &Path,
    rejected_path: &Path,
) -> Result<CleanseStats> {
    info!("Starting customer data cleaning process");

    let csv_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| EtlError::Csv { path, source }
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(input)
        .map_err(csv_err(input))?;

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(csv_err(input))?,
        None => return Err(EtlError::EmptyInput(input.to_path_buf())),
    };

    let mut cleaned_writer = open_writer(cleaned_path)?;
    cleaned_writer
        .write_record(CustomerRecord::HEADER)
        .map_err(csv_err(cleaned_path))?;

    let mut stats = CleanseStats::default();
    let mut rejected: Vec<StringRecord> = Vec::new();

    for record in records {
        let record = record.map_err(csv_err(input))?;
        stats.input += 1;

        let fields: Vec<&str> = record.iter().collect();
        match cleanse_row(&fields) {
            RowOutcome::Clean(customer) => {
                cleaned_writer
                    .write_record(customer.fields())
                    .map_err(csv_err(cleaned_path))?;
                stats.cleaned += 1;
            }
            RowOutcome::Rejected(reason) => {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                debug!("Rejected customer row at line {}: {}", line, reason);
                rejected.push(record);
                stats.rejected += 1;
            }
        }
    }

    cleaned_writer
        .flush()
        .map_err(|source| EtlError::FileWrite {
            path: cleaned_path.to_path_buf(),
            source,
        })?;

    if rejected.is_empty() {
        remove_stale(rejected_path)?;
    } else {
        let mut reject_writer = open_writer(rejected_path)?;
        reject_writer
            .write_record(&header)
            .map_err(csv_err(rejected_path))?;
        for record in &rejected {
            reject_writer
                .write_record(record)
                .map_err(csv_err(rejected_path))?;
        }
        reject_writer
            .flush()
            .map_err(|source| EtlError::FileWrite {
                path: rejected_path.to_path_buf(),
                source,
            })?;
    }

    info!(
        "Customer data cleaning completed - Input: {}, Output: {}, Rejected: {}",
        stats.input, stats.cleaned, stats.rejected
    );

    Ok(stats)
}

/// `\n`-terminated writer that accepts rows of any width.
fn open_writer(path: &Path) -> Result<Writer<std::fs::File>> {
    WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_path(path)
        .map_err(|source| EtlError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Drop a reject file left behind by an earlier run.
fn remove_stale(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale reject file {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(EtlError::FileWrite {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Stage wrapper over [`cleanse_customers`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CustomerCleanser;

impl Stage for CustomerCleanser {
    fn name(&self) -> &'static str {
        stage_names::CLEAN_CUSTOMERS
    }

    fn run(&self, ctx: &StageContext) -> Result<StageReport> {
        let config = &ctx.config;
        let stats = cleanse_customers(
            &config.customer_input(),
            &config.cleaned_customers(),
            &config.rejected_customers(),
        )?;
        Ok(StageReport::Cleansed(stats))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
