//! Per-customer billing aggregation.
//!
//! Reduces `billing_records.txt` (pipe-delimited, header first) to one
//! summary line per customer in `billing_aggregated.txt`, in order of each
//! customer's first appearance.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use telecom_core::error::{EtlError, Result};
use telecom_core::formatting::format_decimal;
use telecom_core::models::{is_missing, AggregateStats, BillingLineItem, BillingSummary};
use telecom_core::stage::{stage_names, Stage, StageContext, StageReport};
use tracing::{debug, info};

const DELIMITER: char = '|';

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse one trimmed data line. `line_no` is 1-based and only used in errors.
pub fn parse_billing_line(line: &str, path: &Path, line_no: usize) -> Result<BillingLineItem> {
    let fields: Vec<&str> = line.split(DELIMITER).collect();
    let [customer_id, amount, billing_date] = fields.as_slice() else {
        return Err(EtlError::MalformedRow {
            path: path.to_path_buf(),
            line: line_no,
            expected: BillingLineItem::FIELD_COUNT,
            found: fields.len(),
        });
    };

    let amount = if is_missing(amount) {
        0.0
    } else {
        match amount.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                return Err(EtlError::InvalidNumber {
                    path: path.to_path_buf(),
                    line: line_no,
                    field: "amount",
                    value: amount.to_string(),
                })
            }
        }
    };

    Ok(BillingLineItem {
        customer_id: customer_id.to_string(),
        amount,
        billing_date: billing_date.to_string(),
    })
}

// ── SummaryTable ──────────────────────────────────────────────────────────────

/// Insertion-ordered map of customer id → running summary.
#[derive(Debug, Default)]
pub struct SummaryTable {
    summaries: Vec<BillingSummary>,
    index: HashMap<String, usize>,
}

impl SummaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: &BillingLineItem) {
        match self.index.get(&item.customer_id) {
            Some(&i) => self.summaries[i].add(item),
            None => {
                self.index
                    .insert(item.customer_id.clone(), self.summaries.len());
                self.summaries.push(BillingSummary::new(item));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Summaries in order of first appearance.
    pub fn summaries(&self) -> &[BillingSummary] {
        &self.summaries
    }
}

/// Render one line of the aggregated file (without terminator).
pub fn summary_line(summary: &BillingSummary) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}|{}",
        summary.customer_id,
        format_decimal(summary.total_amount),
        format_decimal(summary.avg_amount()),
        summary.record_count,
        format_decimal(summary.min_amount),
        format_decimal(summary.max_amount),
        summary.last_billing_date,
    )
}

// ── File driver ───────────────────────────────────────────────────────────────

/// Aggregate the billing extract at `input` into `output`.
pub fn aggregate_billing(input: &Path, output: &Path) -> Result<AggregateStats> {
    info!("Starting billing data aggregation");

    let content = std::fs::read_to_string(input).map_err(|source| EtlError::FileRead {
        path: input.to_path_buf(),
        source,
    })?;

    let mut lines = content.lines().enumerate();
    if lines.next().is_none() {
        return Err(EtlError::EmptyInput(input.to_path_buf()));
    }

    let mut table = SummaryTable::new();
    let mut rows = 0;
    for (i, raw) in lines {
        let line = raw.trim();
        if line.is_empty() {
            debug!("Skipping blank billing line {}", i + 1);
            continue;
        }
        let item = parse_billing_line(line, input, i + 1)?;
        table.add(&item);
        rows += 1;
    }

    let write_err = |source| EtlError::FileWrite {
        path: output.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(output).map_err(write_err)?);
    writeln!(writer, "{}", BillingSummary::HEADER).map_err(write_err)?;
    for summary in table.summaries() {
        writeln!(writer, "{}", summary_line(summary)).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    info!("Billing aggregation completed for {} customers", table.len());

    Ok(AggregateStats {
        rows,
        customers: table.len(),
    })
}

/// Stage wrapper over [`aggregate_billing`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BillingAggregator;

impl Stage for BillingAggregator {
    fn name(&self) -> &'static str {
        stage_names::AGGREGATE_BILLING
    }

    fn run(&self, ctx: &StageContext) -> Result<StageReport> {
        let stats = aggregate_billing(
            &ctx.config.billing_input(),
            &ctx.config.aggregated_billing(),
        )?;
        Ok(StageReport::Aggregated(stats))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
