use serde::{Deserialize, Serialize};
use std::fmt;

// ── Sentinels ─────────────────────────────────────────────────────────────────

/// Marker treated the same as an empty field in every extract.
pub const NULL_MARKER: &str = "NULL";

pub const UNKNOWN_CUSTOMER_ID: &str = "UNKNOWN";
pub const UNKNOWN_NAME: &str = "UNKNOWN_CUSTOMER";
pub const UNKNOWN_PHONE: &str = "0000000000";
pub const UNKNOWN_EMAIL: &str = "noemail@unknown.com";
pub const UNKNOWN_REGISTRATION_DATE: &str = "1900-01-01";
pub const UNKNOWN_STATUS: &str = "INACTIVE";
pub const UNKNOWN_CREDIT_LIMIT: &str = "0";

/// Status value counted as an active customer in the daily report.
pub const ACTIVE_STATUS: &str = "ACTIVE";

/// Returns `true` for values that carry no data (`""` or `"NULL"`).
///
/// The comparison is exact: `" "` and `"null"` are real values.
pub fn is_missing(value: &str) -> bool {
    value.is_empty() || value == NULL_MARKER
}

/// Return `value`, or `sentinel` when the value is missing.
pub fn or_sentinel<'a>(value: &'a str, sentinel: &'a str) -> &'a str {
    if is_missing(value) {
        sentinel
    } else {
        value
    }
}

// ── CustomerRecord ────────────────────────────────────────────────────────────

/// One cleansed row of `customer_data.csv`.
///
/// `credit_limit` is carried as text: the extract is never recomputed, only
/// passed through (or defaulted to `"0"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub registration_date: String,
    pub status: String,
    pub credit_limit: String,
}

impl CustomerRecord {
    /// Number of columns in the customer extract.
    pub const FIELD_COUNT: usize = 7;

    /// Header written to `customer_data_cleaned.csv`.
    pub const HEADER: [&'static str; Self::FIELD_COUNT] = [
        "customer_id",
        "name",
        "phone",
        "email",
        "registration_date",
        "status",
        "credit_limit",
    ];

    /// Zero-based column of `status`.
    pub const STATUS_COLUMN: usize = 5;

    /// Fields in column order, ready for a CSV writer.
    pub fn fields(&self) -> [&str; Self::FIELD_COUNT] {
        [
            &self.customer_id,
            &self.name,
            &self.phone,
            &self.email,
            &self.registration_date,
            &self.status,
            &self.credit_limit,
        ]
    }

    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}

// ── Row outcomes ──────────────────────────────────────────────────────────────

/// Why a customer row was routed to the reject file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The row does not have [`CustomerRecord::FIELD_COUNT`] fields.
    FieldCount { found: usize },
    /// The phone number (after defaulting) is not exactly 10 ASCII digits.
    InvalidPhone(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::FieldCount { found } => write!(
                f,
                "field count: expected {}, found {}",
                CustomerRecord::FIELD_COUNT,
                found
            ),
            RejectReason::InvalidPhone(phone) => write!(f, "invalid phone: {:?}", phone),
        }
    }
}

/// Tagged result of parsing and validating a single customer row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Clean(CustomerRecord),
    Rejected(RejectReason),
}

// ── Billing ───────────────────────────────────────────────────────────────────

/// One data row of `billing_records.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingLineItem {
    pub customer_id: String,
    /// `0.0` when the extract carries an empty or `NULL` amount.
    pub amount: f64,
    pub billing_date: String,
}

impl BillingLineItem {
    /// Number of pipe-delimited columns in the billing extract.
    pub const FIELD_COUNT: usize = 3;
}

/// Running per-customer statistics over billing line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub customer_id: String,
    pub total_amount: f64,
    pub record_count: u64,
    pub min_amount: f64,
    pub max_amount: f64,
    /// Lexicographically greatest date string seen for the customer.
    pub last_billing_date: String,
}

impl BillingSummary {
    /// Header of `billing_aggregated.txt`.
    pub const HEADER: &'static str =
        "customer_id|total_amount|avg_amount|record_count|min_amount|max_amount|last_billing_date";

    /// Number of pipe-delimited columns in the aggregated file.
    pub const FIELD_COUNT: usize = 7;

    /// Zero-based column of `total_amount` in the aggregated file.
    pub const TOTAL_COLUMN: usize = 1;

    /// Start a summary from the first item seen for a customer.
    pub fn new(item: &BillingLineItem) -> Self {
        Self {
            customer_id: item.customer_id.clone(),
            total_amount: item.amount,
            record_count: 1,
            min_amount: item.amount,
            max_amount: item.amount,
            last_billing_date: item.billing_date.clone(),
        }
    }

    /// Fold another item for the same customer into the running totals.
    pub fn add(&mut self, item: &BillingLineItem) {
        self.total_amount += item.amount;
        self.record_count += 1;
        if item.amount < self.min_amount {
            self.min_amount = item.amount;
        }
        if item.amount > self.max_amount {
            self.max_amount = item.amount;
        }
        // Plain string comparison; only calendar-correct for zero-padded ISO dates.
        if item.billing_date > self.last_billing_date {
            self.last_billing_date = item.billing_date.clone();
        }
    }

    /// `total_amount / record_count`. A summary always holds at least one item.
    pub fn avg_amount(&self) -> f64 {
        self.total_amount / self.record_count as f64
    }
}

// ── Stage counters ────────────────────────────────────────────────────────────

/// Counters reported by the customer cleanser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanseStats {
    pub input: usize,
    pub cleaned: usize,
    pub rejected: usize,
}

/// Counters reported by the usage deduplicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupeStats {
    pub input_count: usize,
    pub output_count: usize,
}

impl DedupeStats {
    pub fn duplicates_removed(&self) -> usize {
        self.input_count - self.output_count
    }
}

/// Counters reported by the billing aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    /// Billing data rows consumed (header and blank lines excluded).
    pub rows: usize,
    /// Distinct customers written to the summary file.
    pub customers: usize,
}

/// Figures recomputed by the report composer from the stage outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportStats {
    pub total_customers: usize,
    pub active_customers: usize,
    pub usage_records: usize,
    pub total_data_usage_mb: f64,
    pub billing_customers: usize,
    pub total_revenue: f64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
