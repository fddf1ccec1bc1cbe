//! Daily report composition.
//!
//! Recomputes every figure from the intermediate files rather than trusting
//! the counters of earlier stages, then renders the fixed-layout report.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Local, NaiveDateTime};
use csv::ReaderBuilder;
use regex::Regex;
use telecom_core::config::EtlConfig;
use telecom_core::error::{EtlError, Result};
use telecom_core::formatting::{format_amount, format_decimal};
use telecom_core::models::{BillingSummary, CustomerRecord, ReportStats, ACTIVE_STATUS};
use telecom_core::stage::{stage_names, Stage, StageContext, StageReport};
use tracing::info;

const USAGE_VALUE_COLUMN: usize = 2;

/// ASCII digits with at most one decimal point, e.g. `12`, `12.5`, `12.`, `.5`.
fn usage_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:[0-9]+\.?[0-9]*|\.[0-9]+)$").expect("regex is valid"))
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| EtlError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

// ── Section figures ───────────────────────────────────────────────────────────

/// `(total, active)` customer rows in the cleaned customer file.
pub fn customer_stats(path: &Path) -> Result<(usize, usize)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| EtlError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut total = 0;
    let mut active = 0;
    for record in reader.records() {
        let record = record.map_err(|source| EtlError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        total += 1;

        let Some(status) = record.get(CustomerRecord::STATUS_COLUMN) else {
            return Err(EtlError::MalformedRow {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line() as usize).unwrap_or_default(),
                expected: CustomerRecord::FIELD_COUNT,
                found: record.len(),
            });
        };
        if status == ACTIVE_STATUS {
            active += 1;
        }
    }

    Ok((total, active))
}

/// `(records, total_mb)` over the deduplicated usage file.
///
/// Every line after the header counts as a record; only third fields that
/// look like non-negative decimals contribute to the total.
pub fn usage_stats(path: &Path) -> Result<(usize, f64)> {
    let content = read_text(path)?;
    let pattern = usage_value_pattern();

    let mut records = 0;
    let mut total_mb = 0.0;
    for (i, raw) in content.lines().enumerate().skip(1) {
        records += 1;
        let Some(value) = raw.trim().split('|').nth(USAGE_VALUE_COLUMN) else {
            continue;
        };
        if !pattern.is_match(value) {
            continue;
        }
        total_mb += value.parse::<f64>().map_err(|_| EtlError::InvalidNumber {
            path: path.to_path_buf(),
            line: i + 1,
            field: "data_usage_mb",
            value: value.to_string(),
        })?;
    }

    Ok((records, total_mb))
}

/// `(customers, revenue)` over the aggregated billing file.
pub fn billing_stats(path: &Path) -> Result<(usize, f64)> {
    let content = read_text(path)?;

    let mut customers = 0;
    let mut revenue = 0.0;
    for (i, line) in content.lines().enumerate().skip(1) {
        customers += 1;
        let fields: Vec<&str> = line.split('|').collect();
        let Some(total) = fields.get(BillingSummary::TOTAL_COLUMN) else {
            return Err(EtlError::MalformedRow {
                path: path.to_path_buf(),
                line: i + 1,
                expected: BillingSummary::FIELD_COUNT,
                found: fields.len(),
            });
        };
        match total.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => revenue += value,
            _ => {
                return Err(EtlError::InvalidNumber {
                    path: path.to_path_buf(),
                    line: i + 1,
                    field: "total_amount",
                    value: total.to_string(),
                })
            }
        }
    }

    Ok((customers, revenue))
}

/// Gather all report figures from the stage outputs named by `config`.
pub fn collect_stats(config: &EtlConfig) -> Result<ReportStats> {
    let (total_customers, active_customers) = customer_stats(&config.cleaned_customers())?;
    let (usage_records, total_data_usage_mb) = usage_stats(&config.deduped_usage())?;
    let (billing_customers, total_revenue) = billing_stats(&config.aggregated_billing())?;

    Ok(ReportStats {
        total_customers,
        active_customers,
        usage_records,
        total_data_usage_mb,
        billing_customers,
        total_revenue,
    })
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Render the report text for `stats` as generated at `generated_at`.
pub fn render_report(stats: &ReportStats, generated_at: NaiveDateTime) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== TELECOM DAILY ETL REPORT - {} ===\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    out.push_str("CUSTOMER DATA STATISTICS:\n");
    out.push_str(&format!(
        "  - Total customers processed: {}\n",
        stats.total_customers
    ));
    out.push_str(&format!(
        "  - Active customers: {}\n\n",
        stats.active_customers
    ));

    out.push_str("USAGE DATA STATISTICS:\n");
    out.push_str(&format!(
        "  - Total usage records: {}\n",
        stats.usage_records
    ));
    out.push_str(&format!(
        "  - Total data usage (MB): {}\n\n",
        format_decimal(stats.total_data_usage_mb)
    ));

    out.push_str("BILLING DATA STATISTICS:\n");
    out.push_str(&format!(
        "  - Customers with billing: {}\n",
        stats.billing_customers
    ));
    out.push_str(&format!(
        "  - Total revenue: {}\n\n",
        format_amount(stats.total_revenue)
    ));

    out.push_str("PROCESSING SUMMARY:\n");
    out.push_str("  - Script: telecom_etl_pipeline (Rust version)\n");
    out.push_str("  - Status: SUCCESS\n");
    out.push_str(&format!(
        "  - Report generated at: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S%.6f")
    ));

    out
}

/// Compute, render and write the dated report. Returns its path and figures.
pub fn compose_report(
    config: &EtlConfig,
    generated_at: NaiveDateTime,
) -> Result<(PathBuf, ReportStats)> {
    info!("Creating final consolidated report");

    let stats = collect_stats(config)?;
    let path = config.report_path(generated_at.date());
    std::fs::write(&path, render_report(&stats, generated_at)).map_err(|source| {
        EtlError::FileWrite {
            path: path.clone(),
            source,
        }
    })?;

    info!("Final report created: {}", path.display());
    Ok((path, stats))
}

/// Stage wrapper over [`compose_report`], stamped with the local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportComposer;

impl Stage for ReportComposer {
    fn name(&self) -> &'static str {
        stage_names::FINAL_REPORT
    }

    fn run(&self, ctx: &StageContext) -> Result<StageReport> {
        let (path, stats) = compose_report(&ctx.config, Local::now().naive_local())?;
        Ok(StageReport::Reported { path, stats })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    fn seed(config: &EtlConfig, customers: &str, usage: &str, billing: &str) {
        std::fs::create_dir_all(&config.temp_dir).unwrap();
        std::fs::create_dir_all(&config.output_dir).unwrap();
        std::fs::write(config.cleaned_customers(), customers).unwrap();
        std::fs::write(config.deduped_usage(), usage).unwrap();
        std::fs::write(config.aggregated_billing(), billing).unwrap();
    }

    // ── customer_stats ────────────────────────────────────────────────────────

    #[test]
    fn test_customer_stats_counts_active() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cleaned.csv");
        std::fs::write(
            &path,
            "customer_id,name,phone,email,registration_date,status,credit_limit\n\
             C1,A,5551234567,a@x.com,2024-01-01,ACTIVE,500\n\
             C2,B,5551234568,b@x.com,2024-01-01,INACTIVE,0\n\
             C3,C,5551234569,c@x.com,2024-01-01,ACTIVE,10\n",
        )
        .unwrap();
        assert_eq!(customer_stats(&path).unwrap(), (3, 2));
    }

    #[test]
    fn test_customer_stats_short_row_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cleaned.csv");
        std::fs::write(&path, "h1,h2,h3,h4,h5,h6,h7\nC1,A,555\n").unwrap();
        assert!(matches!(
            customer_stats(&path).unwrap_err(),
            EtlError::MalformedRow { found: 3, .. }
        ));
    }

    // ── usage_stats ───────────────────────────────────────────────────────────

    #[test]
    fn test_usage_stats_skips_header_and_non_numeric() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("usage.txt");
        std::fs::write(
            &path,
            "customer_id|date|data_mb\n\
             C1|2024-01-01|10.5\n\
             C2|2024-01-01|NULL\n\
             C3|2024-01-01|-4\n\
             C4|2024-01-01| 2 \n\
             C5|2024-01-01\n\
             C6|2024-01-01|.5\n",
        )
        .unwrap();

        let (records, total) = usage_stats(&path).unwrap();
        assert_eq!(records, 6);
        assert!((total - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_usage_value_pattern() {
        let p = usage_value_pattern();
        for ok in ["0", "12", "12.5", "12.", ".5"] {
            assert!(p.is_match(ok), "{ok} should match");
        }
        for bad in ["", ".", "1.2.3", "-1", "1e3", " 1", "abc", "\u{0663}", "1\u{0663}.5", "NaN"] {
            assert!(!p.is_match(bad), "{bad} should not match");
        }
    }

    #[test]
    fn test_usage_stats_ignores_non_ascii_digits() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("usage.txt");
        std::fs::write(
            &path,
            "h|d|mb\nC1|2024-01-01|10\nC2|2024-01-01|\u{0663}\nC3|2024-01-01|\u{0661}\u{0662}\n",
        )
        .unwrap();

        let (records, total) = usage_stats(&path).unwrap();
        assert_eq!(records, 3);
        assert!((total - 10.0).abs() < 1e-9);
    }

    // ── billing_stats ─────────────────────────────────────────────────────────

    #[test]
    fn test_billing_stats_sums_totals() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("agg.txt");
        std::fs::write(
            &path,
            format!(
                "{}\nC1|30.0|15.0|2|10.0|20.0|2024-01-10\nC2|7.255|7.255|1|7.255|7.255|2024-02-01\n",
                BillingSummary::HEADER
            ),
        )
        .unwrap();
        let (customers, revenue) = billing_stats(&path).unwrap();
        assert_eq!(customers, 2);
        assert!((revenue - 37.255).abs() < 1e-9);
    }

    #[test]
    fn test_billing_stats_bad_total_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("agg.txt");
        std::fs::write(&path, "header\nC1|oops|1|1|1|1|d\n").unwrap();
        assert!(matches!(
            billing_stats(&path).unwrap_err(),
            EtlError::InvalidNumber { line: 2, .. }
        ));
    }

    #[test]
    fn test_billing_stats_non_finite_total_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("agg.txt");
        for total in ["NaN", "inf", "-infinity"] {
            std::fs::write(&path, format!("header\nC1|{total}|1|1|1|1|d\n")).unwrap();
            assert!(
                matches!(
                    billing_stats(&path).unwrap_err(),
                    EtlError::InvalidNumber { field: "total_amount", line: 2, .. }
                ),
                "{total} should be rejected"
            );
        }
    }

    // ── render_report / compose_report ────────────────────────────────────────

    #[test]
    fn test_render_report_layout() {
        let stats = ReportStats {
            total_customers: 3,
            active_customers: 2,
            usage_records: 5,
            total_data_usage_mb: 120.0,
            billing_customers: 2,
            total_revenue: 1234.5,
        };
        let text = render_report(&stats, at(2025, 1, 2, 3, 4, 5));

        assert_eq!(
            text,
            "=== TELECOM DAILY ETL REPORT - 2025-01-02 03:04:05 ===\n\
             \n\
             CUSTOMER DATA STATISTICS:\n\
             \x20 - Total customers processed: 3\n\
             \x20 - Active customers: 2\n\
             \n\
             USAGE DATA STATISTICS:\n\
             \x20 - Total usage records: 5\n\
             \x20 - Total data usage (MB): 120.0\n\
             \n\
             BILLING DATA STATISTICS:\n\
             \x20 - Customers with billing: 2\n\
             \x20 - Total revenue: 1234.50\n\
             \n\
             PROCESSING SUMMARY:\n\
             \x20 - Script: telecom_etl_pipeline (Rust version)\n\
             \x20 - Status: SUCCESS\n\
             \x20 - Report generated at: 2025-01-02 03:04:05.000000\n"
        );
    }

    #[test]
    fn test_compose_report_writes_dated_file() {
        let tmp = TempDir::new().unwrap();
        let config = EtlConfig::rooted_at(tmp.path());
        seed(
            &config,
            "customer_id,name,phone,email,registration_date,status,credit_limit\n\
             C1,A,5551234567,a@x.com,2024-01-01,ACTIVE,500\n",
            "customer_id|date|data_mb\nC1|2024-01-01|1.5\n",
            &format!(
                "{}\nC1|30.0|15.0|2|10.0|20.0|2024-01-10\n",
                BillingSummary::HEADER
            ),
        );

        let (path, stats) = compose_report(&config, at(2025, 6, 30, 23, 59, 0)).unwrap();

        assert_eq!(path, config.output_dir.join("telecom_daily_report_20250630.txt"));
        assert_eq!(stats.total_customers, 1);
        assert_eq!(stats.active_customers, 1);
        assert_eq!(stats.usage_records, 1);
        assert_eq!(stats.billing_customers, 1);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("  - Total data usage (MB): 1.5\n"));
        assert!(text.contains("  - Total revenue: 30.00\n"));
    }

    #[test]
    fn test_compose_report_missing_input_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let config = EtlConfig::rooted_at(tmp.path());
        let err = compose_report(&config, at(2025, 1, 1, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, EtlError::Csv { .. }));
    }
}
