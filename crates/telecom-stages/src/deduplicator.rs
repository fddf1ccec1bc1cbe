//! Exact-line deduplication of the usage extract.
//!
//! Lines are compared byte for byte including their terminator, so the
//! header and a final unterminated line take part like any other line.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use telecom_core::error::{EtlError, Result};
use telecom_core::models::DedupeStats;
use telecom_core::stage::{stage_names, Stage, StageContext, StageReport};
use tracing::info;

/// Split `content` into lines (keeping `\n`) and keep the first occurrence
/// of each, in input order.
pub fn dedupe_lines(content: &[u8]) -> (Vec<&[u8]>, DedupeStats) {
    let mut seen: HashSet<&[u8]> = HashSet::new();
    let mut kept = Vec::new();
    let mut input_count = 0;

    for line in content.split_inclusive(|&b| b == b'\n') {
        input_count += 1;
        if seen.insert(line) {
            kept.push(line);
        }
    }

    let stats = DedupeStats {
        input_count,
        output_count: kept.len(),
    };
    (kept, stats)
}

/// Deduplicate `input` into `output`.
pub fn dedupe_usage(input: &Path, output: &Path) -> Result<DedupeStats> {
    info!("Starting usage data deduplication");

    let content = std::fs::read(input).map_err(|source| EtlError::FileRead {
        path: input.to_path_buf(),
        source,
    })?;

    let (lines, stats) = dedupe_lines(&content);

    let write_err = |source| EtlError::FileWrite {
        path: output.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(output).map_err(write_err)?);
    for line in &lines {
        writer.write_all(line).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    info!(
        "Deduplication completed - Removed {} duplicates",
        stats.duplicates_removed()
    );
    info!("Final usage records: {}", stats.output_count);

    Ok(stats)
}

/// Stage wrapper over [`dedupe_usage`].
#[derive(Debug, Default, Clone, Copy)]
pub struct UsageDeduplicator;

impl Stage for UsageDeduplicator {
    fn name(&self) -> &'static str {
        stage_names::DEDUPE_USAGE
    }

    fn run(&self, ctx: &StageContext) -> Result<StageReport> {
        let stats = dedupe_usage(&ctx.config.usage_input(), &ctx.config.deduped_usage())?;
        Ok(StageReport::Deduplicated(stats))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_repeat_dropped() {
        let (lines, stats) = dedupe_lines(b"a\nb\na\n");
        assert_eq!(lines, vec![&b"a\n"[..], &b"b\n"[..]]);
        assert_eq!(stats.duplicates_removed(), 1);
        assert_eq!(stats.output_count, 2);
    }

    #[test]
    fn test_whitespace_is_significant() {
        let (lines, stats) = dedupe_lines(b"a\na \na\n a\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(stats.duplicates_removed(), 1);
    }

    #[test]
    fn test_unterminated_last_line_differs_from_terminated() {
        let (lines, _) = dedupe_lines(b"x\ny\nx");
        assert_eq!(lines, vec![&b"x\n"[..], &b"y\n"[..], &b"x"[..]]);
    }

    #[test]
    fn test_empty_input() {
        let (lines, stats) = dedupe_lines(b"");
        assert!(lines.is_empty());
        assert_eq!(stats, DedupeStats::default());
    }

    #[test]
    fn test_output_is_ordered_subsequence_without_repeats() {
        let input = b"h\n3\n1\n3\n2\n1\n1\n4\nh\n";
        let (lines, stats) = dedupe_lines(input);

        let all: Vec<&[u8]> = input.split_inclusive(|&b| b == b'\n').collect();
        let mut cursor = all.iter();
        for line in &lines {
            assert!(cursor.any(|l| l == line), "order not preserved");
        }

        let unique: HashSet<&[u8]> = lines.iter().copied().collect();
        assert_eq!(unique.len(), lines.len());
        assert_eq!(stats.output_count, stats.input_count - stats.duplicates_removed());
        assert_eq!(
            lines,
            vec![&b"h\n"[..], &b"3\n"[..], &b"1\n"[..], &b"2\n"[..], &b"4\n"[..]]
        );
    }

    #[test]
    fn test_file_round_trip() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("usage_data.txt");
        let output = tmp.path().join("usage_data_deduped.txt");
        std::fs::write(
            &input,
            "customer_id|date|data_mb\nC1|2024-01-01|10.5\nC1|2024-01-01|10.5\nC2|2024-01-01|3\n",
        )
        .unwrap();

        let stats = dedupe_usage(&input, &output).unwrap();
        assert_eq!(stats.input_count, 4);
        assert_eq!(stats.output_count, 3);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "customer_id|date|data_mb\nC1|2024-01-01|10.5\nC2|2024-01-01|3\n"
        );
    }

    #[test]
    fn test_missing_input_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = dedupe_usage(&tmp.path().join("absent.txt"), &tmp.path().join("out.txt"))
            .unwrap_err();
        assert!(matches!(err, EtlError::FileRead { .. }));
    }
}
