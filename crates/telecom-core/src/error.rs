use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors produced by the telecom ETL stages.
///
/// Per-row recoverable outcomes (a customer row with a bad phone number) are
/// not errors; see [`crate::models::RowOutcome`].
#[derive(Error, Debug)]
pub enum EtlError {
    /// A required input file does not exist.
    #[error("Missing input file: {0}")]
    MissingInput(PathBuf),

    /// A required input path exists but is not a regular file.
    #[error("Input path is not a file: {0}")]
    NotAFile(PathBuf),

    /// A required input file exists but cannot be opened for reading.
    #[error("Cannot read file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader or writer failed on the given file.
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A file that must at least carry a header line is empty.
    #[error("Input file is empty: {0}")]
    EmptyInput(PathBuf),

    /// A delimited row has the wrong number of fields.
    #[error("Malformed row at {path}:{line}: expected {expected} fields, found {found}")]
    MalformedRow {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A mandatory numeric field could not be parsed.
    #[error("Invalid number in {path}:{line} field '{field}': {value:?}")]
    InvalidNumber {
        path: PathBuf,
        line: usize,
        field: &'static str,
        value: String,
    },

    /// No stage is registered under the requested name.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the telecom crates.
pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_input() {
        let err = EtlError::MissingInput(PathBuf::from("/data/customer_data.csv"));
        assert_eq!(
            err.to_string(),
            "Missing input file: /data/customer_data.csv"
        );
    }

    #[test]
    fn test_error_display_unreadable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = EtlError::Unreadable {
            path: PathBuf::from("/data/usage_data.txt"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Cannot read file"));
        assert!(msg.contains("/data/usage_data.txt"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_error_display_malformed_row() {
        let err = EtlError::MalformedRow {
            path: PathBuf::from("billing_records.txt"),
            line: 4,
            expected: 3,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "Malformed row at billing_records.txt:4: expected 3 fields, found 2"
        );
    }

    #[test]
    fn test_error_display_invalid_number() {
        let err = EtlError::InvalidNumber {
            path: PathBuf::from("billing_records.txt"),
            line: 2,
            field: "amount",
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid number in billing_records.txt:2 field 'amount': \"abc\""
        );
    }

    #[test]
    fn test_error_display_unknown_stage() {
        let err = EtlError::UnknownStage("load_warehouse".to_string());
        assert_eq!(err.to_string(), "Unknown stage: load_warehouse");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: EtlError = io_err.into();
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: EtlError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
