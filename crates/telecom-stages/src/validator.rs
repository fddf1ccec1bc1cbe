//! Gatekeeper for the day's extracts.
//!
//! Confirms every required input exists and can be opened for reading. No
//! content is read; the open handle is dropped immediately.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use telecom_core::error::{EtlError, Result};
use telecom_core::stage::{stage_names, Stage, StageContext, StageReport};
use tracing::info;

/// Check each path in order, failing on the first missing or unreadable one.
///
/// Returns the number of files validated.
pub fn validate_inputs(paths: &[PathBuf]) -> Result<usize> {
    info!("Validating input files...");

    for path in paths {
        check_readable(path)?;
        info!("Validated file: {}", path.display());
    }

    info!("All input files validated successfully");
    Ok(paths.len())
}

fn check_readable(path: &Path) -> Result<()> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(EtlError::MissingInput(path.to_path_buf()))
        }
        Err(source) => {
            return Err(EtlError::Unreadable {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.is_file() {
        return Err(EtlError::NotAFile(path.to_path_buf()));
    }

    File::open(path)
        .map(drop)
        .map_err(|source| EtlError::Unreadable {
            path: path.to_path_buf(),
            source,
        })
}

/// Stage wrapper over [`validate_inputs`] for the configured extracts.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputValidator;

impl Stage for InputValidator {
    fn name(&self) -> &'static str {
        stage_names::VALIDATE
    }

    fn run(&self, ctx: &StageContext) -> Result<StageReport> {
        let files = validate_inputs(&ctx.config.required_inputs())?;
        Ok(StageReport::Validated { files })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
