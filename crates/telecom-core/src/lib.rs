//! Shared foundation for the telecom ETL crates.
//!
//! Holds the error taxonomy, the extract data model, the run configuration,
//! CLI settings and the stage contract that every pipeline step implements.

pub mod config;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod stage;

pub use error::{EtlError, Result};
