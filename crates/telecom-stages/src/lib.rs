//! The five batch stages of the daily telecom ETL.
//!
//! Each module exposes a plain function over explicit paths plus a
//! [`Stage`](telecom_core::stage::Stage) wrapper that resolves those paths
//! from the run configuration.

pub mod aggregator;
pub mod cleanser;
pub mod deduplicator;
pub mod report;
pub mod validator;

pub use aggregator::BillingAggregator;
pub use cleanser::CustomerCleanser;
pub use deduplicator::UsageDeduplicator;
pub use report::ReportComposer;
pub use validator::InputValidator;

pub use telecom_core as core;
