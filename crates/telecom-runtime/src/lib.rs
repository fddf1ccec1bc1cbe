//! Runtime orchestration layer for the telecom ETL.
//!
//! Sequences the stages, retries failed ones and drives the daily trigger.

pub mod pipeline;
pub mod retry;
pub mod scheduler;

pub use telecom_core as core;
pub use telecom_stages as stages;
