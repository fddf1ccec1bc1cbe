//! Bounded retry around individual stages.

use std::time::Duration;

use telecom_core::error::Result;
use telecom_core::stage::{Stage, StageContext, StageReport};
use tracing::{info, warn};

use crate::pipeline::{run_logged, Pipeline};

/// How many times a failed stage is re-attempted, and how long to wait first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    /// One retry after three minutes.
    fn default() -> Self {
        Self {
            retries: 1,
            delay: Duration::from_secs(180),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Run `stage` up to `retries + 1` times, returning the last error when
    /// every attempt fails.
    pub async fn run_stage(&self, stage: &dyn Stage, ctx: &StageContext) -> Result<StageReport> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match run_logged(stage, ctx) {
                Ok(report) => return Ok(report),
                Err(e) if attempt > self.retries => return Err(e),
                Err(_) => {
                    warn!(
                        "Retrying stage {} in {}s (attempt {} of {})",
                        stage.name(),
                        self.delay.as_secs(),
                        attempt + 1,
                        self.retries.saturating_add(1)
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }

    /// Run the whole pipeline in order with per-stage retries.
    pub async fn run_pipeline(
        &self,
        pipeline: &Pipeline,
        ctx: &StageContext,
    ) -> Result<Vec<StageReport>> {
        info!("Starting ETL pipeline");
        let mut reports = Vec::new();
        for stage in pipeline.stages() {
            reports.push(self.run_stage(stage, ctx).await?);
        }
        info!("ETL pipeline completed");
        Ok(reports)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use telecom_core::config::EtlConfig;
    use telecom_core::error::EtlError;
    use tempfile::TempDir;

    /// Fails the first `failures` calls, then succeeds.
    struct Flaky {
        failures: u32,
        calls: Arc<AtomicU32>,
    }

    impl Stage for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn run(&self, _ctx: &StageContext) -> Result<StageReport> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(EtlError::Config("transient".to_string()))
            } else {
                Ok(StageReport::Validated { files: 3 })
            }
        }
    }

    fn ctx(tmp: &TempDir) -> StageContext {
        StageContext::new(EtlConfig::rooted_at(tmp.path()))
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 1);
        assert_eq!(policy.delay, Duration::from_secs(180));
    }

    #[tokio::test]
    async fn test_recovers_within_budget() {
        let tmp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let stage = Flaky {
            failures: 1,
            calls: Arc::clone(&calls),
        };

        let policy = RetryPolicy::new(1, Duration::ZERO);
        let report = policy.run_stage(&stage, &ctx(&tmp)).await.unwrap();

        assert_eq!(report, StageReport::Validated { files: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let tmp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let stage = Flaky {
            failures: 5,
            calls: Arc::clone(&calls),
        };

        let policy = RetryPolicy::new(2, Duration::ZERO);
        let err = policy.run_stage(&stage, &ctx(&tmp)).await.unwrap_err();

        assert!(matches!(err, EtlError::Config(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_runs_once() {
        let tmp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let stage = Flaky {
            failures: 1,
            calls: Arc::clone(&calls),
        };

        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert!(policy.run_stage(&stage, &ctx(&tmp)).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pipeline_missing_inputs_fails_after_retries() {
        let tmp = TempDir::new().unwrap();
        let policy = RetryPolicy::new(1, Duration::ZERO);
        let err = policy
            .run_pipeline(&Pipeline::standard(), &ctx(&tmp))
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::MissingInput(_)));
    }
}
