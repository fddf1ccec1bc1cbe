mod bootstrap;

use std::time::Duration;

use anyhow::Result;
use telecom_core::settings::{Command, RetryArgs, Settings};
use telecom_core::stage::StageContext;
use telecom_runtime::pipeline::Pipeline;
use telecom_runtime::retry::RetryPolicy;
use telecom_runtime::scheduler::{DailyRunner, DailySchedule};

fn retry_policy(args: &RetryArgs) -> RetryPolicy {
    RetryPolicy::new(args.retries, Duration::from_secs(args.retry_delay_secs))
}

/// Run one stage by name. Its failure is already logged by the pipeline.
fn run_single_stage(pipeline: &Pipeline, name: &str, ctx: &StageContext) -> Result<()> {
    pipeline.run_stage(name, ctx)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();
    let config = settings.resolve_config()?;

    bootstrap::ensure_directories(&config)?;
    let _guard = bootstrap::setup_logging(settings.effective_log_level(), &config)?;

    tracing::info!("telecom-etl v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Configuration: {:?}", config);

    let ctx = StageContext::new(config);
    let pipeline = Pipeline::standard();

    if let Some(name) = settings.command.stage_name() {
        return run_single_stage(&pipeline, name, &ctx);
    }

    match &settings.command {
        Command::Run(retry) => {
            if let Err(e) = retry_policy(retry).run_pipeline(&pipeline, &ctx).await {
                tracing::error!("ETL pipeline failed: {}", e);
                return Err(e.into());
            }
        }

        Command::Schedule { retry, at_hour } => {
            let schedule = DailySchedule::new(*at_hour)?;
            let runner = DailyRunner::new(pipeline, ctx, schedule, retry_policy(retry));
            let handle = runner.start();

            tokio::signal::ctrl_c().await?;
            tracing::info!("Ctrl+C received; stopping daily schedule");
            handle.abort();
        }

        // Single-stage commands were dispatched above.
        _ => {}
    }

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
