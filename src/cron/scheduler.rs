//! Cron scheduler for watch mode.
//!
//! Recomputes live yields on a fixed interval. A failed cycle is logged and
//! the next tick starts from scratch; cycles are never retried in between.

use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::{config::SchedulerSettings, engine::YieldEngine};

use super::jobs;

/// Cron scheduler that runs the yield job periodically.
pub struct CronScheduler {
    engine: Arc<YieldEngine>,
    chain: String,
    settings: SchedulerSettings,
}

impl CronScheduler {
    pub fn new(engine: Arc<YieldEngine>, chain: String, settings: SchedulerSettings) -> Self {
        Self {
            engine,
            chain,
            settings,
        }
    }

    /// Runs one cycle immediately, then one per interval until cancellation.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        if let Err(e) = jobs::publish_yield::run(&self.engine, &self.chain, None).await {
            error!("Failed to publish yields: {:#}", e);
        }

        let mut scheduler = JobScheduler::new().await?;

        self.register_publish_yield_job(&scheduler).await?;

        scheduler.start().await?;
        info!("Cron scheduler started");

        cancellation_token.cancelled().await;
        info!("Cron scheduler shutting down...");

        scheduler.shutdown().await?;
        Ok(())
    }

    async fn register_publish_yield_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let engine = self.engine.clone();
        let chain = self.chain.clone();
        let interval = self.settings.interval_secs;

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(interval),
            move |_uuid, _lock| {
                let engine = engine.clone();
                let chain = chain.clone();
                Box::pin(async move {
                    if let Err(e) = jobs::publish_yield::run(&engine, &chain, None).await {
                        error!("Failed to publish yields: {:#}", e);
                    }
                })
            },
        )?;

        scheduler.add(job).await?;
        info!("Registered publish_yield job (every {}s)", interval);
        Ok(())
    }
}
