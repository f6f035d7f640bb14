use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use jemallocator::Jemalloc;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use lpyield::{cron::jobs, CronScheduler, Settings, YieldEngine};

/// Pool TVL and APY estimator for a V2-style DEX with liquidity mining.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file, without extension
    #[arg(long, default_value = "config")]
    config: String,

    /// Chain to compute, must match the configured chain
    #[arg(long)]
    chain: Option<String>,

    /// Replay the day ending at this unix timestamp instead of now
    #[arg(long, conflicts_with = "watch")]
    timestamp: Option<u64>,

    /// Recompute on the configured interval until stopped
    #[arg(long)]
    watch: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    SimpleLogger::new()
        .with_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .init()
        .context("Failed to initialize logger")?;

    let settings = Arc::new(Settings::from_path(&args.config).with_context(|| {
        format!(
            "Failed to load {}.yaml. Please ensure it exists and is valid",
            args.config
        )
    })?);

    let chain = settings
        .select_chain(args.chain.as_deref())
        .context("Invalid --chain")?;

    let engine = Arc::new(
        YieldEngine::from_settings(settings.clone())
            .context("Failed to initialize upstream clients")?,
    );

    if !args.watch {
        jobs::publish_yield::run(&engine, &chain, args.timestamp).await?;
        return Ok(());
    }

    run_watch(engine, chain, settings).await
}

async fn run_watch(
    engine: Arc<YieldEngine>,
    chain: String,
    settings: Arc<Settings>,
) -> anyhow::Result<()> {
    let cancellation_token = CancellationToken::new();

    let scheduler = CronScheduler::new(engine, chain, settings.scheduler.clone());
    let cron_token = cancellation_token.child_token();
    let cron_handle = tokio::spawn(async move { scheduler.run(cron_token).await });

    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    info!("Watching yields. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
            _ = sigterm_stream.recv() => {
                info!("Received SIGTERM, exiting gracefully...");
            },
        };
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
        };
    }

    cancellation_token.cancel();

    info!("Waiting for cron scheduler to stop...");
    cron_handle
        .await
        .context("Cron scheduler task panicked")?
        .context("Cron scheduler failed")?;

    Ok(())
}
