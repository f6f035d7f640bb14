//! Job computing one yield cycle and publishing the records as JSON.

use std::io::Write;

use anyhow::{Context, Result};
use log::info;

use crate::engine::YieldEngine;

/// Computes pool records for `chain` and writes them to stdout as a JSON array.
///
/// Nothing is written when the cycle fails. Returns the number of records.
pub async fn run(engine: &YieldEngine, chain: &str, timestamp: Option<u64>) -> Result<usize> {
    info!("Starting publish_yield job for {}...", chain);

    let start = std::time::Instant::now();

    let records = engine
        .compute_yield(chain, timestamp)
        .await
        .with_context(|| format!("Yield cycle for {} failed", chain))?;

    let json = serde_json::to_string(&records).context("Failed to serialize pool records")?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json).context("Failed to write pool records")?;
    stdout.flush()?;

    info!(
        "Completed publish_yield job in {:?} ({} pools)",
        start.elapsed(),
        records.len()
    );
    Ok(records.len())
}
