//! Block height reconciliation.
//!
//! Picks the two heights a cycle reads at: "now" (or the time-travel
//! timestamp) and exactly one day earlier. In live mode the current height is
//! replaced by the head of the slowest indexer, after checking that indexer is
//! not too far behind the chain.

use chrono::Utc;
use futures::future::try_join_all;
use log::{info, warn};

use crate::{
    config::StalenessSettings,
    error::{Result, YieldError},
    models::BlockPair,
    sources::{BlockSource, IndexerSource},
};

/// Distance between the current and the prior snapshot
pub const SNAPSHOT_OFFSET_SECS: u64 = 86_400;

pub struct BlockReconciler<'a> {
    pub blocks: &'a dyn BlockSource,
    pub indexer: &'a dyn IndexerSource,
    pub staleness: &'a StalenessSettings,
}

impl BlockReconciler<'_> {
    /// Resolve the block pair for a cycle.
    ///
    /// `time_travel` of `None` means live mode against the current wall clock.
    pub async fn reconcile(
        &self,
        chain: &str,
        time_travel: Option<u64>,
        endpoints: &[String],
    ) -> Result<BlockPair> {
        let timestamp = time_travel.unwrap_or_else(|| Utc::now().timestamp().max(0) as u64);
        let timestamp_prior = timestamp.saturating_sub(SNAPSHOT_OFFSET_SECS);

        let block = self.blocks.block_at(chain, timestamp).await?;
        let block_prior = self.blocks.block_at(chain, timestamp_prior).await?;

        // Historical indexers are assumed synced for past blocks
        if time_travel.is_some() {
            return ordered_pair(chain, block, block_prior);
        }

        let indexed = self.min_indexed_block(endpoints).await?;
        check_staleness(chain, block, indexed, self.staleness.threshold_for(chain))?;

        info!(
            "Reconciled {} blocks: current {} (resolved {}), prior {}",
            chain, indexed, block, block_prior
        );

        ordered_pair(chain, indexed, block_prior)
    }

    /// Head of the slowest indexer. All endpoints are queried concurrently.
    async fn min_indexed_block(&self, endpoints: &[String]) -> Result<u64> {
        let heads = try_join_all(
            endpoints
                .iter()
                .map(|endpoint| self.indexer.latest_indexed_block(endpoint)),
        )
        .await?;

        heads.into_iter().min().ok_or(YieldError::NoIndexer)
    }
}

/// Reject a window whose current height is below the prior one.
fn ordered_pair(chain: &str, current: u64, prior: u64) -> Result<BlockPair> {
    if current < prior {
        return Err(YieldError::malformed(
            "block api",
            format!("{chain} current block {current} is below prior block {prior}"),
        ));
    }

    Ok(BlockPair::new(current, prior))
}

/// Fail if the indexed head is `threshold` or more blocks away from the
/// resolved head, in either direction.
///
/// A gap of exactly `threshold` counts as stale. Deployments that ran with a
/// strict `>` accepted that gap, so a configured threshold here rejects one
/// block earlier than it did there.
pub fn check_staleness(chain: &str, resolved: u64, indexed: u64, threshold: u64) -> Result<()> {
    let delta = resolved.abs_diff(indexed);

    if delta >= threshold {
        warn!(
            "Indexer behind on {}: resolved block {}, indexed block {}",
            chain, resolved, indexed
        );
        return Err(YieldError::StaleData {
            chain: chain.to_string(),
            resolved,
            indexed,
            delta,
            threshold,
        });
    }

    Ok(())
}
