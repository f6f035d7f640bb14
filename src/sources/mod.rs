//! External collaborators of the yield engine.
//!
//! Each upstream service sits behind an async trait so a cycle can be driven
//! by the real HTTP/RPC clients or by in-memory fixtures:
//!
//! - [`BlockSource`] - timestamp to block height resolution
//! - [`IndexerSource`] - subgraph head, pair state and prior volumes
//! - [`PriceSource`] - batched USD prices
//! - [`RewardSource`] - staking contract emission snapshot

mod blocks;
mod prices;
mod staking;
mod subgraph;

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    error::{Result, YieldError},
    models::{PriceMap, PriorVolume, RawPool, RewardSnapshot},
};

pub use blocks::LlamaBlockSource;
pub use prices::LlamaPriceSource;
pub use staking::MasterChefReader;
pub use subgraph::SubgraphClient;

#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Height of the last block at or before `timestamp` on `chain`.
    async fn block_at(&self, chain: &str, timestamp: u64) -> Result<u64>;
}

#[async_trait]
pub trait IndexerSource: Send + Sync {
    /// Latest block the indexer behind `endpoint` has processed.
    async fn latest_indexed_block(&self, endpoint: &str) -> Result<u64>;

    /// Full pair state (tokens, reserves, cumulative volume) at `block`.
    async fn fetch_pools(&self, endpoint: &str, block: u64) -> Result<Vec<RawPool>>;

    /// Cumulative volume only, for the prior snapshot.
    async fn fetch_volumes(&self, endpoint: &str, block: u64) -> Result<Vec<PriorVolume>>;
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Resolve USD prices for `chain:address` keys. `at` selects a historical
    /// price; `None` means current. The result is sparse.
    async fn resolve_prices(&self, keys: &[String], at: Option<u64>) -> Result<PriceMap>;
}

#[async_trait]
pub trait RewardSource: Send + Sync {
    async fn reward_snapshot(&self) -> Result<RewardSnapshot>;
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| YieldError::upstream("http client", e))
}
