//! Temporal reconciliation and yield computation.
//!
//! A cycle runs, in data dependency order:
//!
//! 1. [`blocks`] - current and 24h-prior block heights, staleness check
//! 2. pool state at `current`, volumes at `prior` and the staking snapshot
//!    (concurrent, all-or-nothing)
//! 3. one batched price lookup for every pool token and the reward token
//! 4. [`tvl`] - USD TVL per pool
//! 5. [`fees`] - 24h fee revenue annualized against TVL
//! 6. [`rewards`] - emission share annualized against TVL
//! 7. [`assembler`] - pool records, then the finite filter

pub mod assembler;
pub mod blocks;
pub mod fees;
pub mod rewards;
pub mod tvl;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use log::{info, warn};

use crate::{
    config::Settings,
    error::{Result, YieldError},
    models::PoolRecord,
    sources::{
        http_client, BlockSource, IndexerSource, LlamaBlockSource, LlamaPriceSource,
        MasterChefReader, PriceSource, RewardSource, SubgraphClient,
    },
};

use assembler::{keep_finite, PoolRecordAssembler};
use blocks::BlockReconciler;
use fees::{fee_economics, prior_volume_index};
use rewards::{reward_apy, RewardParams};
use tvl::{attach_tvl, price_keys};

/// Computes pool yield records from upstream snapshots.
///
/// Holds no state between cycles; the same historical timestamp over the same
/// upstream data always yields the same records.
pub struct YieldEngine {
    settings: Arc<Settings>,
    blocks: Arc<dyn BlockSource>,
    indexer: Arc<dyn IndexerSource>,
    prices: Arc<dyn PriceSource>,
    rewards: Arc<dyn RewardSource>,
}

impl YieldEngine {
    pub fn new(
        settings: Arc<Settings>,
        blocks: Arc<dyn BlockSource>,
        indexer: Arc<dyn IndexerSource>,
        prices: Arc<dyn PriceSource>,
        rewards: Arc<dyn RewardSource>,
    ) -> Self {
        Self {
            settings,
            blocks,
            indexer,
            prices,
            rewards,
        }
    }

    /// Wire the HTTP and RPC backed sources described by `settings`.
    pub fn from_settings(settings: Arc<Settings>) -> Result<Self> {
        let endpoints = &settings.endpoints;
        let client = http_client(endpoints.request_timeout_secs)?;

        let blocks = LlamaBlockSource::new(client.clone(), &endpoints.block_api_url);
        let indexer =
            SubgraphClient::new(client.clone(), &endpoints.pool_order_by, endpoints.pool_limit);
        let prices = LlamaPriceSource::new(client, &endpoints.price_api_url);
        let rewards =
            MasterChefReader::new(&endpoints.rpc_url, &settings.rewards.staking_contract)?;

        Ok(Self::new(
            settings.clone(),
            Arc::new(blocks),
            Arc::new(indexer),
            Arc::new(prices),
            Arc::new(rewards),
        ))
    }

    /// Run one cycle for `chain`.
    ///
    /// `timestamp` of `None` computes live yields (with the indexer staleness
    /// check); `Some(ts)` replays the day ending at `ts`. Any upstream failure
    /// fails the whole cycle, there are no partial results.
    pub async fn compute_yield(&self, chain: &str, timestamp: Option<u64>) -> Result<Vec<PoolRecord>> {
        let settings = &self.settings;
        let endpoints = settings.endpoints.active_indexers();
        let endpoint = endpoints.first().ok_or(YieldError::NoIndexer)?;

        let reconciler = BlockReconciler {
            blocks: self.blocks.as_ref(),
            indexer: self.indexer.as_ref(),
            staleness: &settings.staleness,
        };
        let block_pair = reconciler.reconcile(chain, timestamp, &endpoints).await?;

        let (pools, prior, snapshot) = futures::try_join!(
            self.indexer.fetch_pools(endpoint, block_pair.current),
            self.indexer.fetch_volumes(endpoint, block_pair.prior),
            self.rewards.reward_snapshot(),
        )?;

        info!(
            "Fetched {} pools at block {} and {} prior volumes at block {} ({} blocks apart)",
            pools.len(),
            block_pair.current,
            prior.len(),
            block_pair.prior,
            block_pair.span()
        );

        let reward_key = settings.rewards.reward_token_key(chain);
        let mut keys = price_keys(&pools, chain);
        if !keys.contains(&reward_key) {
            keys.push(reward_key.clone());
        }
        let prices = self.prices.resolve_prices(&keys, timestamp).await?;
        if prices.is_empty() {
            warn!("No prices resolved for {} tokens on {}", keys.len(), chain);
        }

        let reward_params = RewardParams {
            reward_price_usd: prices.price(&reward_key),
            reward_token_decimals: settings.rewards.reward_token_decimals,
            split_factor: settings.rewards.reward_split_factor,
        };
        if reward_params.reward_price_usd.is_none() {
            warn!("No price for reward token {}, reward APY unavailable", reward_key);
        }

        let priced = attach_tvl(pools, &prices, chain);
        let prior_volumes = prior_volume_index(&prior);
        let schedules = snapshot.schedules();
        let assembler =
            PoolRecordAssembler::new(chain, &settings.project, &settings.rewards.reward_token);

        let records: Vec<PoolRecord> = priced
            .iter()
            .map(|p| {
                let id = p.pool.id.to_lowercase();
                let economics = fee_economics(
                    p.pool.volume_usd,
                    prior_volumes.get(&id).copied(),
                    settings.pricing.fee_rate_per_million,
                    p.total_value_locked_usd,
                );
                let apy_reward =
                    reward_apy(schedules.get(&id), &reward_params, economics.total_value_locked_usd);

                assembler.build(p, &economics, apy_reward)
            })
            .collect();

        let total = records.len();
        let records = keep_finite(records);

        info!(
            "Computed {} pool records for {} ({} dropped as non-finite)",
            records.len(),
            chain,
            total - records.len()
        );

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriorVolume;
    use super::testing::*;

    const WAVAX: &str = "0xb31f66aa3c1e785363f0875a1b74e27b85fd66c7";
    const USDC: &str = "0xa7d7079b0fead91f3e65f86e8915cb59c1a4c664";
    const SCAM: &str = "0x0000000000000000000000000000000000000bad";
    const NEW: &str = "0x0000000000000000000000000000000000000123";

    const POOL_MAIN: &str = "0x00000000000000000000000000000000000000a1";
    const POOL_HALF: &str = "0x00000000000000000000000000000000000000a2";
    const POOL_DEAD: &str = "0x00000000000000000000000000000000000000a3";
    const POOL_NEW: &str = "0x00000000000000000000000000000000000000a4";

    const TS: u64 = 1_700_000_000;

    fn indexer(heads: Vec<u64>) -> MockIndexer {
        MockIndexer::new(
            heads,
            vec![
                // 1000 WAVAX @ 20 + 20_000 USDC = 40k TVL
                raw_pool(POOL_MAIN, (WAVAX, "WAVAX"), (USDC, "USDC.e"), 1000.0, 20_000.0, 5_000_000.0),
                // USDC side only priced: 2 * 5000 = 10k TVL
                raw_pool(POOL_HALF, (SCAM, "SCAM"), (USDC, "USDC"), 1e9, 5_000.0, 300_000.0),
                // Nothing priced: 0 TVL, dropped
                raw_pool(POOL_DEAD, (SCAM, "SCAM"), (NEW, "NEW"), 10.0, 10.0, 1_000.0),
                // Created today: no prior volume, reward only
                raw_pool(POOL_NEW, (WAVAX, "WAVAX"), (NEW, "NEW"), 50.0, 1.0, 10_000.0),
            ],
            vec![
                PriorVolume {
                    id: POOL_MAIN.to_string(),
                    volume_usd: 4_000_000.0,
                },
                PriorVolume {
                    id: POOL_HALF.to_string(),
                    volume_usd: 200_000.0,
                },
                PriorVolume {
                    id: POOL_DEAD.to_string(),
                    volume_usd: 500.0,
                },
            ],
        )
    }

    fn prices() -> MockPrices {
        MockPrices::new(price_map(
            "avalanche",
            &[(WAVAX, 20.0), (USDC, 1.0), (REWARD_TOKEN, 2.0)],
        ))
    }

    fn rewards() -> MockRewards {
        // 4 tokens/s, 50/200 of it to POOL_MAIN and POOL_NEW
        MockRewards::new(
            4e18,
            200.0,
            &[
                (POOL_MAIN, 50.0),
                (POOL_NEW, 50.0),
                ("0x00000000000000000000000000000000000000ff", 100.0),
            ],
        )
    }

    fn engine(
        blocks: Arc<MockBlocks>,
        indexer: Arc<MockIndexer>,
        prices: Arc<MockPrices>,
    ) -> YieldEngine {
        YieldEngine::new(
            Arc::new(test_settings(1)),
            blocks,
            indexer,
            prices,
            Arc::new(rewards()),
        )
    }

    fn find<'a>(records: &'a [PoolRecord], id: &str) -> &'a PoolRecord {
        records.iter().find(|r| r.pool == id).unwrap()
    }

    #[tokio::test]
    async fn test_historical_cycle() {
        let blocks = Arc::new(MockBlocks::new(&[2_000, 1_000]));
        let indexer = Arc::new(indexer(vec![]));
        let prices = Arc::new(prices());
        let engine = engine(blocks.clone(), indexer.clone(), prices.clone());

        let records = engine.compute_yield("avalanche", Some(TS)).await.unwrap();

        assert_eq!(indexer.head_queries(), 0);
        let mut fetched = indexer.pool_blocks();
        fetched.sort();
        assert_eq!(fetched, vec![1_000, 2_000]);

        let ids: Vec<&str> = records.iter().map(|r| r.pool.as_str()).collect();
        assert_eq!(ids, vec![POOL_MAIN, POOL_HALF, POOL_NEW]);

        // 1M volume * 0.3% * 365 / 40k TVL
        let main = find(&records, POOL_MAIN);
        assert_eq!(main.chain, "Avalanche");
        assert_eq!(main.symbol, "WAVAX-USDC.e");
        assert_eq!(main.tvl_usd, 40_000.0);
        assert!((main.apy_base.unwrap() - 2737.5).abs() < 1e-9);
        // 31_536_000 USD/year / 40k TVL
        assert!((main.apy_reward.unwrap() - 78_840.0).abs() < 1e-6);
        assert_eq!(main.reward_tokens, vec![REWARD_TOKEN.to_string()]);
        assert_eq!(main.underlying_tokens, vec![WAVAX.to_string(), USDC.to_string()]);

        let half = find(&records, POOL_HALF);
        assert_eq!(half.tvl_usd, 10_000.0);
        assert!((half.apy_base.unwrap() - 1095.0).abs() < 1e-9);
        assert_eq!(half.apy_reward, None);
        assert!(half.reward_tokens.is_empty());

        // 50 WAVAX doubled = 2000 TVL
        let new = find(&records, POOL_NEW);
        assert_eq!(new.tvl_usd, 2_000.0);
        assert_eq!(new.apy_base, None);
        assert!((new.apy_reward.unwrap() - 1_576_800.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_historical_prices_are_batched_once() {
        let blocks = Arc::new(MockBlocks::new(&[2_000, 1_000]));
        let prices = Arc::new(prices());
        let engine = engine(blocks, Arc::new(indexer(vec![])), prices.clone());

        engine.compute_yield("avalanche", Some(TS)).await.unwrap();

        let requests = prices.requests();
        assert_eq!(requests.len(), 1);
        let (keys, at) = &requests[0];
        assert_eq!(*at, Some(TS));
        assert_eq!(keys.len(), 5);
        assert!(keys.contains(&"avax:0x6e84a6216ea6dacc71ee8e6b0a5b7322eebc0fdd".to_string()));
    }

    #[tokio::test]
    async fn test_historical_replay_is_idempotent() {
        let run = || async {
            let blocks = Arc::new(MockBlocks::new(&[2_000, 1_000]));
            let engine = engine(blocks, Arc::new(indexer(vec![])), Arc::new(prices()));
            let records = engine.compute_yield("avalanche", Some(TS)).await.unwrap();
            serde_json::to_string(&records).unwrap()
        };

        assert_eq!(run().await, run().await);
    }

    #[tokio::test]
    async fn test_live_cycle_reads_at_indexer_head() {
        let blocks = Arc::new(MockBlocks::new(&[2_000, 1_000]));
        let indexer = Arc::new(indexer(vec![1_990]));
        let engine = engine(blocks, indexer.clone(), Arc::new(prices()));

        let records = engine.compute_yield("avalanche", None).await.unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(indexer.head_queries(), 1);
        assert!(indexer.pool_blocks().contains(&1_990));
        assert!(indexer.pool_blocks().contains(&1_000));
    }

    #[tokio::test]
    async fn test_stale_indexer_fails_the_cycle() {
        let blocks = Arc::new(MockBlocks::new(&[20_000, 1_000]));
        let indexer = Arc::new(indexer(vec![10_000]));
        let engine = engine(blocks, indexer.clone(), Arc::new(prices()));

        let err = engine.compute_yield("avalanche", None).await.unwrap_err();

        assert!(err.is_stale());
        assert!(indexer.pool_blocks().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_fails_the_cycle() {
        let blocks = Arc::new(MockBlocks::new(&[2_000, 1_000]));
        let mut failing = indexer(vec![]);
        failing.fail_pools = true;
        let prices = Arc::new(prices());
        let engine = engine(blocks, Arc::new(failing), prices.clone());

        let err = engine.compute_yield("avalanche", Some(TS)).await.unwrap_err();

        assert!(matches!(err, YieldError::Upstream { .. }));
        assert!(prices.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unpriced_reward_token_keeps_fee_yield() {
        let blocks = Arc::new(MockBlocks::new(&[2_000, 1_000]));
        let prices = Arc::new(MockPrices::new(price_map(
            "avalanche",
            &[(WAVAX, 20.0), (USDC, 1.0)],
        )));
        let engine = engine(blocks, Arc::new(indexer(vec![])), prices);

        let records = engine.compute_yield("avalanche", Some(TS)).await.unwrap();

        // POOL_NEW only had reward yield
        let ids: Vec<&str> = records.iter().map(|r| r.pool.as_str()).collect();
        assert_eq!(ids, vec![POOL_MAIN, POOL_HALF]);
        assert!(records.iter().all(|r| r.apy_reward.is_none() && r.reward_tokens.is_empty()));
    }

    #[tokio::test]
    async fn test_no_indexer_configured() {
        let mut settings = test_settings(0);
        settings.endpoints.indexers = vec![None];
        let engine = YieldEngine::new(
            Arc::new(settings),
            Arc::new(MockBlocks::new(&[2_000, 1_000])),
            Arc::new(indexer(vec![])),
            Arc::new(prices()),
            Arc::new(rewards()),
        );

        let err = engine.compute_yield("avalanche", Some(TS)).await.unwrap_err();
        assert!(matches!(err, YieldError::NoIndexer));
    }
}
