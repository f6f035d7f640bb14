//! In-memory sources for engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    error::{Result, YieldError},
    models::{
        price_key, PriceMap, PriorVolume, RawPool, RewardPoolInfo, RewardSnapshot, TokenPrice,
        TokenRef,
    },
    sources::{BlockSource, IndexerSource, PriceSource, RewardSource},
};

pub fn raw_pool(
    id: &str,
    token0: (&str, &str),
    token1: (&str, &str),
    reserve0: f64,
    reserve1: f64,
    volume_usd: f64,
) -> RawPool {
    let token = |(id, symbol): (&str, &str)| TokenRef {
        id: id.to_string(),
        symbol: symbol.to_string(),
    };

    RawPool {
        id: id.to_string(),
        token0: token(token0),
        token1: token(token1),
        reserve0,
        reserve1,
        volume_usd,
    }
}

pub fn price_map(chain: &str, prices: &[(&str, f64)]) -> PriceMap {
    prices
        .iter()
        .map(|(address, price)| {
            (
                price_key(chain, address),
                TokenPrice {
                    price: *price,
                    symbol: String::new(),
                },
            )
        })
        .collect()
}

/// Answers block lookups from a queue, in call order.
pub struct MockBlocks {
    heights: Mutex<VecDeque<u64>>,
    requested: Mutex<Vec<u64>>,
}

impl MockBlocks {
    pub fn new(heights: &[u64]) -> Self {
        Self {
            heights: Mutex::new(heights.iter().copied().collect()),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<u64> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlockSource for MockBlocks {
    async fn block_at(&self, _chain: &str, timestamp: u64) -> Result<u64> {
        self.requested.lock().unwrap().push(timestamp);
        self.heights
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| YieldError::upstream("block api", "no more heights"))
    }
}

/// Indexer with fixed heads (one per endpoint, in order) and fixed snapshots.
#[derive(Default)]
pub struct MockIndexer {
    pub heads: Vec<u64>,
    pub pools: Vec<RawPool>,
    pub prior: Vec<PriorVolume>,
    pub fail_pools: bool,
    head_queries: Mutex<usize>,
    pool_blocks: Mutex<Vec<u64>>,
}

impl MockIndexer {
    pub fn with_heads(heads: Vec<u64>) -> Self {
        Self::new(heads, Vec::new(), Vec::new())
    }

    pub fn new(heads: Vec<u64>, pools: Vec<RawPool>, prior: Vec<PriorVolume>) -> Self {
        Self {
            heads,
            pools,
            prior,
            ..Default::default()
        }
    }

    pub fn head_queries(&self) -> usize {
        *self.head_queries.lock().unwrap()
    }

    /// Blocks requested by `fetch_pools` and `fetch_volumes`, in call order
    pub fn pool_blocks(&self) -> Vec<u64> {
        self.pool_blocks.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexerSource for MockIndexer {
    async fn latest_indexed_block(&self, endpoint: &str) -> Result<u64> {
        let mut queries = self.head_queries.lock().unwrap();
        *queries += 1;

        // Endpoints are named "...-{index}..." by the tests
        let index = endpoint
            .split('-')
            .nth(1)
            .and_then(|rest| rest.split('.').next())
            .and_then(|i| i.parse::<usize>().ok())
            .unwrap_or(0);

        self.heads
            .get(index)
            .copied()
            .ok_or_else(|| YieldError::upstream("subgraph", format!("unknown endpoint {endpoint}")))
    }

    async fn fetch_pools(&self, _endpoint: &str, block: u64) -> Result<Vec<RawPool>> {
        self.pool_blocks.lock().unwrap().push(block);
        if self.fail_pools {
            return Err(YieldError::upstream("subgraph", "connection reset"));
        }
        Ok(self.pools.clone())
    }

    async fn fetch_volumes(&self, _endpoint: &str, block: u64) -> Result<Vec<PriorVolume>> {
        self.pool_blocks.lock().unwrap().push(block);
        Ok(self.prior.clone())
    }
}

pub struct MockPrices {
    pub prices: PriceMap,
    requested: Mutex<Vec<(Vec<String>, Option<u64>)>>,
}

impl MockPrices {
    pub fn new(prices: PriceMap) -> Self {
        Self {
            prices,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(Vec<String>, Option<u64>)> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for MockPrices {
    async fn resolve_prices(&self, keys: &[String], at: Option<u64>) -> Result<PriceMap> {
        self.requested.lock().unwrap().push((keys.to_vec(), at));

        let mut found = PriceMap::new();
        for key in keys {
            if let Some(price) = self.prices.get(key) {
                found.insert(key, price.clone());
            }
        }
        Ok(found)
    }
}

pub struct MockRewards {
    pub snapshot: RewardSnapshot,
}

impl MockRewards {
    pub fn new(reward_per_second: f64, total_alloc_point: f64, pools: &[(&str, f64)]) -> Self {
        Self {
            snapshot: RewardSnapshot {
                reward_per_second,
                total_alloc_point,
                pools: pools
                    .iter()
                    .map(|(lp_token, alloc_point)| RewardPoolInfo {
                        lp_token: lp_token.to_string(),
                        alloc_point: *alloc_point,
                    })
                    .collect(),
            },
        }
    }
}

#[async_trait]
impl RewardSource for MockRewards {
    async fn reward_snapshot(&self) -> Result<RewardSnapshot> {
        Ok(self.snapshot.clone())
    }
}

pub const REWARD_TOKEN: &str = "0x6e84a6216eA6dACC71eE8E6b0a5B7322EEbC0fDd";

pub fn test_settings(indexers: usize) -> crate::config::Settings {
    use crate::config::{
        EndpointSettings, PricingSettings, RewardSettings, SchedulerSettings, Settings,
        StalenessSettings,
    };

    Settings {
        project: "trader-joe".to_string(),
        chain: "avalanche".to_string(),
        endpoints: EndpointSettings {
            indexers: (0..indexers)
                .map(|i| Some(format!("https://indexer-{i}.example.org")))
                .chain(std::iter::once(None))
                .collect(),
            block_api_url: "https://blocks.example.org".to_string(),
            price_api_url: "https://prices.example.org".to_string(),
            rpc_url: "https://rpc.example.org".to_string(),
            request_timeout_secs: 5,
            pool_order_by: "trackedReserveAVAX".to_string(),
            pool_limit: 1000,
        },
        rewards: RewardSettings {
            staking_contract: "0x4483f0b6e2F5486D06958C20f8C39A7aBe87bf8F".to_string(),
            reward_token: REWARD_TOKEN.to_string(),
            reward_token_decimals: 18,
            reward_split_factor: 2.0,
        },
        pricing: PricingSettings::default(),
        staleness: StalenessSettings::default(),
        scheduler: SchedulerSettings::default(),
    }
}
