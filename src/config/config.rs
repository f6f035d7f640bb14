use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::utils::llama_chain;

/// Upstream service locations.
///
/// `indexers` may contain `null` entries (e.g. a chain without a second
/// subgraph); they are skipped. The first non-null indexer answers pool queries,
/// all of them take part in the staleness check.
#[derive(Debug, Deserialize, Clone)]
pub struct EndpointSettings {
    pub indexers: Vec<Option<String>>,
    #[serde(default = "default_block_api_url")]
    pub block_api_url: String,
    #[serde(default = "default_price_api_url")]
    pub price_api_url: String,
    pub rpc_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Field the subgraph orders pairs by (protocol specific, e.g. `trackedReserveAVAX`)
    #[serde(default = "default_pool_order_by")]
    pub pool_order_by: String,
    #[serde(default = "default_pool_limit")]
    pub pool_limit: u32,
}

fn default_block_api_url() -> String {
    "https://coins.llama.fi/block".to_string()
}

fn default_price_api_url() -> String {
    "https://coins.llama.fi".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_pool_order_by() -> String {
    "reserveUSD".to_string()
}

fn default_pool_limit() -> u32 {
    1000
}

impl EndpointSettings {
    /// Non-null indexer endpoints, in configured order.
    pub fn active_indexers(&self) -> Vec<String> {
        self.indexers
            .iter()
            .flatten()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Liquidity mining emission parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct RewardSettings {
    /// MasterChef-style staking contract holding `poolInfo` / `totalAllocPoint`
    pub staking_contract: String,
    pub reward_token: String,
    #[serde(default = "default_reward_token_decimals")]
    pub reward_token_decimals: u8,
    /// Emissions are divided by this before they reach LPs. Protocol policy:
    /// 2.0 means LPs receive half of every emitted token.
    #[serde(default = "default_reward_split_factor")]
    pub reward_split_factor: f64,
}

fn default_reward_token_decimals() -> u8 {
    18
}

fn default_reward_split_factor() -> f64 {
    2.0
}

impl RewardSettings {
    /// Price key of the reward token, e.g. `avax:0x6e84...`.
    pub fn reward_token_key(&self, chain: &str) -> String {
        format!("{}:{}", llama_chain(chain), self.reward_token).to_lowercase()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingSettings {
    /// Swap fee charged by every pool of this protocol, in parts per million
    #[serde(default = "default_fee_rate_per_million")]
    pub fee_rate_per_million: u32,
}

fn default_fee_rate_per_million() -> u32 {
    3000
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            fee_rate_per_million: default_fee_rate_per_million(),
        }
    }
}

/// Maximum block distance tolerated between the time-resolved head and the
/// slowest indexer before a cycle is rejected.
#[derive(Debug, Deserialize, Clone)]
pub struct StalenessSettings {
    #[serde(default = "default_threshold_blocks")]
    pub default_threshold_blocks: u64,
    #[serde(default = "default_chain_thresholds")]
    pub chain_thresholds: HashMap<String, u64>,
}

fn default_threshold_blocks() -> u64 {
    3000
}

fn default_chain_thresholds() -> HashMap<String, u64> {
    HashMap::from([("ethereum".to_string(), 300)])
}

impl Default for StalenessSettings {
    fn default() -> Self {
        Self {
            default_threshold_blocks: default_threshold_blocks(),
            chain_thresholds: default_chain_thresholds(),
        }
    }
}

impl StalenessSettings {
    pub fn threshold_for(&self, chain: &str) -> u64 {
        self.chain_thresholds
            .get(&chain.to_lowercase())
            .copied()
            .unwrap_or(self.default_threshold_blocks)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    3600
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup, with `LPYIELD__SECTION__KEY`
/// environment variables taking precedence.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Project slug written into every pool record
    pub project: String,
    pub chain: String,
    pub endpoints: EndpointSettings,
    pub rewards: RewardSettings,
    #[serde(default)]
    pub pricing: PricingSettings,
    #[serde(default)]
    pub staleness: StalenessSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_path("config")
    }

    pub fn from_path(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("LPYIELD").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// Chain a run computes. Endpoints and the staking contract belong to the
    /// configured chain, so any other chain is refused.
    pub fn select_chain(&self, requested: Option<&str>) -> Result<String, ConfigError> {
        match requested {
            None => Ok(self.chain.clone()),
            Some(chain) if chain.eq_ignore_ascii_case(&self.chain) => Ok(self.chain.clone()),
            Some(chain) => Err(ConfigError::Message(format!(
                "chain {chain} requested but endpoints are configured for {}",
                self.chain
            ))),
        }
    }
}
