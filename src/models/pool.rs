use serde::Serialize;

/// Token side of a pair as reported by the subgraph.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRef {
    /// Lowercase token address
    pub id: String,
    pub symbol: String,
}

/// Pair state at the current block.
///
/// Reserves are decimal-adjusted token amounts, `volume_usd` is the cumulative
/// USD volume since pair creation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPool {
    pub id: String,
    pub token0: TokenRef,
    pub token1: TokenRef,
    pub reserve0: f64,
    pub reserve1: f64,
    pub volume_usd: f64,
}

/// Cumulative volume of a pair at the prior (24h earlier) block.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorVolume {
    pub id: String,
    pub volume_usd: f64,
}

/// A pair with its USD TVL attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedPool {
    pub pool: RawPool,
    pub total_value_locked_usd: f64,
}

/// Fee economics of one pair over the last 24h.
///
/// The volume derived fields are `None` when no prior snapshot matched the pair.
/// `apy_base` may still be non-finite (zero TVL); the final filter handles that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolEconomics {
    pub total_value_locked_usd: f64,
    pub volume_usd_24h: Option<f64>,
    pub fee_usd_24h: Option<f64>,
    pub fee_usd_365_days: Option<f64>,
    pub apy_base: Option<f64>,
}

/// Published pool yield record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRecord {
    pub pool: String,
    pub chain: String,
    pub project: String,
    pub symbol: String,
    pub tvl_usd: f64,
    pub apy_base: Option<f64>,
    pub apy_reward: Option<f64>,
    pub reward_tokens: Vec<String>,
    pub underlying_tokens: Vec<String>,
}

impl PoolRecord {
    /// Inclusion rule for publishing: TVL must be finite and at least one of
    /// base, reward or their sum must be finite.
    pub fn is_finite(&self) -> bool {
        let finite = |v: Option<f64>| v.is_some_and(f64::is_finite);
        let total = match (self.apy_base, self.apy_reward) {
            (Some(base), Some(reward)) => Some(base + reward),
            _ => None,
        };

        (finite(self.apy_base) || finite(self.apy_reward) || finite(total))
            && self.tvl_usd.is_finite()
    }
}
