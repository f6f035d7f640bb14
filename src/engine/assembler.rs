//! Pool record assembly and the publish filter.

use crate::{
    models::{PoolEconomics, PoolRecord, PricedPool},
    utils::{format_chain, format_symbol},
};

/// Builds published records for one chain/project.
pub struct PoolRecordAssembler {
    chain: String,
    project: String,
    reward_token: String,
}

impl PoolRecordAssembler {
    pub fn new(chain: &str, project: &str, reward_token: &str) -> Self {
        Self {
            chain: format_chain(chain),
            project: project.to_string(),
            reward_token: reward_token.to_string(),
        }
    }

    pub fn build(
        &self,
        priced: &PricedPool,
        economics: &PoolEconomics,
        apy_reward: Option<f64>,
    ) -> PoolRecord {
        let pool = &priced.pool;
        let symbol = format_symbol(&format!("{}-{}", pool.token0.symbol, pool.token1.symbol));

        let reward_tokens = if apy_reward.is_some_and(|apy| apy > 0.0) {
            vec![self.reward_token.clone()]
        } else {
            Vec::new()
        };

        PoolRecord {
            pool: pool.id.clone(),
            chain: self.chain.clone(),
            project: self.project.clone(),
            symbol,
            tvl_usd: economics.total_value_locked_usd,
            apy_base: economics.apy_base,
            apy_reward,
            reward_tokens,
            underlying_tokens: vec![pool.token0.id.clone(), pool.token1.id.clone()],
        }
    }
}

/// Drop records failing [`PoolRecord::is_finite`] and clear the non-finite
/// APY fields of the kept ones. This is the only place pools are removed.
pub fn keep_finite(records: Vec<PoolRecord>) -> Vec<PoolRecord> {
    records
        .into_iter()
        .filter(PoolRecord::is_finite)
        .map(|mut record| {
            record.apy_base = record.apy_base.filter(|v| v.is_finite());
            record.apy_reward = record.apy_reward.filter(|v| v.is_finite());
            record
        })
        .collect()
}
