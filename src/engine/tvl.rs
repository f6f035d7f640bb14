//! USD TVL from reserves and oracle prices.

use log::debug;
use rustc_hash::FxHashSet;

use crate::models::{price_key, PriceMap, PricedPool, RawPool};

/// TVL of a two-token pool.
///
/// With one price missing the known side is doubled (50/50 value
/// assumption); with both missing the pool is worth 0.
pub fn pool_tvl(reserve0: f64, price0: Option<f64>, reserve1: f64, price1: Option<f64>) -> f64 {
    match (price0, price1) {
        (Some(p0), Some(p1)) => reserve0 * p0 + reserve1 * p1,
        (Some(p0), None) => reserve0 * p0 * 2.0,
        (None, Some(p1)) => reserve1 * p1 * 2.0,
        (None, None) => 0.0,
    }
}

/// Unique price keys for every token of `pools`, in first-seen order.
pub fn price_keys(pools: &[RawPool], chain: &str) -> Vec<String> {
    let mut seen = FxHashSet::default();
    pools
        .iter()
        .flat_map(|pool| [&pool.token0.id, &pool.token1.id])
        .map(|address| price_key(chain, address))
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// Attach a USD TVL to every pool. No pool is dropped here.
pub fn attach_tvl(pools: Vec<RawPool>, prices: &PriceMap, chain: &str) -> Vec<PricedPool> {
    pools
        .into_iter()
        .map(|pool| {
            let price0 = prices.token_price(chain, &pool.token0.id);
            let price1 = prices.token_price(chain, &pool.token1.id);

            if price0.is_none() || price1.is_none() {
                debug!(
                    "Pool {} missing price(s): {}={:?} {}={:?}",
                    pool.id, pool.token0.symbol, price0, pool.token1.symbol, price1
                );
            }

            let total_value_locked_usd = pool_tvl(pool.reserve0, price0, pool.reserve1, price1);
            PricedPool {
                pool,
                total_value_locked_usd,
            }
        })
        .collect()
}
