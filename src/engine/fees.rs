//! Trading fee yield.
//!
//! 24h volume is the difference between two cumulative volume readings taken
//! one day apart. A pool without a prior reading (created within the last day)
//! gets no fee yield at all rather than its lifetime volume as a spike.

use rustc_hash::FxHashMap;

use crate::models::{PoolEconomics, PriorVolume};

pub const DAYS_PER_YEAR: f64 = 365.0;

const PARTS_PER_MILLION: f64 = 1_000_000.0;

/// Prior cumulative volume by lowercase pool id. The first entry for an id wins.
pub fn prior_volume_index(prior: &[PriorVolume]) -> FxHashMap<String, f64> {
    let mut index = FxHashMap::default();
    for entry in prior {
        index
            .entry(entry.id.to_lowercase())
            .or_insert(entry.volume_usd);
    }
    index
}

/// Fee economics for one pool.
///
/// Zero TVL is not guarded: the resulting non-finite APY is removed by the
/// final pool filter.
pub fn fee_economics(
    current_volume: f64,
    prior_volume: Option<f64>,
    fee_rate_per_million: u32,
    total_value_locked_usd: f64,
) -> PoolEconomics {
    let volume_usd_24h = prior_volume.map(|prior| current_volume - prior);
    let fee_usd_24h = volume_usd_24h.map(|v| v * fee_rate_per_million as f64 / PARTS_PER_MILLION);
    let fee_usd_365_days = fee_usd_24h.map(|f| f * DAYS_PER_YEAR);
    let apy_base = fee_usd_365_days.map(|f| f / total_value_locked_usd * 100.0);

    PoolEconomics {
        total_value_locked_usd,
        volume_usd_24h,
        fee_usd_24h,
        fee_usd_365_days,
        apy_base,
    }
}
