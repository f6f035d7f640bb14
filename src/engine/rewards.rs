//! Liquidity mining reward yield.

use crate::models::RewardSchedule;

use super::fees::DAYS_PER_YEAR;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Cycle-wide inputs shared by every pool's reward computation.
#[derive(Debug, Clone, Copy)]
pub struct RewardParams {
    /// `None` when the oracle has no price for the reward token
    pub reward_price_usd: Option<f64>,
    pub reward_token_decimals: u8,
    /// Emissions are divided by this before they reach LPs
    pub split_factor: f64,
}

/// Reward tokens per second accruing to the LPs of one pool.
pub fn pool_reward_per_second(schedule: &RewardSchedule, params: &RewardParams) -> f64 {
    let pool_share = schedule.alloc_point / schedule.total_alloc_point;
    let scale = 10f64.powi(params.reward_token_decimals as i32);

    pool_share * schedule.reward_per_second / scale / params.split_factor
}

/// Yearly USD value of the rewards accruing to one pool.
pub fn reward_per_year_usd(schedule: &RewardSchedule, params: &RewardParams) -> Option<f64> {
    let price = params.reward_price_usd?;
    let reward_per_day = pool_reward_per_second(schedule, params) * SECONDS_PER_DAY;

    Some(reward_per_day * DAYS_PER_YEAR * price)
}

/// Reward APY in percent. `None` for pools without an emission schedule or
/// when the reward token is unpriced.
pub fn reward_apy(
    schedule: Option<&RewardSchedule>,
    params: &RewardParams,
    total_value_locked_usd: f64,
) -> Option<f64> {
    let per_year = reward_per_year_usd(schedule?, params)?;
    Some(per_year / total_value_locked_usd * 100.0)
}
