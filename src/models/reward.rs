use rustc_hash::FxHashMap;

/// One `poolInfo` entry of the staking contract.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardPoolInfo {
    /// Staked LP token, i.e. the pair address
    pub lp_token: String,
    pub alloc_point: f64,
}

/// Staking contract state read once per cycle.
///
/// `reward_per_second` is raw (not decimal adjusted).
#[derive(Debug, Clone, PartialEq)]
pub struct RewardSnapshot {
    pub reward_per_second: f64,
    pub total_alloc_point: f64,
    pub pools: Vec<RewardPoolInfo>,
}

/// Emission schedule that applies to a single pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardSchedule {
    pub alloc_point: f64,
    pub total_alloc_point: f64,
    pub reward_per_second: f64,
}

impl RewardSnapshot {
    /// Schedules keyed by lowercase LP token address.
    ///
    /// If the contract lists an LP token twice the later entry wins.
    pub fn schedules(&self) -> FxHashMap<String, RewardSchedule> {
        self.pools
            .iter()
            .map(|info| {
                let schedule = RewardSchedule {
                    alloc_point: info.alloc_point,
                    total_alloc_point: self.total_alloc_point,
                    reward_per_second: self.reward_per_second,
                };
                (info.lp_token.to_lowercase(), schedule)
            })
            .collect()
    }
}
