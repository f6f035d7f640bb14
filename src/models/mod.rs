//! Data carried between the stages of a yield cycle.

pub mod block;
pub mod pool;
pub mod price;
pub mod reward;

pub use block::BlockPair;
pub use pool::{PoolEconomics, PoolRecord, PricedPool, PriorVolume, RawPool, TokenRef};
pub use price::{price_key, PriceMap, TokenPrice};
pub use reward::{RewardPoolInfo, RewardSchedule, RewardSnapshot};
