pub mod abis;
pub mod config;
pub mod cron;
pub mod engine;
pub mod error;
pub mod models;
pub mod sources;
pub mod utils;

pub use self::config::Settings;
pub use cron::CronScheduler;
pub use engine::YieldEngine;
pub use error::{Result, YieldError};
pub use models::{BlockPair, PoolRecord};
