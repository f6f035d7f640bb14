#[allow(clippy::module_inception)]
mod config;

pub use self::config::{
    EndpointSettings, PricingSettings, RewardSettings, SchedulerSettings, Settings,
    StalenessSettings,
};
