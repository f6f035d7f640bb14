pub mod masterchef;
pub mod multicall;

pub use masterchef::IMasterChef;
pub use multicall::{Call3, IMulticall3};
