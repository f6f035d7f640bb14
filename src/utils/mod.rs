//! Utility functions for the yield engine.
//!
//! - [`conversion`] - Numeric conversions (U256, decimal strings) into f64
//! - [`format`] - Symbol and chain name normalization

mod conversion;
mod format;

pub use conversion::{str_to_f64_with_decimals, u256_to_f64};

pub use format::{format_chain, format_symbol, llama_chain};
