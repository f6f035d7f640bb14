use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::utils::llama_chain;

/// Price key as used by the price service: `chain:address`, lowercased.
pub fn price_key(chain: &str, address: &str) -> String {
    format!("{}:{}", llama_chain(chain), address).to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenPrice {
    pub price: f64,
    #[serde(default)]
    pub symbol: String,
}

/// Sparse USD price table for one cycle.
///
/// A missing key means the price is unknown; it is not an error.
#[derive(Debug, Clone, Default)]
pub struct PriceMap {
    prices: FxHashMap<String, TokenPrice>,
}

impl PriceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, price: TokenPrice) {
        self.prices.insert(key.to_lowercase(), price);
    }

    pub fn get(&self, key: &str) -> Option<&TokenPrice> {
        self.prices.get(&key.to_lowercase())
    }

    /// USD price for a key, `None` when unknown or not a finite number.
    pub fn price(&self, key: &str) -> Option<f64> {
        self.get(key).map(|p| p.price).filter(|p| p.is_finite())
    }

    pub fn token_price(&self, chain: &str, address: &str) -> Option<f64> {
        self.price(&price_key(chain, address))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl<K: AsRef<str>> FromIterator<(K, TokenPrice)> for PriceMap {
    fn from_iter<I: IntoIterator<Item = (K, TokenPrice)>>(iter: I) -> Self {
        let mut map = PriceMap::new();
        for (key, price) in iter {
            map.insert(key.as_ref(), price);
        }
        map
    }
}
