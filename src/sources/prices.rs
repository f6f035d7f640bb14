use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::try_join_all;
use log::debug;
use serde::Deserialize;
use serde_json::json;

use super::PriceSource;
use crate::{
    error::{Result, YieldError},
    models::{PriceMap, TokenPrice},
};

const SERVICE: &str = "price api";

/// Keys per historical request; they travel in the URL path
const HISTORICAL_BATCH_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(default)]
    coins: HashMap<String, TokenPrice>,
}

/// USD prices from `coins.llama.fi`.
///
/// Current prices are one batched POST; historical prices use the
/// `/prices/historical/{ts}/{keys}` form so replays see the prices of the
/// requested moment.
#[derive(Clone)]
pub struct LlamaPriceSource {
    client: reqwest::Client,
    base_url: String,
}

impl LlamaPriceSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn current(&self, keys: &[String]) -> Result<PricesResponse> {
        self.client
            .post(format!("{}/prices", self.base_url))
            .json(&json!({ "coins": keys }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| YieldError::upstream(SERVICE, e))?
            .json()
            .await
            .map_err(|e| YieldError::malformed(SERVICE, e.to_string()))
    }

    async fn historical(&self, keys: &[String], timestamp: u64) -> Result<PricesResponse> {
        let url = format!(
            "{}/prices/historical/{}/{}",
            self.base_url,
            timestamp,
            keys.join(",")
        );

        self.client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| YieldError::upstream(SERVICE, e))?
            .json()
            .await
            .map_err(|e| YieldError::malformed(SERVICE, e.to_string()))
    }
}

#[async_trait]
impl PriceSource for LlamaPriceSource {
    async fn resolve_prices(&self, keys: &[String], at: Option<u64>) -> Result<PriceMap> {
        if keys.is_empty() {
            return Ok(PriceMap::new());
        }

        let responses = match at {
            None => vec![self.current(keys).await?],
            Some(timestamp) => {
                try_join_all(
                    keys.chunks(HISTORICAL_BATCH_SIZE)
                        .map(|chunk| self.historical(chunk, timestamp)),
                )
                .await?
            },
        };

        let prices: PriceMap = responses.into_iter().flat_map(|r| r.coins).collect();

        debug!("Resolved {} of {} prices", prices.len(), keys.len());
        Ok(prices)
    }
}
