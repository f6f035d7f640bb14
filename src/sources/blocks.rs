use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use moka::future::Cache;
use serde::Deserialize;

use super::BlockSource;
use crate::{
    error::{Result, YieldError},
    utils::llama_chain,
};

const SERVICE: &str = "block api";

#[derive(Debug, Deserialize)]
struct BlockResponse {
    height: u64,
}

/// Timestamp to block resolver backed by `coins.llama.fi/block/{chain}/{ts}`.
///
/// A timestamp always maps to the same block, so answers are cached.
#[derive(Clone)]
pub struct LlamaBlockSource {
    client: reqwest::Client,
    base_url: String,
    heights: Cache<(String, u64), u64>,
}

impl LlamaBlockSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        // 1 day TTL keeps the cache bounded in watch mode
        let heights = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(86_400))
            .build();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            heights,
        }
    }
}

#[async_trait]
impl BlockSource for LlamaBlockSource {
    async fn block_at(&self, chain: &str, timestamp: u64) -> Result<u64> {
        let chain = llama_chain(chain);
        let key = (chain.clone(), timestamp);

        if let Some(height) = self.heights.get(&key).await {
            return Ok(height);
        }

        let url = format!("{}/{}/{}", self.base_url, chain, timestamp);
        let response: BlockResponse = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| YieldError::upstream(SERVICE, e))?
            .json()
            .await
            .map_err(|e| YieldError::malformed(SERVICE, e.to_string()))?;

        debug!("Resolved {} at {} to block {}", chain, timestamp, response.height);

        self.heights.insert(key, response.height).await;
        Ok(response.height)
    }
}
