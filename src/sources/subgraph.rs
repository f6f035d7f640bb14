use async_trait::async_trait;
use log::debug;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use super::IndexerSource;
use crate::{
    error::{Result, YieldError},
    models::{PriorVolume, RawPool, TokenRef},
    utils::str_to_f64_with_decimals,
};

const SERVICE: &str = "subgraph";

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MetaData {
    #[serde(rename = "_meta")]
    meta: Meta,
}

#[derive(Debug, Deserialize)]
struct Meta {
    block: MetaBlock,
}

#[derive(Debug, Deserialize)]
struct MetaBlock {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct PairsData<P> {
    pairs: Vec<P>,
}

#[derive(Debug, Deserialize)]
struct PairEntry {
    id: String,
    #[serde(rename = "volumeUSD")]
    volume_usd: String,
    reserve0: String,
    reserve1: String,
    token0: TokenEntry,
    token1: TokenEntry,
}

#[derive(Debug, Deserialize)]
struct TokenEntry {
    id: String,
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct VolumeEntry {
    id: String,
    #[serde(rename = "volumeUSD")]
    volume_usd: String,
}

/// GraphQL client for Uniswap V2 style exchange subgraphs.
#[derive(Clone)]
pub struct SubgraphClient {
    client: reqwest::Client,
    order_by: String,
    limit: u32,
}

impl SubgraphClient {
    pub fn new(client: reqwest::Client, order_by: &str, limit: u32) -> Self {
        Self {
            client,
            order_by: order_by.to_string(),
            limit,
        }
    }

    fn pairs_query(&self, block: u64, fields: &str) -> String {
        format!(
            "{{ pairs(first: {}, orderBy: {}, orderDirection: desc, block: {{number: {}}}) {{ {} }} }}",
            self.limit, self.order_by, block, fields
        )
    }

    async fn query<T: DeserializeOwned>(&self, endpoint: &str, query: &str) -> Result<T> {
        let response: GraphQlResponse<T> = self
            .client
            .post(endpoint)
            .json(&json!({ "query": query }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| YieldError::upstream(SERVICE, e))?
            .json()
            .await
            .map_err(|e| YieldError::malformed(SERVICE, e.to_string()))?;

        if let Some(err) = response.errors.first() {
            return Err(YieldError::upstream(SERVICE, err.message.clone()));
        }

        response
            .data
            .ok_or_else(|| YieldError::malformed(SERVICE, "response has no data"))
    }
}

fn parse_amount(field: &str, pair: &str, value: &str) -> Result<f64> {
    str_to_f64_with_decimals(value, 0)
        .ok_or_else(|| YieldError::malformed(SERVICE, format!("{field} of {pair}: {value:?}")))
}

impl TokenEntry {
    fn into_token(self) -> TokenRef {
        TokenRef {
            id: self.id.to_lowercase(),
            symbol: self.symbol,
        }
    }
}

impl TryFrom<PairEntry> for RawPool {
    type Error = YieldError;

    fn try_from(entry: PairEntry) -> Result<Self> {
        Ok(RawPool {
            volume_usd: parse_amount("volumeUSD", &entry.id, &entry.volume_usd)?,
            reserve0: parse_amount("reserve0", &entry.id, &entry.reserve0)?,
            reserve1: parse_amount("reserve1", &entry.id, &entry.reserve1)?,
            id: entry.id.to_lowercase(),
            token0: entry.token0.into_token(),
            token1: entry.token1.into_token(),
        })
    }
}

#[async_trait]
impl IndexerSource for SubgraphClient {
    async fn latest_indexed_block(&self, endpoint: &str) -> Result<u64> {
        let data: MetaData = self
            .query(endpoint, "{ _meta { block { number } } }")
            .await?;
        Ok(data.meta.block.number)
    }

    async fn fetch_pools(&self, endpoint: &str, block: u64) -> Result<Vec<RawPool>> {
        let query = self.pairs_query(
            block,
            "id volumeUSD reserve0 reserve1 token0 { id symbol } token1 { id symbol }",
        );
        let data: PairsData<PairEntry> = self.query(endpoint, &query).await?;

        debug!("Fetched {} pairs at block {}", data.pairs.len(), block);

        data.pairs.into_iter().map(RawPool::try_from).collect()
    }

    async fn fetch_volumes(&self, endpoint: &str, block: u64) -> Result<Vec<PriorVolume>> {
        let query = self.pairs_query(block, "id volumeUSD");
        let data: PairsData<VolumeEntry> = self.query(endpoint, &query).await?;

        debug!("Fetched {} prior volumes at block {}", data.pairs.len(), block);

        data.pairs
            .into_iter()
            .map(|entry| {
                Ok(PriorVolume {
                    volume_usd: parse_amount("volumeUSD", &entry.id, &entry.volume_usd)?,
                    id: entry.id.to_lowercase(),
                })
            })
            .collect()
    }
}
