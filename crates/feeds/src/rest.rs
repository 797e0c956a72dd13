//! REST fetcher for the Bybit big-deal endpoint.
//!
//! The endpoint returns the most recent large trades for one symbol, newest
//! first:
//!
//! ```json
//! {"retCode":0,"retMsg":"OK","result":{"list":[
//!   {"symbol":"BTCUSDT","side":"Buy","timestamp":"1700000000","value":"1,200,000"}
//! ]}}
//! ```

use crate::error::{FeedError, FeedResult};
use async_trait::async_trait;
use bigdeal_core::{Batch, Deal};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Source of deal batches. Stateless; every call is an independent fetch.
#[async_trait]
pub trait DealSource: Send + Sync {
    /// Fetch the latest batch, newest first.
    async fn fetch(&self) -> FeedResult<Batch>;
}

/// Configuration for the upstream feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Endpoint URL without query string
    pub base_url: String,
    /// Instrument to watch
    pub symbol: String,
    /// Number of deals requested per fetch
    pub limit: u32,
    /// HTTP request timeout (ms)
    pub request_timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api2.bybit.com/contract/v5/public/support/big-deal".to_string(),
            symbol: "BTCUSDT".to_string(),
            limit: 10,
            request_timeout_ms: 10_000,
        }
    }
}

impl FeedConfig {
    /// Full request URL, for logging.
    pub fn url(&self) -> String {
        format!("{}?limit={}&symbol={}", self.base_url, self.limit, self.symbol)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "retCode", alias = "ret_code", default)]
    ret_code: i64,
    #[serde(rename = "retMsg", alias = "ret_msg", default)]
    ret_msg: String,
    #[serde(default)]
    result: Option<EnvelopeResult>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeResult {
    #[serde(default)]
    list: Option<Vec<RawDeal>>,
}

#[derive(Debug, Deserialize)]
struct RawDeal {
    symbol: String,
    side: String,
    timestamp: String,
    value: String,
}

/// Decode a response body into a batch.
///
/// A missing or empty list is [`FeedError::EmptyFeed`]; malformed JSON or any
/// unparsable field fails the whole batch with [`FeedError::Decode`].
pub fn parse_batch(body: &str) -> FeedResult<Batch> {
    let envelope: Envelope = serde_json::from_str(body)?;

    let list = match envelope.result.and_then(|r| r.list) {
        Some(list) if !list.is_empty() => list,
        _ => {
            if envelope.ret_code != 0 {
                debug!(
                    ret_code = envelope.ret_code,
                    ret_msg = %envelope.ret_msg,
                    "Big-deal API returned no list"
                );
            }
            return Err(FeedError::EmptyFeed);
        }
    };

    list.iter()
        .map(|raw| {
            Deal::from_raw(&raw.symbol, &raw.side, &raw.timestamp, &raw.value)
                .map_err(FeedError::from)
        })
        .collect()
}

/// HTTP client for the big-deal endpoint.
pub struct BigDealFetcher {
    client: reqwest::Client,
    config: FeedConfig,
}

impl BigDealFetcher {
    /// Create a fetcher with its own connection pool.
    pub fn new(config: FeedConfig) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl DealSource for BigDealFetcher {
    async fn fetch(&self) -> FeedResult<Batch> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("limit", self.config.limit.to_string()),
                ("symbol", self.config.symbol.clone()),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Transport(Box::new(e)))?;

        if !response.status().is_success() {
            return Err(FeedError::Transport(
                format!("HTTP {}", response.status()).into(),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Transport(Box::new(e)))?;

        let batch = parse_batch(&body)?;
        debug!("Big-deal feed: fetched {} deals", batch.len());
        Ok(batch)
    }
}
