//! Indodax public API client
//!
//! Pull-only access to the market summary feed and the per-pair order book.
//! Every request carries a short timeout and a small fixed number of retry
//! attempts with a brief pause between them; exhausting the attempts yields
//! an error the caller treats as "no data this cycle", never a fault.

use crate::config::IndodaxConfig;
use crate::error::{Error, Result};
use crate::orderbook::Depth;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

/// Read access to the market data feeds, behind a seam so the engine can be
/// driven by a test double.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Fetch the full ticker summary: pair key to raw ticker record
    async fn fetch_summaries(&self) -> Result<serde_json::Map<String, Value>>;

    /// Fetch the top of book for a pair
    async fn fetch_depth(&self, pair: &str) -> Result<Depth>;
}

pub struct IndodaxClient {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
    retry_delay: Duration,
}

impl IndodaxClient {
    pub fn new(config: &IndodaxConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retries: config.retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let mut last_err = Error::Feed(format!("no response from {url}"));

        for attempt in 1..=self.retries {
            match self.http.get(url).send().await {
                Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                    Ok(body) => return Ok(body),
                    Err(e) => {
                        tracing::debug!("invalid JSON from {url}: {e}");
                        last_err = e.into();
                    }
                },
                Ok(resp) => {
                    tracing::debug!("status {} from {url}", resp.status());
                    last_err = Error::Feed(format!("status {} from {url}", resp.status()));
                }
                Err(e) => {
                    tracing::debug!("request error from {url}: {e}");
                    last_err = e.into();
                }
            }

            if attempt < self.retries {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(last_err)
    }
}

#[async_trait]
impl MarketFeed for IndodaxClient {
    async fn fetch_summaries(&self) -> Result<serde_json::Map<String, Value>> {
        let body = self.get_json(&format!("{}/summaries", self.base_url)).await?;
        body.get("tickers")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| Error::Feed("summaries response missing tickers".to_string()))
    }

    async fn fetch_depth(&self, pair: &str) -> Result<Depth> {
        let body = self.get_json(&format!("{}/depth/{pair}", self.base_url)).await?;
        Ok(serde_json::from_value(body)?)
    }
}
