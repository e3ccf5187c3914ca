//! CoinGecko price source
//!
//! Uses the public `simple/price` endpoint; no key required.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::PriceSource;
use crate::error::{EngineError, Result};
use crate::model::PriceSnapshot;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Deserialize)]
struct SimplePrice {
    bitcoin: UsdQuote,
    ethereum: UsdQuote,
}

#[derive(Deserialize)]
struct UsdQuote {
    usd: Decimal,
}

pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    /// Client against the public API with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("crypto-pulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EngineError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch_prices(&self) -> Result<PriceSnapshot> {
        let url = format!("{}/simple/price", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("ids", "bitcoin,ethereum"), ("vs_currencies", "usd")])
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(EngineError::RateLimited("coingecko".into())),
            s if !s.is_success() => return Err(EngineError::Transport(format!("coingecko returned {s}"))),
            _ => {}
        }

        let body: SimplePrice = response.json().await?;
        Ok(PriceSnapshot {
            btc_usd: body.bitcoin.usd,
            eth_usd: body.ethereum.usd,
        })
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}
