//! Market Data
//!
//! Price source abstraction for the price-request replies and analysis posts.

mod coingecko;
mod mock;

pub use coingecko::CoinGeckoClient;
pub use mock::MockPriceSource;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::PriceSnapshot;

/// Literal used in place of prices when the source fails
pub const PRICES_UNAVAILABLE: &str = "BTC & ETH prices unavailable";

/// Price source trait (Strategy pattern)
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current BTC and ETH spot prices in USD
    async fn fetch_prices(&self) -> Result<PriceSnapshot>;

    /// Source name, for logs
    fn name(&self) -> &str;
}

/// `"BTC: $X | ETH: $Y"`, or [`PRICES_UNAVAILABLE`] if the fetch fails
pub async fn price_line(source: &dyn PriceSource) -> String {
    match source.fetch_prices().await {
        Ok(snapshot) => snapshot.to_string(),
        Err(e) => {
            tracing::warn!(source = source.name(), error = %e, "Price fetch failed");
            PRICES_UNAVAILABLE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_price_line_formats_snapshot() {
        let line = price_line(&MockPriceSource::new()).await;
        assert_eq!(line, "BTC: $97,500 | ETH: $3,450");
    }

    #[tokio::test]
    async fn test_price_line_unavailable() {
        let line = price_line(&MockPriceSource::unavailable()).await;
        assert_eq!(line, PRICES_UNAVAILABLE);
    }
}
