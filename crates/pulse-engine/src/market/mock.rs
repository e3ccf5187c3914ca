//! Mock Price Source
//!
//! For tests and dry runs. Returns static prices or a scripted outage.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::PriceSource;
use crate::error::{EngineError, Result};
use crate::model::PriceSnapshot;

pub struct MockPriceSource {
    snapshot: Option<PriceSnapshot>,
    calls: AtomicUsize,
}

impl Default for MockPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self::with_prices(dec!(97500), dec!(3450))
    }

    pub fn with_prices(btc_usd: Decimal, eth_usd: Decimal) -> Self {
        Self {
            snapshot: Some(PriceSnapshot { btc_usd, eth_usd }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every fetch fails with a transport error
    pub fn unavailable() -> Self {
        Self {
            snapshot: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_prices(&self) -> Result<PriceSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .ok_or_else(|| EngineError::Transport("mock price feed offline".into()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
