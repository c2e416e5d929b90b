use async_trait::async_trait;
use chrono::Duration;

use crate::{Granularity, Result, Series};

/// Source of candle windows.
///
/// `CoinbaseClient` implements this for live runs; tests substitute fakes.
/// Implementations make exactly one upstream call per `fetch` and never sleep:
/// pacing between calls belongs to the caller.
#[async_trait]
pub trait CandleFetcher: Send + Sync {
    /// Fetch the window `[now - lookback, now]` for one asset.
    ///
    /// Returns an empty series when upstream has fewer than two candles.
    async fn fetch(&self, asset: &str, granularity: Granularity, lookback: Duration)
        -> Result<Series>;
}

/// Lists every tradable product id on the exchange, e.g. "BTC-USD".
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn product_ids(&self) -> Result<Vec<String>>;
}
