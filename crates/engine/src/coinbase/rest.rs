use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Candle, CandleFetcher, Error, Granularity, ProductCatalog, Result, Series};

/// Public market-data routes. They need no credentials, so CDP keys and legacy
/// API keys alike never reach the wire.
const MARKET_PRODUCTS_PATH: &str = "/api/v3/brokerage/market/products";

/// REST client for Coinbase Advanced Trade market data. Serves candle windows
/// and the product list; never places orders.
pub struct CoinbaseClient {
    base_url: String,
    http: Client,
}

impl CoinbaseClient {
    /// Client for `base_url` (production, sandbox or a test server) with a
    /// per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: StdDuration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{path}", self.base_url);

        let mut req = self.http.get(&url);
        if !query.is_empty() {
            req = req.query(query);
        }
        let resp = req.send().await.map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }

    async fn fetch_ending_at(
        &self,
        asset: &str,
        granularity: Granularity,
        lookback: Duration,
        end: DateTime<Utc>,
    ) -> Result<Series> {
        let (start, end) = window(end, lookback);
        let path = format!("{MARKET_PRODUCTS_PATH}/{asset}/candles");
        let query = [
            ("start", start.to_string()),
            ("end", end.to_string()),
            ("granularity", granularity.wire_name().to_string()),
        ];

        debug!(asset, %granularity, start, end, "Fetching candles from Coinbase");
        let body = self.get(&path, &query).await?;
        let resp: CandlesResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Fetch(format!("malformed candles payload for {asset}: {e}")))?;

        let candles = resp
            .candles
            .iter()
            .map(|raw| raw.parse(asset))
            .collect::<Result<Vec<_>>>()?;
        let series = Series::new(asset, granularity, candles);

        // Counted after de-duplication: repeated starts are one candle.
        if series.len() < 2 {
            debug!(asset, count = series.len(), "Not enough candles");
            return Ok(Series::insufficient(asset, granularity));
        }
        Ok(series)
    }
}

/// Request window `[end - lookback, end]` as Unix seconds.
fn window(end: DateTime<Utc>, lookback: Duration) -> (i64, i64) {
    let end = end.timestamp();
    (end - lookback.num_seconds(), end)
}

#[async_trait]
impl CandleFetcher for CoinbaseClient {
    async fn fetch(
        &self,
        asset: &str,
        granularity: Granularity,
        lookback: Duration,
    ) -> Result<Series> {
        self.fetch_ending_at(asset, granularity, lookback, Utc::now())
            .await
    }
}

#[async_trait]
impl ProductCatalog for CoinbaseClient {
    async fn product_ids(&self) -> Result<Vec<String>> {
        let body = self.get(MARKET_PRODUCTS_PATH, &[]).await?;
        let resp: ProductsResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Fetch(format!("malformed products payload: {e}")))?;
        Ok(resp.products.into_iter().map(|p| p.product_id).collect())
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CandlesResponse {
    #[serde(default)]
    candles: Vec<RawCandle>,
}

/// Coinbase sends every field as a decimal string.
#[derive(Deserialize)]
struct RawCandle {
    start: String,
    open: String,
    close: String,
    volume: String,
}

impl RawCandle {
    fn parse(&self, asset: &str) -> Result<Candle> {
        let number = |field: &str, raw: &str| {
            raw.parse::<f64>().map_err(|e| {
                Error::Fetch(format!("{asset}: bad {field} value '{raw}': {e}"))
            })
        };
        let secs = self
            .start
            .parse::<i64>()
            .map_err(|e| Error::Fetch(format!("{asset}: bad start '{}': {e}", self.start)))?;
        let timestamp = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| Error::Fetch(format!("{asset}: start out of range: {secs}")))?;

        Ok(Candle::new(
            timestamp,
            number("open", &self.open)?,
            number("close", &self.close)?,
            number("volume", &self.volume)?,
        ))
    }
}

#[derive(Deserialize)]
struct ProductsResponse {
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct Product {
    product_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    fn client(url: &str) -> CoinbaseClient {
        CoinbaseClient::new(url, StdDuration::from_secs(5)).unwrap()
    }

    fn candles_path(asset: &str) -> String {
        format!("{MARKET_PRODUCTS_PATH}/{asset}/candles")
    }

    #[test]
    fn window_spans_the_lookback_and_ends_now() {
        let end = Utc.with_ymd_and_hms(2024, 6, 8, 12, 0, 0).unwrap();

        let (start, stop) = window(end, Duration::days(7));
        assert_eq!(stop, end.timestamp());
        assert_eq!(stop - start, Duration::days(7).num_seconds());

        let (start, stop) = window(end, Duration::hours(24));
        assert_eq!(stop - start, 86_400);
    }

    #[tokio::test]
    async fn fetch_parses_and_sorts_candles() {
        let mut server = mockito::Server::new_async().await;
        // Coinbase returns newest first.
        let mock = server
            .mock("GET", candles_path("DOGE-USD").as_str())
            .match_query(Matcher::UrlEncoded("granularity".into(), "ONE_DAY".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candles":[
                    {"start":"1700172800","low":"0.1","high":"0.2","open":"1.12","close":"1.10","volume":"450"},
                    {"start":"1700086400","low":"0.1","high":"0.2","open":"1.00","close":"1.12","volume":"300"},
                    {"start":"1700000000","low":"0.1","high":"0.2","open":"1.00","close":"1.00","volume":"0"}
                ]}"#,
            )
            .create_async()
            .await;

        let series = client(&server.url())
            .fetch("DOGE-USD", Granularity::Daily, Duration::days(7))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(series.len(), 3);
        assert_eq!(series.asset(), "DOGE-USD");
        let starts: Vec<i64> = series.candles().iter().map(|c| c.timestamp.timestamp()).collect();
        assert_eq!(starts, vec![1_700_000_000, 1_700_086_400, 1_700_172_800]);
        assert_eq!(series.candles()[1].close, 1.12);
        assert_eq!(series.candles()[1].volume, 300.0);
    }

    #[tokio::test]
    async fn fetch_requests_the_lookback_window() {
        let end = Utc.with_ymd_and_hms(2024, 6, 8, 12, 0, 0).unwrap();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", candles_path("PEPE-USD").as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start".into(), "1717761600".into()),
                Matcher::UrlEncoded("end".into(), "1717848000".into()),
                Matcher::UrlEncoded("granularity".into(), "ONE_HOUR".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"candles":[]}"#)
            .expect(1)
            .create_async()
            .await;

        client(&server.url())
            .fetch_ending_at("PEPE-USD", Granularity::Hourly, Duration::hours(24), end)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn market_requests_carry_no_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", candles_path("BTC-USD").as_str())
            .match_query(Matcher::Any)
            .match_header("authorization", Matcher::Missing)
            .match_header("cb-access-key", Matcher::Missing)
            .match_header("cb-access-sign", Matcher::Missing)
            .with_status(200)
            .with_body(
                r#"{"candles":[
                    {"start":"1700003600","open":"1","close":"1","volume":"1"},
                    {"start":"1700000000","open":"1","close":"1","volume":"1"}
                ]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let series = client(&server.url())
            .fetch("BTC-USD", Granularity::Hourly, Duration::hours(24))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(series.len(), 2);
    }

    #[tokio::test]
    async fn fewer_than_two_candles_is_insufficient() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", candles_path("WIF-USD").as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candles":[{"start":"1700000000","open":"1","close":"2","volume":"3"}]}"#)
            .create_async()
            .await;

        let series = client(&server.url())
            .fetch("WIF-USD", Granularity::Hourly, Duration::hours(24))
            .await
            .unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn duplicate_starts_count_once() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", candles_path("DUP-USD").as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"candles":[
                    {"start":"1700000000","open":"1","close":"2","volume":"3"},
                    {"start":"1700000000","open":"1","close":"2","volume":"3"}
                ]}"#,
            )
            .create_async()
            .await;

        let series = client(&server.url())
            .fetch("DUP-USD", Granularity::Hourly, Duration::hours(24))
            .await
            .unwrap();
        assert!(series.is_empty());
        assert_eq!(series.asset(), "DUP-USD");
    }

    #[tokio::test]
    async fn http_error_is_a_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", candles_path("SOL-USD").as_str())
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let err = client(&server.url())
            .fetch("SOL-USD", Granularity::Hourly, Duration::hours(24))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(ref msg) if msg.contains("429")), "{err}");
    }

    #[tokio::test]
    async fn malformed_numbers_are_a_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", candles_path("APT-USD").as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"candles":[
                    {"start":"1700000000","open":"abc","close":"1","volume":"1"},
                    {"start":"1700003600","open":"1","close":"1","volume":"1"}
                ]}"#,
            )
            .create_async()
            .await;

        let err = client(&server.url())
            .fetch("APT-USD", Granularity::Hourly, Duration::hours(24))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_an_http_error() {
        // Port 9 (discard) is closed on test hosts.
        let err = client("http://127.0.0.1:9")
            .fetch("OP-USD", Granularity::Daily, Duration::days(7))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[tokio::test]
    async fn product_ids_are_listed_in_catalog_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", MARKET_PRODUCTS_PATH)
            .match_query(Matcher::Any)
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(
                r#"{"products":[
                    {"product_id":"BTC-USD","status":"online"},
                    {"product_id":"ETH-USDC"},
                    {"product_id":"DOGE-USD"}
                ],"num_products":3}"#,
            )
            .create_async()
            .await;

        let ids = client(&server.url()).product_ids().await.unwrap();
        assert_eq!(ids, vec!["BTC-USD", "ETH-USDC", "DOGE-USD"]);
    }
}
