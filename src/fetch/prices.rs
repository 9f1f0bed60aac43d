use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;

use crate::error::AppError;

use super::{AssetId, FetchResult, PriceCache, RetryingFetcher};

/// Direction of the 24h change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    pub fn from_change(change_percent: f64) -> Self {
        if change_percent > 0.0 {
            Trend::Up
        } else if change_percent < 0.0 {
            Trend::Down
        } else {
            Trend::Neutral
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Up => "▲",
            Trend::Down => "▼",
            Trend::Neutral => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceInfo {
    pub current_price: f64,
    pub open_price: f64,
    pub trend: Trend,
    pub change_percent: f64,
}

impl PriceInfo {
    /// Build from the current price and the 24h percentage change; the opening price is
    /// backed out of the change.
    pub fn from_quote(current_price: f64, change_percent: f64) -> Self {
        Self {
            current_price,
            open_price: current_price - current_price * change_percent / 100.0,
            trend: Trend::from_change(change_percent),
            change_percent,
        }
    }
}

/// Latest known-good batch result, replaced wholesale every cycle.
pub type PriceSnapshot = HashMap<AssetId, PriceInfo>;

/// Resolves asset ids to prices with one batched upstream call, consulting the cache first.
pub struct BatchPriceClient {
    fetcher: Arc<RetryingFetcher>,
    cache: Arc<PriceCache>,
    api_base: String,
}

impl BatchPriceClient {
    pub fn new(
        fetcher: Arc<RetryingFetcher>,
        cache: Arc<PriceCache>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            api_base: api_base.into(),
        }
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    pub fn fetcher(&self) -> &Arc<RetryingFetcher> {
        &self.fetcher
    }

    pub fn price_url(&self, ids: &[AssetId]) -> FetchResult<String> {
        let joined = ids.join(",");
        let url = reqwest::Url::parse_with_params(
            &format!("{}/simple/price", self.api_base),
            &[
                ("ids", joined.as_str()),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
            ],
        )
        .map_err(|err| AppError::message(format!("invalid price url: {err}")))?;
        Ok(url.into())
    }

    /// Fetch prices for `ids`. Assets that are neither cached nor present and well-formed in
    /// the upstream reply are simply absent from the result.
    pub async fn fetch_prices(&self, ids: &[AssetId]) -> PriceSnapshot {
        let mut result = PriceSnapshot::new();
        let mut uncached: Vec<AssetId> = Vec::new();

        for id in ids {
            if result.contains_key(id) || uncached.contains(id) {
                continue;
            }
            match self.cache.get(id) {
                Some(price) => {
                    result.insert(id.clone(), price);
                }
                None => uncached.push(id.clone()),
            }
        }

        if uncached.is_empty() {
            debug!("All {} prices served from cache", result.len());
            return result;
        }

        info!("Fetching prices for {} assets in batch...", uncached.len());
        let url = match self.price_url(&uncached) {
            Ok(url) => url,
            Err(err) => {
                warn!("Batch price fetch skipped: {err}");
                return result;
            }
        };
        let body = match self.fetcher.fetch(&url).await {
            Ok(body) => body,
            Err(err) => {
                warn!("Batch price fetch failed: {err}");
                return result;
            }
        };

        match parse_batch(&body, &uncached) {
            Ok(fetched) => {
                for (id, price) in fetched {
                    self.cache.put(&id, price.clone());
                    result.insert(id, price);
                }
            }
            Err(err) => warn!("Invalid batch price response: {err}"),
        }

        result
    }

    pub async fn fetch_price(&self, id: &str) -> Option<PriceInfo> {
        self.fetch_prices(&[id.to_string()]).await.remove(id)
    }
}

/// Parse the `{id: {usd, usd_24h_change}}` payload, keeping only requested, well-formed entries.
pub fn parse_batch(body: &str, requested: &[AssetId]) -> FetchResult<PriceSnapshot> {
    let root: Value = serde_json::from_str(body)?;
    let Some(entries) = root.as_object() else {
        return Err(AppError::message(
            "batch price response is not a JSON object",
        ));
    };

    let mut prices = PriceSnapshot::new();
    for id in requested {
        let Some(entry) = entries.get(id) else {
            warn!("No data for {id} in batch response");
            continue;
        };
        match parse_entry(entry) {
            Some(price) => {
                prices.insert(id.clone(), price);
            }
            None => warn!("Invalid price data for {id}: {entry}"),
        }
    }
    Ok(prices)
}

fn parse_entry(entry: &Value) -> Option<PriceInfo> {
    let fields = entry.as_object()?;
    let current_price = fields.get("usd")?.as_f64()?;
    if !current_price.is_finite() || current_price <= 0.0 {
        return None;
    }

    let change_percent = match fields.get("usd_24h_change") {
        None | Some(Value::Null) => 0.0,
        Some(value) => value.as_f64().filter(|change| change.is_finite())?,
    };

    Some(PriceInfo::from_quote(current_price, change_percent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::retry::{RateLimitCounter, RetryPolicy};
    use crate::fetch::transport::testing::ScriptedTransport;
    use crate::fetch::Throttle;
    use std::time::Duration;

    fn ids(list: &[&str]) -> Vec<AssetId> {
        list.iter().map(|id| id.to_string()).collect()
    }

    fn client(transport: Arc<ScriptedTransport>) -> BatchPriceClient {
        let fetcher = RetryingFetcher::new(
            transport,
            Arc::new(Throttle::new(Duration::ZERO, 100, Duration::from_secs(60))),
            RetryPolicy {
                max_retries: 2,
                retry_delay: Duration::from_secs(1),
            },
            Arc::new(RateLimitCounter::new()),
        );
        BatchPriceClient::new(
            Arc::new(fetcher),
            Arc::new(PriceCache::new(Duration::from_secs(30))),
            "http://api.test/v3",
        )
    }

    #[test]
    fn derives_trend_and_open_price() {
        let up = PriceInfo::from_quote(50_000.0, 2.0);
        assert_eq!(up.trend, Trend::Up);
        assert!((up.open_price - 49_000.0).abs() < 1e-6);

        assert_eq!(PriceInfo::from_quote(3_000.0, -1.5).trend, Trend::Down);
        assert_eq!(PriceInfo::from_quote(1.0, 0.0).trend, Trend::Neutral);
    }

    #[test]
    fn parse_skips_malformed_entries() {
        let body = r#"{
            "bitcoin": {"usd": 50000, "usd_24h_change": 2.0},
            "ethereum": {"usd": 3000, "usd_24h_change": -1.5},
            "dogecoin": {"usd": "cheap", "usd_24h_change": 1.0}
        }"#;

        let prices = parse_batch(body, &ids(&["bitcoin", "ethereum", "dogecoin"])).unwrap();

        assert_eq!(prices.len(), 2);
        assert!(prices.contains_key("bitcoin"));
        assert!(prices.contains_key("ethereum"));
        assert!(!prices.contains_key("dogecoin"));
    }

    #[test]
    fn parse_rejects_non_positive_prices() {
        let body = r#"{"a": {"usd": 0}, "b": {"usd": -4.2}, "c": {"usd_24h_change": 1.0}}"#;

        let prices = parse_batch(body, &ids(&["a", "b", "c"])).unwrap();

        assert!(prices.is_empty());
    }

    #[test]
    fn parse_treats_missing_or_null_change_as_neutral() {
        let body = r#"{"a": {"usd": 1.5}, "b": {"usd": 2.5, "usd_24h_change": null}}"#;

        let prices = parse_batch(body, &ids(&["a", "b"])).unwrap();

        assert_eq!(prices["a"].trend, Trend::Neutral);
        assert_eq!(prices["b"].change_percent, 0.0);
    }

    #[test]
    fn parse_ignores_unrequested_entries() {
        let body = r#"{"a": {"usd": 1.0}, "b": {"usd": 2.0}}"#;

        let prices = parse_batch(body, &ids(&["a"])).unwrap();

        assert_eq!(prices.len(), 1);
    }

    #[test]
    fn parse_rejects_non_object_payload() {
        assert!(parse_batch("[1, 2]", &ids(&["a"])).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn batch_partial_failure_returns_well_formed_subset() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(
            r#"{"bitcoin": {"usd": 50000, "usd_24h_change": 2.0},
                "ethereum": {"usd": 3000, "usd_24h_change": -1.5},
                "solana": {"usd": null}}"#,
        );
        let client = client(Arc::clone(&transport));

        let prices = client
            .fetch_prices(&ids(&["bitcoin", "ethereum", "solana"]))
            .await;

        assert_eq!(prices.len(), 2);
        assert!(!prices.contains_key("solana"));
        assert_eq!(transport.requests().len(), 1);
        assert!(client.cache().get("bitcoin").is_some());
        assert!(client.cache().get("solana").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn fully_cached_request_skips_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client(Arc::clone(&transport));
        client
            .cache()
            .put("bitcoin", PriceInfo::from_quote(50_000.0, 2.0));

        let prices = client.fetch_prices(&ids(&["bitcoin"])).await;

        assert_eq!(prices.len(), 1);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn only_uncached_ids_are_requested() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(r#"{"ethereum": {"usd": 3000, "usd_24h_change": -1.5}}"#);
        let client = client(Arc::clone(&transport));
        client
            .cache()
            .put("bitcoin", PriceInfo::from_quote(50_000.0, 2.0));

        let prices = client.fetch_prices(&ids(&["bitcoin", "ethereum"])).await;

        assert_eq!(prices.len(), 2);
        let requests = transport.requests();
        assert_eq!(
            requests,
            vec![
                "http://api.test/v3/simple/price?ids=ethereum&vs_currencies=usd&include_24hr_change=true"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_returns_cached_subset() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_status(500, "");
        transport.push_network_error();
        let client = client(Arc::clone(&transport));
        client
            .cache()
            .put("bitcoin", PriceInfo::from_quote(50_000.0, 2.0));

        let prices = client.fetch_prices(&ids(&["bitcoin", "ethereum"])).await;

        assert_eq!(prices.keys().collect::<Vec<_>>(), vec!["bitcoin"]);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_request_touches_nothing() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client(Arc::clone(&transport));

        assert!(client.fetch_prices(&[]).await.is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_price_returns_single_quote() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(r#"{"solana": {"usd": 0.5, "usd_24h_change": -3.25}}"#);
        let client = client(transport);

        let price = client.fetch_price("solana").await.unwrap();

        assert_eq!(price.trend, Trend::Down);
        assert_eq!(price.change_percent, -3.25);
        assert!(client.fetch_price("solana").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn joins_multiple_ids_into_one_parameter() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok("{}");
        let client = client(Arc::clone(&transport));

        client.fetch_prices(&ids(&["bitcoin", "matic-network"])).await;

        assert!(transport.requests()[0].contains("ids=bitcoin%2Cmatic-network&"));
    }
}
