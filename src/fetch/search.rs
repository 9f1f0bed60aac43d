use std::sync::Arc;

use log::warn;
use serde::Deserialize;

use crate::error::AppError;
use crate::symbols::{lookup_id, normalize_symbol};

use super::{AssetId, FetchResult, RetryingFetcher};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCandidate>,
}

#[derive(Debug, Deserialize)]
struct SearchCandidate {
    id: Option<String>,
    #[serde(default)]
    symbol: String,
}

/// Maps user-typed ticker symbols to asset ids: static table first, then the search API.
pub struct SymbolResolver {
    fetcher: Arc<RetryingFetcher>,
    api_base: String,
}

impl SymbolResolver {
    pub fn new(fetcher: Arc<RetryingFetcher>, api_base: impl Into<String>) -> Self {
        Self {
            fetcher,
            api_base: api_base.into(),
        }
    }

    pub fn search_url(&self, symbol: &str) -> FetchResult<String> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/search", self.api_base),
            &[("query", symbol)],
        )
        .map_err(|err| AppError::message(format!("invalid search url: {err}")))?;
        Ok(url.into())
    }

    /// Resolve `symbol` to an asset id, `None` when nothing matches or the lookup fails.
    pub async fn resolve(&self, symbol: &str) -> Option<AssetId> {
        let wanted = normalize_symbol(symbol);
        if wanted.is_empty() {
            return None;
        }
        if let Some(id) = lookup_id(&wanted) {
            return Some(id.to_string());
        }

        let body = match self.search_url(&wanted) {
            Ok(url) => self.fetcher.fetch(&url).await,
            Err(err) => Err(err),
        };
        let body = match body {
            Ok(body) => body,
            Err(err) => {
                warn!("Symbol search for `{wanted}` failed: {err}");
                return None;
            }
        };

        match pick_candidate(&body, &wanted) {
            Ok(found) => found,
            Err(err) => {
                warn!("Invalid search response for `{wanted}`: {err}");
                None
            }
        }
    }
}

/// Exact (case-insensitive) symbol match first, otherwise the first candidate.
fn pick_candidate(body: &str, wanted: &str) -> FetchResult<Option<AssetId>> {
    let response: SearchResponse = serde_json::from_str(body)?;

    let exact = response
        .coins
        .iter()
        .find(|candidate| candidate.symbol.to_lowercase() == wanted)
        .and_then(|candidate| candidate.id.clone());

    Ok(exact.or_else(|| response.coins.first().and_then(|first| first.id.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::retry::{RateLimitCounter, RetryPolicy};
    use crate::fetch::transport::testing::ScriptedTransport;
    use crate::fetch::Throttle;
    use std::time::Duration;

    fn resolver(transport: Arc<ScriptedTransport>) -> SymbolResolver {
        let fetcher = RetryingFetcher::new(
            transport,
            Arc::new(Throttle::new(Duration::ZERO, 100, Duration::from_secs(60))),
            RetryPolicy {
                max_retries: 1,
                retry_delay: Duration::from_secs(1),
            },
            Arc::new(RateLimitCounter::new()),
        );
        SymbolResolver::new(Arc::new(fetcher), "http://api.test/v3")
    }

    #[tokio::test]
    async fn known_symbols_skip_the_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let resolver = resolver(Arc::clone(&transport));

        assert_eq!(resolver.resolve("ETH").await.as_deref(), Some("ethereum"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn prefers_exact_symbol_match() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(
            r#"{"coins": [
                {"id": "pepe-2", "symbol": "PEPE2"},
                {"id": "pepe", "symbol": "PEPE"}
            ]}"#,
        );
        let resolver = resolver(Arc::clone(&transport));

        assert_eq!(resolver.resolve("Pepe").await.as_deref(), Some("pepe"));
        assert_eq!(
            transport.requests(),
            vec!["http://api.test/v3/search?query=pepe"]
        );
    }

    #[tokio::test]
    async fn search_query_is_form_encoded() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(r#"{"coins": []}"#);
        let resolver = resolver(Arc::clone(&transport));

        assert!(resolver.resolve("dog wif&hat").await.is_none());
        assert_eq!(
            transport.requests(),
            vec!["http://api.test/v3/search?query=dog+wif%26hat"]
        );
    }

    #[tokio::test]
    async fn falls_back_to_first_candidate() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(r#"{"coins": [{"id": "bonk", "symbol": "BONK"}]}"#);
        let resolver = resolver(transport);

        assert_eq!(resolver.resolve("bonkk").await.as_deref(), Some("bonk"));
    }

    #[tokio::test]
    async fn empty_results_or_failures_resolve_to_none() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(r#"{"coins": []}"#);
        transport.push_status(500, "");
        let resolver = resolver(transport);

        assert!(resolver.resolve("nothing").await.is_none());
        assert!(resolver.resolve("broken").await.is_none());
        assert!(resolver.resolve("   ").await.is_none());
    }
}
