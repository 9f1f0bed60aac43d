use crate::error::Result;

pub mod cache;
pub mod prices;
pub mod retry;
pub mod search;
pub mod throttle;
pub mod transport;

pub use cache::PriceCache;
pub use prices::{BatchPriceClient, PriceInfo, PriceSnapshot, Trend};
pub use retry::{RateLimitCounter, RateLimitListener, RetryPolicy, RetryingFetcher};
pub use search::SymbolResolver;
pub use throttle::Throttle;
pub use transport::{HttpReply, HttpTransport, ReqwestTransport};

/// Canonical identifier of a priceable asset, e.g. `bitcoin`.
pub type AssetId = String;

pub type FetchResult<T> = Result<T>;
