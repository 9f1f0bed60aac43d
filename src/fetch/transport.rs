use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, StatusCode};

use crate::error::Context;

use super::FetchResult;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
}

/// Issues a single GET. Transport-level failures (timeouts, refused connections) are errors;
/// any HTTP status, including 4xx/5xx, is a successful reply.
pub trait HttpTransport: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FetchResult<HttpReply>>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("crypto-ticker/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to construct HTTP client")?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FetchResult<HttpReply>> {
        async move {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok(HttpReply { status, body })
        }
        .boxed()
    }
}
