//! HTTP implementation of the feed backend.
//!
//! Talks to a `GET {base}/api/news/{page}/{page_size}` endpoint returning a
//! camelCase JSON envelope (see [`types`](super::types)). The base URL is
//! validated once at construction so a typo fails fast instead of on the
//! first fetch.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{NewsApi, NewsPage, PAGE_SIZE};
use crate::error::Result;

/// A news backend reached over HTTP.
///
/// The [`reqwest::Client`] is shared with the rest of the application (one
/// connection pool for feed pages, thumbnails, and article bodies), so
/// construction takes it as a parameter instead of building its own.
#[derive(Debug)]
pub struct HttpNewsApi {
    client: reqwest::Client,
    /// Base URL without a trailing slash, e.g. `https://webapi.autodoc.ru`.
    base: String,
}

impl HttpNewsApi {
    /// Create a backend for the given base URL.
    ///
    /// # Arguments
    ///
    /// * `base` — scheme + host (+ optional path prefix) of the API, e.g.
    ///   `https://webapi.autodoc.ru`.
    /// * `client` — the shared HTTP client.
    pub fn new(base: impl Into<String>, client: reqwest::Client) -> Result<Self> {
        let base = base.into().trim_end_matches('/').to_string();
        // Parse eagerly so an unusable base URL is reported at startup.
        Url::parse(&base)?;
        Ok(Self { client, base })
    }

    fn page_url(&self, page: u32) -> Result<Url> {
        Ok(format!("{}/api/news/{page}/{PAGE_SIZE}", self.base).parse()?)
    }
}

#[async_trait]
impl NewsApi for HttpNewsApi {
    async fn fetch_page(&self, page: u32) -> Result<NewsPage> {
        let url = self.page_url(page)?;
        debug!(%url, "requesting feed page");

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;

        // Decode via serde_json directly (rather than `Response::json`) so
        // schema mismatches surface as `Error::Decode`, distinct from
        // transport failures.
        Ok(serde_json::from_slice(&body)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
