use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{BoxError, HttpError, Result, SearchError};
use crate::query::{Query, SearchResult};
use crate::transport::{HttpRequest, ReqwestTransport, Transport};

/// Results per page served by the search API.
pub const PAGE_SIZE: u32 = 100;

/// Executes queries and builds browser links for them.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Fetch every page needed to satisfy `query.limit` and aggregate them.
    async fn search(&self, query: &Query) -> Result<SearchResult>;

    /// Browser URL for `query`. Performs no network call.
    fn url(&self, query: &Query) -> Result<Url>;
}

pub struct GitHubSearcher<T> {
    transport: T,
    host: String,
}

impl<T: Transport> GitHubSearcher<T> {
    /// Create a searcher that sends requests through `transport` to `host`.
    pub fn new(transport: T, host: impl Into<String>) -> Self {
        GitHubSearcher {
            transport,
            host: host.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch a single page, classifying failures.
    async fn search_page(&self, query: &Query, page: u32, per_page: u32) -> Result<SearchResult> {
        let url = query.api_url(&self.host, page, per_page)?;
        debug!("Requesting URL: {}", url);

        let response = self
            .transport
            .execute(HttpRequest {
                url: url.clone(),
                headers: request_headers(),
            })
            .await
            .map_err(SearchError::Transport)?;

        if !response.status.is_success() {
            let err = HttpError::from_response(
                response.status,
                response.content_type(),
                &response.body,
                url,
            )?;
            error!("Search failed on page {}: {}", page, err);
            return Err(err.into());
        }

        let result: SearchResult = serde_json::from_slice(&response.body)?;
        if result.incomplete_results {
            warn!("Search timed out before completing page {}", page);
        }
        info!(
            "Fetched {} results on page {} ({} total)",
            result.items.len(),
            page,
            result.total_count
        );
        Ok(result)
    }
}

impl GitHubSearcher<ReqwestTransport> {
    /// Create a searcher talking to the configured host over `reqwest`.
    pub fn from_config(config: &Config) -> std::result::Result<Self, BoxError> {
        let transport = ReqwestTransport::new(config.token.clone())?;
        Ok(GitHubSearcher::new(transport, config.host.clone()))
    }
}

#[async_trait]
impl<T: Transport> Searcher for GitHubSearcher<T> {
    async fn search(&self, query: &Query) -> Result<SearchResult> {
        let mut result = SearchResult::default();

        // One page at a time; the first failure discards everything.
        for (page, per_page) in page_plan(query.limit) {
            let page_result = self.search_page(query, page, per_page).await?;
            result.absorb_page(page_result);
        }

        info!(
            "Collected {} of {} results for '{}'",
            result.items.len(),
            result.total_count,
            query.search_terms()
        );
        Ok(result)
    }

    fn url(&self, query: &Query) -> Result<Url> {
        query.browser_url(&self.host)
    }
}

fn request_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
    headers
}

/// `(page, per_page)` for each request needed to cover `limit` results.
///
/// The size of page `i` is derived from what remains after `i` full pages:
/// above one page it is [`PAGE_SIZE`], at or below zero it is `limit`,
/// otherwise the remainder itself.
pub fn page_plan(limit: u32) -> impl Iterator<Item = (u32, u32)> {
    let pages = limit.div_ceil(PAGE_SIZE);
    (1..=pages).map(move |page| {
        let remaining = i64::from(limit) - i64::from(page) * i64::from(PAGE_SIZE);
        let per_page = if remaining > i64::from(PAGE_SIZE) {
            PAGE_SIZE
        } else if remaining <= 0 {
            limit
        } else {
            remaining as u32
        };
        (page, per_page)
    })
}
