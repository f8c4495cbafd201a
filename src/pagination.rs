//! Full-collection assembly over `skip`/`limit` paged endpoints.
//!
//! DESIGN
//! ======
//! Pages are requested strictly one after another and appended in order, so
//! accumulation needs no coordination. Only `has_next == false` ends a fetch;
//! an empty page with `has_next == true` keeps going. The page ceiling from
//! [`PageLimits`] guarantees termination against a backend that never stops:
//! hitting it is logged and reported through `truncated`, not raised.
//!
//! Any failing page aborts the whole fetch; partial results are dropped.
//! Counts are best-effort except for authentication failures, which always
//! reach the caller.

#[cfg(test)]
#[path = "pagination_test.rs"]
mod tests;

use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ConsoleError;
use crate::session::{RequestOptions, Session, ensure_success};

/// Wire shape every paginated endpoint returns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub has_next: bool,
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// Result of a fetch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedCollection<T> {
    pub items: Vec<T>,
    /// Requests issued.
    pub pages: u32,
    /// The page ceiling was reached while the backend still reported more.
    pub truncated: bool,
}

/// What to fetch: endpoint, filters, headers and page size.
#[derive(Debug, Clone)]
pub struct PageQuery {
    endpoint: String,
    params: Vec<(String, Option<String>)>,
    headers: HeaderMap,
    page_size: Option<u32>,
}

impl PageQuery {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), params: Vec::new(), headers: HeaderMap::new(), page_size: None }
    }

    /// Add a filter. `None` values are skipped when the URL is built.
    #[must_use]
    pub fn param(mut self, key: &str, value: Option<impl ToString>) -> Self {
        self.params.push((key.to_owned(), value.map(|v| v.to_string())));
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Override the session's default page size.
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }
}

/// Build the URL for one page: the endpoint, then the present filters, then
/// `skip` and `limit`. Keys already on the endpoint are replaced, not repeated.
///
/// # Errors
///
/// Returns [`ConsoleError::InvalidUrl`] if `endpoint` does not parse.
pub fn page_url(endpoint: &str, params: &[(String, Option<String>)], skip: u64, limit: u32) -> Result<Url, ConsoleError> {
    let mut url = Url::parse(endpoint).map_err(|e| ConsoleError::InvalidUrl(format!("{endpoint}: {e}")))?;
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    let mut set = |key: &str, value: String| {
        pairs.retain(|(k, _)| k != key);
        pairs.push((key.to_owned(), value));
    };
    for (key, value) in params {
        if let Some(value) = value {
            set(key, value.clone());
        }
    }
    set("skip", skip.to_string());
    set("limit", limit.to_string());

    url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    Ok(url)
}

impl Session {
    /// Fetch every page of `query` and concatenate the items in page order.
    ///
    /// # Errors
    ///
    /// Returns the first request, status or decode failure; nothing partial.
    pub async fn fetch_all<T: DeserializeOwned>(&self, query: &PageQuery) -> Result<FetchedCollection<T>, ConsoleError> {
        let limits = self.page_limits();
        let page_size = query.page_size.unwrap_or(limits.page_size).max(1);
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let skip = u64::from(page - 1) * u64::from(page_size);
            let url = page_url(&query.endpoint, &query.params, skip, page_size)?;
            let options = RequestOptions { headers: query.headers.clone(), json: None };

            let response = self.authenticated_request(Method::GET, url.as_str(), options).await?;
            let response = ensure_success(response, |status| format!("HTTP error! status: {}", status.as_u16())).await?;
            let body: PagedResponse<T> = response.json().await.inspect_err(|e| {
                tracing::error!(endpoint = %query.endpoint, page, error = %e, "page body did not decode");
            })?;

            let received = body.items.len();
            items.extend(body.items);
            tracing::debug!(endpoint = %query.endpoint, page, received, total = items.len(), has_next = body.has_next, "page fetched");

            if !body.has_next {
                return Ok(FetchedCollection { items, pages: page, truncated: false });
            }
            if page >= limits.max_pages {
                tracing::warn!(
                    endpoint = %query.endpoint,
                    max_pages = limits.max_pages,
                    total = items.len(),
                    "reached maximum pagination limit; returning truncated collection"
                );
                return Ok(FetchedCollection { items, pages: page, truncated: true });
            }
            page += 1;
        }
    }

    /// `total_count` reported by the first one-item page.
    ///
    /// Ordinary failures (status, transport, decode) are logged and count as 0.
    ///
    /// # Errors
    ///
    /// Returns authentication errors (no token, rejected token) so the caller
    /// can perform their redirect.
    pub async fn total_count(&self, endpoint: &str, params: &[(String, Option<String>)]) -> Result<u64, ConsoleError> {
        match self.try_total_count(endpoint, params).await {
            Ok(count) => Ok(count),
            Err(e) if e.is_auth_terminal() => Err(e),
            Err(e) => {
                tracing::error!(%endpoint, error = %e, "error fetching total count");
                Ok(0)
            }
        }
    }

    async fn try_total_count(&self, endpoint: &str, params: &[(String, Option<String>)]) -> Result<u64, ConsoleError> {
        let url = page_url(endpoint, params, 0, 1)?;
        let response = self.authenticated_request(Method::GET, url.as_str(), RequestOptions::default()).await?;
        let response = ensure_success(response, |status| format!("HTTP error! status: {}", status.as_u16())).await?;
        let body: PagedResponse<serde_json::Value> = response.json().await?;
        Ok(body.total_count.unwrap_or(0))
    }
}
