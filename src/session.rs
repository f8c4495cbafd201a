//! Authenticated request wrapper.
//!
//! ARCHITECTURE
//! ============
//! Every protected call goes through [`Session::authenticated_request`]. It
//! reads the token fresh from the store on each call, attaches it, and turns a
//! 401 into a purge of the stored credentials plus
//! [`ConsoleError::AuthenticationFailed`]. It never navigates and never reads
//! the body: the redirect rides on the error, and non-401 statuses are handed
//! back untouched for the caller to interpret.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ConsoleConfig, PageLimits};
use crate::endpoints::ApiEndpoints;
use crate::error::ConsoleError;
use crate::store::TokenStore;

/// Caller-supplied parts of a protected request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers. These override the defaults, except `Authorization`.
    pub headers: HeaderMap,
    /// JSON body, if any.
    pub json: Option<Value>,
}

impl RequestOptions {
    #[must_use]
    pub fn json(body: Value) -> Self {
        Self { headers: HeaderMap::new(), json: Some(body) }
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    http: reqwest::Client,
    store: TokenStore,
    endpoints: ApiEndpoints,
    pages: PageLimits,
}

impl Session {
    /// Build a session with an HTTP client configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ConsoleConfig, store: TokenStore) -> Result<Self, ConsoleError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()?;
        Ok(Self::with_client(http, store, ApiEndpoints::new(&config.api_base_url), config.pages))
    }

    #[must_use]
    pub fn with_client(http: reqwest::Client, store: TokenStore, endpoints: ApiEndpoints, pages: PageLimits) -> Self {
        Self { http, store, endpoints, pages }
    }

    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    #[must_use]
    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    #[must_use]
    pub fn page_limits(&self) -> PageLimits {
        self.pages
    }

    /// Unauthenticated client, for the login call.
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Issue `method url` with the stored bearer token attached.
    ///
    /// # Errors
    ///
    /// - [`ConsoleError::NoToken`] if no token is stored (no request is sent).
    /// - [`ConsoleError::AuthenticationFailed`] on a 401; the token and the
    ///   legacy user-data key have been removed by the time this returns.
    /// - [`ConsoleError::Http`] on transport failure.
    ///
    /// Every other status, 4xx and 5xx included, is returned as `Ok`.
    pub async fn authenticated_request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response, ConsoleError> {
        let Some(token) = self.store.get() else {
            tracing::debug!(%url, "no token stored; refusing protected request");
            return Err(ConsoleError::NoToken);
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(options.headers);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {token}"))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let request = self.http.request(method.clone(), url).headers(headers);
        let request = if let Some(body) = &options.json { request.json(body) } else { request };

        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(%method, %url, "backend rejected token; ending session");
            self.store.clear();
            self.store.clear_user_data();
            return Err(ConsoleError::AuthenticationFailed);
        }
        Ok(response)
    }

    /// GET `url` and decode a 2xx JSON body.
    ///
    /// # Errors
    ///
    /// Returns the wrapper's errors, [`ConsoleError::RequestFailed`] for a
    /// non-2xx status, or a decode error for an unexpected body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ConsoleError> {
        let response = self.authenticated_request(Method::GET, url, RequestOptions::default()).await?;
        let response = ensure_success(response, |status| format!("HTTP error! status: {}", status.as_u16())).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Pass a 2xx response through; otherwise turn it into `RequestFailed`.
///
/// The message is the body's `detail` string when present, else `fallback`.
///
/// # Errors
///
/// Returns [`ConsoleError::RequestFailed`] for any non-2xx status.
pub async fn ensure_success(
    response: Response,
    fallback: impl FnOnce(StatusCode) -> String,
) -> Result<Response, ConsoleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = detail_message(&body).unwrap_or_else(|| fallback(status));
    tracing::debug!(status = status.as_u16(), %message, "request failed");
    Err(ConsoleError::RequestFailed { status: status.as_u16(), message })
}

/// Extract `detail` from an error body of shape `{"detail": "..."}`.
pub(crate) fn detail_message(body: &str) -> Option<String> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return None;
    };
    match map.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => Some(detail.clone()),
        _ => None,
    }
}
