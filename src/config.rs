//! Console configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
    #[error("invalid API base URL: {0}")]
    BaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

/// Pagination bounds applied by collection fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub page_size: u32,
    /// Hard ceiling on requests per fetch-all, guarding against a backend
    /// that never reports the last page.
    pub max_pages: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, max_pages: DEFAULT_MAX_PAGES }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub pages: PageLimits,
    pub timeouts: Timeouts,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            pages: PageLimits::default(),
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

impl ConsoleConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `ADMIN_API_BASE_URL`: default `http://localhost:8000`
    /// - `ADMIN_PAGE_SIZE`: default 100
    /// - `ADMIN_MAX_PAGES`: default 1000
    /// - `ADMIN_REQUEST_TIMEOUT_SECS`: default 30
    /// - `ADMIN_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s) or a page bound is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = std::env::var("ADMIN_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned());
        let config = Self {
            api_base_url,
            pages: PageLimits {
                page_size: env_parse("ADMIN_PAGE_SIZE", DEFAULT_PAGE_SIZE),
                max_pages: env_parse("ADMIN_MAX_PAGES", DEFAULT_MAX_PAGES),
            },
            timeouts: Timeouts {
                request_secs: env_parse("ADMIN_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("ADMIN_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        };
        config.validated()
    }

    /// Normalize the base URL and check page bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s) or a page bound is zero.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.api_base_url = self.api_base_url.trim().trim_end_matches('/').to_owned();
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(ConfigError::BaseUrl(self.api_base_url));
        }
        if self.pages.page_size == 0 {
            return Err(ConfigError::Zero { var: "ADMIN_PAGE_SIZE" });
        }
        if self.pages.max_pages == 0 {
            return Err(ConfigError::Zero { var: "ADMIN_MAX_PAGES" });
        }
        Ok(self)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
