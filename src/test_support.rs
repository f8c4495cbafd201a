//! Shared fixtures for unit tests: token minting, sessions against a mock
//! backend, and a navigator that records what it was asked to do.

use std::sync::{Arc, Mutex};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use wiremock::MockServer;

use crate::claims::now_ms;
use crate::config::PageLimits;
use crate::endpoints::ApiEndpoints;
use crate::navigation::{Navigator, Redirect};
use crate::session::Session;
use crate::store::{MemoryStorage, TokenStore};

/// Unsigned JWT-shaped token carrying `payload`.
pub fn token_for(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}

/// Token valid for the next hour.
pub fn live_token(sub: &str, username: &str) -> String {
    token_for(&json!({ "sub": sub, "username": username, "exp": now_ms() / 1000 + 3600 }))
}

/// Token that lapsed a minute ago.
pub fn expired_token(sub: &str, username: &str) -> String {
    token_for(&json!({ "sub": sub, "username": username, "exp": now_ms() / 1000 - 60 }))
}

pub struct Fixture {
    pub storage: Arc<MemoryStorage>,
    pub store: TokenStore,
    pub session: Session,
}

pub fn fixture(server: &MockServer) -> Fixture {
    fixture_with_limits(server, PageLimits::default())
}

pub fn fixture_with_limits(server: &MockServer, pages: PageLimits) -> Fixture {
    let storage = Arc::new(MemoryStorage::new());
    let store = TokenStore::new(storage.clone());
    let session = Session::with_client(reqwest::Client::new(), store.clone(), ApiEndpoints::new(&server.uri()), pages);
    Fixture { storage, store, session }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<Redirect>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<Redirect> {
        self.redirects.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, redirect: &Redirect) {
        if let Ok(mut redirects) = self.redirects.lock() {
            redirects.push(redirect.clone());
        }
    }
}
