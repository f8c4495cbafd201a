//! Bearer-token claim extraction.
//!
//! DESIGN
//! ======
//! Tokens are JWT-shaped but never verified here; the payload segment is read
//! only to learn who is logged in and when the token lapses. Every failure
//! degrades to "no claims" instead of an error.
//!
//! Claim values follow loose truthiness: an empty string, a zero number,
//! `false` or `null` count as absent, so the fallback chains skip them.

#[cfg(test)]
#[path = "claims_test.rs"]
mod tests;

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value};

use crate::error::ConsoleError;
use crate::store::TokenStore;

/// Standard alphabet that accepts payloads with or without `=` padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Username used when no claim identifies the user.
pub const FALLBACK_USERNAME: &str = "User";

const USERNAME_CLAIMS: [&str; 5] = ["username", "sub", "user_id", "email", "preferred_username"];
const SUBJECT_CLAIMS: [&str; 3] = ["sub", "user_id", "username"];

/// Identity read from a token payload. Recomputed on demand, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityClaims {
    pub subject_id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `iat`, seconds since the Unix epoch.
    pub issued_at: Option<i64>,
    /// `exp`, seconds since the Unix epoch.
    pub expires_at: Option<i64>,
}

impl IdentityClaims {
    /// Whether `exp` lies strictly before `now_ms` (milliseconds since epoch).
    /// A missing or zero `exp` never expires.
    #[must_use]
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        match self.expires_at {
            Some(exp) if exp != 0 => exp.saturating_mul(1000) < now_ms,
            _ => false,
        }
    }
}

/// Decode the middle segment of a three-part token into a JSON object.
#[must_use]
pub fn decode_payload(token: &str) -> Option<Map<String, Value>> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return None;
    }
    let translated = segments[1].replace('-', "+").replace('_', "/");
    let bytes = match PAYLOAD_ENGINE.decode(translated.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "token payload is not base64");
            return None;
        }
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "token payload is not JSON");
            None
        }
    }
}

/// Extract identity claims. Pure: expiry is reported, not enforced.
#[must_use]
pub fn decode(token: &str) -> Option<IdentityClaims> {
    let payload = decode_payload(token)?;

    let username = first_claim(&payload, &USERNAME_CLAIMS).unwrap_or_else(|| FALLBACK_USERNAME.to_owned());
    let subject_id = first_claim(&payload, &SUBJECT_CLAIMS).unwrap_or_else(|| username.clone());

    Some(IdentityClaims {
        subject_id,
        username,
        email: claim_text(&payload, "email"),
        first_name: first_claim(&payload, &["first_name", "given_name"]),
        last_name: first_claim(&payload, &["last_name", "family_name"]),
        issued_at: claim_seconds(&payload, "iat"),
        expires_at: claim_seconds(&payload, "exp"),
    })
}

/// Claims of the stored token, if it is present, decodable and unexpired.
///
/// Side effect: an expired token is purged from `store`.
#[must_use]
pub fn usable_identity(store: &TokenStore) -> Option<IdentityClaims> {
    usable_identity_at(store, now_ms())
}

/// [`usable_identity`] against an explicit clock.
#[must_use]
pub fn usable_identity_at(store: &TokenStore, now_ms: i64) -> Option<IdentityClaims> {
    match stored_identity_at(store, now_ms) {
        Ok(claims) => Some(claims),
        Err(_) => None,
    }
}

/// Like [`usable_identity`], but says why no identity is available.
///
/// # Errors
///
/// - [`ConsoleError::NoToken`] when nothing is stored, or the stored token
///   expired and has just been purged.
/// - [`ConsoleError::DecodeFailed`] when the stored token is malformed.
pub fn stored_identity(store: &TokenStore) -> Result<IdentityClaims, ConsoleError> {
    stored_identity_at(store, now_ms())
}

/// [`stored_identity`] against an explicit clock.
///
/// # Errors
///
/// See [`stored_identity`].
pub fn stored_identity_at(store: &TokenStore, now_ms: i64) -> Result<IdentityClaims, ConsoleError> {
    let token = store.get().ok_or(ConsoleError::NoToken)?;
    let Some(claims) = decode(&token) else {
        tracing::debug!("stored token could not be decoded");
        return Err(ConsoleError::DecodeFailed);
    };
    if claims.is_expired_at(now_ms) {
        tracing::info!(username = %claims.username, "stored token expired; purging");
        store.clear();
        return Err(ConsoleError::NoToken);
    }
    Ok(claims)
}

pub(crate) fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

fn first_claim(payload: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| claim_text(payload, key))
}

fn claim_text(payload: &Map<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|v| v != 0.0) => Some(n.to_string()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn claim_seconds(payload: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = payload.get(key)?;
    value.as_i64().or_else(|| value.as_f64().map(|v| v.floor() as i64))
}
