//! Who is logged in.
//!
//! DESIGN
//! ======
//! The resolver owns the profile for the lifetime of a session. `resolve`
//! always re-fetches; callers decide when a refresh is due. When the backend
//! cannot answer for a reason other than a rejected token, a profile is
//! synthesized from the token claims with admin rights withheld. A rejected
//! token is returned as an error so the shell can perform its redirect.
//!
//! Any JSON object from `/users/me` is adopted: fields of an unexpected type
//! read as unset, and unknown fields are kept in `extra`.
//!
//! `is_admin` is strict: only an explicit `is_admin: true` counts.

#[cfg(test)]
#[path = "current_user_test.rs"]
mod tests;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::claims::{self, FALLBACK_USERNAME};
use crate::error::ConsoleError;
use crate::session::Session;
use crate::users::UserId;

/// Server-resolved identity of the logged-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUserProfile {
    #[serde(default, deserialize_with = "lenient")]
    pub id: UserId,
    #[serde(default, deserialize_with = "lenient")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_name: Option<String>,
    /// Alternate identifier; set on profiles synthesized from token claims.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Absent in legacy payloads; anything but a JSON bool reads as absent.
    #[serde(default, deserialize_with = "lenient")]
    pub is_admin: Option<bool>,
    /// Remaining payload fields, kept as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decode a field, falling back to its default when the value has another type.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl CurrentUserProfile {
    fn from_claims(claims: claims::IdentityClaims) -> Self {
        let id = UserId::Text(claims.subject_id);
        Self {
            user_id: Some(id.clone()),
            id,
            username: claims.username,
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            is_admin: Some(false),
            extra: Map::new(),
        }
    }
}

#[derive(Debug)]
pub struct CurrentUserResolver {
    session: Session,
    profile: RwLock<Option<CurrentUserProfile>>,
}

impl CurrentUserResolver {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session, profile: RwLock::new(None) }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<CurrentUserProfile>> {
        self.profile.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<CurrentUserProfile>> {
        self.profile.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Fetch the current user and replace the cached profile with the result.
    ///
    /// Returns the profile now held, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::AuthenticationFailed`] when the backend rejects
    /// the token; the cached profile is cleared first. Every other failure
    /// falls back to the token claims.
    pub async fn resolve(&self) -> Result<Option<CurrentUserProfile>, ConsoleError> {
        let url = self.session.endpoints().me();
        let resolved = match self.session.get_json::<CurrentUserProfile>(&url).await {
            Ok(profile) => {
                tracing::debug!(username = %profile.username, "current user resolved");
                Some(profile)
            }
            Err(ConsoleError::AuthenticationFailed) => {
                tracing::debug!("current user lookup ended the session");
                self.clear();
                return Err(ConsoleError::AuthenticationFailed);
            }
            Err(e) => {
                tracing::warn!(error = %e, "current user lookup failed; falling back to token claims");
                claims::usable_identity(self.session.store()).map(CurrentUserProfile::from_claims)
            }
        };
        self.write().clone_from(&resolved);
        Ok(resolved)
    }

    /// Cached profile, without touching the network.
    #[must_use]
    pub fn profile(&self) -> Option<CurrentUserProfile> {
        self.read().clone()
    }

    /// True only when the cached profile says `is_admin: true`.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.read().as_ref().is_some_and(|p| p.is_admin == Some(true))
    }

    /// Drop the cached profile (logout).
    pub fn clear(&self) {
        *self.write() = None;
    }

    /// Header label: profile username, else token username, else `"User"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(profile) = self.read().as_ref() {
            if !profile.username.is_empty() {
                return profile.username.clone();
            }
        }
        claims::usable_identity(self.session.store())
            .map_or_else(|| FALLBACK_USERNAME.to_owned(), |claims| claims.username)
    }
}
