//! User management: records, the business rules guarding destructive
//! actions, and the CRUD calls behind the users screen.
//!
//! BUSINESS RULES
//! ==============
//! - The account named exactly `admin` can never be deleted and can never
//!   lose its admin flag, whoever is acting.
//! - Nobody can delete their own account. "Own" means the target matches the
//!   current profile by id, by alternate id, or by username.
//!
//! Refusals happen before any request is sent.

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::current_user::CurrentUserProfile;
use crate::error::ConsoleError;
use crate::pagination::{FetchedCollection, PageQuery};
use crate::session::{RequestOptions, Session, ensure_success};

/// Username of the built-in administrator account.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Server-assigned identifier; numeric on current backends, text when
/// synthesized from token claims.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl UserId {
    /// Loose equality: both sides compared in their string form.
    #[must_use]
    pub fn same_as(&self, other: &UserId) -> bool {
        self.to_string() == other.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// Body of `POST /users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub is_admin: bool,
}

/// Body of `PATCH /users/{id}`. An empty password is left out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "password_unset")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

#[allow(clippy::ref_option)]
fn password_unset(password: &Option<String>) -> bool {
    password.as_deref().is_none_or(str::is_empty)
}

// =============================================================================
// RULES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("Cannot delete the default admin user")]
    DeleteDefaultAdmin,
    #[error("You cannot delete your own account")]
    DeleteSelf,
    #[error("Cannot remove admin privileges from the default admin user")]
    RevokeDefaultAdmin,
}

#[must_use]
pub fn is_default_admin(user: &UserRecord) -> bool {
    user.username == DEFAULT_ADMIN_USERNAME
}

/// Whether `target` is the logged-in user.
#[must_use]
pub fn is_current_user(target: &UserRecord, current: Option<&CurrentUserProfile>) -> bool {
    let Some(current) = current else {
        return false;
    };
    (!current.id.to_string().is_empty() && current.id.same_as(&target.id))
        || current.user_id.as_ref().is_some_and(|alt| alt.same_as(&target.id))
        || (!current.username.is_empty() && current.username == target.username)
}

/// Check the delete rules for `target`.
///
/// # Errors
///
/// Returns the violated rule.
pub fn check_delete(target: &UserRecord, current: Option<&CurrentUserProfile>) -> Result<(), PolicyViolation> {
    if is_default_admin(target) {
        return Err(PolicyViolation::DeleteDefaultAdmin);
    }
    if is_current_user(target, current) {
        return Err(PolicyViolation::DeleteSelf);
    }
    Ok(())
}

/// Check the rule for flipping `target`'s admin flag.
///
/// # Errors
///
/// Returns [`PolicyViolation::RevokeDefaultAdmin`] when the flip would revoke
/// the default admin.
pub fn check_admin_toggle(target: &UserRecord) -> Result<(), PolicyViolation> {
    if is_default_admin(target) && target.is_admin {
        return Err(PolicyViolation::RevokeDefaultAdmin);
    }
    Ok(())
}

/// Per-row affordances for the users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowActions {
    pub is_current_user: bool,
    pub can_delete: bool,
    pub can_toggle_admin: bool,
}

#[must_use]
pub fn row_actions(target: &UserRecord, current: Option<&CurrentUserProfile>) -> RowActions {
    RowActions {
        is_current_user: is_current_user(target, current),
        can_delete: check_delete(target, current).is_ok(),
        can_toggle_admin: check_admin_toggle(target).is_ok(),
    }
}

// =============================================================================
// DIRECTORY
// =============================================================================

/// CRUD calls for the users screen.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    session: Session,
}

impl UserDirectory {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Every user, across all pages.
    ///
    /// # Errors
    ///
    /// Returns any request, status or decode failure.
    pub async fn list(&self) -> Result<FetchedCollection<UserRecord>, ConsoleError> {
        let query = PageQuery::new(self.session.endpoints().users());
        self.session.fetch_all(&query).await
    }

    /// # Errors
    ///
    /// Returns any request failure, or the backend's `detail`.
    pub async fn create(&self, user: &NewUser) -> Result<UserRecord, ConsoleError> {
        let url = self.session.endpoints().users();
        let response = self
            .session
            .authenticated_request(Method::POST, &url, RequestOptions::json(serde_json::to_value(user)?))
            .await?;
        let response = ensure_success(response, |_| "Failed to create user".to_owned()).await?;
        let created = response.json::<UserRecord>().await?;
        tracing::info!(id = %created.id, username = %created.username, "user created");
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns any request failure, or the backend's `detail`.
    pub async fn update(&self, id: &UserId, update: &UserUpdate) -> Result<(), ConsoleError> {
        let url = self.session.endpoints().user(id);
        let response = self
            .session
            .authenticated_request(Method::PATCH, &url, RequestOptions::json(serde_json::to_value(update)?))
            .await?;
        ensure_success(response, |status| format!("Failed to update user ({})", status.as_u16())).await?;
        tracing::info!(%id, "user updated");
        Ok(())
    }

    /// Flip `target`'s admin flag.
    ///
    /// # Errors
    ///
    /// Returns a policy violation without contacting the backend, or any
    /// request failure.
    pub async fn toggle_admin(&self, target: &UserRecord) -> Result<(), ConsoleError> {
        check_admin_toggle(target)?;
        let url = self.session.endpoints().user(&target.id);
        let body = json!({ "is_admin": !target.is_admin });
        let response = self.session.authenticated_request(Method::PUT, &url, RequestOptions::json(body)).await?;
        ensure_success(response, |_| "Failed to update user admin status".to_owned()).await?;
        tracing::info!(id = %target.id, is_admin = !target.is_admin, "admin flag toggled");
        Ok(())
    }

    /// Delete `target` on behalf of `current`.
    ///
    /// # Errors
    ///
    /// Returns a policy violation without contacting the backend, or any
    /// request failure.
    pub async fn delete(&self, target: &UserRecord, current: Option<&CurrentUserProfile>) -> Result<(), ConsoleError> {
        check_delete(target, current)?;
        let url = self.session.endpoints().user(&target.id);
        let response = self.session.authenticated_request(Method::DELETE, &url, RequestOptions::default()).await?;
        ensure_success(response, |_| "Failed to delete user".to_owned()).await?;
        tracing::info!(id = %target.id, username = %target.username, "user deleted");
        Ok(())
    }
}
