//! Route gates: may the current session enter a protected view?
//!
//! DESIGN
//! ======
//! Each gate starts in [`GateState::Checking`] and settles exactly once per
//! evaluation into `Allowed` or `Redirecting`. The authenticated gate is
//! purely local (token claims only). The admin gate asks the backend who is
//! logged in and reads the explicit `is_admin` flag; a payload without that
//! field goes through [`crate::compat::legacy_admin_heuristic`].
//!
//! Gates never navigate. The shell performs the redirect they report.

#[cfg(test)]
#[path = "guards_test.rs"]
mod tests;

use std::sync::{PoisonError, RwLock};

use serde_json::Value;

use crate::claims;
use crate::compat::legacy_admin_heuristic;
use crate::error::ConsoleError;
use crate::navigation::Redirect;
use crate::session::Session;
use crate::store::TokenStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Checking,
    Allowed,
    Redirecting(Redirect),
}

impl GateState {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    #[must_use]
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Self::Redirecting(redirect) => Some(redirect),
            _ => None,
        }
    }
}

// =============================================================================
// AUTHENTICATED GATE
// =============================================================================

/// Lets a view through when the stored token yields usable claims.
#[derive(Debug)]
pub struct AuthGate {
    store: TokenStore,
    state: RwLock<GateState>,
}

impl AuthGate {
    #[must_use]
    pub fn new(store: TokenStore) -> Self {
        Self { store, state: RwLock::new(GateState::Checking) }
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Check the stored token. An expired token is purged on the way.
    pub fn evaluate(&self) -> GateState {
        let outcome = match claims::stored_identity(&self.store) {
            Ok(_) => GateState::Allowed,
            Err(e) => {
                tracing::debug!(error = %e, "no usable token; redirecting to login");
                GateState::Redirecting(e.redirect().unwrap_or_else(Redirect::login))
            }
        };
        self.state.write().unwrap_or_else(PoisonError::into_inner).clone_from(&outcome);
        outcome
    }
}

// =============================================================================
// ADMIN GATE
// =============================================================================

/// Lets a view through only for administrators, as reported by `/users/me`.
#[derive(Debug)]
pub struct AdminGate {
    session: Session,
    state: RwLock<GateState>,
}

impl AdminGate {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session, state: RwLock::new(GateState::Checking) }
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Resolve admin rights against the backend.
    ///
    /// Denial sends the user home. A 401 during the check instead reports the
    /// session-expired redirect, since the token is already gone.
    pub async fn evaluate(&self) -> GateState {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = GateState::Checking;
        let outcome = self.check().await;
        self.state.write().unwrap_or_else(PoisonError::into_inner).clone_from(&outcome);
        outcome
    }

    async fn check(&self) -> GateState {
        if let Err(e) = claims::stored_identity(self.session.store()) {
            tracing::debug!(error = %e, "admin gate: no usable token");
            return GateState::Redirecting(Redirect::home());
        }

        let url = self.session.endpoints().me();
        match self.session.get_json::<Value>(&url).await {
            Ok(payload) => {
                let admin = admin_flag(&payload);
                tracing::debug!(admin, "admin gate settled");
                if admin { GateState::Allowed } else { GateState::Redirecting(Redirect::home()) }
            }
            Err(ConsoleError::AuthenticationFailed) => GateState::Redirecting(Redirect::session_expired()),
            Err(e) => {
                tracing::error!(error = %e, "error checking admin status");
                GateState::Redirecting(Redirect::home())
            }
        }
    }
}

/// Explicit `is_admin` wins; only an absent field falls back to the legacy guess.
fn admin_flag(payload: &Value) -> bool {
    match payload.get("is_admin") {
        Some(flag) => flag.as_bool() == Some(true),
        None => legacy_admin_heuristic(payload),
    }
}
