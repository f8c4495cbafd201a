//! The console shell: the piece a UI surface drives.
//!
//! SYSTEM CONTEXT
//! ==============
//! `Console` owns one session and everything scoped to it (current-user
//! cache, user directory, inventory). It is the only component that talks to
//! the [`Navigator`]: library calls report redirects through their errors or
//! gate states, and the shell performs each one exactly once.

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;

use std::sync::Arc;

use serde::Deserialize;

use crate::current_user::{CurrentUserProfile, CurrentUserResolver};
use crate::error::ConsoleError;
use crate::guards::{AdminGate, AuthGate, GateState};
use crate::inventory::Inventory;
use crate::navigation::{MenuEntry, Navigator, Redirect, Route, menu_for};
use crate::session::Session;
use crate::store::TokenStore;
use crate::users::UserDirectory;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
}

pub struct Console {
    session: Session,
    current_user: CurrentUserResolver,
    users: UserDirectory,
    inventory: Inventory,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").field("session", &self.session).finish_non_exhaustive()
    }
}

impl Console {
    #[must_use]
    pub fn new(session: Session, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            current_user: CurrentUserResolver::new(session.clone()),
            users: UserDirectory::new(session.clone()),
            inventory: Inventory::new(session.clone()),
            session,
            navigator,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn store(&self) -> &TokenStore {
        self.session.store()
    }

    #[must_use]
    pub fn current_user(&self) -> &CurrentUserResolver {
        &self.current_user
    }

    #[must_use]
    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    // =========================================================================
    // LOGIN / LOGOUT
    // =========================================================================

    /// Exchange credentials for a token, resolve the user and go home.
    ///
    /// Any failure leaves no token stored.
    ///
    /// # Errors
    ///
    /// - [`ConsoleError::InvalidCredentials`] on a non-2xx answer.
    /// - [`ConsoleError::TokenMissing`] when the answer carries no token.
    /// - [`ConsoleError::AuthenticationFailed`] when the backend rejects the
    ///   new token while resolving the user. The session-expired redirect has
    ///   already been performed; do not pass this error to
    ///   [`Console::handle_error`] again.
    /// - Transport, decode or storage failures.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<CurrentUserProfile>, ConsoleError> {
        let token = match self.request_token(username, password).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(%username, error = %e, "login failed");
                self.store().clear();
                return Err(e);
            }
        };
        if let Err(e) = self.store().set(&token) {
            self.store().clear();
            return Err(e.into());
        }
        tracing::info!(%username, "login successful");

        self.current_user.clear();
        let profile = match self.current_user.resolve().await {
            Ok(profile) => profile,
            Err(e) => {
                self.handle_error(&e);
                return Err(e);
            }
        };
        self.navigator.navigate(&Redirect::push(Route::Home));
        Ok(profile)
    }

    async fn request_token(&self, username: &str, password: &str) -> Result<String, ConsoleError> {
        let response = self
            .session
            .http()
            .post(self.session.endpoints().login())
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ConsoleError::InvalidCredentials);
        }
        let body: LoginResponse = response.json().await?;
        body.access_token.filter(|t| !t.is_empty()).ok_or(ConsoleError::TokenMissing)
    }

    /// Forget the token and the cached user, then show the login surface.
    pub fn logout(&self) {
        self.store().clear();
        self.current_user.clear();
        tracing::info!("logged out");
        self.navigator.navigate(&Redirect::push(Route::Login));
    }

    // =========================================================================
    // ROUTING
    // =========================================================================

    /// Run the gates guarding `route` and perform any redirect they settle on.
    ///
    /// Returns the route actually entered, or `None` if the user was sent
    /// elsewhere.
    pub async fn enter(&self, route: Route) -> Option<Route> {
        let state = match route {
            Route::Root => GateState::Redirecting(Redirect { to: Route::Home, replace: true, message: None }),
            Route::Login => GateState::Allowed,
            Route::Home => AuthGate::new(self.store().clone()).evaluate(),
            Route::Users => match AuthGate::new(self.store().clone()).evaluate() {
                GateState::Allowed => AdminGate::new(self.session.clone()).evaluate().await,
                denied => denied,
            },
        };
        match state {
            GateState::Allowed => Some(route),
            GateState::Redirecting(redirect) => {
                tracing::debug!(from = route.path(), to = redirect.to.path(), "route entry redirected");
                self.navigator.navigate(&redirect);
                None
            }
            GateState::Checking => None,
        }
    }

    /// Perform the navigation `err` implies, if any, and return the inline
    /// message the initiating screen should show.
    pub fn handle_error(&self, err: &ConsoleError) -> Option<String> {
        if let Some(redirect) = err.redirect() {
            self.current_user.clear();
            self.navigator.navigate(&redirect);
        }
        err.display_message()
    }

    // =========================================================================
    // HEADER / SIDEBAR
    // =========================================================================

    #[must_use]
    pub fn display_name(&self) -> String {
        self.current_user.display_name()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.current_user.is_admin()
    }

    #[must_use]
    pub fn menu(&self) -> Vec<MenuEntry> {
        menu_for(self.current_user.is_admin())
    }
}
