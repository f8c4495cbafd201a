//! Route targets, navigation effects and the admin-gated menu model.
//!
//! SYSTEM CONTEXT
//! ==============
//! Data-fetching code never navigates. It reports a [`Redirect`] (usually via
//! `ConsoleError::redirect`) and the shell hands it to a [`Navigator`].

#[cfg(test)]
#[path = "navigation_test.rs"]
mod tests;

/// Message shown on the login surface after a 401.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Home,
    Users,
}

impl Route {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Home => "/home",
            Self::Users => "/users",
        }
    }

    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" | "" => Some(Self::Root),
            "/login" => Some(Self::Login),
            "/home" => Some(Self::Home),
            "/users" => Some(Self::Users),
            _ => None,
        }
    }
}

/// A navigation the UI should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: Route,
    /// Replace the current history entry instead of pushing.
    pub replace: bool,
    /// Message for the target surface to display.
    pub message: Option<String>,
}

impl Redirect {
    /// Plain bounce to login, e.g. when no token exists.
    #[must_use]
    pub fn login() -> Self {
        Self { to: Route::Login, replace: true, message: None }
    }

    /// Bounce to login after the backend rejected the token.
    #[must_use]
    pub fn session_expired() -> Self {
        Self { to: Route::Login, replace: true, message: Some(SESSION_EXPIRED_MESSAGE.to_owned()) }
    }

    /// Bounce to home, used by the admin gate on denial.
    #[must_use]
    pub fn home() -> Self {
        Self { to: Route::Root, replace: true, message: None }
    }

    /// Ordinary forward navigation.
    #[must_use]
    pub fn push(to: Route) -> Self {
        Self { to, replace: false, message: None }
    }
}

/// Performs navigation on behalf of the UI surface.
pub trait Navigator: Send + Sync {
    fn navigate(&self, redirect: &Redirect);
}

// =============================================================================
// MENU
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: &'static str,
    pub title: &'static str,
    pub route: Option<Route>,
    pub admin_only: bool,
    pub children: Vec<MenuEntry>,
}

fn full_menu() -> Vec<MenuEntry> {
    vec![
        MenuEntry { id: "home", title: "Home", route: Some(Route::Home), admin_only: false, children: Vec::new() },
        MenuEntry {
            id: "management",
            title: "Management",
            route: None,
            admin_only: true,
            children: vec![MenuEntry {
                id: "users",
                title: "Users",
                route: Some(Route::Users),
                admin_only: true,
                children: Vec::new(),
            }],
        },
    ]
}

/// Sidebar entries visible to a user with the given admin status.
///
/// Admin-only entries are dropped for non-admins, and a section left without
/// children is dropped as well.
#[must_use]
pub fn menu_for(is_admin: bool) -> Vec<MenuEntry> {
    filter_entries(full_menu(), is_admin)
}

fn filter_entries(entries: Vec<MenuEntry>, is_admin: bool) -> Vec<MenuEntry> {
    entries
        .into_iter()
        .filter(|entry| is_admin || !entry.admin_only)
        .filter_map(|mut entry| {
            if entry.children.is_empty() {
                return Some(entry);
            }
            entry.children = filter_entries(entry.children, is_admin);
            (!entry.children.is_empty()).then_some(entry)
        })
        .collect()
}
