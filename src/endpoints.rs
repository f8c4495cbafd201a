//! Backend endpoint table, rooted at the configured API base URL.

#[cfg(test)]
#[path = "endpoints_test.rs"]
mod tests;

use std::fmt::Display;

const API_PREFIX: &str = "/api/v1";

/// Paginated inventory collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Devices,
    Circuits,
    Clients,
    Services,
}

impl Collection {
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Devices => "devices",
            Self::Circuits => "circuits",
            Self::Clients => "clients",
            Self::Services => "services",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    base: String,
}

impl ApiEndpoints {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self { base: base_url.trim_end_matches('/').to_owned() }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn api(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base)
    }

    #[must_use]
    pub fn login(&self) -> String {
        self.api("/auth/login")
    }

    #[must_use]
    pub fn logout(&self) -> String {
        self.api("/auth/logout")
    }

    #[must_use]
    pub fn refresh_token(&self) -> String {
        self.api("/auth/refresh_token")
    }

    /// Users collection; also the create target.
    #[must_use]
    pub fn users(&self) -> String {
        self.api("/users")
    }

    /// A single user, for update and delete.
    #[must_use]
    pub fn user(&self, id: impl Display) -> String {
        self.api(&format!("/users/{id}"))
    }

    /// The "who am I" endpoint.
    #[must_use]
    pub fn me(&self) -> String {
        self.api("/users/me")
    }

    #[must_use]
    pub fn collection(&self, collection: Collection) -> String {
        self.api(&format!("/{}", collection.path_segment()))
    }
}
