//! Admin console client: session, authorization and pagination pipeline.
//!
//! ARCHITECTURE
//! ============
//! Leaf-first: `store` holds the bearer token, `claims` reads identity out of
//! it, `session` wraps every protected request, `current_user` caches who is
//! logged in, `pagination` assembles full collections, and `guards` decides
//! whether a route may be entered. `app` composes them into the shell that a
//! UI surface drives.

pub mod app;
pub mod claims;
pub mod compat;
pub mod config;
pub mod current_user;
pub mod endpoints;
pub mod error;
pub mod guards;
pub mod inventory;
pub mod navigation;
pub mod pagination;
pub mod session;
pub mod store;
pub mod users;

#[cfg(test)]
mod test_support;

pub use app::Console;
pub use config::ConsoleConfig;
pub use error::ConsoleError;
pub use session::Session;
pub use store::TokenStore;
