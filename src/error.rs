//! Library error type.
//!
//! ERROR HANDLING
//! ==============
//! Authentication problems (`NoToken`, `AuthenticationFailed`) are terminal for
//! the call that hit them: they carry a redirect and no display message, so
//! screens never need their own 401 handling. Everything else is an ordinary
//! failure rendered inline by the screen that started the call.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use crate::config::ConfigError;
use crate::navigation::Redirect;
use crate::store::StorageError;
use crate::users::PolicyViolation;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// No credential is stored.
    #[error("no token available")]
    NoToken,

    /// The backend answered 401; the token has already been purged.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The token is malformed. Treated like an absent token.
    #[error("token could not be decoded")]
    DecodeFailed,

    /// Any other non-2xx status. `message` is fit for display.
    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    /// Login was rejected by the backend.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Login succeeded but the response carried no token.
    #[error("Token not received from API")]
    TokenMissing,

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Policy(#[from] PolicyViolation),
}

impl ConsoleError {
    /// Whether the error ends the session-bound call without a user-facing message.
    #[must_use]
    pub fn is_auth_terminal(&self) -> bool {
        matches!(self, Self::NoToken | Self::AuthenticationFailed | Self::DecodeFailed)
    }

    /// Navigation this error implies, if any.
    #[must_use]
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            Self::NoToken | Self::DecodeFailed => Some(Redirect::login()),
            Self::AuthenticationFailed => Some(Redirect::session_expired()),
            _ => None,
        }
    }

    /// Inline error text for the initiating screen. `None` when the redirect
    /// already communicates the problem.
    #[must_use]
    pub fn display_message(&self) -> Option<String> {
        if self.is_auth_terminal() { None } else { Some(self.to_string()) }
    }

    /// HTTP status behind a `RequestFailed`, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
