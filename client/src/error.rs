//! Client error taxonomy
//!
//! Configuration and connectivity errors are fatal and propagate.
//! Authentication failures are wrapped into a human-readable [`AuthError`]
//! classified by substring matching on the underlying message. Storage and
//! encryption failures are never surfaced here - those paths fail soft and
//! log instead (see `session` and `storage`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway error {code}: {message}")]
    Gateway { code: i32, message: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("not logged in")]
    NoSession,

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Human-readable authentication failure.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Login window was blocked or closed before completing: {0}")]
    PopupBlocked(String),

    #[error("Login timed out: {0}")]
    Timeout(String),

    #[error("Token verification failed: {0}")]
    TokenRejected(String),

    #[error("Login failed: {0}")]
    Other(String),
}

impl AuthError {
    /// Classify a raw failure message by substring.
    ///
    /// The gateway and the browser callback flow report failures as free-form
    /// strings; this maps the known shapes onto stable variants.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();

        if lower.contains("popup") || lower.contains("window closed") {
            AuthError::PopupBlocked(message)
        } else if lower.contains("timed out") || lower.contains("timeout") {
            AuthError::Timeout(message)
        } else if lower.contains("token") {
            AuthError::TokenRejected(message)
        } else {
            AuthError::Other(message)
        }
    }
}
