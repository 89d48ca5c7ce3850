//! Error types for edgefix
//!
//! Every failure the core can observe maps onto one of four kinds:
//!
//! - **Fatal precondition**: [`Error::MissingCredential`], [`Error::Config`]
//! - **Transport failure**: [`Error::Transport`]
//! - **Remote rejection**: [`Error::Rejected`]
//! - **Not found**: [`Error::NotFound`]
//!
//! Probe results are not errors; an unhealthy origin is a normal outcome
//! of the remediation machine.

use thiserror::Error;

/// Result type alias for edgefix operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A required credential or identifier is missing or empty
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential store read/write errors
    #[error("Credential store error: {0}")]
    CredentialStore(String),

    /// The request never produced a usable response (network, timeout, malformed body)
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The API answered but reported failure
    #[error("Rejected by control plane (status {}): {}", status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()), messages.join("; "))]
    Rejected {
        /// HTTP status of the response
        status: Option<u16>,
        /// Error messages reported by the API
        messages: Vec<String>,
    },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a missing credential error
    pub fn missing_credential(key: impl Into<String>) -> Self {
        Self::MissingCredential(key.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a credential store error
    pub fn credential_store(msg: impl Into<String>) -> Self {
        Self::CredentialStore(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a remote rejection error
    pub fn rejected(status: Option<u16>, messages: Vec<String>) -> Self {
        Self::Rejected { status, messages }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error must halt the whole run
    pub fn is_fatal_precondition(&self) -> bool {
        matches!(self, Self::MissingCredential(_) | Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display_joins_messages() {
        let err = Error::rejected(Some(400), vec!["bad value".into(), "plan required".into()]);
        assert_eq!(
            err.to_string(),
            "Rejected by control plane (status 400): bad value; plan required"
        );
    }

    #[test]
    fn fatal_preconditions() {
        assert!(Error::missing_credential("CLOUDFLARE_ZONE_ID").is_fatal_precondition());
        assert!(Error::config("bad").is_fatal_precondition());
        assert!(!Error::transport("timeout").is_fatal_precondition());
        assert!(!Error::not_found("api.example.com").is_fatal_precondition());
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_fatal_precondition());
    }
}
