//! Credential context
//!
//! A [`CredentialContext`] bundles everything the control-plane client needs
//! to address one zone: the active auth mode, the zone identifier and the
//! origin server address. It is validated once at construction and never
//! mutated afterwards.

use crate::error::{Error, Result};

/// Authentication material for the control plane
///
/// Exactly one mode is active per context.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// Scoped API token, sent as a bearer token
    Token(String),

    /// Account email plus global API key, sent as paired headers
    GlobalKey {
        /// Account email
        email: String,
        /// Global API key
        key: String,
    },
}

impl Auth {
    /// Short name of the auth mode, safe to log
    pub fn mode(&self) -> &'static str {
        match self {
            Auth::Token(_) => "token",
            Auth::GlobalKey { .. } => "global-key",
        }
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Token(_) => f.debug_tuple("Token").field(&"<REDACTED>").finish(),
            Auth::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}

/// Immutable credential bundle for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialContext {
    auth: Auth,
    zone_id: String,
    origin: String,
}

impl CredentialContext {
    /// Build a context, rejecting empty material or identifiers
    pub fn new(auth: Auth, zone_id: impl Into<String>, origin: impl Into<String>) -> Result<Self> {
        let zone_id = zone_id.into().trim().to_string();
        let origin = origin.into().trim().to_string();

        match &auth {
            Auth::Token(token) if token.trim().is_empty() => {
                return Err(Error::missing_credential("API token is empty"));
            }
            Auth::GlobalKey { email, key } => {
                if email.trim().is_empty() {
                    return Err(Error::missing_credential("account email is empty"));
                }
                if key.trim().is_empty() {
                    return Err(Error::missing_credential("global API key is empty"));
                }
            }
            _ => {}
        }

        if zone_id.is_empty() {
            return Err(Error::missing_credential("zone identifier is empty"));
        }
        if origin.is_empty() {
            return Err(Error::missing_credential("origin server address is empty"));
        }

        Ok(Self {
            auth,
            zone_id,
            origin,
        })
    }

    /// Token-mode convenience constructor
    pub fn with_token(
        token: impl Into<String>,
        zone_id: impl Into<String>,
        origin: impl Into<String>,
    ) -> Result<Self> {
        Self::new(Auth::Token(token.into()), zone_id, origin)
    }

    /// Email + global key convenience constructor
    pub fn with_global_key(
        email: impl Into<String>,
        key: impl Into<String>,
        zone_id: impl Into<String>,
        origin: impl Into<String>,
    ) -> Result<Self> {
        Self::new(
            Auth::GlobalKey {
                email: email.into(),
                key: key.into(),
            },
            zone_id,
            origin,
        )
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Whether this context carries elevated (global key) credentials
    pub fn is_elevated(&self) -> bool {
        matches!(self.auth, Auth::GlobalKey { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_identifiers() {
        assert!(matches!(
            CredentialContext::with_token("tok", "", "203.0.113.10"),
            Err(Error::MissingCredential(_))
        ));
        assert!(matches!(
            CredentialContext::with_token("tok", "zone", "  "),
            Err(Error::MissingCredential(_))
        ));
        assert!(matches!(
            CredentialContext::with_token("", "zone", "203.0.113.10"),
            Err(Error::MissingCredential(_))
        ));
        assert!(matches!(
            CredentialContext::with_global_key("ops@example.com", "", "zone", "203.0.113.10"),
            Err(Error::MissingCredential(_))
        ));
    }

    #[test]
    fn secrets_not_exposed_in_debug() {
        let ctx = CredentialContext::with_global_key(
            "ops@example.com",
            "super-secret-key",
            "zone",
            "203.0.113.10",
        )
        .unwrap();
        let debug_str = format!("{:?}", ctx);
        assert!(!debug_str.contains("super-secret-key"));
        assert!(debug_str.contains("ops@example.com"));

        let ctx = CredentialContext::with_token("token-value-123", "zone", "203.0.113.10").unwrap();
        assert!(!format!("{:?}", ctx).contains("token-value-123"));
    }

    #[test]
    fn elevated_flag_follows_auth_mode() {
        let token = CredentialContext::with_token("tok", "zone", "203.0.113.10").unwrap();
        let global =
            CredentialContext::with_global_key("a@b.c", "key", "zone", "203.0.113.10").unwrap();
        assert!(!token.is_elevated());
        assert!(global.is_elevated());
        assert_eq!(token.auth().mode(), "token");
        assert_eq!(global.auth().mode(), "global-key");
    }
}
