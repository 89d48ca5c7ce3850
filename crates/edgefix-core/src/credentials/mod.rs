//! Credential stores and resolution
//!
//! [`CredentialResolver`] turns raw store lookups into validated
//! [`CredentialContext`] values. Missing required keys are fatal, except the
//! account email, which is asked for interactively and persisted.

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use std::sync::Arc;
use tracing::warn;

use crate::context::CredentialContext;
use crate::error::{Error, Result};
use crate::remediation::RemediationCredentials;
use crate::traits::{CredentialProvider, Prompt};

/// Store keys
pub mod keys {
    pub const API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
    pub const GLOBAL_API_KEY: &str = "CLOUDFLARE_GLOBAL_API_KEY";
    pub const EMAIL: &str = "CLOUDFLARE_EMAIL";
    pub const ZONE_ID: &str = "CLOUDFLARE_ZONE_ID";
    pub const SERVER_IP: &str = "SERVER_IP";
    pub const DNS_RECORDS: &str = "DNS_RECORDS";
    pub const ORIGIN_RECORD: &str = "ORIGIN_RECORD";

    pub const SENTRY_AUTH_TOKEN: &str = "SENTRY_AUTH_TOKEN";
    pub const SENTRY_ORG: &str = "SENTRY_ORG";
    pub const SENTRY_WEBHOOK_URL: &str = "SENTRY_WEBHOOK_URL";
}

/// Resolves credentials from a provider, prompting for the email if needed
pub struct CredentialResolver {
    provider: Arc<dyn CredentialProvider>,
    prompt: Option<Arc<dyn Prompt>>,
}

impl CredentialResolver {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            prompt: None,
        }
    }

    /// Enable interactive prompting for the account email
    pub fn with_prompt(mut self, prompt: Arc<dyn Prompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Value that must be present
    pub async fn require(&self, key: &str) -> Result<String> {
        self.provider
            .resolve(key)
            .await?
            .ok_or_else(|| Error::missing_credential(key))
    }

    pub async fn optional(&self, key: &str) -> Result<Option<String>> {
        self.provider.resolve(key).await
    }

    /// Comma-separated list; empty entries are dropped
    pub async fn list(&self, key: &str) -> Result<Vec<String>> {
        let raw = self.require(key).await?;
        let items: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if items.is_empty() {
            return Err(Error::missing_credential(key));
        }
        Ok(items)
    }

    /// Account email, asking once and persisting the answer when absent
    pub async fn email(&self) -> Result<String> {
        if let Some(email) = self.provider.resolve(keys::EMAIL).await? {
            return Ok(email);
        }

        let Some(prompt) = &self.prompt else {
            return Err(Error::missing_credential(keys::EMAIL));
        };

        let email = prompt
            .ask("Cloudflare account email")?
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::missing_credential(keys::EMAIL))?;

        if !email.contains('@') {
            return Err(Error::invalid_input(format!(
                "'{}' does not look like an email address",
                email
            )));
        }

        self.provider.persist(keys::EMAIL, &email).await?;
        Ok(email)
    }

    async fn zone_and_origin(&self) -> Result<(String, String)> {
        let zone_id = self.require(keys::ZONE_ID).await?;
        let origin = self.require(keys::SERVER_IP).await?;
        Ok((zone_id, origin))
    }

    /// Token-mode context
    pub async fn token_context(&self) -> Result<CredentialContext> {
        let token = self.require(keys::API_TOKEN).await?;
        let (zone_id, origin) = self.zone_and_origin().await?;
        CredentialContext::with_token(token, zone_id, origin)
    }

    /// Email + global key context, `None` when no global key is stored
    pub async fn elevated_context(&self) -> Result<Option<CredentialContext>> {
        let Some(key) = self.optional(keys::GLOBAL_API_KEY).await? else {
            return Ok(None);
        };
        let email = self.email().await?;
        let (zone_id, origin) = self.zone_and_origin().await?;
        CredentialContext::with_global_key(email, key, zone_id, origin).map(Some)
    }

    /// Context for settings and DNS work: the token when present, else the global key
    pub async fn primary_context(&self) -> Result<CredentialContext> {
        if self.optional(keys::API_TOKEN).await?.is_some() {
            return self.token_context().await;
        }
        self.elevated_context()
            .await?
            .ok_or_else(|| Error::missing_credential(keys::API_TOKEN))
    }

    /// Both contexts for the remediation machine; at least one must exist
    ///
    /// With a token available, an unanswered email prompt leaves the
    /// elevated context out instead of failing, so the machine can still
    /// reach its read-only fallback.
    pub async fn remediation_credentials(&self) -> Result<RemediationCredentials> {
        let token = match self.optional(keys::API_TOKEN).await? {
            Some(_) => Some(self.token_context().await?),
            None => None,
        };
        let elevated = match self.elevated_context().await {
            Ok(elevated) => elevated,
            Err(Error::MissingCredential(key)) if key == keys::EMAIL && token.is_some() => {
                warn!("No account email available, continuing without elevated credentials");
                None
            }
            Err(e) => return Err(e),
        };
        RemediationCredentials::new(elevated, token)
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("prompt", &self.prompt.is_some())
            .finish()
    }
}
