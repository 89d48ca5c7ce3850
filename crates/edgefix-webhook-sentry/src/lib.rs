// # Sentry Event-Hook Registration
//
// Registers a webhook that receives Sentry event and issue notifications.
//
// ## Flow
//
// 1. Resolve the organization slug (configured, or the first organization
//    the token can see)
// 2. POST `{url, events}` to each candidate endpoint under the organization
//    in order: `hooks/`, `webhooks/`, `integrations/`
// 3. The first success wins; any HTTP or transport error moves on to the
//    next endpoint
//
// If every endpoint fails the caller gets an error and `manual_guidance`
// explains the dashboard steps.

use edgefix_core::{Error, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Default Sentry API base
pub const DEFAULT_SENTRY_API_BASE: &str = "https://sentry.io/api/0";

/// Candidate endpoints, tried in order
pub const HOOK_ENDPOINTS: [&str; 3] = ["hooks/", "webhooks/", "integrations/"];

/// Events the hook subscribes to
pub const HOOK_EVENTS: [&str; 5] = [
    "event.created",
    "event.updated",
    "issue.created",
    "issue.updated",
    "issue.resolved",
];

/// A created hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookRegistration {
    /// Hook id reported by Sentry, if any
    pub id: Option<String>,
    /// Endpoint that accepted the registration
    pub endpoint: String,
    pub organization: String,
}

#[derive(Debug, Deserialize)]
struct Organization {
    slug: String,
}

/// Registers Sentry event hooks
pub struct SentryHookRegistrar {
    client: reqwest::Client,
    api_base: String,
    auth_token: String,
}

impl std::fmt::Debug for SentryHookRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryHookRegistrar")
            .field("api_base", &self.api_base)
            .field("auth_token", &"<REDACTED>")
            .finish()
    }
}

impl SentryHookRegistrar {
    pub fn new(auth_token: impl Into<String>) -> Result<Self> {
        Self::with_api_base(auth_token, DEFAULT_SENTRY_API_BASE)
    }

    pub fn with_api_base(auth_token: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
        let auth_token = auth_token.into();
        if auth_token.trim().is_empty() {
            return Err(Error::missing_credential("SENTRY_AUTH_TOKEN"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    /// Slug of the first organization the token can see
    pub async fn discover_organization(&self) -> Result<String> {
        let url = format!("{}/organizations/", self.api_base);
        tracing::info!("Looking up Sentry organization");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.auth_token)
            .send()
            .await
            .map_err(|e| Error::transport(format!("organization lookup failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::rejected(Some(status.as_u16()), vec![body]));
        }

        let organizations: Vec<Organization> = response
            .json()
            .await
            .map_err(|e| Error::transport(format!("malformed organization list: {}", e)))?;

        let slug = organizations
            .into_iter()
            .next()
            .map(|o| o.slug)
            .ok_or_else(|| Error::not_found("no Sentry organizations visible to this token"))?;

        tracing::info!("Found organization: {}", slug);
        Ok(slug)
    }

    /// Register the webhook, discovering the organization when not given
    pub async fn register(&self, organization: Option<&str>, webhook_url: &str) -> Result<HookRegistration> {
        if !(webhook_url.starts_with("https://") || webhook_url.starts_with("http://")) {
            return Err(Error::invalid_input(format!(
                "Webhook URL must be http(s): '{}'",
                webhook_url
            )));
        }

        let organization = match organization.map(str::trim).filter(|o| !o.is_empty()) {
            Some(org) => org.to_string(),
            None => self.discover_organization().await?,
        };

        let body = json!({ "url": webhook_url, "events": HOOK_EVENTS });
        let mut failures = Vec::new();

        for suffix in HOOK_ENDPOINTS {
            let endpoint = format!("{}/organizations/{}/{}", self.api_base, organization, suffix);
            tracing::info!("Trying {}", endpoint);

            match self.try_endpoint(&endpoint, &body).await {
                Ok(id) => {
                    tracing::info!(
                        "Event hook created (id: {})",
                        id.as_deref().unwrap_or("N/A")
                    );
                    return Ok(HookRegistration {
                        id,
                        endpoint,
                        organization,
                    });
                }
                Err(e) => {
                    tracing::warn!("{} failed: {}", endpoint, e);
                    failures.push(format!("{}: {}", suffix, e));
                }
            }
        }

        Err(Error::provider(
            "sentry",
            format!("could not create event hook via API ({})", failures.join("; ")),
        ))
    }

    async fn try_endpoint(&self, endpoint: &str, body: &Value) -> Result<Option<String>> {
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.auth_token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = match status.as_u16() {
                404 => "endpoint not found".to_string(),
                _ => response.text().await.unwrap_or_default(),
            };
            return Err(Error::rejected(Some(status.as_u16()), vec![detail]));
        }

        let payload: Value = response.json().await.unwrap_or(Value::Null);
        Ok(payload.get("id").and_then(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }))
    }
}

/// Dashboard steps for when API registration fails
pub fn manual_guidance(webhook_url: &str) -> Vec<String> {
    vec![
        "1. Go to Settings > Integrations > Event Hooks in the Sentry dashboard".to_string(),
        format!("2. Add webhook URL: {}", webhook_url),
        "3. Select events: issue.created, issue.updated, issue.resolved".to_string(),
    ]
}
