//! Settings reconciliation engine
//!
//! The SettingsEngine drives a zone toward a desired settings profile:
//! - PATCH every directive in declared order
//! - Record one outcome per directive, never aborting on a failure
//! - Purge the cache unconditionally once every directive has an outcome
//!
//! ## Flow
//!
//! ```text
//! profile ──► directive 1 ──► PATCH settings/<key> ──► outcome 1
//!             directive 2 ──► PATCH settings/<key> ──► outcome 2
//!             ...
//!             (always)    ──► POST purge_cache      ──► purge outcome
//! ```
//!
//! There are no retries. A run is complete once every directive has an
//! outcome, whatever those outcomes are.

pub mod profile;

pub use profile::recommended_profile;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::CredentialContext;
use crate::error::{Error, Result};
use crate::traits::{ApiResponse, ControlPlane, Method};

/// Endpoint used for the cache purge
pub const PURGE_ENDPOINT: &str = "purge_cache";

/// One desired setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingDirective {
    /// Setting name, e.g. `ssl` or `minify`
    pub key: String,

    /// Desired value; structured values are sent as one PATCH
    pub value: Value,

    /// Human-readable label for reports
    #[serde(default)]
    pub label: Option<String>,
}

impl SettingDirective {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn endpoint(&self) -> String {
        format!("settings/{}", self.key)
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

/// Result of applying one directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingOutcome {
    pub key: String,
    pub applied: bool,
    /// Messages reported by the control plane when not applied
    pub errors: Option<Vec<String>>,
}

impl SettingOutcome {
    fn from_response(key: &str, response: ApiResponse) -> Self {
        if response.success {
            Self {
                key: key.to_string(),
                applied: true,
                errors: None,
            }
        } else {
            Self {
                key: key.to_string(),
                applied: false,
                errors: Some(response.error_messages()),
            }
        }
    }
}

/// Report of a full reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// One outcome per directive, in directive order
    pub outcomes: Vec<SettingOutcome>,
    /// Outcome of the trailing cache purge
    pub purge: SettingOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ReconcileReport {
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.applied).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &SettingOutcome> {
        self.outcomes.iter().filter(|o| !o.applied)
    }

    /// Whether every directive and the purge succeeded
    pub fn is_clean(&self) -> bool {
        self.purge.applied && self.outcomes.iter().all(|o| o.applied)
    }
}

/// Applies settings profiles to a zone
pub struct SettingsEngine {
    client: Arc<dyn ControlPlane>,
}

impl SettingsEngine {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }

    /// Apply every directive in order, then purge the cache
    ///
    /// Never fails: each directive yields an outcome, applied or not.
    pub async fn reconcile(
        &self,
        profile: &[SettingDirective],
        ctx: &CredentialContext,
    ) -> ReconcileReport {
        let started_at = Utc::now();
        info!(
            "Reconciling {} settings on zone {} via {}",
            profile.len(),
            ctx.zone_id(),
            self.client.provider_name()
        );

        let mut outcomes = Vec::with_capacity(profile.len());
        for directive in profile {
            outcomes.push(self.apply(directive, ctx).await);
        }

        let purge = self.purge_cache(ctx).await;

        let report = ReconcileReport {
            outcomes,
            purge,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "Reconciliation finished: {}/{} settings applied, purge {}",
            report.applied_count(),
            profile.len(),
            if report.purge.applied { "ok" } else { "failed" }
        );

        report
    }

    /// Apply a single directive
    pub async fn apply(&self, directive: &SettingDirective, ctx: &CredentialContext) -> SettingOutcome {
        let body = json!({ "value": directive.value });
        debug!("PATCH {} = {}", directive.endpoint(), directive.value);

        let response = self
            .client
            .call(Method::Patch, &directive.endpoint(), ctx, Some(&body))
            .await;
        let outcome = SettingOutcome::from_response(&directive.key, response);

        match &outcome.errors {
            None => info!("{}: applied", directive.display_name()),
            Some(errors) => warn!("{}: failed: {}", directive.display_name(), errors.join("; ")),
        }

        outcome
    }

    /// Purge everything from the edge cache
    pub async fn purge_cache(&self, ctx: &CredentialContext) -> SettingOutcome {
        let body = json!({ "purge_everything": true });
        let response = self
            .client
            .call(Method::Post, PURGE_ENDPOINT, ctx, Some(&body))
            .await;
        let outcome = SettingOutcome::from_response(PURGE_ENDPOINT, response);

        if let Some(errors) = &outcome.errors {
            warn!("Cache purge failed: {}", errors.join("; "));
        } else {
            info!("Cache purged");
        }

        outcome
    }

    /// Read the current value of a setting
    pub async fn current_value(&self, key: &str, ctx: &CredentialContext) -> Result<Value> {
        let endpoint = format!("settings/{}", key);
        let payload = self
            .client
            .call(Method::Get, &endpoint, ctx, None)
            .await
            .into_result()?;

        payload
            .as_ref()
            .and_then(|p| p.get("value"))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("setting '{}' has no value", key)))
    }
}
