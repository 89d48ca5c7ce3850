//! 521 remediation state machine
//!
//! A 521 means the edge could not reach the origin. The machine separates
//! edge faults from origin faults by taking the edge out of the path:
//!
//! ```text
//! Start ──► ProxyDisabled ──► Probing ──┬──► ProxyRestored
//!   │             │                     └──► ManualFixRequired
//!   └─────────────┴──────────────────────────► PermissionFallback
//! ```
//!
//! 1. Look the record up; a missing record ends the run before any write
//! 2. Disable the proxy, keeping name/type/content/ttl
//! 3. Wait for propagation, then probe the origin directly with the record
//!    name as Host header
//! 4. Healthy: re-enable the proxy and wait again. Otherwise leave the
//!    record unproxied and report
//!
//! Writes use elevated (email + global key) credentials only. Without them,
//! or when a write is rejected, the machine falls back to a read-only
//! visibility check with the token and stops with manual instructions.
//!
//! No state is revisited and nothing is rolled back. The report carries the
//! trace of states the run passed through.
//!
//! The machine refuses to start against a dry-run client.

pub mod report;

pub use report::{ManualFixReason, Outcome, RemediationReport, RemediationState, Step};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::RemediationConfig;
use crate::context::CredentialContext;
use crate::dns::{DnsReconciler, DnsRecord};
use crate::error::{Error, Result};
use crate::traits::{OriginProbe, ProbeRequest, ProbeResult};

/// Credential contexts available to a remediation run
#[derive(Debug, Clone)]
pub struct RemediationCredentials {
    elevated: Option<CredentialContext>,
    token: Option<CredentialContext>,
}

impl RemediationCredentials {
    /// At least one context is required
    pub fn new(elevated: Option<CredentialContext>, token: Option<CredentialContext>) -> Result<Self> {
        if elevated.is_none() && token.is_none() {
            return Err(Error::missing_credential(
                "CLOUDFLARE_API_TOKEN or CLOUDFLARE_GLOBAL_API_KEY",
            ));
        }
        Ok(Self { elevated, token })
    }

    pub fn elevated(&self) -> Option<&CredentialContext> {
        self.elevated.as_ref()
    }

    pub fn token(&self) -> Option<&CredentialContext> {
        self.token.as_ref()
    }

    /// Context for reads: elevated when present
    fn read_context(&self) -> Result<&CredentialContext> {
        self.elevated
            .as_ref()
            .or(self.token.as_ref())
            .ok_or_else(|| Error::missing_credential("CLOUDFLARE_API_TOKEN"))
    }
}

/// Working state of one run: the snapshot, what was observed, where the
/// machine has been
struct RemediationSession {
    record_name: String,
    origin: String,
    snapshot: DnsRecord,
    probe: Option<ProbeResult>,
    states: Vec<RemediationState>,
    steps: Vec<Step>,
    started_at: DateTime<Utc>,
}

impl RemediationSession {
    fn enter(&mut self, state: RemediationState) {
        debug!("{}: {:?}", self.record_name, state);
        self.states.push(state);
    }
}

/// Runs the remediation machine for one record
pub struct Remediator {
    dns: DnsReconciler,
    probe: Arc<dyn OriginProbe>,
    config: RemediationConfig,
}

impl Remediator {
    pub fn new(dns: DnsReconciler, probe: Arc<dyn OriginProbe>, config: RemediationConfig) -> Self {
        Self { dns, probe, config }
    }

    /// Run the machine once
    ///
    /// Returns `Err` only when the run cannot start: the client is in
    /// dry-run mode, the record name is invalid, the lookup fails or the
    /// record does not exist. Nothing has been written in those cases.
    /// Every other ending is an `Ok` report.
    pub async fn run(
        &self,
        record_name: &str,
        creds: &RemediationCredentials,
    ) -> Result<RemediationReport> {
        if self.dns.is_dry_run() {
            return Err(Error::config(
                "521 remediation needs live proxy toggles and cannot run in dry-run mode",
            ));
        }

        let started_at = Utc::now();
        info!("Remediating 521 for {}", record_name);

        let read_ctx = creds.read_context()?;
        let snapshot = self
            .dns
            .lookup(record_name, read_ctx)
            .await?
            .ok_or_else(|| Error::not_found(format!("DNS record {}", record_name)))?;
        info!(
            "Current record: {} {} -> {} (proxied: {})",
            snapshot.record_type, snapshot.name, snapshot.content, snapshot.proxied
        );

        let mut session = RemediationSession {
            record_name: record_name.to_string(),
            origin: read_ctx.origin().to_string(),
            snapshot,
            probe: None,
            states: vec![RemediationState::Start],
            steps: vec![Step::Lookup],
            started_at,
        };

        let Some(elevated) = creds.elevated() else {
            warn!("No elevated credentials available, cannot toggle the proxy");
            let outcome = self
                .permission_fallback(
                    &mut session,
                    creds,
                    vec!["elevated credentials (email + global API key) not configured".to_string()],
                )
                .await;
            return Ok(self.finish(session, outcome));
        };

        // Start -> ProxyDisabled
        let disabled = match self
            .dns
            .update(&session.snapshot.clone().with_proxied(false), elevated)
            .await
        {
            Ok(record) => {
                session.steps.push(Step::DisableProxy { accepted: true });
                session.enter(RemediationState::ProxyDisabled);
                info!("Proxy disabled for {}", record_name);
                record
            }
            Err(e) => {
                session.steps.push(Step::DisableProxy { accepted: false });
                warn!("Failed to disable proxy for {}: {}", record_name, e);
                let outcome = self
                    .permission_fallback(&mut session, creds, vec![e.to_string()])
                    .await;
                return Ok(self.finish(session, outcome));
            }
        };

        self.settle(&mut session).await;

        // ProxyDisabled -> Probing
        session.enter(RemediationState::Probing);
        let probe = self.probe_origin(&mut session).await;
        session.probe = Some(probe.clone());

        if !probe.is_healthy(self.config.healthy_status) {
            warn!("Origin unhealthy for {}: {}", record_name, probe);
            let outcome = Outcome::ManualFixRequired {
                reason: ManualFixReason::OriginUnhealthy { probe },
                record: disabled,
            };
            return Ok(self.finish(session, outcome));
        }

        // Probing -> ProxyRestored
        info!("Origin healthy ({}), re-enabling proxy", probe);
        let outcome = match self.dns.update(&disabled.clone().with_proxied(true), elevated).await {
            Ok(record) => {
                session.steps.push(Step::RestoreProxy { accepted: true });
                self.settle(&mut session).await;
                Outcome::ProxyRestored { record }
            }
            Err(e) => {
                session.steps.push(Step::RestoreProxy { accepted: false });
                warn!("Failed to re-enable proxy for {}: {}", record_name, e);
                Outcome::ManualFixRequired {
                    reason: ManualFixReason::RestoreRejected {
                        probe,
                        errors: vec![e.to_string()],
                    },
                    record: disabled,
                }
            }
        };

        Ok(self.finish(session, outcome))
    }

    async fn settle(&self, session: &mut RemediationSession) {
        let delay = self.config.settle_delay();
        debug!("Waiting {:?} for propagation", delay);
        tokio::time::sleep(delay).await;
        session.steps.push(Step::Settle(delay));
    }

    /// Poll until healthy or attempts are exhausted; returns the last result
    async fn probe_origin(&self, session: &mut RemediationSession) -> ProbeResult {
        let request = ProbeRequest::new(
            session.origin.clone(),
            session.record_name.clone(),
            self.config.probe_path.clone(),
            self.config.probe_timeout(),
        );
        let attempts = self.config.probe_attempts.max(1);

        let mut attempt = 1;
        loop {
            let result = self.probe.probe(&request).await;
            info!("Probe {}/{} {}: {}", attempt, attempts, request.url(), result);
            session.steps.push(Step::Probe {
                attempt,
                result: result.clone(),
            });

            if result.is_healthy(self.config.healthy_status) || attempt >= attempts {
                return result;
            }

            attempt += 1;
            tokio::time::sleep(self.config.probe_interval()).await;
        }
    }

    async fn permission_fallback(
        &self,
        session: &mut RemediationSession,
        creds: &RemediationCredentials,
        errors: Vec<String>,
    ) -> Outcome {
        let record_visible = match creds.token() {
            Some(token) => {
                let visible = match self.dns.lookup(&session.record_name, token).await {
                    Ok(found) => Some(found.is_some()),
                    Err(e) => {
                        warn!("Read-only check with token failed: {}", e);
                        None
                    }
                };
                session.steps.push(Step::VisibilityCheck { visible });
                visible
            }
            None => None,
        };

        Outcome::PermissionFallback {
            errors,
            record_visible,
        }
    }

    fn finish(&self, mut session: RemediationSession, outcome: Outcome) -> RemediationReport {
        session.enter(outcome.state());

        let final_proxied = match &outcome {
            Outcome::ProxyRestored { record } | Outcome::ManualFixRequired { record, .. } => {
                record.proxied
            }
            Outcome::PermissionFallback { .. } => session.snapshot.proxied,
        };

        let report = RemediationReport {
            record_name: session.record_name,
            origin: session.origin,
            probe_path: self.config.probe_path.clone(),
            snapshot: session.snapshot,
            probe: session.probe,
            final_proxied,
            outcome,
            states: session.states,
            steps: session.steps,
            started_at: session.started_at,
            finished_at: Utc::now(),
        };

        info!(
            "Remediation for {} ended in {:?} (proxied: {})",
            report.record_name,
            report.state(),
            report.final_proxied
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_require_one_context() {
        assert!(matches!(
            RemediationCredentials::new(None, None),
            Err(Error::MissingCredential(_))
        ));
    }

    #[test]
    fn reads_prefer_elevated() {
        let token = CredentialContext::with_token("tok", "zone", "203.0.113.10").unwrap();
        let elevated =
            CredentialContext::with_global_key("ops@example.com", "key", "zone", "203.0.113.10")
                .unwrap();

        let creds = RemediationCredentials::new(Some(elevated), Some(token.clone())).unwrap();
        assert!(creds.read_context().unwrap().is_elevated());

        let creds = RemediationCredentials::new(None, Some(token)).unwrap();
        assert!(!creds.read_context().unwrap().is_elevated());
    }
}
