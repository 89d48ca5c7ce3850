// Remediation states, steps and the final report.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::dns::DnsRecord;
use crate::traits::ProbeResult;

/// States of the remediation machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationState {
    Start,
    ProxyDisabled,
    Probing,
    ProxyRestored,
    ManualFixRequired,
    PermissionFallback,
}

impl RemediationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RemediationState::ProxyRestored
                | RemediationState::ManualFixRequired
                | RemediationState::PermissionFallback
        )
    }
}

/// One externally visible action, in execution order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Lookup,
    DisableProxy { accepted: bool },
    Settle(Duration),
    Probe { attempt: u32, result: ProbeResult },
    RestoreProxy { accepted: bool },
    /// Read-only lookup with token credentials; `None` when the read failed
    VisibilityCheck { visible: Option<bool> },
}

/// Why an operator has to step in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualFixReason {
    /// The origin did not answer healthy while unproxied
    OriginUnhealthy { probe: ProbeResult },
    /// The origin is healthy but re-enabling the proxy was rejected
    RestoreRejected { probe: ProbeResult, errors: Vec<String> },
}

/// Terminal outcome of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    ProxyRestored {
        record: DnsRecord,
    },
    ManualFixRequired {
        reason: ManualFixReason,
        /// Record as last written (unproxied)
        record: DnsRecord,
    },
    PermissionFallback {
        errors: Vec<String>,
        /// Whether the token can see the record; `None` when unknown
        record_visible: Option<bool>,
    },
}

impl Outcome {
    pub fn state(&self) -> RemediationState {
        match self {
            Outcome::ProxyRestored { .. } => RemediationState::ProxyRestored,
            Outcome::ManualFixRequired { .. } => RemediationState::ManualFixRequired,
            Outcome::PermissionFallback { .. } => RemediationState::PermissionFallback,
        }
    }
}

/// Everything a remediation run observed
///
/// Never persisted; the binary logs it and exits.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationReport {
    pub record_name: String,
    /// Origin address the probe targeted
    pub origin: String,
    pub probe_path: String,
    /// Record before any change
    pub snapshot: DnsRecord,
    /// Last probe result, absent when no probe ran
    pub probe: Option<ProbeResult>,
    pub final_proxied: bool,
    pub outcome: Outcome,
    /// States passed through, from `Start` to the terminal state
    pub states: Vec<RemediationState>,
    pub steps: Vec<Step>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RemediationReport {
    pub fn state(&self) -> RemediationState {
        self.outcome.state()
    }

    pub fn writes(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::DisableProxy { .. } | Step::RestoreProxy { .. }))
            .count()
    }

    /// Operator instructions for non-restored endings
    pub fn guidance(&self) -> Vec<String> {
        let host = &self.record_name;
        match &self.outcome {
            Outcome::ProxyRestored { .. } => Vec::new(),
            Outcome::ManualFixRequired {
                reason: ManualFixReason::OriginUnhealthy { probe },
                ..
            } => vec![
                format!(
                    "The origin {} answered {} for http://{}{} (Host: {}).",
                    self.origin, probe, self.origin, self.probe_path, host
                ),
                "Check that the web server is running and listening on port 80.".to_string(),
                "Check the origin firewall allows inbound HTTP from the edge network.".to_string(),
                format!(
                    "{} is left unproxied; re-enable the proxy once the origin is healthy.",
                    host
                ),
            ],
            Outcome::ManualFixRequired {
                reason: ManualFixReason::RestoreRejected { errors, .. },
                ..
            } => vec![
                format!("The origin is healthy but re-enabling the proxy failed: {}", errors.join("; ")),
                format!("Re-enable the proxy for {} in the dashboard (DNS > Records).", host),
            ],
            Outcome::PermissionFallback {
                errors,
                record_visible,
            } => {
                let mut lines = vec![format!(
                    "Could not change {} automatically: {}",
                    host,
                    errors.join("; ")
                )];
                match record_visible {
                    Some(true) => lines.push("The API token can read the record but not modify it.".to_string()),
                    Some(false) => lines.push("The API token cannot see the record.".to_string()),
                    None => {}
                }
                lines.extend([
                    "1. Open the dashboard and go to DNS > Records.".to_string(),
                    format!("2. Edit {} and switch the proxy status to DNS only.", host),
                    format!(
                        "3. Verify http://{}{} answers with Host {} before re-enabling the proxy.",
                        self.origin, self.probe_path, host
                    ),
                ]);
                lines
            }
        }
    }
}
