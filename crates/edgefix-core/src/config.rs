//! Configuration types for edgefix
//!
//! Tunables for the control-plane client and the remediation machine.
//! Secrets never live here; they come from the credential store.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Cloudflare API v4 base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Control-plane client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL; zone paths are appended as `/zones/<id>/<endpoint>`
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Transport timeout for every call (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,

    /// Perform reads but only log writes
    #[serde(default)]
    pub dry_run: bool,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_request_timeout_secs(),
            dry_run: false,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(crate::Error::config(format!(
                "API base must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Remediation machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationConfig {
    /// Wait after each proxy toggle (in seconds)
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,

    /// Health-check path on the origin
    #[serde(default = "default_probe_path")]
    pub probe_path: String,

    /// Status code that counts as healthy
    #[serde(default = "default_healthy_status")]
    pub healthy_status: u16,

    /// Per-probe timeout (in seconds)
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Probe attempts before giving up
    #[serde(default = "default_probe_attempts")]
    pub probe_attempts: u32,

    /// Wait between probe attempts (in seconds)
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

impl RemediationConfig {
    pub fn new() -> Self {
        Self {
            settle_delay_secs: default_settle_delay_secs(),
            probe_path: default_probe_path(),
            healthy_status: default_healthy_status(),
            probe_timeout_secs: default_probe_timeout_secs(),
            probe_attempts: default_probe_attempts(),
            probe_interval_secs: default_probe_interval_secs(),
        }
    }

    /// Configuration with no waits, used to drive the machine in tests
    pub fn immediate() -> Self {
        Self {
            settle_delay_secs: 0,
            probe_interval_secs: 0,
            probe_timeout_secs: 1,
            ..Self::new()
        }
    }

    pub fn with_settle_delay_secs(mut self, secs: u64) -> Self {
        self.settle_delay_secs = secs;
        self
    }

    pub fn with_probe_attempts(mut self, attempts: u32) -> Self {
        self.probe_attempts = attempts;
        self
    }

    pub fn with_probe_path(mut self, path: impl Into<String>) -> Self {
        self.probe_path = path.into();
        self
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.settle_delay_secs > 600 {
            return Err(crate::Error::config("Settle delay must be <= 600 seconds"));
        }
        if !(1..=120).contains(&self.probe_timeout_secs) {
            return Err(crate::Error::config(
                "Probe timeout must be between 1 and 120 seconds",
            ));
        }
        if !(1..=10).contains(&self.probe_attempts) {
            return Err(crate::Error::config("Probe attempts must be between 1 and 10"));
        }
        if !self.probe_path.starts_with('/') {
            return Err(crate::Error::config("Probe path must start with '/'"));
        }
        if !(100..=599).contains(&self.healthy_status) {
            return Err(crate::Error::config("Healthy status must be a valid HTTP status"));
        }
        Ok(())
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_settle_delay_secs() -> u64 {
    30
}

fn default_probe_path() -> String {
    "/health".to_string()
}

fn default_healthy_status() -> u16 {
    200
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_probe_attempts() -> u32 {
    1
}

fn default_probe_interval_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        RemediationConfig::default().validate().unwrap();
        RemediationConfig::immediate().validate().unwrap();
        ClientConfig::default().validate().unwrap();
    }

    #[test]
    fn serde_fills_defaults() {
        let config: RemediationConfig = serde_json::from_str(r#"{"probe_attempts": 3}"#).unwrap();
        assert_eq!(config.probe_attempts, 3);
        assert_eq!(config.settle_delay(), Duration::from_secs(30));
        assert_eq!(config.probe_path, "/health");
        assert_eq!(config.healthy_status, 200);
    }

    #[test]
    fn out_of_range_values_rejected() {
        assert!(RemediationConfig::new().with_settle_delay_secs(601).validate().is_err());
        assert!(RemediationConfig::new().with_probe_attempts(0).validate().is_err());
        assert!(RemediationConfig::new().with_probe_path("health").validate().is_err());
        assert!(ClientConfig::new().with_api_base("ftp://x").validate().is_err());
    }
}
