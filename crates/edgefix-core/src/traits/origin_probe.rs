// # Origin Probe Trait
//
// Defines the direct health check used to tell edge-layer faults apart from
// origin faults. A probe bypasses the edge entirely: it talks to the origin
// address and names the site through the Host header.
//
// ## Implementations
//
// - Plain HTTP: `edgefix-probe-http` crate

use async_trait::async_trait;
use std::time::Duration;

/// One probe request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    /// Origin server address (IP or IP:port)
    pub origin: String,
    /// Virtual host sent in the Host header
    pub host: String,
    /// Health-check path, starting with `/`
    pub path: String,
    /// Upper bound for the whole round trip
    pub timeout: Duration,
}

impl ProbeRequest {
    pub fn new(
        origin: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            origin: origin.into(),
            host: host.into(),
            path: path.into(),
            timeout,
        }
    }

    /// Target URL of the probe
    pub fn url(&self) -> String {
        if self.path.starts_with('/') {
            format!("http://{}{}", self.origin, self.path)
        } else {
            format!("http://{}/{}", self.origin, self.path)
        }
    }
}

/// What the probe observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The origin answered with this status code
    Status(u16),
    /// No response (connect error, timeout, ...)
    Failed(String),
}

impl ProbeResult {
    pub fn is_healthy(&self, expected: u16) -> bool {
        matches!(self, ProbeResult::Status(code) if *code == expected)
    }

    /// Status code, `0` when no response was received
    pub fn code(&self) -> u16 {
        match self {
            ProbeResult::Status(code) => *code,
            ProbeResult::Failed(_) => 0,
        }
    }
}

impl std::fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeResult::Status(code) => write!(f, "HTTP {}", code),
            ProbeResult::Failed(reason) => write!(f, "HTTP 000 ({})", reason),
        }
    }
}

/// Trait for origin probes
///
/// Implementations issue exactly one request per call and never retry;
/// the remediation machine owns the polling policy.
#[async_trait]
pub trait OriginProbe: Send + Sync {
    async fn probe(&self, request: &ProbeRequest) -> ProbeResult;
}
