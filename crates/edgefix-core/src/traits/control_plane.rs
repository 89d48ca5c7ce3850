// # Control-Plane Trait
//
// Defines the single request/response capability every component builds on.
//
// ## Implementations
//
// - Cloudflare API v4: `edgefix-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use edgefix_core::traits::{ControlPlane, Method};
//
// let response = client
//     .call(Method::Patch, "settings/ssl", &ctx, Some(&json!({ "value": "full" })))
//     .await;
//
// if !response.success {
//     tracing::warn!("ssl rejected: {:?}", response.error_messages());
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::CredentialContext;
use crate::error::{Error, Result};

/// HTTP method accepted by the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
        }
    }

    /// Whether the method mutates remote state
    pub fn is_write(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a response's error list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Provider error code, absent for synthesized entries
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

impl ApiMessage {
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Normalized result of one control-plane call
///
/// `status` is `None` when the request never produced a parseable
/// response; such responses always carry exactly one synthesized error.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub success: bool,
    pub status: Option<u16>,
    pub payload: Option<Value>,
    pub errors: Vec<ApiMessage>,
}

impl ApiResponse {
    /// Successful response
    pub fn ok(status: u16, payload: Option<Value>) -> Self {
        Self {
            success: true,
            status: Some(status),
            payload,
            errors: Vec::new(),
        }
    }

    /// Response the API answered but reported as failed
    pub fn rejected(status: u16, errors: Vec<ApiMessage>) -> Self {
        Self {
            success: false,
            status: Some(status),
            payload: None,
            errors,
        }
    }

    /// Synthesized failure for network errors, timeouts and malformed bodies
    pub fn transport_failure(detail: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            status: None,
            payload: None,
            errors: vec![ApiMessage::new(None, format!("transport failure: {}", detail))],
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        !self.success && self.status.is_none()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Convert into a `Result`, keeping transport failures and rejections apart
    pub fn into_result(self) -> Result<Option<Value>> {
        if self.success {
            return Ok(self.payload);
        }

        let messages = self.error_messages();
        match self.status {
            None => Err(Error::transport(messages.join("; "))),
            Some(status) => Err(Error::rejected(Some(status), messages)),
        }
    }
}

/// Trait for control-plane clients
///
/// # Contract
///
/// - `call` never fails: transport faults come back as
///   [`ApiResponse::transport_failure`], API-level failures as
///   [`ApiResponse::rejected`]
/// - No retries. Retry and wait policy belongs to the remediation machine
/// - No local state is mutated by a call
///
/// `endpoint` is relative to the zone resource, e.g. `settings/ssl`,
/// `dns_records?name=api.example.com` or `purge_cache`.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Issue one authenticated request against the zone
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        ctx: &CredentialContext,
        body: Option<&Value>,
    ) -> ApiResponse;

    /// Provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;

    /// Whether writes are only logged, never sent
    fn is_dry_run(&self) -> bool {
        false
    }
}
