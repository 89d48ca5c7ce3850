//! DNS record reconciliation
//!
//! Records are keyed by name within a zone. The first record the control
//! plane returns for a name is canonical; any duplicates are ignored.
//! Updates are full replacements of type, content, ttl and proxied state.
//! Last write wins, there is no locking.

pub mod name;

pub use name::validate_record_name;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

use crate::context::CredentialContext;
use crate::error::{Error, Result};
use crate::traits::{ControlPlane, Method};

/// TTL value meaning "automatic"
pub const AUTO_TTL: u32 = 1;

/// A DNS record as the control plane describes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Identifier, absent until the record exists remotely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    /// Record type, e.g. `A`, `AAAA`, `CNAME`
    #[serde(rename = "type")]
    pub record_type: String,

    pub content: String,

    #[serde(default)]
    pub proxied: bool,

    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

fn default_ttl() -> u32 {
    AUTO_TTL
}

impl DnsRecord {
    /// Desired record with automatic TTL, not proxied
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            record_type: record_type.into(),
            content: content.into(),
            proxied: false,
            ttl: AUTO_TTL,
        }
    }

    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Request body for create and full-replace update
    pub fn body(&self) -> Value {
        json!({
            "type": self.record_type,
            "name": self.name,
            "content": self.content,
            "ttl": self.ttl,
            "proxied": self.proxied,
        })
    }
}

/// What an upsert did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertResult {
    Created { record: DnsRecord },
    Updated { previous: DnsRecord, record: DnsRecord },
}

impl UpsertResult {
    pub fn record(&self) -> &DnsRecord {
        match self {
            UpsertResult::Created { record } | UpsertResult::Updated { record, .. } => record,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, UpsertResult::Created { .. })
    }
}

/// Creates, updates and looks up DNS records
pub struct DnsReconciler {
    client: Arc<dyn ControlPlane>,
}

impl DnsReconciler {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }

    /// Whether writes through this reconciler only reach the log
    pub fn is_dry_run(&self) -> bool {
        self.client.is_dry_run()
    }

    /// First record with exactly this name
    ///
    /// `Ok(None)` when the zone has no such record. Transport failures and
    /// rejections are errors, never `None`.
    pub async fn lookup(&self, name: &str, ctx: &CredentialContext) -> Result<Option<DnsRecord>> {
        validate_record_name(name)?;

        let endpoint = format!("dns_records?name={}", name);
        let payload = self
            .client
            .call(Method::Get, &endpoint, ctx, None)
            .await
            .into_result()?;

        let first = match payload {
            Some(Value::Array(mut records)) if !records.is_empty() => records.swap_remove(0),
            Some(Value::Array(_)) | None | Some(Value::Null) => {
                debug!("No DNS record named {}", name);
                return Ok(None);
            }
            Some(other) => {
                return Err(Error::transport(format!(
                    "unexpected record listing shape: {}",
                    other
                )));
            }
        };

        let record: DnsRecord = serde_json::from_value(first)?;
        if !record.name.eq_ignore_ascii_case(name) {
            return Err(Error::transport(format!(
                "lookup for {} returned record {}",
                name, record.name
            )));
        }

        debug!(
            "Found {} record {} -> {} (proxied: {})",
            record.record_type, record.name, record.content, record.proxied
        );
        Ok(Some(record))
    }

    /// Create the record, or replace the first existing record with that name
    pub async fn upsert(&self, desired: &DnsRecord, ctx: &CredentialContext) -> Result<UpsertResult> {
        match self.lookup(&desired.name, ctx).await? {
            Some(previous) => {
                let id = previous
                    .id
                    .clone()
                    .ok_or_else(|| Error::transport(format!("record {} has no identifier", previous.name)))?;
                let record = self.update(&desired.clone().with_id(id), ctx).await?;
                info!("Updated {} {} -> {}", record.record_type, record.name, record.content);
                Ok(UpsertResult::Updated { previous, record })
            }
            None => {
                let record = self.create(desired, ctx).await?;
                info!("Created {} {} -> {}", record.record_type, record.name, record.content);
                Ok(UpsertResult::Created { record })
            }
        }
    }

    /// Create a new record
    pub async fn create(&self, desired: &DnsRecord, ctx: &CredentialContext) -> Result<DnsRecord> {
        validate_record_name(&desired.name)?;

        let payload = self
            .client
            .call(Method::Post, "dns_records", ctx, Some(&desired.body()))
            .await
            .into_result()?;

        Self::record_from_payload(payload, desired)
    }

    /// Full replace of an existing record by identifier
    pub async fn update(&self, record: &DnsRecord, ctx: &CredentialContext) -> Result<DnsRecord> {
        let id = record
            .id
            .as_deref()
            .ok_or_else(|| Error::invalid_input(format!("record {} has no identifier", record.name)))?;

        let endpoint = format!("dns_records/{}", id);
        let payload = self
            .client
            .call(Method::Put, &endpoint, ctx, Some(&record.body()))
            .await
            .into_result()?;

        Self::record_from_payload(payload, record)
    }

    /// A successful write without a body (dry-run) echoes the request
    fn record_from_payload(payload: Option<Value>, sent: &DnsRecord) -> Result<DnsRecord> {
        match payload {
            Some(value) if value.is_object() => Ok(serde_json::from_value(value)?),
            _ => Ok(sent.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_deserializes_provider_shape() {
        let record: DnsRecord = serde_json::from_value(json!({
            "id": "372e67954025e0ba6aaa6d586b9e0b59",
            "name": "api.example.com",
            "type": "A",
            "content": "203.0.113.10",
            "proxied": true,
            "ttl": 1,
            "zone_id": "ignored",
        }))
        .unwrap();
        assert_eq!(record.id.as_deref(), Some("372e67954025e0ba6aaa6d586b9e0b59"));
        assert_eq!(record.record_type, "A");
        assert!(record.proxied);
    }

    #[test]
    fn body_carries_full_replacement() {
        let body = DnsRecord::new("api.example.com", "A", "203.0.113.10")
            .with_proxied(true)
            .with_id("abc")
            .body();
        assert_eq!(body["type"], "A");
        assert_eq!(body["ttl"], 1);
        assert_eq!(body["proxied"], true);
        assert!(body.get("id").is_none());
    }
}
