//! Test doubles for behavioral contract tests
//!
//! - `FakeControlPlane`: in-memory zone (records, settings) that records
//!   every call and can be told to reject or drop specific endpoints
//! - `ScriptedProbe`: returns queued probe results in order

#![allow(dead_code)]

use edgefix_core::context::CredentialContext;
use edgefix_core::dns::DnsRecord;
use edgefix_core::remediation::RemediationCredentials;
use edgefix_core::traits::{
    ApiMessage, ApiResponse, ControlPlane, Method, OriginProbe, ProbeRequest, ProbeResult,
};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

pub const ZONE: &str = "zone-0123";
pub const ORIGIN: &str = "203.0.113.10";

pub fn token_ctx() -> CredentialContext {
    CredentialContext::with_token("test-token", ZONE, ORIGIN).unwrap()
}

pub fn elevated_ctx() -> CredentialContext {
    CredentialContext::with_global_key("ops@example.com", "global-key", ZONE, ORIGIN).unwrap()
}

pub fn both_creds() -> RemediationCredentials {
    RemediationCredentials::new(Some(elevated_ctx()), Some(token_ctx())).unwrap()
}

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
    pub elevated: bool,
}

impl Call {
    pub fn is_write(&self) -> bool {
        self.method.is_write()
    }
}

#[derive(Default)]
struct ZoneState {
    records: Vec<DnsRecord>,
    settings: HashMap<String, Value>,
    next_id: usize,
    rejected: HashSet<String>,
    dropped: HashSet<String>,
    deny_token_writes: bool,
    deny_elevated_writes: bool,
    write_budget: Option<usize>,
    dry_run: bool,
    calls: Vec<Call>,
}

/// In-memory control plane
#[derive(Clone, Default)]
pub struct FakeControlPlane {
    state: Arc<Mutex<ZoneState>>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing record; returns its id
    pub fn with_record(self, record: DnsRecord) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = format!("rec-{}", state.next_id);
            state.records.push(record.with_id(id));
        }
        self
    }

    /// Answer calls to `endpoint` with a 400 rejection
    pub fn rejecting(self, endpoint: &str) -> Self {
        self.state.lock().unwrap().rejected.insert(endpoint.to_string());
        self
    }

    /// Answer calls to `endpoint` with a transport failure
    pub fn dropping(self, endpoint: &str) -> Self {
        self.state.lock().unwrap().dropped.insert(endpoint.to_string());
        self
    }

    pub fn denying_token_writes(self) -> Self {
        self.state.lock().unwrap().deny_token_writes = true;
        self
    }

    pub fn denying_elevated_writes(self) -> Self {
        self.state.lock().unwrap().deny_elevated_writes = true;
        self
    }

    /// Accept `n` writes, then reject every further write with a 403
    pub fn allowing_writes(self, n: usize) -> Self {
        self.state.lock().unwrap().write_budget = Some(n);
        self
    }

    /// Report dry-run mode to callers
    pub fn in_dry_run(self) -> Self {
        self.state.lock().unwrap().dry_run = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn records(&self) -> Vec<DnsRecord> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn record(&self, name: &str) -> Option<DnsRecord> {
        self.records().into_iter().find(|r| r.name == name)
    }

    pub fn setting(&self, key: &str) -> Option<Value> {
        self.state.lock().unwrap().settings.get(key).cloned()
    }

    pub fn set_setting(&self, key: &str, value: Value) {
        self.state
            .lock()
            .unwrap()
            .settings
            .insert(key.to_string(), value);
    }

    fn not_found(what: &str) -> ApiResponse {
        ApiResponse::rejected(404, vec![ApiMessage::new(Some(81044), format!("{} not found", what))])
    }
}

#[async_trait::async_trait]
impl ControlPlane for FakeControlPlane {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        ctx: &CredentialContext,
        body: Option<&Value>,
    ) -> ApiResponse {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            method,
            endpoint: endpoint.to_string(),
            body: body.cloned(),
            elevated: ctx.is_elevated(),
        });

        if state.dropped.contains(endpoint) {
            return ApiResponse::transport_failure("connection reset by peer");
        }
        if state.rejected.contains(endpoint) {
            return ApiResponse::rejected(
                400,
                vec![ApiMessage::new(Some(1007), format!("{} rejected", endpoint))],
            );
        }
        if method.is_write() {
            let denied = if ctx.is_elevated() {
                state.deny_elevated_writes
            } else {
                state.deny_token_writes
            };
            let exhausted = match state.write_budget.as_mut() {
                Some(0) => true,
                Some(left) => {
                    *left -= 1;
                    false
                }
                None => false,
            };
            if denied || exhausted {
                return ApiResponse::rejected(
                    403,
                    vec![ApiMessage::new(Some(10000), "Authentication error")],
                );
            }
        }

        let (path, query) = endpoint.split_once('?').unwrap_or((endpoint, ""));

        match (method, path) {
            (Method::Get, "dns_records") => {
                let name = query.strip_prefix("name=").unwrap_or_default();
                let matches: Vec<Value> = state
                    .records
                    .iter()
                    .filter(|r| r.name == name)
                    .map(|r| serde_json::to_value(r).unwrap())
                    .collect();
                ApiResponse::ok(200, Some(Value::Array(matches)))
            }
            (Method::Post, "dns_records") => {
                let mut record: DnsRecord = serde_json::from_value(body.cloned().unwrap()).unwrap();
                state.next_id += 1;
                record.id = Some(format!("rec-{}", state.next_id));
                state.records.push(record.clone());
                ApiResponse::ok(200, Some(serde_json::to_value(record).unwrap()))
            }
            (Method::Put, p) if p.starts_with("dns_records/") => {
                let id = p.trim_start_matches("dns_records/").to_string();
                let mut record: DnsRecord = serde_json::from_value(body.cloned().unwrap()).unwrap();
                record.id = Some(id.clone());
                match state.records.iter_mut().find(|r| r.id.as_deref() == Some(id.as_str())) {
                    Some(existing) => {
                        *existing = record.clone();
                        ApiResponse::ok(200, Some(serde_json::to_value(record).unwrap()))
                    }
                    None => Self::not_found("record"),
                }
            }
            (Method::Patch, p) if p.starts_with("settings/") => {
                let key = p.trim_start_matches("settings/").to_string();
                let value = body.and_then(|b| b.get("value")).cloned().unwrap_or(Value::Null);
                state.settings.insert(key.clone(), value.clone());
                ApiResponse::ok(200, Some(json!({ "id": key, "value": value })))
            }
            (Method::Get, p) if p.starts_with("settings/") => {
                let key = p.trim_start_matches("settings/");
                match state.settings.get(key) {
                    Some(value) => ApiResponse::ok(200, Some(json!({ "id": key, "value": value }))),
                    None => Self::not_found("setting"),
                }
            }
            (Method::Post, "purge_cache") => ApiResponse::ok(200, Some(json!({ "id": ZONE }))),
            _ => Self::not_found(endpoint),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn is_dry_run(&self) -> bool {
        self.state.lock().unwrap().dry_run
    }
}

/// Probe returning queued results; `Failed` once the queue is empty
#[derive(Clone, Default)]
pub struct ScriptedProbe {
    results: Arc<Mutex<VecDeque<ProbeResult>>>,
    requests: Arc<Mutex<Vec<ProbeRequest>>>,
}

impl ScriptedProbe {
    pub fn new(results: impl IntoIterator<Item = ProbeResult>) -> Self {
        Self {
            results: Arc::new(Mutex::new(results.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<ProbeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl OriginProbe for ScriptedProbe {
    async fn probe(&self, request: &ProbeRequest) -> ProbeResult {
        self.requests.lock().unwrap().push(request.clone());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ProbeResult::Failed("operation timed out".into()))
    }
}
