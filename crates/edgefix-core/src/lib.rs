// # edgefix-core
//
// Core library for edge control-plane automation.
//
// ## Architecture Overview
//
// - **ControlPlane**: Trait for authenticated zone API calls
// - **OriginProbe**: Trait for direct origin health checks
// - **CredentialProvider**: Trait for the append-only credential store
// - **SettingsEngine**: Applies a settings profile, one outcome per directive
// - **DnsReconciler**: Record lookup and upsert keyed by name
// - **Remediator**: 521 proxy-toggle state machine
//
// ## Design Principles
//
// 1. **Core-first**: Reconciliation and remediation logic never touch HTTP directly
// 2. **Continue past failure**: Batches accumulate outcomes instead of aborting
// 3. **Sequential**: One request in flight at a time, no background tasks

pub mod config;
pub mod context;
pub mod credentials;
pub mod dns;
pub mod engine;
pub mod error;
pub mod remediation;
pub mod traits;

// Re-export core types for convenience
pub use config::{ClientConfig, RemediationConfig};
pub use context::{Auth, CredentialContext};
pub use credentials::{CredentialResolver, FileCredentialStore, MemoryCredentialStore};
pub use dns::{DnsReconciler, DnsRecord, UpsertResult};
pub use engine::{ReconcileReport, SettingDirective, SettingOutcome, SettingsEngine};
pub use error::{Error, Result};
pub use remediation::{Outcome, RemediationCredentials, RemediationReport, Remediator};
pub use traits::{ApiResponse, ControlPlane, CredentialProvider, Method, OriginProbe, Prompt};
