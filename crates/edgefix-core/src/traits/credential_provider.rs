// # Credential Provider Trait
//
// Defines the interface to the credential store collaborator.
//
// The store is line-oriented `KEY=VALUE` text and append-only: values are
// never rewritten in place, a newer line simply shadows an older one.
//
// ## Implementations
//
// - File-backed: `FileCredentialStore`
// - In-memory (tests, embedding): `MemoryCredentialStore`

use async_trait::async_trait;

use crate::error::Result;

/// Trait for credential store implementations
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Look up a value; `Ok(None)` when the key is absent
    async fn resolve(&self, key: &str) -> Result<Option<String>>;

    /// Append a value to the store
    async fn persist(&self, key: &str, value: &str) -> Result<()>;
}

/// Interactive source for values the store does not hold yet
pub trait Prompt: Send + Sync {
    /// Ask the operator for `label`; `Ok(None)` when nothing was entered
    fn ask(&self, label: &str) -> Result<Option<String>>;
}
