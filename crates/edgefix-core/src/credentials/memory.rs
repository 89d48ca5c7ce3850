// # Memory Credential Store
//
// In-memory implementation of CredentialProvider. Nothing survives the
// process; persisted entries are kept in an append log so callers can see
// what would have been written.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::traits::CredentialProvider;

/// In-memory credential store
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    values: Arc<RwLock<HashMap<String, String>>>,
    persisted: Arc<RwLock<Vec<(String, String)>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without recording it as persisted
    pub fn with_value(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut values) = self.values.try_write() {
            values.insert(key.into(), value.into());
        }
        self
    }

    /// Entries written through `persist`, in order
    pub async fn persisted(&self) -> Vec<(String, String)> {
        self.persisted.read().await.clone()
    }
}

#[async_trait]
impl CredentialProvider for MemoryCredentialStore {
    async fn resolve(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .read()
            .await
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .cloned())
    }

    async fn persist(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        self.persisted
            .write()
            .await
            .push((key.to_string(), value.to_string()));
        Ok(())
    }
}
