// # File Credential Store
//
// Line-oriented `KEY=VALUE` store backed by a dotenv-style file.
//
// ## File Format
//
// ```text
// # Cloudflare credentials
// CLOUDFLARE_API_TOKEN=abc123
// CLOUDFLARE_ZONE_ID=0123456789abcdef
// SERVER_IP=203.0.113.10
// ```
//
// - Blank lines and lines starting with `#` are ignored
// - The first `=` splits key from value; both sides are trimmed
// - A later line for the same key overrides an earlier one
// - Process environment variables with the same name win over the file
//
// ## Persistence
//
// `persist` appends a new line and never rewrites existing content.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::traits::CredentialProvider;

/// File-backed credential store
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    values: Arc<RwLock<HashMap<String, String>>>,
    env_overrides: bool,
}

impl FileCredentialStore {
    /// Open an existing store
    ///
    /// A missing file is a configuration error: the operator has to create it
    /// with at least the zone identifier and origin address.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::config(format!(
                    "Credential file not found: {}",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(Error::credential_store(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let values = parse_lines(&content);
        tracing::debug!(
            "Loaded credential store {}: {} keys",
            path.display(),
            values.len()
        );

        Ok(Self {
            path,
            values: Arc::new(RwLock::new(values)),
            env_overrides: true,
        })
    }

    /// Ignore process environment variables and answer from the file only
    pub fn without_env(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse `KEY=VALUE` lines; later keys override earlier ones
pub fn parse_lines(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        values.insert(key.to_string(), value.trim().to_string());
    }

    values
}

#[async_trait]
impl CredentialProvider for FileCredentialStore {
    async fn resolve(&self, key: &str) -> Result<Option<String>> {
        if self.env_overrides {
            if let Ok(value) = std::env::var(key) {
                if !value.trim().is_empty() {
                    return Ok(Some(value.trim().to_string()));
                }
            }
        }

        let values = self.values.read().await;
        Ok(values.get(key).filter(|v| !v.is_empty()).cloned())
    }

    async fn persist(&self, key: &str, value: &str) -> Result<()> {
        if key.contains('=') || key.contains('\n') || value.contains('\n') {
            return Err(Error::invalid_input(format!(
                "Refusing to persist malformed entry for {}",
                key
            )));
        }

        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                Error::credential_store(format!(
                    "Failed to open {} for append: {}",
                    self.path.display(),
                    e
                ))
            })?;

        file.write_all(format!("\n{}={}\n", key, value).as_bytes())
            .await
            .map_err(|e| Error::credential_store(format!("Failed to append {}: {}", key, e)))?;
        file.flush().await?;

        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());

        tracing::info!("Saved {} to {}", key, self.path.display());
        Ok(())
    }
}
