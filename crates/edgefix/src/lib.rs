// # edgefix - command-line entry points
//
// Thin integration layer shared by the five binaries:
//
// - `edgefix-settings`: apply the recommended zone profile and purge the cache
// - `edgefix-dns`: upsert the configured records as proxied A records
// - `edgefix-ssl`: report the current SSL mode and set it to Full
// - `edgefix-fix-521`: run the proxy-toggle remediation for one record
// - `edgefix-webhook`: register the Sentry event hook
//
// No reconciliation or remediation logic lives here; that is edgefix-core.
//
// ## Configuration
//
// Secrets and identifiers come from the credential store (`KEY=VALUE`
// file). Tunables come from the environment:
//
// - `EDGEFIX_CREDENTIALS_FILE`: credential store (default `.cloudflare/.env`)
// - `EDGEFIX_WEBHOOK_CREDENTIALS_FILE`: webhook store (default `.env-config/.env`)
// - `EDGEFIX_MODE`: `live` (default) or `dry-run`
// - `EDGEFIX_API_BASE`: control-plane base URL
// - `EDGEFIX_LOG_LEVEL`: trace, debug, info (default), warn, error
// - `EDGEFIX_SETTLE_DELAY_SECS`, `EDGEFIX_PROBE_TIMEOUT_SECS`,
//   `EDGEFIX_PROBE_ATTEMPTS`, `EDGEFIX_PROBE_INTERVAL_SECS`
//
// ## Example
//
// ```bash
// cat .cloudflare/.env
// CLOUDFLARE_API_TOKEN=...
// CLOUDFLARE_ZONE_ID=...
// SERVER_IP=203.0.113.10
// DNS_RECORDS=example.com,www.example.com
//
// EDGEFIX_MODE=dry-run edgefix-dns
// ```

use anyhow::Result;
use edgefix_core::config::{ClientConfig, DEFAULT_API_BASE, RemediationConfig};
use edgefix_core::credentials::{CredentialResolver, FileCredentialStore};
use edgefix_core::traits::Prompt;
use std::future::Future;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

/// Default credential store path
pub const DEFAULT_CREDENTIALS_FILE: &str = ".cloudflare/.env";

/// Default webhook credential store path
pub const DEFAULT_WEBHOOK_CREDENTIALS_FILE: &str = ".env-config/.env";

/// Exit codes
///
/// - 0: The run completed (individual items may still have failed)
/// - 1: Fatal precondition (configuration, missing credential, missing record)
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgefixExitCode {
    Completed = 0,
    PreconditionFailed = 1,
    RuntimeError = 2,
}

impl From<EdgefixExitCode> for ExitCode {
    fn from(code: EdgefixExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// An error that stops the run before it changes anything
#[derive(Debug)]
pub struct Precondition(pub String);

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Precondition {}

/// Wrap an error as a fatal precondition
pub fn precondition(err: impl std::fmt::Display) -> anyhow::Error {
    anyhow::Error::new(Precondition(err.to_string()))
}

/// Exit code for an error that ended a run
pub fn exit_code_for(err: &anyhow::Error) -> EdgefixExitCode {
    if err.downcast_ref::<Precondition>().is_some() {
        return EdgefixExitCode::PreconditionFailed;
    }

    match err.downcast_ref::<edgefix_core::Error>() {
        Some(e)
            if e.is_fatal_precondition()
                || matches!(
                    e,
                    edgefix_core::Error::InvalidInput(_) | edgefix_core::Error::NotFound(_)
                ) =>
        {
            EdgefixExitCode::PreconditionFailed
        }
        _ => EdgefixExitCode::RuntimeError,
    }
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub credentials_file: PathBuf,
    pub webhook_credentials_file: PathBuf,
    pub dry_run: bool,
    pub api_base: String,
    pub log_level: String,
    pub remediation: RemediationConfig,
}

impl RuntimeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let numeric = |key: &str, default: u64| -> Result<u64> {
            match get(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer. Got: {}", key, raw)),
                None => Ok(default),
            }
        };

        let mode = get("EDGEFIX_MODE").unwrap_or_else(|| "live".to_string());
        let dry_run = match mode.to_lowercase().as_str() {
            "live" => false,
            "dry-run" => true,
            _ => anyhow::bail!("EDGEFIX_MODE '{}' is not valid. Valid modes: live, dry-run", mode),
        };

        let defaults = RemediationConfig::default();
        let probe_attempts = numeric("EDGEFIX_PROBE_ATTEMPTS", defaults.probe_attempts as u64)?;
        let remediation = RemediationConfig {
            settle_delay_secs: numeric("EDGEFIX_SETTLE_DELAY_SECS", defaults.settle_delay_secs)?,
            probe_timeout_secs: numeric("EDGEFIX_PROBE_TIMEOUT_SECS", defaults.probe_timeout_secs)?,
            probe_attempts: u32::try_from(probe_attempts)
                .map_err(|_| anyhow::anyhow!("EDGEFIX_PROBE_ATTEMPTS is out of range"))?,
            probe_interval_secs: numeric("EDGEFIX_PROBE_INTERVAL_SECS", defaults.probe_interval_secs)?,
            ..defaults
        };

        Ok(Self {
            credentials_file: get("EDGEFIX_CREDENTIALS_FILE")
                .unwrap_or_else(|| DEFAULT_CREDENTIALS_FILE.to_string())
                .into(),
            webhook_credentials_file: get("EDGEFIX_WEBHOOK_CREDENTIALS_FILE")
                .unwrap_or_else(|| DEFAULT_WEBHOOK_CREDENTIALS_FILE.to_string())
                .into(),
            dry_run,
            api_base: get("EDGEFIX_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            log_level: get("EDGEFIX_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            remediation,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.client_config().validate().map_err(|e| {
            anyhow::anyhow!("EDGEFIX_API_BASE is not valid: {}", e)
        })?;

        let r = &self.remediation;
        if r.settle_delay_secs > 600 {
            anyhow::bail!(
                "EDGEFIX_SETTLE_DELAY_SECS must be between 0 and 600 seconds. Got: {}",
                r.settle_delay_secs
            );
        }
        if !(1..=120).contains(&r.probe_timeout_secs) {
            anyhow::bail!(
                "EDGEFIX_PROBE_TIMEOUT_SECS must be between 1 and 120 seconds. Got: {}",
                r.probe_timeout_secs
            );
        }
        if !(1..=10).contains(&r.probe_attempts) {
            anyhow::bail!(
                "EDGEFIX_PROBE_ATTEMPTS must be between 1 and 10. Got: {}",
                r.probe_attempts
            );
        }
        r.validate()?;

        self.level()?;
        Ok(())
    }

    /// Parsed log level
    pub fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "EDGEFIX_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_api_base(self.api_base.clone())
            .with_dry_run(self.dry_run)
    }

    /// Open the credential store
    pub async fn credential_resolver(&self, interactive: bool) -> Result<CredentialResolver> {
        let store = FileCredentialStore::open(&self.credentials_file).await?;
        let resolver = CredentialResolver::new(Arc::new(store));
        Ok(if interactive {
            resolver.with_prompt(Arc::new(StdinPrompt))
        } else {
            resolver
        })
    }

    /// Open the webhook credential store
    pub async fn webhook_resolver(&self) -> Result<CredentialResolver> {
        let store = FileCredentialStore::open(&self.webhook_credentials_file).await?;
        Ok(CredentialResolver::new(Arc::new(store)))
    }
}

/// Reads a line from standard input
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&self, label: &str) -> edgefix_core::Result<Option<String>> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{}: ", label)?;
        stderr.flush()?;

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }

        let line = line.trim();
        Ok((!line.is_empty()).then(|| line.to_string()))
    }
}

/// Load and validate configuration, set up tracing, run `entry` on a runtime
///
/// Every binary's `main` is a single call to this function.
pub fn run<F, Fut>(name: &str, entry: F) -> ExitCode
where
    F: FnOnce(RuntimeConfig) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let config = match RuntimeConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return EdgefixExitCode::PreconditionFailed.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return EdgefixExitCode::PreconditionFailed.into();
    }

    let level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return EdgefixExitCode::PreconditionFailed.into();
    }

    tracing::info!(
        "Starting {} [mode: {}]",
        name,
        if config.dry_run { "DRY-RUN" } else { "LIVE" }
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return EdgefixExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match entry(config).await {
            Ok(()) => EdgefixExitCode::Completed,
            Err(e) => {
                error!("{} failed: {:#}", name, e);
                exit_code_for(&e)
            }
        }
    });

    code.into()
}
