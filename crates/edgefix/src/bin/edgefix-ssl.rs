//! Report the zone SSL mode and set it to Full.

use edgefix::RuntimeConfig;
use edgefix_core::{SettingDirective, SettingsEngine};
use edgefix_provider_cloudflare::CloudflareClient;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

const SSL_SETTING: &str = "ssl";
const SSL_MODE: &str = "full";

fn main() -> ExitCode {
    edgefix::run("edgefix-ssl", set_ssl_mode)
}

async fn set_ssl_mode(config: RuntimeConfig) -> anyhow::Result<()> {
    let resolver = config.credential_resolver(true).await?;
    let ctx = resolver.primary_context().await?;
    let client = CloudflareClient::new(&config.client_config())?;
    let engine = SettingsEngine::new(Arc::new(client));

    match engine.current_value(SSL_SETTING, &ctx).await {
        Ok(value) => info!("Current SSL mode: {}", value),
        Err(e) => warn!("Could not read current SSL mode: {}", e),
    }

    let directive = SettingDirective::new(SSL_SETTING, SSL_MODE).with_label("SSL mode: Full");
    let outcome = engine.apply(&directive, &ctx).await;
    match outcome.errors {
        None => info!("SSL mode set to {}", SSL_MODE),
        Some(errors) => warn!("Failed to set SSL mode: {}", errors.join("; ")),
    }
    Ok(())
}
