//! Register the Sentry issue hook that feeds the webhook receiver.

use edgefix::RuntimeConfig;
use edgefix_core::credentials::keys;
use edgefix_webhook_sentry::{SentryHookRegistrar, manual_guidance};
use std::process::ExitCode;
use tracing::{info, warn};

fn main() -> ExitCode {
    edgefix::run("edgefix-webhook", register_hook)
}

async fn register_hook(config: RuntimeConfig) -> anyhow::Result<()> {
    let resolver = config.webhook_resolver().await?;
    let token = resolver.require(keys::SENTRY_AUTH_TOKEN).await?;
    let organization = resolver.optional(keys::SENTRY_ORG).await?;
    let webhook_url = resolver.require(keys::SENTRY_WEBHOOK_URL).await?;

    let registrar = SentryHookRegistrar::new(token)?;
    match registrar.register(organization.as_deref(), &webhook_url).await {
        Ok(hook) => info!(
            "Registered hook {} for {} via {}",
            hook.id.as_deref().unwrap_or("<unknown>"),
            hook.organization,
            hook.endpoint
        ),
        Err(e) => {
            warn!("Automatic registration failed: {}", e);
            for line in manual_guidance(&webhook_url) {
                warn!("  {}", line);
            }
        }
    }
    Ok(())
}
