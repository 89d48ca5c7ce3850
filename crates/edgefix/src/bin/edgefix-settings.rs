//! Apply the recommended zone settings profile, then purge the cache.

use edgefix::RuntimeConfig;
use edgefix_core::engine::recommended_profile;
use edgefix_core::SettingsEngine;
use edgefix_provider_cloudflare::CloudflareClient;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

fn main() -> ExitCode {
    edgefix::run("edgefix-settings", apply_profile)
}

async fn apply_profile(config: RuntimeConfig) -> anyhow::Result<()> {
    let resolver = config.credential_resolver(true).await?;
    let ctx = resolver.primary_context().await?;
    let client = CloudflareClient::new(&config.client_config())?;
    let engine = SettingsEngine::new(Arc::new(client));

    let profile = recommended_profile();
    info!("Authenticating with {} credentials", ctx.auth().mode());

    let report = engine.reconcile(&profile, &ctx).await;

    for (directive, outcome) in profile.iter().zip(&report.outcomes) {
        match &outcome.errors {
            None => info!("  [ok]   {}", directive.display_name()),
            Some(errors) => warn!("  [fail] {}: {}", directive.display_name(), errors.join("; ")),
        }
    }

    match &report.purge.errors {
        None => info!("Cache purged"),
        Some(errors) => warn!("Cache purge failed: {}", errors.join("; ")),
    }

    info!(
        "Applied {}/{} settings in {} ms",
        report.applied_count(),
        report.outcomes.len(),
        (report.finished_at - report.started_at).num_milliseconds()
    );
    Ok(())
}
