//! Diagnose a 521 on the origin record by toggling the proxy off and
//! probing the origin directly.

use edgefix::{RuntimeConfig, precondition};
use edgefix_core::credentials::keys;
use edgefix_core::{DnsReconciler, Outcome, RemediationCredentials, Remediator};
use edgefix_probe_http::HttpOriginProbe;
use edgefix_provider_cloudflare::CloudflareClient;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn};

fn main() -> ExitCode {
    edgefix::run("edgefix-fix-521", remediate)
}

async fn remediate(config: RuntimeConfig) -> anyhow::Result<()> {
    let resolver = config.credential_resolver(true).await?;
    let record_name = resolver.require(keys::ORIGIN_RECORD).await?;
    let creds = resolver.remediation_credentials().await?;

    let client = CloudflareClient::new(&config.client_config())?;
    let dns = DnsReconciler::new(Arc::new(client));

    if dns.is_dry_run() {
        return plan_only(&dns, &record_name, &creds, &config).await;
    }

    let probe = HttpOriginProbe::new()?;
    let remediator = Remediator::new(dns, Arc::new(probe), config.remediation.clone());

    let report = remediator
        .run(&record_name, &creds)
        .await
        .map_err(|e| precondition(format!("remediation for {} did not start: {}", record_name, e)))?;

    debug!("states: {:?}", report.states);
    for step in &report.steps {
        debug!("step: {:?}", step);
    }

    match &report.outcome {
        Outcome::ProxyRestored { .. } => {
            info!("{} is healthy and proxied again", record_name);
        }
        Outcome::ManualFixRequired { .. } | Outcome::PermissionFallback { .. } => {
            warn!(
                "{} needs manual attention (proxied: {})",
                record_name, report.final_proxied
            );
            for line in report.guidance() {
                warn!("  {}", line);
            }
        }
    }
    Ok(())
}

/// Dry run: look the record up and describe what a live run would do
async fn plan_only(
    dns: &DnsReconciler,
    record_name: &str,
    creds: &RemediationCredentials,
    config: &RuntimeConfig,
) -> anyhow::Result<()> {
    let ctx = creds
        .elevated()
        .or(creds.token())
        .ok_or_else(|| precondition("no credentials available"))?;

    let record = dns
        .lookup(record_name, ctx)
        .await
        .map_err(|e| precondition(format!("lookup of {} failed: {}", record_name, e)))?
        .ok_or_else(|| precondition(format!("DNS record {} not found", record_name)))?;

    info!(
        "[DRY-RUN] {} {} -> {} (proxied: {})",
        record.record_type, record.name, record.content, record.proxied
    );
    if creds.elevated().is_none() {
        info!("[DRY-RUN] No elevated credentials: a live run would stop at the permission fallback");
        return Ok(());
    }
    info!("[DRY-RUN] Would disable the proxy for {}", record_name);
    info!(
        "[DRY-RUN] Would probe http://{}{} with Host {} after {}s",
        ctx.origin(),
        config.remediation.probe_path,
        record_name,
        config.remediation.settle_delay_secs
    );
    info!("[DRY-RUN] Would re-enable the proxy if the origin answers {}", config.remediation.healthy_status);
    Ok(())
}
