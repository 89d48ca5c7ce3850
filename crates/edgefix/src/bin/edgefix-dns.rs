//! Point every configured record at the server address, proxied.

use edgefix::RuntimeConfig;
use edgefix_core::credentials::keys;
use edgefix_core::dns::AUTO_TTL;
use edgefix_core::{DnsReconciler, DnsRecord, UpsertResult};
use edgefix_provider_cloudflare::CloudflareClient;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

fn main() -> ExitCode {
    edgefix::run("edgefix-dns", sync_records)
}

async fn sync_records(config: RuntimeConfig) -> anyhow::Result<()> {
    let resolver = config.credential_resolver(true).await?;
    let ctx = resolver.primary_context().await?;
    let names = resolver.list(keys::DNS_RECORDS).await?;
    let client = CloudflareClient::new(&config.client_config())?;
    let dns = DnsReconciler::new(Arc::new(client));

    info!("Syncing {} records to {}", names.len(), ctx.origin());

    let mut succeeded = 0;
    for name in &names {
        let desired = DnsRecord::new(name.as_str(), "A", ctx.origin())
            .with_proxied(true)
            .with_ttl(AUTO_TTL);

        match dns.upsert(&desired, &ctx).await {
            Ok(UpsertResult::Created { .. }) => {
                info!("  [created] {}", name);
                succeeded += 1;
            }
            Ok(UpsertResult::Updated { previous, .. }) => {
                info!("  [updated] {} (was {})", name, previous.content);
                succeeded += 1;
            }
            Err(e) => warn!("  [failed]  {}: {}", name, e),
        }
    }

    info!("{}/{} records in sync", succeeded, names.len());
    Ok(())
}
