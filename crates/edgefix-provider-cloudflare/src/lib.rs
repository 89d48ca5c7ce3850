// # Cloudflare Control-Plane Client
//
// ControlPlane implementation for the Cloudflare API v4.
//
// ## Behavior
//
// - One HTTP request per call, no retries, no caching
// - Every failure comes back as an `ApiResponse`, never as a panic or `Err`
// - HTTP timeout configured (30 seconds by default)
// - Dry-run mode: GET requests go out, writes are only logged
//
// ## Authentication
//
// - Token mode: `Authorization: Bearer <token>`
// - Global key mode: `X-Auth-Email` + `X-Auth-Key`
//
// Neither value ever appears in logs or Debug output.
//
// ## Response Envelope
//
// ```json
// { "success": false, "errors": [{ "code": 1003, "message": "Invalid or missing zone id." }], "result": null }
// ```
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Zone settings: PATCH `/zones/:zone_id/settings/:name`
// - DNS records: GET/POST `/zones/:zone_id/dns_records`, PUT `/zones/:zone_id/dns_records/:id`
// - Purge cache: POST `/zones/:zone_id/purge_cache`

use async_trait::async_trait;
use edgefix_core::config::ClientConfig;
use edgefix_core::context::{Auth, CredentialContext};
use edgefix_core::traits::{ApiMessage, ApiResponse, ControlPlane, Method};
use edgefix_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

/// Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

/// Cloudflare API v4 client
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the client:
/// - Performs GET requests normally
/// - Logs the intended write (method, URL, payload)
/// - Returns a successful response without a payload for writes
pub struct CloudflareClient {
    client: reqwest::Client,
    api_base: String,
    dry_run: bool,
}

impl std::fmt::Debug for CloudflareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareClient")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareClient {
    /// Build a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if config.dry_run {
            tracing::warn!("Cloudflare client running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            dry_run: config.dry_run,
        })
    }

    /// Live client against the public API
    pub fn live() -> Result<Self> {
        Self::new(&ClientConfig::default())
    }

    fn url(&self, ctx: &CredentialContext, endpoint: &str) -> String {
        format!(
            "{}/zones/{}/{}",
            self.api_base,
            ctx.zone_id(),
            endpoint.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, url: &str, ctx: &CredentialContext) -> reqwest::RequestBuilder {
        let builder = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Patch => self.client.patch(url),
            Method::Put => self.client.put(url),
        };

        let builder = match ctx.auth() {
            Auth::Token(token) => builder.bearer_auth(token),
            Auth::GlobalKey { email, key } => builder
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
        };

        builder.header("Content-Type", "application/json")
    }
}

/// Map a status code without a usable error list to a message
fn describe_status(status: u16, body: &str) -> String {
    match status {
        401 | 403 => format!(
            "Authentication failed: invalid credentials or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("Resource not found. Status: {}", status),
        409 => format!("Conflict: resource is being modified by another request. Status: {}", status),
        429 => format!("Rate limit exceeded. Please retry later. Status: {}", status),
        500..=599 => format!("Cloudflare server error (transient): {} - {}", status, body),
        _ => format!("Request failed: {} - {}", status, body),
    }
}

/// Turn a status and raw body into a normalized response
fn normalize(status: u16, body: &str) -> ApiResponse {
    let http_ok = (200..300).contains(&status);

    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) if envelope.success && http_ok => ApiResponse::ok(status, envelope.result),
        Ok(envelope) => {
            let errors = if envelope.errors.is_empty() {
                vec![ApiMessage::new(None, describe_status(status, body))]
            } else {
                envelope.errors
            };
            ApiResponse::rejected(status, errors)
        }
        Err(e) if http_ok => ApiResponse::transport_failure(format!("malformed response body: {}", e)),
        Err(_) => ApiResponse::rejected(
            status,
            vec![ApiMessage::new(None, describe_status(status, body.trim()))],
        ),
    }
}

#[async_trait]
impl ControlPlane for CloudflareClient {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        ctx: &CredentialContext,
        body: Option<&Value>,
    ) -> ApiResponse {
        let url = self.url(ctx, endpoint);

        if self.dry_run && method.is_write() {
            tracing::info!(
                "[DRY-RUN] Would send {} request to {} with payload: {}",
                method,
                url,
                body.map(ToString::to_string).unwrap_or_default()
            );
            return ApiResponse::ok(200, None);
        }

        tracing::debug!("{} {} [auth: {}]", method, url, ctx.auth().mode());

        let mut request = self.request(method, &url, ctx);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{} {} failed: {}", method, url, e);
                return ApiResponse::transport_failure(e);
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return ApiResponse::transport_failure(format!("failed to read body: {}", e)),
        };

        let normalized = normalize(status, &text);
        if !normalized.success {
            tracing::debug!(
                "{} {} -> {}: {:?}",
                method,
                url,
                status,
                normalized.error_messages()
            );
        }
        normalized
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
