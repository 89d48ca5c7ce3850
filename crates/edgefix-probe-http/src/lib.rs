// # HTTP Origin Probe
//
// OriginProbe implementation that talks to the origin server directly.
//
// ## Purpose
//
// When the edge reports a 521 the question is whether the origin itself
// answers. The probe bypasses the edge: it connects to the origin address
// and names the site through the Host header, so virtual hosting on the
// origin still routes the request to the right application.
//
// ## Behavior
//
// - Plain HTTP GET, one request per call
// - Redirects are not followed; a 301 is reported as 301
// - Per-request timeout taken from the `ProbeRequest`
// - Any failure to get a status line is `ProbeResult::Failed`

use async_trait::async_trait;
use edgefix_core::traits::{OriginProbe, ProbeRequest, ProbeResult};
use edgefix_core::{Error, Result};

/// Direct HTTP probe against the origin
#[derive(Debug, Clone)]
pub struct HttpOriginProbe {
    client: reqwest::Client,
}

impl HttpOriginProbe {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

fn describe_failure(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "operation timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

#[async_trait]
impl OriginProbe for HttpOriginProbe {
    async fn probe(&self, request: &ProbeRequest) -> ProbeResult {
        let url = request.url();
        tracing::debug!("Probing {} (Host: {}, timeout: {:?})", url, request.host, request.timeout);

        let result = self
            .client
            .get(&url)
            .header(reqwest::header::HOST, request.host.as_str())
            .timeout(request.timeout)
            .send()
            .await;

        match result {
            Ok(response) => ProbeResult::Status(response.status().as_u16()),
            Err(e) => {
                let reason = describe_failure(&e);
                tracing::debug!("Probe of {} failed: {}", url, reason);
                ProbeResult::Failed(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn request_for(server: &mockito::Server, timeout: Duration) -> ProbeRequest {
        ProbeRequest::new(server.host_with_port(), "api.example.com", "/health", timeout)
    }

    #[tokio::test]
    async fn reports_status_and_sends_host_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .match_header("host", "api.example.com")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;
        let probe = HttpOriginProbe::new().unwrap();

        let result = probe.probe(&request_for(&server, Duration::from_secs(5))).await;
        assert_eq!(result, ProbeResult::Status(200));
        assert!(result.is_healthy(200));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_not_a_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;
        let probe = HttpOriginProbe::new().unwrap();

        let result = probe.probe(&request_for(&server, Duration::from_secs(5))).await;
        assert_eq!(result, ProbeResult::Status(502));
        assert!(!result.is_healthy(200));
    }

    #[tokio::test]
    async fn redirects_are_reported_not_followed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(301)
            .with_header("location", "https://api.example.com/health")
            .create_async()
            .await;
        let probe = HttpOriginProbe::new().unwrap();

        let result = probe.probe(&request_for(&server, Duration::from_secs(5))).await;
        assert_eq!(result, ProbeResult::Status(301));
    }

    #[tokio::test]
    async fn silent_origin_times_out() {
        // accepted by the kernel backlog but never answered
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let origin = listener.local_addr().unwrap().to_string();
        let probe = HttpOriginProbe::new().unwrap();
        let request = ProbeRequest::new(origin, "api.example.com", "/health", Duration::from_millis(300));

        let started = Instant::now();
        let result = probe.probe(&request).await;

        assert_eq!(result, ProbeResult::Failed("operation timed out".to_string()));
        assert_eq!(result.code(), 0);
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(listener);
    }

    #[tokio::test]
    async fn refused_connection_is_failed() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let probe = HttpOriginProbe::new().unwrap();
        let request = ProbeRequest::new(
            format!("127.0.0.1:{}", port),
            "api.example.com",
            "/health",
            Duration::from_secs(2),
        );

        assert!(matches!(probe.probe(&request).await, ProbeResult::Failed(_)));
    }
}
