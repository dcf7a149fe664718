//! Network access for cache population and cache misses
//!
//! The cache manager only sees the `Network` trait. `HttpNetwork` is the
//! real implementation, backed by a blocking `ureq` agent that runs on the
//! tokio blocking pool.

use crate::error::{PrecacheError, PrecacheResult};
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use ureq::ResponseExt;

/// Abstract network interface
///
/// HTTP error statuses are responses, not errors. Only transport failures
/// (DNS, connection, TLS, timeout) are reported as `Err`.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform a request and return the response
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response>;

    /// Human-readable network name for display
    fn name(&self) -> &'static str;
}

/// HTTP network backed by `ureq`
#[derive(Clone)]
pub struct HttpNetwork {
    agent: ureq::Agent,
}

impl HttpNetwork {
    /// Create an HTTP network with a global per-request timeout
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .user_agent(user_agent)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn fetch_blocking(agent: &ureq::Agent, request: &Request) -> PrecacheResult<Response> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let http_request = builder.body(()).map_err(|e| PrecacheError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        let mut http_response = agent
            .run(http_request)
            .map_err(|e| PrecacheError::network(&request.url, e))?;

        // Differs from the request URL when redirects were followed
        let final_url = http_response.get_uri().to_string();
        let status = http_response.status();
        let headers = http_response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = http_response
            .body_mut()
            .read_to_vec()
            .map_err(|e| PrecacheError::network(&request.url, e))?;

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            url: final_url,
        })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response> {
        debug!("{} {}", request.method, request.url);

        let agent = self.agent.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &request))
            .await
            .map_err(|e| PrecacheError::Internal(format!("network task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
