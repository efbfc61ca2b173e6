//! Stateless forwarding relay that injects the upstream API key server-side.

pub mod server;

use std::fmt;
use std::io::Read;

use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::transport::DEFAULT_ENDPOINT;

pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Attached to every relay response, including errors.
pub const CORS_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
    (
        "Access-Control-Allow-Headers",
        "Content-Type, Authorization, X-API-Key",
    ),
];

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Clone, PartialEq)]
pub struct RelayConfig {
    pub upstream_url: String,
    /// Name of the environment variable the key was read from, for diagnostics.
    pub api_key_env: String,
    pub api_key: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_ENDPOINT.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
        }
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("upstream_url", &self.upstream_url)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A request the relay sends upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Whatever the upstream answered, any status included.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

pub trait Upstream {
    /// Perform the outbound call. Only failures to get any response are errors.
    fn forward(
        &self,
        request: OutboundRequest,
    ) -> impl std::future::Future<Output = Result<UpstreamResponse>> + Send;
}

/// What the relay answers the inbound caller. CORS headers come from [`CORS_HEADERS`].
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

impl RelayResponse {
    fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    fn text(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some(TEXT_CONTENT_TYPE),
            body: message.into().into_bytes(),
        }
    }
}

pub struct Relay<U: Upstream> {
    config: RelayConfig,
    upstream: U,
}

impl<U: Upstream> Relay<U> {
    pub fn new(config: RelayConfig, upstream: U) -> Self {
        Self { config, upstream }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    /// Handle one inbound request. Never fails: every problem becomes a 5xx/4xx response.
    ///
    /// Inbound headers are not an input, so a caller-supplied credential can
    /// never reach the upstream.
    pub async fn handle(&self, method: &str, body: &[u8]) -> RelayResponse {
        match method {
            "OPTIONS" => return RelayResponse::empty(204),
            "POST" => {}
            other => {
                warn!(method = other, "rejecting non-POST request");
                return RelayResponse::text(405, "Method not allowed");
            }
        }

        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) else {
            error!(env = %self.config.api_key_env, "relay API key not configured");
            return RelayResponse::text(500, format!("Missing {}", self.config.api_key_env));
        };

        if let Err(e) = serde_json::from_slice::<serde::de::IgnoredAny>(body) {
            warn!(error = %e, "inbound body is not JSON");
            return RelayResponse::text(500, format!("Proxy error: {e}"));
        }

        let request = OutboundRequest {
            url: self.config.upstream_url.clone(),
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {api_key}")),
                ("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()),
            ],
            body: body.to_vec(),
        };

        match self.upstream.forward(request).await {
            Ok(response) => {
                info!(status = response.status, "forwarded request upstream");
                RelayResponse {
                    status: response.status,
                    content_type: Some(JSON_CONTENT_TYPE),
                    body: response.body,
                }
            }
            Err(e) => {
                warn!(error = %e, "upstream forwarding failed");
                RelayResponse::text(500, format!("Proxy error: {e}"))
            }
        }
    }
}

/// Forwards with a blocking `ureq` agent on the tokio blocking pool.
#[derive(Clone)]
pub struct UreqUpstream {
    agent: ureq::Agent,
}

impl Default for UreqUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqUpstream {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Upstream for UreqUpstream {
    async fn forward(&self, request: OutboundRequest) -> Result<UpstreamResponse> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || post_bytes(&agent, &request))
            .await
            .map_err(|e| Error::Network(format!("forwarding task failed: {e}")))?
    }
}

fn post_bytes(agent: &ureq::Agent, request: &OutboundRequest) -> Result<UpstreamResponse> {
    let mut call = agent.post(&request.url);
    for (name, value) in &request.headers {
        call = call.set(name, value);
    }

    let response = match call.send_bytes(&request.body) {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(e)) => return Err(Error::Network(e.to_string())),
    };

    let status = response.status();
    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|e| Error::Network(format!("failed to read upstream body: {e}")))?;
    Ok(UpstreamResponse { status, body })
}
