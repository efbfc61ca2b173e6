use std::fmt;
use std::io::Read;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::prompts::SYSTEM_INSTRUCTION;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// How the client authenticates against its endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Talking to the model API itself; the client attaches its key.
    #[default]
    Direct,
    /// Talking to a relay that injects its own key.
    Relay,
}

impl AuthMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "direct" => Some(AuthMode::Direct),
            "relay" => Some(AuthMode::Relay),
            _ => None,
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Direct => write!(f, "direct"),
            AuthMode::Relay => write!(f, "relay"),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct TransportConfig {
    pub endpoint_url: String,
    pub auth_mode: AuthMode,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT.to_string(),
            auth_mode: AuthMode::Direct,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("auth_mode", &self.auth_mode)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Outbound chat-completion body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(config: &TransportConfig, prompt: &str) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Headers beyond `Content-Type` for a request under `config`.
/// Only direct mode with a key attaches credentials.
pub fn auth_headers(config: &TransportConfig) -> Vec<(&'static str, String)> {
    match (config.auth_mode, config.api_key.as_deref()) {
        (AuthMode::Direct, Some(key)) => vec![
            ("Authorization", format!("Bearer {key}")),
            ("X-API-Key", key.to_string()),
        ],
        _ => vec![],
    }
}

pub trait Transport {
    /// Send one prompt and return the raw response body.
    fn send(&self, prompt: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Transport over HTTP(S) to the configured endpoint.
pub struct HttpTransport {
    config: TransportConfig,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    async fn send(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest::new(&self.config, prompt);
        let headers = auth_headers(&self.config);
        let agent = self.agent.clone();
        let url = self.config.endpoint_url.clone();

        info!(
            endpoint = %url,
            auth_mode = %self.config.auth_mode,
            model = %self.config.model,
            "sending generation request"
        );

        let result = tokio::task::spawn_blocking(move || post_json(&agent, &url, &headers, &body))
            .await
            .map_err(|e| Error::Network(format!("request task failed: {e}")))?;

        if let Err(ref e) = result {
            warn!(error = %e, "generation request failed");
        }
        result
    }
}

fn post_json(
    agent: &ureq::Agent,
    url: &str,
    headers: &[(&'static str, String)],
    body: &ChatRequest,
) -> Result<String> {
    let mut request = agent.post(url).set("Content-Type", "application/json");
    for (name, value) in headers {
        request = request.set(name, value);
    }

    match request.send_json(body) {
        Ok(response) => read_body(response)
            .map_err(|e| Error::Network(format!("failed to read response body: {e}"))),
        Err(ureq::Error::Status(status, response)) => Err(Error::Transport {
            status,
            body: read_body(response)
                .unwrap_or_else(|e| format!("<failed to read error body: {e}>")),
        }),
        Err(ureq::Error::Transport(e)) => Err(Error::Network(e.to_string())),
    }
}

/// Whole body as text, with no size cap. Invalid UTF-8 is replaced, not rejected.
fn read_body(response: ureq::Response) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    response.into_reader().read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
