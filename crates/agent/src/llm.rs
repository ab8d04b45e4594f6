use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use opsforce_core::config::{LlmConfig, LlmProvider};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion endpoint returned status {status}")]
    Status { status: u16 },
    #[error("completion endpoint returned no usable content")]
    EmptyCompletion,
    #[error("completion response could not be decoded: {0}")]
    MalformedResponse(String),
}

/// One stateless text-in/text-out call against the completion service.
/// Everything upstream of this trait treats the service as opaque.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError>;
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Deserialize)]
struct WireChoiceMessage {
    content: Option<String>,
}

/// Chat-completions HTTP adapter. All supported providers speak the same
/// `POST {base}/chat/completions` contract; the per-call timeout lives on
/// the underlying client so a hung upstream cannot stall a reaction batch.
pub struct HttpCompletionGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpCompletionGateway {
    pub fn from_config(config: &LlmConfig) -> Result<Self, GatewayError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(config.provider).to_string());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: config.api_key.as_ref().map(|key| key.expose_secret().to_owned()),
            model: config.model.clone(),
        })
    }
}

fn default_base_url(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => "https://api.openai.com/v1",
        LlmProvider::Anthropic => "https://api.anthropic.com/v1",
        LlmProvider::Ollama => "http://localhost:11434/v1",
    }
}

#[async_trait]
impl CompletionGateway for HttpCompletionGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError> {
        let body = WireRequest {
            model: &self.model,
            messages: vec![
                WireMessage { role: "system", content: &request.system },
                WireMessage { role: "user", content: &request.user },
            ],
            max_tokens: request.max_tokens,
        };

        let mut http_request = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status { status: status.as_u16() });
        }

        let decoded: WireResponse = response
            .json()
            .await
            .map_err(|error| GatewayError::MalformedResponse(error.to_string()))?;

        let content = decoded
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(GatewayError::EmptyCompletion);
        }

        Ok(content)
    }
}
