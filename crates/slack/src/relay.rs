use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use opsforce_core::config::RelayConfig;

use crate::blocks::MessageTemplate;

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("relay is not configured")]
    NotConfigured,
    #[error("relay send failed: {0}")]
    Send(String),
}

/// Single best-effort broadcast to the operator channel. One message per
/// call, no fan-out: the per-recipient inbox lives in the conversation log.
#[async_trait]
pub trait OperatorRelay: Send + Sync {
    async fn broadcast(&self, message: MessageTemplate) -> Result<(), RelayError>;
}

/// Stands in when no relay is configured; drops everything silently.
#[derive(Default)]
pub struct NoopRelay;

#[async_trait]
impl OperatorRelay for NoopRelay {
    async fn broadcast(&self, message: MessageTemplate) -> Result<(), RelayError> {
        debug!(
            event_name = "relay.noop.dropped",
            fallback_text = %message.fallback_text,
            "relay disabled; dropping broadcast"
        );
        Ok(())
    }
}

/// Posts to the configured operator channel via `chat.postMessage`.
pub struct HttpSlackRelay {
    client: reqwest::Client,
    bot_token: String,
    channel: String,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

impl HttpSlackRelay {
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        if !config.enabled {
            return Err(RelayError::NotConfigured);
        }
        let bot_token = config
            .bot_token
            .as_ref()
            .map(|token| token.expose_secret().to_owned())
            .filter(|token| !token.is_empty())
            .ok_or(RelayError::NotConfigured)?;
        let channel = config
            .channel
            .clone()
            .filter(|channel| !channel.trim().is_empty())
            .ok_or(RelayError::NotConfigured)?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|error| RelayError::Send(error.to_string()))?;

        Ok(Self { client, bot_token, channel })
    }
}

#[async_trait]
impl OperatorRelay for HttpSlackRelay {
    async fn broadcast(&self, message: MessageTemplate) -> Result<(), RelayError> {
        let body = serde_json::json!({
            "channel": self.channel,
            "text": message.fallback_text,
            "blocks": message.blocks,
        });

        let response = self
            .client
            .post(POST_MESSAGE_URL)
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|error| RelayError::Send(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Send(format!("http status {status}")));
        }

        let decoded: PostMessageResponse =
            response.json().await.map_err(|error| RelayError::Send(error.to_string()))?;
        if !decoded.ok {
            return Err(RelayError::Send(
                decoded.error.unwrap_or_else(|| "unknown slack error".to_string()),
            ));
        }

        Ok(())
    }
}

/// Test transport capturing every broadcast, optionally scripted to fail.
#[derive(Default)]
pub struct InMemoryRelay {
    sent: Mutex<Vec<MessageTemplate>>,
    fail_sends: Mutex<bool>,
}

impl InMemoryRelay {
    pub async fn sent(&self) -> Vec<MessageTemplate> {
        self.sent.lock().await.clone()
    }

    pub async fn fail_sends(&self, fail: bool) {
        *self.fail_sends.lock().await = fail;
    }
}

#[async_trait]
impl OperatorRelay for InMemoryRelay {
    async fn broadcast(&self, message: MessageTemplate) -> Result<(), RelayError> {
        if *self.fail_sends.lock().await {
            return Err(RelayError::Send("scripted failure".to_string()));
        }
        self.sent.lock().await.push(message);
        Ok(())
    }
}
