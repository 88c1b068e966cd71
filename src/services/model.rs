//! Hosted language model client used by the conversation endpoint

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ModelConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model endpoint misconfigured: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Empty response from model")]
    EmptyResponse,
}

/// Single-turn chat with a hosted model
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn converse(&self, model_id: &str, message: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Messages-API client over reqwest
pub struct AnthropicClient {
    client: reqwest::Client,
    url: url::Url,
    api_key: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let base = url::Url::parse(&config.endpoint)
            .map_err(|e| ModelError::Config(format!("{}: {}", config.endpoint, e)))?;
        let url = base
            .join("v1/messages")
            .map_err(|e| ModelError::Config(e.to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            url,
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn url(&self) -> &url::Url {
        &self.url
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn converse(&self, model_id: &str, message: &str) -> Result<String, ModelError> {
        debug!("Calling model {} at {}", model_id, self.url);

        let request = MessagesRequest {
            model: model_id,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: message,
            }],
        };

        let response = self
            .client
            .post(self.url.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        let parsed: MessagesResponse = response.json().await?;
        first_text(parsed)
    }
}

fn first_text(response: MessagesResponse) -> Result<String, ModelError> {
    response
        .content
        .into_iter()
        .find_map(|block| block.text)
        .ok_or(ModelError::EmptyResponse)
}
