//! OpenAI-compatible chat-completions client
//!
//! This module implements the LlmClient trait for any endpoint speaking the
//! `/chat/completions` protocol.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::LlmConfig;
use crate::error::{AdvisorError, Result};
use crate::llm::client::LlmClient;
use crate::llm::types::{CompletionRequest, CompletionResponse, FinishReason, Role, Usage};

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model to use
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default max tokens
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Configuration for the OpenAI client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.2,
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&LlmConfig> for OpenAiConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// OpenAI API client
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
    usage: Arc<Mutex<Usage>>,
}

impl OpenAiClient {
    /// Create a new client, reading the API key from `api_key_env`
    pub fn from_env(api_key_env: &str, config: OpenAiConfig) -> Result<Self> {
        let api_key = std::env::var(api_key_env)
            .map_err(|_| AdvisorError::LlmUnavailable(format!("{} not set", api_key_env)))?;

        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AdvisorError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
            usage: Arc::new(Mutex::new(Usage::default())),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Build the request body for the chat-completions API
    fn build_request(&self, request: &CompletionRequest) -> Value {
        let model = request.model.as_ref().unwrap_or(&self.config.model).clone();
        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);
        let temperature = request.temperature.unwrap_or(self.config.temperature);

        let mut messages: Vec<Value> = Vec::with_capacity(request.messages.len() + 1);

        if !request.system.is_empty() {
            messages.push(json!({ "role": "system", "content": request.system }));
        }

        messages.extend(request.messages.iter().map(|m| {
            json!({
                "role": match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                "content": m.content
            })
        }));

        json!({
            "model": model,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "messages": messages
        })
    }

    /// Parse the API response into a CompletionResponse
    fn parse_response(&self, body: Value) -> Result<CompletionResponse> {
        let choice = body["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .ok_or_else(|| AdvisorError::Llm("Response contained no choices".to_string()))?;

        let content = choice["message"]["content"].as_str().unwrap_or_default().trim().to_string();
        let finish_reason = FinishReason::from_api(choice["finish_reason"].as_str());

        let usage = body
            .get("usage")
            .map(|u| {
                Usage::new(
                    u["prompt_tokens"].as_u64().unwrap_or(0),
                    u["completion_tokens"].as_u64().unwrap_or(0),
                )
            })
            .unwrap_or_default();

        if let Ok(mut total) = self.usage.lock() {
            total.add(&usage);
        }

        if finish_reason.is_truncated() {
            warn!("LLM reply truncated at {} tokens", self.config.max_tokens);
        }

        Ok(CompletionResponse {
            content,
            finish_reason,
            usage,
        })
    }

    /// Send a request to the API
    async fn send_request(&self, body: Value) -> Result<Value> {
        debug!("POST {} model={}", self.endpoint(), body["model"]);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdvisorError::Llm(format!("Request failed: {}", e)))?;

        let status = response.status();

        // Handle rate limiting
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(AdvisorError::Llm(format!(
                "Rate limited, retry after {} seconds",
                retry_after
            )));
        }

        // Handle other errors
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AdvisorError::Llm(format!("API error {}: {}", status, error_body)));
        }

        response
            .json()
            .await
            .map_err(|e| AdvisorError::Llm(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(&request);
        let response = self.send_request(body).await?;
        self.parse_response(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn is_ready(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn total_usage(&self) -> Usage {
        self.usage.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}
