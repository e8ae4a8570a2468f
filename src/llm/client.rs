//! LLM client trait and a scripted mock

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AdvisorError, Result};
use crate::llm::types::{CompletionRequest, CompletionResponse, Usage};

/// Stateless LLM client - each call is independent
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Model name used for requests
    fn model(&self) -> &str;

    /// Whether the client has what it needs to make calls
    fn is_ready(&self) -> bool;

    /// Tokens used by every successful call so far
    fn total_usage(&self) -> Usage;
}

/// Mock client for tests: replays queued replies and records requests.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<Result<CompletionResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    usage: Mutex<Usage>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock with a single queued reply.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.push_reply(reply);
        mock
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.push_response(CompletionResponse::text(reply));
    }

    pub fn push_response(&self, response: CompletionResponse) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Ok(response));
        }
    }

    pub fn push_error(&self, error: AdvisorError) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(error));
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let response = self
            .replies
            .lock()
            .map_err(|_| AdvisorError::Llm("mock poisoned".to_string()))?
            .pop_front()
            .unwrap_or_else(|| Err(AdvisorError::Llm("no scripted reply".to_string())))?;
        if let Ok(mut usage) = self.usage.lock() {
            usage.add(&response.usage);
        }
        Ok(response)
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn total_usage(&self) -> Usage {
        self.usage.lock().map(|u| u.clone()).unwrap_or_default()
    }
}
