//! LLM Client Layer - chat-completion API integration
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - OpenAiClient implementation
//! - MockLlmClient for tests

pub mod client;
pub mod openai;
pub mod types;

pub use client::{LlmClient, MockLlmClient};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use types::{CompletionRequest, CompletionResponse, FinishReason, Message, Role, Usage};
