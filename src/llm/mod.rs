//! LLM Client Layer - the generation capability behind the code generator
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - AnthropicClient implementation
//! - MockLlmClient for scripted tests

pub mod anthropic;
pub mod client;
pub mod types;

pub use anthropic::{API_KEY_ENV, AnthropicClient, AnthropicConfig};
pub use client::{LlmClient, MockLlmClient};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, Usage};
