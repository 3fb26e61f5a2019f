//! Provider module for voxcrm
//!
//! This module contains the model provider abstraction and the
//! chat-completions implementation used in production.

pub mod base;
pub mod chat;

pub use base::{CompletionResponse, FunctionCall, Message, Provider, TokenUsage, ToolCall};
pub use chat::ChatCompletionsProvider;
