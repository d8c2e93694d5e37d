//! Chat-model access: environment-driven configuration, the client factory,
//! and the blocking OpenAI-compatible client.

mod client;
mod config;

pub use client::LlmClient;
pub use config::{
    build_llm, ConfigError, LlmConfig, LlmOverrides, Provider, DEFAULT_BASE_URL,
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, ENV_API_KEY, ENV_FALLBACK_BASE_URLS,
    ENV_FALLBACK_MODELS, OPENROUTER_PREFIX,
};

use crate::StepError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A language model an agent can talk to.
///
/// [`LlmClient`] is the real implementation; tests script their own.
pub trait ChatModel: Send + Sync {
    /// Model name as configured (routing prefix included).
    fn model(&self) -> &str;

    /// Send the conversation and return the assistant's reply text.
    fn chat(&self, messages: &[Message]) -> Result<String, StepError>;
}
