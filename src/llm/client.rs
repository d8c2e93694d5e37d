use super::{ChatModel, LlmConfig, Message};
use crate::StepError;
use crate::tools::http;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Blocking client for OpenAI-compatible chat-completions endpoints.
///
/// Tries the primary endpoint first. When it fails with a transient or
/// rate-limit error, each fallback base URL is tried with the primary model,
/// then each fallback model against the primary base URL.
pub struct LlmClient {
    config: LlmConfig,
    agent: ureq::Agent,
}

impl fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // LlmConfig's Debug keeps the key redacted.
        f.debug_struct("LlmClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            agent: http::agent(REQUEST_TIMEOUT),
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// `(base_url, wire model)` pairs in the order they are tried.
    pub fn candidates(&self) -> Vec<(&str, &str)> {
        let provider = self.config.provider;
        let base = self.config.base_url.as_str();
        let model = provider.wire_model(&self.config.model);

        let mut out = vec![(base, model)];
        out.extend(
            self.config
                .fallback_base_urls
                .iter()
                .map(|url| (url.as_str(), model)),
        );
        out.extend(
            self.config
                .fallback_models
                .iter()
                .map(|m| (base, provider.wire_model(m))),
        );
        out
    }

    fn request_body(&self, model: &str, messages: &[Message]) -> Value {
        let mut body = json!({
            "model": model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });
        if let Some(obj) = body.as_object_mut() {
            obj.extend(self.config.extra_body.clone());
        }
        body
    }

    fn send(&self, base_url: &str, model: &str, messages: &[Message]) -> Result<String, StepError> {
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        debug!(%url, model, messages = messages.len(), "chat completion request");

        let mut req = self
            .agent
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key));
        for (name, value) in &self.config.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let mut response = req.send_json(self.request_body(model, messages))?;
        let status = response.status().as_u16();

        if !(200..300).contains(&status) {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(StepError::from_status(status, &body, retry_after));
        }

        let parsed: ChatResponse = response.body_mut().read_json()?;
        parsed.into_text()
    }
}

impl ChatModel for LlmClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn chat(&self, messages: &[Message]) -> Result<String, StepError> {
        let mut last_err = None;

        for (base_url, model) in self.candidates() {
            match self.send(base_url, model, messages) {
                Ok(text) => return Ok(text),
                Err(err) if err.is_recoverable() => {
                    warn!(base_url, model, error = %err, "chat completion failed, trying next endpoint");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_err.unwrap_or_else(|| StepError::other("no chat endpoint configured")))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, StepError> {
        // OpenRouter reports some upstream failures inside a 200 body.
        if let Some(err) = self.error {
            return Err(StepError::transient(format!("provider error: {}", err.message)));
        }
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(StepError::transient("empty completion"));
        }
        Ok(text)
    }
}
