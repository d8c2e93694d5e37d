use super::LlmClient;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "mistralai/mistral-large";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 800;
pub const OPENROUTER_PREFIX: &str = "openrouter/";

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_FALLBACK_BASE_URLS: &str = "OPENROUTER_FALLBACK_BASE_URLS";
pub const ENV_FALLBACK_MODELS: &str = "OPENROUTER_FALLBACK_MODELS";

const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("HTTP-Referer", "https://github.com/your-org/agentic-workshop"),
    ("X-Title", "Agentic AI Workshop"),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENROUTER_API_KEY is missing. Set it in your environment or .env file.")]
    MissingApiKey,

    #[error("unknown provider: {0} (expected `openrouter` or `openai`)")]
    UnknownProvider(String),
}

/// How model names are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    /// Models are addressed as `openrouter/<vendor>/<model>`.
    #[default]
    OpenRouter,
    /// Plain OpenAI-compatible endpoint, model names used verbatim.
    OpenAi,
}

impl Provider {
    /// The configured model name for this provider.
    pub fn route_model(self, model: &str) -> String {
        match self {
            Provider::OpenRouter if !model.starts_with(OPENROUTER_PREFIX) => {
                format!("{OPENROUTER_PREFIX}{model}")
            }
            _ => model.to_string(),
        }
    }

    /// The model name as sent on the wire.
    pub fn wire_model(self, model: &str) -> &str {
        match self {
            Provider::OpenRouter => model.strip_prefix(OPENROUTER_PREFIX).unwrap_or(model),
            Provider::OpenAi => model,
        }
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(Provider::OpenRouter),
            "openai" => Ok(Provider::OpenAi),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Client settings shared read-only by every agent of a run.
#[derive(Clone, PartialEq)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub base_url: String,
    pub headers: BTreeMap<String, String>,
    pub fallback_base_urls: Vec<String>,
    pub fallback_models: Vec<String>,
    pub provider: Provider,
    /// Extra top-level fields merged into every request body.
    pub extra_body: Map<String, Value>,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("api_key", &key)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("fallback_base_urls", &self.fallback_base_urls)
            .field("fallback_models", &self.fallback_models)
            .field("provider", &self.provider)
            .field("extra_body", &self.extra_body)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fallback_base_urls: Vec::new(),
            fallback_models: Vec::new(),
            provider: Provider::OpenRouter,
            extra_body: Map::new(),
        }
    }
}

/// Per-agent settings that win over the environment defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
    /// Replaces the default header map entirely.
    pub extra_headers: Option<BTreeMap<String, String>>,
    pub provider: Option<Provider>,
    pub extra_body: Map<String, Value>,
}

impl LlmOverrides {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn body_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra_body.insert(key.into(), value);
        self
    }
}

impl LlmConfig {
    /// Defaults plus whatever the process environment provides.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults plus whatever `lookup` returns for the known variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_key: lookup(ENV_API_KEY).unwrap_or_default(),
            fallback_base_urls: split_list(lookup(ENV_FALLBACK_BASE_URLS).as_deref()),
            fallback_models: split_list(lookup(ENV_FALLBACK_MODELS).as_deref()),
            ..Self::default()
        }
    }

    /// Apply `overrides` on top of this config and route the model name.
    pub fn merge(&self, overrides: &LlmOverrides) -> LlmConfig {
        let provider = overrides.provider.unwrap_or(self.provider);
        let model = overrides.model.as_deref().unwrap_or(&self.model);

        let mut extra_body = self.extra_body.clone();
        extra_body.extend(overrides.extra_body.clone());

        LlmConfig {
            model: provider.route_model(model),
            api_key: self.api_key.clone(),
            temperature: overrides.temperature.unwrap_or(self.temperature),
            max_tokens: overrides.max_tokens.unwrap_or(self.max_tokens),
            base_url: overrides
                .base_url
                .clone()
                .unwrap_or_else(|| self.base_url.clone()),
            headers: overrides
                .extra_headers
                .clone()
                .unwrap_or_else(|| self.headers.clone()),
            fallback_base_urls: self.fallback_base_urls.clone(),
            fallback_models: self.fallback_models.clone(),
            provider,
            extra_body,
        }
    }

    /// Merge `overrides` and build a client. Fails without an API key.
    pub fn build_client(&self, overrides: &LlmOverrides) -> Result<LlmClient, ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(LlmClient::new(self.merge(overrides)))
    }
}

/// Build a client from the process environment and `overrides`.
pub fn build_llm(overrides: &LlmOverrides) -> Result<LlmClient, ConfigError> {
    LlmConfig::from_env().build_client(overrides)
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
