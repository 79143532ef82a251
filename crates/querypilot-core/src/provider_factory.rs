// LLM driver factory
//
// Resolves a provider configuration into a boxed LlmDriver. Selection is a
// closed enum decided once at startup from configuration, never inferred
// from the model identifier string. Missing credentials fail here, before
// any conversation step runs.

use crate::anthropic::AnthropicDriver;
use crate::error::{AgentError, Result};
use crate::llm::LlmDriver;
use crate::openai::OpenAiDriver;

/// Supported provider variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAi,
    Anthropic,
}

impl std::str::FromStr for ProviderType {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAi),
            "anthropic" => Ok(ProviderType::Anthropic),
            other => Err(AgentError::config(format!(
                "Unknown provider type: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::OpenAi => write!(f, "openai"),
            ProviderType::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Configuration for resolving an LLM driver
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Which provider variant to construct
    pub provider_type: ProviderType,
    /// API key for authentication; required
    pub api_key: Option<String>,
    /// Base URL override for API-compatible endpoints
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            api_key: None,
            base_url: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Boxed LLM driver for dynamic dispatch
pub type BoxedLlmDriver = Box<dyn LlmDriver>;

/// Resolve a driver from configuration.
///
/// Fails eagerly with a configuration error when the API key for the
/// selected provider is absent.
pub fn resolve_driver(config: &ProviderConfig) -> Result<BoxedLlmDriver> {
    let api_key = config.api_key.as_deref().ok_or_else(|| {
        AgentError::config(format!(
            "Missing API key for provider '{}'",
            config.provider_type
        ))
    })?;

    match config.provider_type {
        ProviderType::OpenAi => {
            let driver = match &config.base_url {
                Some(url) => OpenAiDriver::with_base_url(api_key, url),
                None => OpenAiDriver::new(api_key),
            };
            Ok(Box::new(driver))
        }
        ProviderType::Anthropic => {
            let driver = match &config.base_url {
                Some(url) => AnthropicDriver::with_base_url(api_key, url),
                None => AnthropicDriver::new(api_key),
            };
            Ok(Box::new(driver))
        }
    }
}
