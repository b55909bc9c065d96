use async_trait::async_trait;
use std::time::Duration;
use crate::config::LLMConfig;
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for an LLM provider connection
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    pub api_base: String,
    pub timeout: Option<Duration>,
}

impl LLMProviderConfig {
    pub fn from_config(config: &LLMConfig) -> Self {
        Self {
            name: config.provider.clone(),
            api_key: config.active_api_key().unwrap_or_default(),
            api_base: config.api_base.clone(),
            timeout: (config.request_timeout_secs > 0)
                .then(|| Duration::from_secs(config.request_timeout_secs)),
        }
    }
}

/// Handle to the remote model, built once at startup and shared by reference
pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let adapter: Box<dyn LLMAdapter> = match LLMProvider::from_id(&provider.name) {
            Some(LLMProvider::Google) => Box::new(crate::llm::google::GoogleAdapter::with_options(
                &provider.api_key,
                &provider.api_base,
                provider.timeout,
            )?),
            None => {
                return Err(AppError::Config(format!(
                    "Unsupported provider: {}",
                    provider.name
                )))
            }
        };

        Ok(Self {
            adapter,
            provider_name: provider.name,
        })
    }

    /// Wrap an already constructed adapter
    pub fn from_adapter(name: impl Into<String>, adapter: Box<dyn LLMAdapter>) -> Self {
        Self {
            adapter,
            provider_name: name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_provider_is_config_error() {
        let result = LLM::new(LLMProviderConfig {
            name: "carrier-pigeon".to_string(),
            api_key: "key".to_string(),
            api_base: "http://localhost".to_string(),
            timeout: None,
        });
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_google_provider_builds() {
        let llm = LLM::new(LLMProviderConfig::from_config(&LLMConfig::default())).unwrap();
        assert_eq!(llm.provider_name(), "google");
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = LLMConfig {
            request_timeout_secs: 0,
            ..LLMConfig::default()
        };
        assert!(LLMProviderConfig::from_config(&config).timeout.is_none());
    }
}
