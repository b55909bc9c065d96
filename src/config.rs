use anyhow::Result;
use std::env;

use crate::session_registry::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_TIMEOUT};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub session_idle_timeout_secs: u64,
    pub max_sessions: usize,
}

#[derive(Clone)]
pub struct LLMConfig {
    pub provider: String,
    pub google_api_key: String,
    pub model: String,
    pub api_base: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub max_context_chars: usize,
    pub request_timeout_secs: u64,
}

// The API key never shows up in logs.
impl std::fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMConfig")
            .field("provider", &self.provider)
            .field("google_api_key", &if self.google_api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("max_context_chars", &self.max_context_chars)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

pub const DEFAULT_GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = crate::llm::google::models::DEFAULT;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 500_000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_idle_timeout_secs: DEFAULT_SESSION_IDLE_TIMEOUT.as_secs(),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            google_api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_GOOGLE_API_BASE.to_string(),
            temperature: None,
            max_output_tokens: None,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            request_timeout_secs: 60,
        }
    }
}

impl LLMConfig {
    /// The API key for the configured provider, if one was supplied
    pub fn active_api_key(&self) -> Option<String> {
        let key = self.google_api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let server_defaults = ServerConfig::default();
        let llm_defaults = LLMConfig::default();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| server_defaults.port.to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or(server_defaults.host),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .map(|origins| parse_origins(&origins))
                    .unwrap_or(server_defaults.cors_allowed_origins),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|_| server_defaults.max_upload_bytes.to_string())
                    .parse()?,
                session_idle_timeout_secs: env::var("SESSION_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| server_defaults.session_idle_timeout_secs.to_string())
                    .parse()?,
                max_sessions: env::var("MAX_SESSIONS")
                    .unwrap_or_else(|_| server_defaults.max_sessions.to_string())
                    .parse()?,
            },
            llm: LLMConfig {
                provider: env::var("LLM_PROVIDER").unwrap_or(llm_defaults.provider),
                google_api_key: env::var("GOOGLE_API_KEY").unwrap_or_default(),
                model: env::var("LLM_MODEL").unwrap_or(llm_defaults.model),
                api_base: env::var("LLM_API_BASE").unwrap_or(llm_defaults.api_base),
                temperature: optional_var("LLM_TEMPERATURE")?,
                max_output_tokens: optional_var("LLM_MAX_OUTPUT_TOKENS")?,
                max_context_chars: env::var("LLM_MAX_CONTEXT_CHARS")
                    .unwrap_or_else(|_| llm_defaults.max_context_chars.to_string())
                    .parse()?,
                request_timeout_secs: env::var("LLM_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| llm_defaults.request_timeout_secs.to_string())
                    .parse()?,
            },
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn optional_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(Some(value.trim().parse()?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://a.test, http://b.test ,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(parse_origins("*"), vec!["*".to_string()]);
    }

    #[test]
    fn test_active_api_key() {
        let mut llm = LLMConfig::default();
        assert!(llm.active_api_key().is_none());

        llm.google_api_key = "   ".to_string();
        assert!(llm.active_api_key().is_none());

        llm.google_api_key = " key-123 ".to_string();
        assert_eq!(llm.active_api_key(), Some("key-123".to_string()));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let llm = LLMConfig {
            google_api_key: "super-secret".to_string(),
            ..LLMConfig::default()
        };
        let rendered = format!("{:?}", llm);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
