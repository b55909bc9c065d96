//! Reply Agent
//!
//! Answers a question about the uploaded document with one call to the
//! configured model. The agent reports failures as [`AnswerError`]; turning
//! those into the fallback sentence is the caller's job.

use crate::config::LLMConfig;
use crate::llm::provider::{LLMProviderConfig, LLM};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};
use tracing::{info, warn};

/// Sent whenever no genuine answer is available
pub const FALLBACK_ANSWER: &str =
    "Sorry, I didn't understand your question. Do you want to connect with a live agent?";

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("answer service failed: {0}")]
    Service(#[from] AppError),

    #[error("answer service returned no text")]
    Empty,
}

/// Generation knobs forwarded with every request
#[derive(Debug, Clone)]
pub struct ReplySettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_context_chars: usize,
}

impl ReplySettings {
    pub fn from_config(config: &LLMConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
            max_context_chars: config.max_context_chars,
        }
    }
}

pub struct ReplyAgent {
    llm: LLM,
    settings: ReplySettings,
}

impl ReplyAgent {
    pub fn new(llm: LLM, settings: ReplySettings) -> Self {
        Self { llm, settings }
    }

    pub fn from_config(config: &LLMConfig) -> AppResult<Self> {
        if config.active_api_key().is_none() {
            warn!("GOOGLE_API_KEY is not set; every answer will be the fallback sentence");
        }
        let llm = LLM::new(LLMProviderConfig::from_config(config))?;
        Ok(Self::new(llm, ReplySettings::from_config(config)))
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Ask the model one question about `context`
    pub async fn ask(&self, context: &str, question: &str) -> Result<String, AnswerError> {
        let context = Self::clamp_context(context, self.settings.max_context_chars);
        let prompt = Self::create_answer_prompt(context, question);

        let request = LLMRequest {
            model: self.settings.model.clone(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let response = self.llm.create_chat_completion(&request).await?;
        if response.content.is_empty() {
            return Err(AnswerError::Empty);
        }

        info!(
            provider = self.llm.provider_name(),
            response_len = response.content.len(),
            total_tokens = response.usage.total_tokens,
            "Generated answer"
        );
        Ok(response.content)
    }

    pub fn create_answer_prompt(context: &str, question: &str) -> String {
        format!(
            "Context from PDF: {}\n\nQuestion: {}\n\nPlease provide a concise and relevant answer based on the context. If the answer cannot be found in the context, respond with: \"{}\"",
            context, question, FALLBACK_ANSWER
        )
    }

    /// Cut `context` down to at most `max_chars` characters
    fn clamp_context(context: &str, max_chars: usize) -> &str {
        match context.char_indices().nth(max_chars) {
            Some((byte_index, _)) => {
                warn!(
                    max_chars,
                    total_chars = context.chars().count(),
                    "Document context truncated"
                );
                &context[..byte_index]
            }
            None => context,
        }
    }
}
