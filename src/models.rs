use std::sync::Arc;
use crate::agents::ReplyAgent;
use crate::config::Config;
use crate::session_registry::{SessionLimits, SessionRegistry};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionRegistry,
    pub reply_agent: Arc<ReplyAgent>,
}

impl AppState {
    pub fn new(config: Config, reply_agent: ReplyAgent) -> Self {
        let limits = SessionLimits::from_config(&config.server);
        Self {
            config,
            sessions: SessionRegistry::new(limits),
            reply_agent: Arc::new(reply_agent),
        }
    }
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub text: String,
    pub is_from_system: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_from_system: true,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_from_system: false,
            created_at: chrono::Utc::now(),
        }
    }
}

// API Request/Response types

#[derive(Debug, serde::Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: uuid::Uuid,
    pub document_loaded: bool,
    pub messages: Vec<Message>,
}

/// Returned after a question; `answer` is absent when the question was rejected
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub messages: Vec<Message>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub document_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<usize>,
    pub messages: Vec<Message>,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub model: String,
}
