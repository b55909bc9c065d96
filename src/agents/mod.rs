//! Agent System
//!
//! The two operations the chat UI calls into:
//!
//! - **File Upload Agent**: turns an uploaded PDF into one string of text
//! - **Reply Agent**: answers a question about that text with the remote model
//!
//! ```text
//! upload ──► extract() ──► DocumentText (kept by the session)
//!                               │
//! question ─────────────────────┴──► answer() ──► model text | fallback
//! ```

pub mod file_upload;
pub mod reply;

pub use file_upload::{DocumentText, ExtractionError, FileUploadAgent};
pub use reply::{AnswerError, ReplyAgent, ReplySettings, FALLBACK_ANSWER};

use bytes::Bytes;
use tracing::warn;

/// Extract the text of an uploaded PDF off the async runtime
pub async fn extract(content: Bytes) -> Result<DocumentText, ExtractionError> {
    tokio::task::spawn_blocking(move || FileUploadAgent::extract_text(&content))
        .await
        .map_err(|e| ExtractionError::Worker(e.to_string()))?
}

/// Answer `question` from `context`; never fails
pub async fn answer(agent: &ReplyAgent, context: &str, question: &str) -> String {
    answer_or_fallback(agent.ask(context, question).await)
}

/// Swap any failed answer for the fallback sentence
pub fn answer_or_fallback(result: Result<String, AnswerError>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "No answer available, sending fallback");
            FALLBACK_ANSWER.to_string()
        }
    }
}
