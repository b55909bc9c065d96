//! Chat session state
//!
//! A session holds the text of the current document, the transcript, and a
//! busy flag that keeps at most one extraction or answer in flight. The
//! session is only locked for these short transitions, never across I/O.

use crate::agents::{DocumentText, ExtractionError};
use crate::models::Message;
use crate::types::{AppError, AppResult};
use std::sync::Arc;
use tracing::{info, warn};

pub const UPLOAD_SUCCESS_MESSAGE: &str =
    "PDF uploaded successfully! You can now ask questions about its content.";
pub const UPLOAD_FAILURE_MESSAGE: &str = "Error processing PDF. Please try again.";
pub const UPLOAD_FIRST_MESSAGE: &str = "Please upload a PDF document first.";

/// What the caller should do after submitting a question
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionStep {
    /// Ask the model about `context`; the session is now busy
    Ready { context: Arc<DocumentText> },
    /// No document text or blank question; a prompt was added to the transcript
    Rejected,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    document: Option<Arc<DocumentText>>,
    transcript: Vec<Message>,
    busy: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.transcript
    }

    pub fn document(&self) -> Option<&DocumentText> {
        self.document.as_deref()
    }

    /// A document with text to answer from is loaded
    pub fn has_document(&self) -> bool {
        self.document.as_deref().is_some_and(|document| !document.is_empty())
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn begin_upload(&mut self) -> AppResult<()> {
        self.acquire()
    }

    /// Store the extraction result and reset the transcript
    pub fn finish_upload(&mut self, result: Result<DocumentText, ExtractionError>) {
        self.busy = false;
        self.transcript.clear();
        match result {
            Ok(text) => {
                if text.is_empty() {
                    warn!(pages = text.page_count(), "Document has no extractable text");
                }
                info!(pages = text.page_count(), chars = text.char_count(), "Document stored");
                self.document = Some(Arc::new(text));
                self.transcript.push(Message::system(UPLOAD_SUCCESS_MESSAGE));
            }
            Err(e) => {
                warn!(error = %e, "Document upload failed");
                self.transcript.push(Message::system(UPLOAD_FAILURE_MESSAGE));
            }
        }
    }

    pub fn begin_question(&mut self, question: &str) -> AppResult<QuestionStep> {
        if self.busy {
            return Err(AppError::Busy);
        }

        let document = match &self.document {
            Some(document) if !document.is_empty() && !question.trim().is_empty() => {
                Arc::clone(document)
            }
            _ => {
                self.transcript.push(Message::system(UPLOAD_FIRST_MESSAGE));
                return Ok(QuestionStep::Rejected);
            }
        };

        self.transcript.push(Message::user(question));
        self.busy = true;
        Ok(QuestionStep::Ready { context: document })
    }

    pub fn finish_question(&mut self, answer: String) {
        self.transcript.push(Message::system(answer));
        self.busy = false;
    }

    /// Clear the busy flag without recording anything
    pub fn abandon(&mut self) {
        self.busy = false;
    }

    fn acquire(&mut self) -> AppResult<()> {
        if self.busy {
            return Err(AppError::Busy);
        }
        self.busy = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::answer;
    use crate::agents::reply::tests::{agent_with, ScriptedAdapter};
    use tokio_test::{assert_err, assert_ok};

    fn loaded_session(text: &str) -> ChatSession {
        let mut session = ChatSession::new();
        assert_ok!(session.begin_upload());
        session.finish_upload(Ok(DocumentText::new(text, 1)));
        session
    }

    #[test]
    fn test_upload_success_resets_transcript() {
        let mut session = loaded_session("old");
        session.finish_question("an answer".to_string());
        assert_eq!(session.messages().len(), 2);

        assert_ok!(session.begin_upload());
        session.finish_upload(Ok(DocumentText::new("new", 1)));

        assert_eq!(session.document().unwrap().as_str(), "new");
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text, UPLOAD_SUCCESS_MESSAGE);
        assert!(session.messages()[0].is_from_system);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_first_upload_failure_leaves_document_unset() {
        let mut session = ChatSession::new();
        assert_ok!(session.begin_upload());
        session.finish_upload(Err(ExtractionError::Empty));

        assert!(!session.has_document());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text, UPLOAD_FAILURE_MESSAGE);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_failed_reupload_keeps_previous_document() {
        let mut session = loaded_session("kept");
        assert_ok!(session.begin_upload());
        session.finish_upload(Err(ExtractionError::Empty));
        assert_eq!(session.document().unwrap().as_str(), "kept");
    }

    #[test]
    fn test_question_before_upload_is_rejected() {
        let mut session = ChatSession::new();
        let step = session.begin_question("What color is the sky?").unwrap();

        assert_eq!(step, QuestionStep::Rejected);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text, UPLOAD_FIRST_MESSAGE);
        assert!(session.messages()[0].is_from_system);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_question_against_textless_document_is_rejected() {
        let mut session = loaded_session("");
        assert_eq!(session.messages()[0].text, UPLOAD_SUCCESS_MESSAGE);
        assert!(!session.has_document());

        let step = session.begin_question("What color is the sky?").unwrap();
        assert_eq!(step, QuestionStep::Rejected);
        assert_eq!(session.messages().last().unwrap().text, UPLOAD_FIRST_MESSAGE);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_blank_question_is_rejected() {
        let mut session = loaded_session("text");
        let step = session.begin_question("   ").unwrap();
        assert_eq!(step, QuestionStep::Rejected);
        assert_eq!(session.messages().last().unwrap().text, UPLOAD_FIRST_MESSAGE);
    }

    #[test]
    fn test_busy_session_refuses_work() {
        let mut session = loaded_session("text");
        assert!(matches!(
            session.begin_question("one?").unwrap(),
            QuestionStep::Ready { .. }
        ));
        assert!(session.is_busy());

        assert!(matches!(session.begin_question("two?"), Err(AppError::Busy)));
        assert_err!(session.begin_upload());

        session.finish_question("answer".to_string());
        assert!(!session.is_busy());
        assert_ok!(session.begin_upload());
        session.abandon();
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_sky_is_blue_scenario() {
        let adapter = ScriptedAdapter::with(vec![Ok("The sky is blue.".to_string())]);
        let agent = agent_with(adapter.clone(), 10_000);
        let mut session = loaded_session("The sky is blue.");

        let context = match session.begin_question("What color is the sky?").unwrap() {
            QuestionStep::Ready { context } => context,
            QuestionStep::Rejected => panic!("question should be accepted"),
        };
        let reply = answer(&agent, context.as_str(), "What color is the sky?").await;
        session.finish_question(reply);

        assert_eq!(
            adapter.prompts(),
            vec![crate::agents::ReplyAgent::create_answer_prompt(
                "The sky is blue.",
                "What color is the sky?"
            )]
        );

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].text, "What color is the sky?");
        assert!(!messages[1].is_from_system);
        assert_eq!(messages[2].text, "The sky is blue.");
        assert!(messages[2].is_from_system);
        assert!(messages[1].created_at <= messages[2].created_at);
    }
}
