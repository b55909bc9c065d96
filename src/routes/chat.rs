use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::agents;
use crate::models::{AppState, ChatRequest, ChatResponse, SessionResponse};
use crate::session::QuestionStep;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/{session_id}/messages",
            get(get_messages).post(post_question),
        )
        .with_state(state)
}

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let (session_id, _) = state.sessions.create().await;
    info!(%session_id, "Session created");

    Json(SessionResponse {
        session_id,
        document_loaded: false,
        messages: Vec::new(),
    })
}

async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<SessionResponse>> {
    let session = state.sessions.require(&session_id).await?;
    let guard = session.lock().await;

    Ok(Json(SessionResponse {
        session_id,
        document_loaded: guard.has_document(),
        messages: guard.messages().to_vec(),
    }))
}

pub async fn post_question(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let session = state.sessions.require(&session_id).await?;
    info!(%session_id, question_len = request.question.len(), "Received question");

    let context = {
        let mut guard = session.lock().await;
        match guard.begin_question(&request.question)? {
            QuestionStep::Ready { context } => context,
            QuestionStep::Rejected => {
                return Ok(Json(ChatResponse {
                    answer: None,
                    messages: guard.messages().to_vec(),
                }))
            }
        }
    };

    // Spawned so the busy flag is released even if the client goes away
    let agent = Arc::clone(&state.reply_agent);
    let task_session = Arc::clone(&session);
    let task = tokio::spawn(async move {
        let answer = agents::answer(&agent, context.as_str(), &request.question).await;
        let mut guard = task_session.lock().await;
        guard.finish_question(answer.clone());
        ChatResponse {
            answer: Some(answer),
            messages: guard.messages().to_vec(),
        }
    });

    match task.await {
        Ok(response) => {
            info!(%session_id, "Answer sent");
            Ok(Json(response))
        }
        Err(e) => {
            session.lock().await.abandon();
            Err(AppError::Internal(format!("answer task failed: {}", e)))
        }
    }
}
