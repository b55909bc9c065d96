//! API Routes
//!
//! - `/` - Chat page (upload button, transcript, question form)
//! - `/api/health` - Health check
//! - `/api/sessions` - Create a chat session
//! - `/api/sessions/{id}/document` - Upload the PDF for a session
//! - `/api/sessions/{id}/messages` - Read the transcript / ask a question

pub mod chat;
pub mod files;
pub mod health;
pub mod ui;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use crate::middleware::apply_cors;
use crate::models::AppState;
use tracing::info;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let max_upload_bytes = state.config.server.max_upload_bytes;
    let allowed_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(chat::router(state.clone()))
        .merge(files::router(state.clone()))
        .merge(health::router(state));

    let router = Router::new()
        .merge(api_router)
        .merge(ui::router())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &allowed_origins)
}
