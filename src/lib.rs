// PDF Chatbot - ask questions about an uploaded PDF through a hosted language model

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod session;
pub mod session_registry;
pub mod routes;
pub mod middleware;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
