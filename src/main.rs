use clap::Parser;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use pdf_chatbot::{
    agents::ReplyAgent, config::Config, routes::create_router, session_registry::SessionLimits,
    utils::init_logger, AppState,
};

#[derive(Debug, Parser)]
#[command(name = "pdf-chatbot", version, about = "Chat with an uploaded PDF")]
struct Args {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration (also reads .env, so RUST_LOG may come from there)
    let mut config = Config::from_env()?;
    init_logger();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!("Configuration loaded: {:?}", config);

    // One answer client for the whole process, shared through the state
    let reply_agent = ReplyAgent::from_config(&config.llm)?;
    let state = AppState::new(config.clone(), reply_agent);

    // Idle sessions are also pruned on create; the sweep frees them sooner
    let sweep_every = (SessionLimits::from_config(&config.server).idle_timeout / 4).max(Duration::from_secs(1));
    state.sessions.spawn_expiry(sweep_every);

    let app = create_router(state);

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
