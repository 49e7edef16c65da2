use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use chatgate::sandbox::{DockerRuntime, SandboxExecutor};
use chatgate::server::{create_router, AppState};
use chatgate::tracing::{init_tracing, shutdown_tracing};
use chatgate::{OllamaAgent, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    init_tracing("chatgate", config.otlp_endpoint.as_deref())
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialise tracing")?;

    info!(
        model = %config.agent.model,
        ollama = %config.agent.base_url,
        agent = %config.agent.name,
        "Starting chatgate"
    );

    let agent = Arc::new(OllamaAgent::new(config.agent.clone()));
    let mut state = AppState::new(agent)
        .with_sandbox_defaults(config.sandbox_image.clone(), config.sandbox_timeout);

    match connect_docker().await {
        Ok(runtime) => {
            info!(image = %config.sandbox_image, "Container runtime available");
            state = state.with_executor(Arc::new(SandboxExecutor::new(Arc::new(runtime))));
        }
        Err(e) => warn!(error = %e, "Docker unavailable, /execute will report failures"),
    }

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tracing();
    Ok(())
}

async fn connect_docker() -> Result<DockerRuntime, chatgate::sandbox::SandboxError> {
    let runtime = DockerRuntime::connect()?;
    runtime.ping().await?;
    Ok(runtime)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
