use anyhow::{Context, Result};
use clap::Parser;
use flowsmith_server::config::Settings;
use flowsmith_server::logging::init_tracing;
use flowsmith_server::{AppState, router};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();
    let _guard = init_tracing(&settings.log_level);
    settings.validate()?;

    let state = AppState::from_settings(&settings)?;
    let shutdown = state.shutdown.clone();

    let listener = tokio::net::TcpListener::bind(&settings.addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.addr))?;
    info!(addr = %settings.addr, model = %settings.gigachat_model, "flowsmith listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    Ok(())
}
