mod admin;
mod config;
mod error;
mod model;
mod progress;
mod server;
mod store;
#[cfg(test)]
mod testing;

use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting workbook-server");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        workbooks_path = %config.workbooks_path.display(),
        bind_addr = %config.bind_addr,
        solvedac = %config.solvedac.base_url,
        timeout_ms = config.solvedac.timeout.as_millis(),
        progress_concurrency = config.progress_concurrency,
        "configuration loaded"
    );

    // 2. Load workbooks and build the judge client
    let state = AppState::from_config(&config)?;

    // 3. Serve HTTP until Ctrl-C
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP server ready");
    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "HTTP server error"))?;

    info!("workbook-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
