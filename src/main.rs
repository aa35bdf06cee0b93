use anyhow::Context;
use tokio_util::sync::CancellationToken;

use suno_proxy::config::Config;
use suno_proxy::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "suno_proxy=info,tower_http=info".into()),
        )
        .init();

    let config = Config::load().context("invalid configuration")?;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        upstream = %config.upstream.base_url,
        "suno-proxy starting"
    );

    let shutdown = CancellationToken::new();
    let state = AppState::new(&config, shutdown.clone()).context("failed to build upstream client")?;
    tracing::info!(
        interval_secs = state.poller.interval().as_secs(),
        max_attempts = state.poller.max_attempts(),
        worst_case_secs = state.poller.worst_case().as_secs(),
        "task polling configured"
    );
    let app = server::app(state, &config.server)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("server error")?;

    tracing::info!("suno-proxy shut down");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM, cancelling in-flight polls so connections drain.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }

    shutdown.cancel();
}
