mod api;
mod cache;
mod config;
mod error;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use remedy_engine::SharedRepertory;

use cache::SuggestionCache;
use config::Config;
use server::RepertoryServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting repertory MCP server");

    let config = Config::from_env()?;
    info!(
        data_dir = %config.data_dir.display(),
        failure_policy = ?config.failure_policy,
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    let files = config.data_files();
    if files.patterns.is_none() {
        warn!(file = %config.patterns_file, "remedy patterns not found, signature bonuses disabled");
    }

    let fingerprint = cache::data_fingerprint(&files).map_err(error::AppError::from)?;
    let repertory = Arc::new(SharedRepertory::new(files));
    // Load eagerly so bad reference data stops the server before it accepts clients.
    let store = repertory.get().map_err(error::AppError::from)?;
    info!(
        categories = store.categories().len(),
        rubrics = store.rubric_count(),
        fingerprint = %fingerprint,
        "repertory ready"
    );

    let cache = SuggestionCache::new(config.redis_url.as_deref(), fingerprint);
    if cache.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without cache");
    }

    let server = RepertoryServer::new(repertory, config.failure_policy, Arc::new(cache));

    if let Ok(addr) = std::env::var("MCP_TCP_LISTEN_ADDR") {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
