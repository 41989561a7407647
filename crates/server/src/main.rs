//! hoardcache server entry point.
//!
//! This is the main binary that opens the media cache and serves it as MCP
//! tools on stdio transport. Logging goes to stderr to avoid interfering
//! with the JSON-RPC protocol on stdout.

use anyhow::Result;
use hoardcache_core::{AppConfig, CacheDb, MediaCache, metrics};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    metrics::register_metrics();
    let db = CacheDb::open_at(&config.db_path, config.schema_revision, config.busy_timeout()).await?;
    tracing::info!(entries = metrics::CACHE_ENTRIES.get(), "media cache ready");

    tracing::info!("Starting hoardcache server on stdio transport");

    let handler = handler::HoardCacheServer::new(MediaCache::new(db));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
