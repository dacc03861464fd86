//! readinglist server
//!
//! Reads its configuration from the YAML file named by `READINGLIST_CONFIG`
//! (built-in defaults otherwise) and serves it over the in-memory backend.

use anyhow::Result;
use readinglist::config::AppConfig;
use readinglist::server::ServerBuilder;
use readinglist::storage::InMemoryBackend;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("readinglist=info,tower_http=info")),
        )
        .init();

    let config = match std::env::var("READINGLIST_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading configuration from {}", path);
            AppConfig::from_yaml_file(&path)?
        }
        Err(_) => AppConfig::default_config(),
    }
    .with_env_overrides()?;

    let addr = config.http.address();

    ServerBuilder::new()
        .with_backend(InMemoryBackend::new())
        .with_config(&config)?
        .serve(&addr)
        .await
}
