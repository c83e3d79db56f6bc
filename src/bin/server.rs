//! Chat server binary
//!
//! Run with: cargo run --bin ragchat-server

use ragchat::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ragchat=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                         ragchat                           ║
║        Document-grounded chat with source tracking        ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = RagConfig::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Chat model: {}", config.provider.chat_model);
    tracing::info!("  - Embedding model: {}", config.provider.embed_model);
    tracing::info!("  - Documents dir: {}", config.storage.docs_dir.display());
    tracing::info!("  - Index dir: {}", config.storage.index_dir.display());
    tracing::info!("  - Router strategy: {:?}", config.routing.strategy);

    // Probe the provider API so a dead endpoint shows up in the logs at
    // startup instead of on the first chat request
    tracing::info!("Checking provider at {}...", config.provider.base_url);
    let probe = reqwest::Client::new();
    match probe
        .get(format!("{}/models", config.provider.base_url))
        .bearer_auth(&config.provider.api_key)
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Provider API is reachable");
        }
        Ok(resp) => {
            tracing::warn!("Provider API answered HTTP {}", resp.status());
        }
        Err(e) => {
            tracing::warn!("Provider API not reachable: {}", e);
        }
    }

    let server = RagServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/chat             - Chat (grounded or direct)");
    println!("  GET    /api/documents        - List documents");
    println!("  POST   /api/documents        - Upload and ingest a document");
    println!("  DELETE /api/documents/:id    - Delete a document");
    println!("  POST   /api/documents/ingest - Ingest the documents directory");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
