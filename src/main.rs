use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;

use soft_startup::ai::{self, ReframeService};
use soft_startup::cli::{Terminal, Wizard};
use soft_startup::config::AppConfig;
use soft_startup::store::{FileStorage, SessionStore, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout belongs to the wizard.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env();

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data directory {}", config.data_dir.display()))?;
    let backend: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(&config.data_dir));
    let store = SessionStore::with_key(backend, config.storage_key.clone());

    let mut ai: Option<Arc<dyn ReframeService>> = ai::create_service(&config.ai)
        .unwrap_or_else(|e| {
            tracing::warn!("AI helper unavailable: {e}");
            None
        });
    let healthy = match &ai {
        Some(service) => service.health().await,
        None => false,
    };
    if ai.is_some() && !healthy {
        tracing::warn!(url = %config.ai.base_url, "AI helper unreachable, continuing without it");
        ai = None;
    }

    eprintln!("Soft Startup v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Data: {}", config.data_dir.display());
    eprintln!(
        "   AI helper: {}",
        if ai.is_some() { "on" } else { "off" }
    );

    let term = Terminal::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    let mut wizard = Wizard::new(&store, ai, term);
    wizard.run().await?;

    eprintln!("Goodbye.");
    Ok(())
}
