use anyhow::{Context, Result};
use clap::Parser;
use notifications_app::app::{self, AppState};
use notifications_app::auth::StaticTokens;
use notifications_app::config::{self, Config, StoreKind};
use notifications_app::render::PageOptions;
use notifications_app::store::{MemoryStore, NotificationStore, RemoteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let store = build_store(&cfg).await?;
    if cfg.auth.users.is_empty() {
        warn!("no auth users configured; every request will be rejected");
    }
    let users = Arc::new(StaticTokens::from_config(&cfg.auth.users));
    let state = AppState::new(store, users, PageOptions::from_config(&cfg));

    let addr = cfg.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "serving notifications");
    axum::serve(listener, app::router(state))
        .await
        .context("server error")?;

    Ok(())
}

async fn build_store(cfg: &Config) -> Result<Arc<dyn NotificationStore>> {
    match cfg.store.kind {
        StoreKind::Memory => {
            let store = match &cfg.store.fixtures {
                Some(path) => MemoryStore::from_fixtures(path).await?,
                None => MemoryStore::default(),
            };
            Ok(Arc::new(store))
        }
        StoreKind::Remote => {
            let store = RemoteStore::new(cfg.remote_url()?, cfg.store.access_token.clone())?;
            info!(url = %store.base_url(), "using remote notification store");
            Ok(Arc::new(store))
        }
    }
}
