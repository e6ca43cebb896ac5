mod cli;
mod config;

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use yatube_api::cache::PageCache;
use yatube_api::media::MediaStore;
use yatube_api::{AppState, AppStateInner};
use yatube_db::Database;

use crate::cli::{Cli, Commands};
use crate::config::Config;

/// Used when `RUST_LOG` is unset. Names every crate of the workspace.
const DEFAULT_LOG_FILTER: &str =
    "yatube=debug,yatube_server=info,yatube_api=debug,yatube_db=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let db = Database::open(&config.db_path)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, db).await,
        Commands::CreateGroup {
            slug,
            title,
            description,
        } => {
            let id = db.create_group(&title, &slug, &description)?;
            info!("Created group '{}' (/group/{}/) with id {}", title, slug, id);
            Ok(())
        }
    }
}

async fn serve(config: Config, db: Database) -> anyhow::Result<()> {
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret()?,
        page_size: config.page_size,
        media: MediaStore::new(config.media_dir.clone()),
        index_cache: PageCache::new(config.index_cache_ttl),
    });

    let app = yatube_api::router(state);

    let addr = config.addr()?;
    info!("Yatube listening on {}", addr);
    info!(
        "Page size {}, home page cached for {}s, media in {}",
        config.page_size,
        config.index_cache_ttl.as_secs(),
        config.media_dir.display()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Yatube stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_covers_the_binary() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        for target in ["yatube_server=", "yatube_api=", "yatube_db="] {
            assert!(DEFAULT_LOG_FILTER.contains(target), "{}", target);
        }
    }
}
