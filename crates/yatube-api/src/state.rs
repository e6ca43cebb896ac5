use std::sync::Arc;

use tracing::error;
use yatube_db::Database;

use crate::cache::PageCache;
use crate::error::ApiError;
use crate::media::MediaStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Posts per feed page.
    pub page_size: usize,
    pub media: MediaStore,
    /// Rendered home listing pages, keyed by path and query.
    pub index_cache: PageCache,
}

/// Runs a blocking DB call off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let value = tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
        })??;
    Ok(value)
}
