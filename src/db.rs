use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::AppConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::SqliteStore;

pub struct ConnectionCache<S> {
    cell: OnceCell<Arc<S>>,
}

impl<S> Default for ConnectionCache<S> {
    fn default() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }
}

impl<S> ConnectionCache<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached handle, running `init` only if none exists yet.
    ///
    /// A failed `init` leaves the cache empty so the next caller retries.
    pub async fn acquire<F, Fut>(&self, init: F) -> StoreResult<Arc<S>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<S>>,
    {
        self.cell
            .get_or_try_init(|| async move { init().await.map(Arc::new) })
            .await
            .map(Arc::clone)
    }

    pub fn get(&self) -> Option<Arc<S>> {
        self.cell.get().cloned()
    }
}

static SHARED: Lazy<ConnectionCache<SqliteStore>> = Lazy::new(ConnectionCache::new);

/// Shared SQLite store for this process. Only the first call's path is used.
pub async fn connect(config: &AppConfig) -> StoreResult<Arc<SqliteStore>> {
    let path = config.database_path();
    SHARED.acquire(move || open_blocking(path)).await
}

async fn open_blocking(path: PathBuf) -> StoreResult<SqliteStore> {
    tokio::task::spawn_blocking(move || open_at(&path))
        .await
        .map_err(|err| StoreError::Unavailable(err.to_string()))?
}

fn open_at(path: &Path) -> StoreResult<SqliteStore> {
    let store = SqliteStore::open(path)?;
    info!(path = %path.display(), "database ready");
    Ok(store)
}
