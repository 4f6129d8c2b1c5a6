//! Asset store client: list and upload-and-register for one asset kind.
//!
//! DESIGN
//! ======
//! `AssetStore<A>` owns the cached list for its kind and exposes an explicit
//! `refresh`. Upload follows a fixed order: storage key, blob write, public
//! URL, metadata insert, full list re-fetch.
//!
//! ERROR HANDLING
//! ==============
//! A failed blob write never creates metadata. A failed metadata insert
//! after a successful write leaves the blob orphaned; that is logged and
//! reported as `Register`, not rolled back.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::backend::{BackendError, DesignBackend};
use crate::model::Asset;
use crate::storage::storage_key;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset list fetch failed: {0}")]
    Fetch(#[source] BackendError),
    #[error("asset upload failed: {0}")]
    Upload(#[source] BackendError),
    #[error("asset registration failed for {url}: {source}")]
    Register {
        url: String,
        #[source]
        source: BackendError,
    },
}

pub struct AssetStore<A: Asset> {
    backend: Arc<dyn DesignBackend>,
    items: RwLock<Vec<A>>,
    uploads_in_flight: AtomicUsize,
    _kind: PhantomData<A>,
}

/// Decrements the in-flight counter however the upload ends.
struct UploadGuard<'a>(&'a AtomicUsize);

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<A: Asset> AssetStore<A> {
    #[must_use]
    pub fn new(backend: Arc<dyn DesignBackend>) -> Self {
        Self { backend, items: RwLock::new(Vec::new()), uploads_in_flight: AtomicUsize::new(0), _kind: PhantomData }
    }

    /// Re-fetch the full list, newest first, and replace the cache.
    ///
    /// # Errors
    ///
    /// Returns `Fetch` if the backend query fails; the cache is left as it was.
    pub async fn refresh(&self) -> Result<Vec<A>, AssetError> {
        let rows = self
            .backend
            .list_assets(A::KIND)
            .await
            .map_err(AssetError::Fetch)?;
        let items: Vec<A> = rows.into_iter().map(A::from_row).collect();
        *self.items.write().await = items.clone();
        Ok(items)
    }

    /// Snapshot of the cached list.
    pub async fn items(&self) -> Vec<A> {
        self.items.read().await.clone()
    }

    /// True while any upload call is in flight.
    #[must_use]
    pub fn is_uploading(&self) -> bool {
        self.uploads_in_flight.load(Ordering::SeqCst) > 0
    }

    /// Store `bytes` and register the resulting asset.
    ///
    /// # Errors
    ///
    /// Returns `Upload` if the blob write fails and `Register` if the
    /// metadata insert fails after the blob was written.
    pub async fn upload(&self, bytes: &[u8], original_name: &str) -> Result<A, AssetError> {
        self.uploads_in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = UploadGuard(&self.uploads_in_flight);

        let kind = A::KIND;
        let key = storage_key(original_name);
        self.backend
            .put_object(kind, &key, bytes)
            .await
            .map_err(AssetError::Upload)?;

        let url = self.backend.public_url(kind, &key);
        let name = A::registered_name(original_name);
        let row = match self.backend.insert_asset(kind, &url, &name).await {
            Ok(row) => row,
            Err(source) => {
                warn!(?kind, %key, %url, error = %source, "metadata insert failed; blob left orphaned");
                return Err(AssetError::Register { url, source });
            }
        };
        let item = A::from_row(row);
        info!(?kind, id = %item.id(), url = item.url(), bytes = bytes.len(), "asset uploaded");

        // PHASE: REFRESH
        // WHY: full re-fetch picks up concurrent uploads too.
        if let Err(e) = self.refresh().await {
            warn!(?kind, error = %e, "asset list refresh after upload failed");
        }
        Ok(item)
    }
}

#[cfg(test)]
#[path = "assets_test.rs"]
mod tests;
