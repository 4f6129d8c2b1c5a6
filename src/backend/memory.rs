//! In-process backend used by tests and by pool-less local runs.
//!
//! Tables live behind a `tokio::sync::RwLock`. Blobs stay in memory unless a
//! `BucketStore` is attached, in which case they go to disk and are served
//! like the Postgres backend's. Individual operations can be made to fail
//! with [`Fault`] switches.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BackendError, DesignBackend};
use crate::model::{AssetKind, AssetRow, Screen, ScreenDraft};
use crate::storage::BucketStore;

/// Operations that can be switched to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    ListAssets,
    PutObject,
    InsertAsset,
    ScreenLookup,
    ScreenWrite,
}

#[derive(Default)]
struct Tables {
    images: Vec<AssetRow>,
    fonts: Vec<AssetRow>,
    screens: Vec<ScreenRecord>,
    blobs: HashMap<(AssetKind, String), Vec<u8>>,
}

impl Tables {
    fn assets_mut(&mut self, kind: AssetKind) -> &mut Vec<AssetRow> {
        match kind {
            AssetKind::Image => &mut self.images,
            AssetKind::Font => &mut self.fonts,
        }
    }

    fn assets(&self, kind: AssetKind) -> &[AssetRow] {
        match kind {
            AssetKind::Image => &self.images,
            AssetKind::Font => &self.fonts,
        }
    }
}

#[derive(Debug, Clone)]
struct ScreenRecord {
    screen: Screen,
    created_at: OffsetDateTime,
}

pub struct MemoryBackend {
    tables: RwLock<Tables>,
    faults: Mutex<HashSet<Fault>>,
    storage: Option<BucketStore>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self { tables: RwLock::new(Tables::default()), faults: Mutex::new(HashSet::new()), storage: None }
    }

    /// Keep tables in memory but write blobs through `storage`.
    #[must_use]
    pub fn with_storage(storage: BucketStore) -> Self {
        Self { storage: Some(storage), ..Self::new() }
    }

    /// Turn a failure switch on or off.
    #[cfg(test)]
    pub fn set_fault(&self, fault: Fault, enabled: bool) {
        let Ok(mut faults) = self.faults.lock() else {
            return;
        };
        if enabled {
            faults.insert(fault);
        } else {
            faults.remove(&fault);
        }
    }

    fn check(&self, fault: Fault) -> Result<(), BackendError> {
        let tripped = self.faults.lock().map(|f| f.contains(&fault)).unwrap_or(false);
        if tripped {
            return Err(BackendError::Unavailable(format!("injected fault: {fault:?}")));
        }
        Ok(())
    }

    /// Number of screen rows currently stored.
    #[cfg(test)]
    pub async fn screen_count(&self) -> usize {
        self.tables.read().await.screens.len()
    }

    /// Number of in-memory blobs stored for `kind`.
    #[cfg(test)]
    pub async fn blob_count(&self, kind: AssetKind) -> usize {
        self.tables.read().await.blobs.keys().filter(|(k, _)| *k == kind).count()
    }

    /// Insert a metadata row directly, bypassing the upload protocol.
    #[cfg(test)]
    pub async fn seed_asset(&self, kind: AssetKind, url: &str, name: Option<&str>) -> AssetRow {
        self.push_asset(kind, url, name).await
    }

    async fn push_asset(&self, kind: AssetKind, url: &str, name: Option<&str>) -> AssetRow {
        let row = AssetRow {
            id: Uuid::new_v4(),
            url: url.to_owned(),
            name: name.map(str::to_owned),
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables.write().await.assets_mut(kind).push(row.clone());
        row
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_draft(screen: &mut Screen, draft: &ScreenDraft) {
    if let Some(bg) = draft.background_image_id {
        screen.background_image_id = bg;
    }
    if let Some(button) = draft.button_image_id {
        screen.button_image_id = button;
    }
    if let Some(font) = draft.font_id {
        screen.font_id = font;
    }
}

#[async_trait::async_trait]
impl DesignBackend for MemoryBackend {
    async fn list_assets(&self, kind: AssetKind) -> Result<Vec<AssetRow>, BackendError> {
        self.check(Fault::ListAssets)?;
        let tables = self.tables.read().await;
        // Rows are appended in creation order.
        Ok(tables.assets(kind).iter().rev().cloned().collect())
    }

    async fn put_object(&self, kind: AssetKind, key: &str, bytes: &[u8]) -> Result<(), BackendError> {
        self.check(Fault::PutObject)?;
        if let Some(storage) = &self.storage {
            storage.put(kind, key, bytes).await?;
            return Ok(());
        }
        self.tables.write().await.blobs.insert((kind, key.to_owned()), bytes.to_vec());
        Ok(())
    }

    fn public_url(&self, kind: AssetKind, key: &str) -> String {
        match &self.storage {
            Some(storage) => storage.public_url(kind, key),
            None => format!("memory://{}/{key}", kind.bucket()),
        }
    }

    async fn insert_asset(&self, kind: AssetKind, url: &str, name: &str) -> Result<AssetRow, BackendError> {
        self.check(Fault::InsertAsset)?;
        Ok(self.push_asset(kind, url, Some(name)).await)
    }

    async fn first_screen(&self) -> Result<Option<Screen>, BackendError> {
        self.check(Fault::ScreenLookup)?;
        let tables = self.tables.read().await;
        Ok(tables
            .screens
            .iter()
            .max_by_key(|record| record.created_at)
            .map(|record| record.screen.clone()))
    }

    async fn first_screen_id(&self) -> Result<Option<Uuid>, BackendError> {
        self.check(Fault::ScreenLookup)?;
        Ok(self.tables.read().await.screens.first().map(|record| record.screen.id))
    }

    async fn update_screen(
        &self,
        id: Uuid,
        draft: &ScreenDraft,
        updated_at: OffsetDateTime,
    ) -> Result<Screen, BackendError> {
        self.check(Fault::ScreenWrite)?;
        let mut tables = self.tables.write().await;
        let record = tables
            .screens
            .iter_mut()
            .find(|record| record.screen.id == id)
            .ok_or(BackendError::NotFound(id))?;
        apply_draft(&mut record.screen, draft);
        record.screen.updated_at = Some(updated_at);
        Ok(record.screen.clone())
    }

    async fn insert_screen(&self, draft: &ScreenDraft, updated_at: OffsetDateTime) -> Result<Screen, BackendError> {
        self.check(Fault::ScreenWrite)?;
        let mut screen = Screen {
            id: Uuid::new_v4(),
            background_image_id: None,
            button_image_id: None,
            font_id: None,
            updated_at: Some(updated_at),
        };
        apply_draft(&mut screen, draft);
        self.tables
            .write()
            .await
            .screens
            .push(ScreenRecord { screen: screen.clone(), created_at: OffsetDateTime::now_utc() });
        Ok(screen)
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
