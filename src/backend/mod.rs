//! Backend seam: database tables plus object storage behind one trait.
//!
//! ARCHITECTURE
//! ============
//! Store clients compose these primitives into the upload and save
//! protocols; they never talk to Postgres or the filesystem directly. The
//! Postgres implementation backs the running service, the in-memory one
//! backs tests and pool-less local runs.

pub mod memory;
pub mod postgres;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{AssetKind, AssetRow, Screen, ScreenDraft};

pub use memory::MemoryBackend;
pub use postgres::PgBackend;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("row not found: {0}")]
    NotFound(Uuid),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Everything the designer needs from its remote store.
#[async_trait::async_trait]
pub trait DesignBackend: Send + Sync {
    /// All asset rows of `kind`, newest first.
    async fn list_assets(&self, kind: AssetKind) -> Result<Vec<AssetRow>, BackendError>;

    /// Write a blob into the bucket for `kind`.
    async fn put_object(&self, kind: AssetKind, key: &str, bytes: &[u8]) -> Result<(), BackendError>;

    /// Public URL of an already-written object.
    fn public_url(&self, kind: AssetKind, key: &str) -> String;

    /// Insert one metadata row and return it as stored.
    async fn insert_asset(&self, kind: AssetKind, url: &str, name: &str) -> Result<AssetRow, BackendError>;

    /// The configured screen, if any (limit 1, newest first).
    async fn first_screen(&self) -> Result<Option<Screen>, BackendError>;

    /// Just the id of the configured screen, if any.
    async fn first_screen_id(&self) -> Result<Option<Uuid>, BackendError>;

    /// Write the present fields of `draft` onto row `id`.
    async fn update_screen(
        &self,
        id: Uuid,
        draft: &ScreenDraft,
        updated_at: OffsetDateTime,
    ) -> Result<Screen, BackendError>;

    /// Insert `draft` as the screen row; absent fields are stored as NULL.
    async fn insert_screen(&self, draft: &ScreenDraft, updated_at: OffsetDateTime) -> Result<Screen, BackendError>;
}
