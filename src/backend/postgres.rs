//! Postgres + filesystem bucket backend.
//!
//! DESIGN
//! ======
//! Metadata rows live in `images`, `fonts` and `screens`; blobs live in a
//! [`BucketStore`]. Screen writes are built with `QueryBuilder` so only the
//! fields present in a draft are touched.
//!
//! TRADE-OFFS
//! ==========
//! `insert_screen` is an `ON CONFLICT (singleton) DO UPDATE`. Two sessions
//! that both observe "no row" and both insert collapse onto one row instead
//! of violating the single-screen invariant.

use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{BackendError, DesignBackend};
use crate::model::{AssetKind, AssetRow, Screen, ScreenDraft};
use crate::storage::BucketStore;

type AssetTuple = (Uuid, String, Option<String>, OffsetDateTime);
type ScreenTuple = (Uuid, Option<Uuid>, Option<Uuid>, Option<Uuid>, Option<OffsetDateTime>);

const SCREEN_COLUMNS: &str = "id, background_image_id, button_image_id, font_id, updated_at";

fn asset_from_tuple((id, url, name, created_at): AssetTuple) -> AssetRow {
    AssetRow { id, url, name, created_at }
}

fn screen_from_tuple((id, background_image_id, button_image_id, font_id, updated_at): ScreenTuple) -> Screen {
    Screen { id, background_image_id, button_image_id, font_id, updated_at }
}

pub struct PgBackend {
    pool: PgPool,
    storage: BucketStore,
}

impl PgBackend {
    #[must_use]
    pub fn new(pool: PgPool, storage: BucketStore) -> Self {
        Self { pool, storage }
    }
}

#[async_trait::async_trait]
impl DesignBackend for PgBackend {
    async fn list_assets(&self, kind: AssetKind) -> Result<Vec<AssetRow>, BackendError> {
        let sql = format!("SELECT id, url, name, created_at FROM {} ORDER BY created_at DESC", kind.table());
        let rows = sqlx::query_as::<_, AssetTuple>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(asset_from_tuple).collect())
    }

    async fn put_object(&self, kind: AssetKind, key: &str, bytes: &[u8]) -> Result<(), BackendError> {
        self.storage.put(kind, key, bytes).await?;
        Ok(())
    }

    fn public_url(&self, kind: AssetKind, key: &str) -> String {
        self.storage.public_url(kind, key)
    }

    async fn insert_asset(&self, kind: AssetKind, url: &str, name: &str) -> Result<AssetRow, BackendError> {
        let sql = format!(
            "INSERT INTO {} (id, url, name) VALUES ($1, $2, $3) RETURNING id, url, name, created_at",
            kind.table()
        );
        let row = sqlx::query_as::<_, AssetTuple>(&sql)
            .bind(Uuid::new_v4())
            .bind(url)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(asset_from_tuple(row))
    }

    async fn first_screen(&self) -> Result<Option<Screen>, BackendError> {
        let sql = format!("SELECT {SCREEN_COLUMNS} FROM screens ORDER BY created_at DESC LIMIT 1");
        let row = sqlx::query_as::<_, ScreenTuple>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(screen_from_tuple))
    }

    async fn first_screen_id(&self) -> Result<Option<Uuid>, BackendError> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM screens LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update_screen(
        &self,
        id: Uuid,
        draft: &ScreenDraft,
        updated_at: OffsetDateTime,
    ) -> Result<Screen, BackendError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE screens SET updated_at = ");
        builder.push_bind(updated_at);
        push_present_assignments(&mut builder, draft);
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING ");
        builder.push(SCREEN_COLUMNS);

        let row = builder
            .build_query_as::<ScreenTuple>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(BackendError::NotFound(id))?;
        Ok(screen_from_tuple(row))
    }

    async fn insert_screen(&self, draft: &ScreenDraft, updated_at: OffsetDateTime) -> Result<Screen, BackendError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO screens (id, background_image_id, button_image_id, font_id, updated_at) VALUES (",
        );
        {
            let mut values = builder.separated(", ");
            values.push_bind(Uuid::new_v4());
            values.push_bind(draft.background_image_id());
            values.push_bind(draft.button_image_id());
            values.push_bind(draft.font_id());
            values.push_bind(updated_at);
        }
        builder.push(") ON CONFLICT (singleton) DO UPDATE SET updated_at = EXCLUDED.updated_at");
        // EDGE: a racing insert lost; behave like an update of the present fields.
        if draft.background_image_id.is_some() {
            builder.push(", background_image_id = EXCLUDED.background_image_id");
        }
        if draft.button_image_id.is_some() {
            builder.push(", button_image_id = EXCLUDED.button_image_id");
        }
        if draft.font_id.is_some() {
            builder.push(", font_id = EXCLUDED.font_id");
        }
        builder.push(" RETURNING ");
        builder.push(SCREEN_COLUMNS);

        let row = builder
            .build_query_as::<ScreenTuple>()
            .fetch_one(&self.pool)
            .await?;
        Ok(screen_from_tuple(row))
    }
}

fn push_present_assignments(builder: &mut QueryBuilder<'_, Postgres>, draft: &ScreenDraft) {
    if let Some(bg) = draft.background_image_id {
        builder.push(", background_image_id = ");
        builder.push_bind(bg);
    }
    if let Some(button) = draft.button_image_id {
        builder.push(", button_image_id = ");
        builder.push_bind(button);
    }
    if let Some(font) = draft.font_id {
        builder.push(", font_id = ");
        builder.push_bind(font);
    }
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "postgres_test.rs"]
mod tests;
