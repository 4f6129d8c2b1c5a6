//! Screen store client: load and save the single screen row.
//!
//! DESIGN
//! ======
//! Save is check-then-act: look up the existing row id, then update it or
//! insert a new row. A concurrent save from another session can slip
//! between the two steps; the Postgres backend absorbs that with its
//! singleton constraint, the protocol itself does not lock.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;

use crate::backend::{BackendError, DesignBackend};
use crate::model::{Screen, ScreenDraft};

#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("screen load failed: {0}")]
    Fetch(#[source] BackendError),
    #[error("screen save failed: {0}")]
    Save(#[source] BackendError),
}

#[derive(Clone)]
pub struct ScreenStore {
    backend: Arc<dyn DesignBackend>,
}

impl ScreenStore {
    #[must_use]
    pub fn new(backend: Arc<dyn DesignBackend>) -> Self {
        Self { backend }
    }

    /// Load the configured screen, or an empty draft when none exists yet.
    ///
    /// # Errors
    ///
    /// Returns `Fetch` if the backend query fails.
    pub async fn load(&self) -> Result<ScreenDraft, ScreenError> {
        let screen = self.backend.first_screen().await.map_err(ScreenError::Fetch)?;
        Ok(screen.map(ScreenDraft::from).unwrap_or_default())
    }

    /// Persist `draft` as the single screen row.
    ///
    /// # Errors
    ///
    /// Returns `Save` if either the lookup or the write fails.
    pub async fn save(&self, draft: &ScreenDraft) -> Result<Screen, ScreenError> {
        let existing = self
            .backend
            .first_screen_id()
            .await
            .map_err(ScreenError::Save)?;
        let updated_at = OffsetDateTime::now_utc();

        let screen = match existing {
            Some(id) => self.backend.update_screen(id, draft, updated_at).await,
            None => self.backend.insert_screen(draft, updated_at).await,
        }
        .map_err(ScreenError::Save)?;

        info!(id = %screen.id, inserted = existing.is_none(), "screen saved");
        Ok(screen)
    }
}

#[cfg(test)]
#[path = "screens_test.rs"]
mod tests;
