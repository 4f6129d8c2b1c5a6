//! Editor shell: owns the working screen and the session's status flags.
//!
//! DESIGN
//! ======
//! The shell is constructed with its store clients and font registry; it
//! holds no global state. Pickers merge one field at a time into the
//! working draft. Save snapshots the draft, so edits that land while a save
//! is in flight go out with the next save.
//!
//! ERROR HANDLING
//! ==============
//! Store errors stop here: each is logged with its detail and replaced by a
//! generic notification. A failed initial load still unblocks the editor
//! with an empty draft.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::model::{FontItem, ImageItem, Screen, ScreenDraft};
use crate::services::assets::{AssetError, AssetStore};
use crate::services::fonts::{FontLoadStatus, FontRegistry, RegisteredFace};
use crate::services::preview::{self, PreviewTree};
use crate::services::screens::{ScreenError, ScreenStore};

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_millis(6000);

const MSG_SAVED: &str = "Screen saved successfully!";
const MSG_SAVE_FAILED: &str = "Failed to save screen. Please try again.";
const MSG_LOAD_FAILED: &str = "Failed to load screen. Please refresh the page.";
const MSG_UPLOAD_FAILED: &str = "Failed to upload file. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("editor busy: {0}")]
    Busy(&'static str),
    #[error(transparent)]
    Screen(#[from] ScreenError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone)]
struct QueuedNotification {
    id: u64,
    severity: Severity,
    message: &'static str,
    shown_at: Option<Instant>,
}

/// The notification currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
    pub remaining_ms: u64,
}

// =============================================================================
// VIEW
// =============================================================================

/// Everything a client needs to draw the editor.
#[derive(Debug, Clone, Serialize)]
pub struct EditorView {
    pub initial_loading: bool,
    pub saving: bool,
    pub screen: ScreenDraft,
    pub notification: Option<Notification>,
    pub images: Vec<ImageItem>,
    pub fonts: Vec<FontItem>,
    pub uploading_image: bool,
    pub uploading_font: bool,
    pub font_status: Vec<FontStatusEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontStatusEntry {
    pub id: Uuid,
    pub name: String,
    pub status: Option<FontLoadStatus>,
}

// =============================================================================
// SHELL
// =============================================================================

pub struct EditorShell {
    images: AssetStore<ImageItem>,
    fonts: AssetStore<FontItem>,
    screens: ScreenStore,
    registry: FontRegistry,
    working: RwLock<ScreenDraft>,
    initial_loading: AtomicBool,
    saving: AtomicBool,
    notifications: Mutex<VecDeque<QueuedNotification>>,
    next_notification_id: AtomicU64,
}

/// Clears the flag it guards however the guarded call ends.
struct FlagGuard<'a>(&'a AtomicBool);

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl EditorShell {
    #[must_use]
    pub fn new(
        images: AssetStore<ImageItem>,
        fonts: AssetStore<FontItem>,
        screens: ScreenStore,
        registry: FontRegistry,
    ) -> Self {
        Self {
            images,
            fonts,
            screens,
            registry,
            working: RwLock::new(ScreenDraft::default()),
            initial_loading: AtomicBool::new(true),
            saving: AtomicBool::new(false),
            notifications: Mutex::new(VecDeque::new()),
            next_notification_id: AtomicU64::new(1),
        }
    }

    /// Load asset lists and the persisted screen, then register fonts.
    ///
    /// `initial_loading` clears as soon as the screen load resolves, either
    /// way; font downloads happen after that and never hold the gate.
    pub async fn initialize(&self) {
        let fonts = {
            let _loading = FlagGuard(&self.initial_loading);

            let (images, fonts, screen) =
                tokio::join!(self.images.refresh(), self.fonts.refresh(), self.screens.load());
            if let Err(e) = images {
                warn!(error = %e, "initial image list fetch failed");
            }
            match screen {
                Ok(draft) => {
                    info!(id = ?draft.id, "screen loaded");
                    *self.working.write().await = draft;
                }
                Err(e) => {
                    error!(error = %e, "screen load failed");
                    self.notify(Severity::Error, MSG_LOAD_FAILED).await;
                }
            }
            fonts
        };

        match fonts {
            Ok(fonts) => {
                let report = self.registry.sync(&fonts).await;
                info!(loaded = report.loaded, failed = report.failed, "initial font sync");
            }
            Err(e) => warn!(error = %e, "initial font list fetch failed"),
        }
    }

    #[must_use]
    pub fn is_initial_loading(&self) -> bool {
        self.initial_loading.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    pub async fn working(&self) -> ScreenDraft {
        self.working.read().await.clone()
    }

    // -------------------------------------------------------------------------
    // Pickers
    // -------------------------------------------------------------------------

    /// Merge `patch` into the working draft, field by field.
    pub async fn apply(&self, patch: ScreenDraft) -> ScreenDraft {
        let mut working = self.working.write().await;
        // The row id is owned by the store, never by a picker.
        working.merge(ScreenDraft { id: None, ..patch });
        working.clone()
    }

    pub async fn select_background(&self, image_id: Option<Uuid>) -> ScreenDraft {
        self.apply(ScreenDraft { background_image_id: Some(image_id), ..ScreenDraft::default() }).await
    }

    pub async fn select_button(&self, image_id: Option<Uuid>) -> ScreenDraft {
        self.apply(ScreenDraft { button_image_id: Some(image_id), ..ScreenDraft::default() }).await
    }

    pub async fn select_font(&self, font_id: Uuid) -> ScreenDraft {
        self.apply(ScreenDraft { font_id: Some(Some(font_id)), ..ScreenDraft::default() }).await
    }

    // -------------------------------------------------------------------------
    // Uploads
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns the store error after queueing a generic notification.
    pub async fn upload_image(&self, bytes: &[u8], original_name: &str) -> Result<ImageItem, EditorError> {
        match self.images.upload(bytes, original_name).await {
            Ok(image) => Ok(image),
            Err(e) => {
                error!(error = %e, file = original_name, "image upload failed");
                self.notify(Severity::Error, MSG_UPLOAD_FAILED).await;
                Err(e.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns the store error after queueing a generic notification.
    pub async fn upload_font(&self, bytes: &[u8], original_name: &str) -> Result<FontItem, EditorError> {
        match self.fonts.upload(bytes, original_name).await {
            Ok(font) => {
                let fonts = self.fonts.items().await;
                let report = self.registry.sync(&fonts).await;
                if report.failed > 0 {
                    warn!(font = %font.name, failed = report.failed, "font sync after upload had failures");
                }
                Ok(font)
            }
            Err(e) => {
                error!(error = %e, file = original_name, "font upload failed");
                self.notify(Severity::Error, MSG_UPLOAD_FAILED).await;
                Err(e.into())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Save
    // -------------------------------------------------------------------------

    /// Persist the working draft as it is right now.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while the initial load or another save is running, or
    /// the store error (after queueing a notification). The working draft is
    /// never modified by a save.
    pub async fn save(&self) -> Result<Screen, EditorError> {
        if self.is_initial_loading() {
            return Err(EditorError::Busy("initial load in progress"));
        }
        if self.saving.swap(true, Ordering::SeqCst) {
            return Err(EditorError::Busy("save in progress"));
        }
        let _saving = FlagGuard(&self.saving);

        let snapshot = self.working.read().await.clone();
        match self.screens.save(&snapshot).await {
            Ok(screen) => {
                self.notify(Severity::Success, MSG_SAVED).await;
                Ok(screen)
            }
            Err(e) => {
                error!(error = %e, "screen save failed");
                self.notify(Severity::Error, MSG_SAVE_FAILED).await;
                Err(e.into())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------

    async fn notify(&self, severity: Severity, message: &'static str) {
        let id = self.next_notification_id.fetch_add(1, Ordering::SeqCst);
        self.notifications
            .lock()
            .await
            .push_back(QueuedNotification { id, severity, message, shown_at: None });
    }

    /// The notification on screen now. Expired ones are dropped first; the
    /// next queued one starts its countdown when it is first returned.
    pub async fn notification(&self) -> Option<Notification> {
        self.notification_at(Instant::now()).await
    }

    pub(crate) async fn notification_at(&self, now: Instant) -> Option<Notification> {
        let mut queue = self.notifications.lock().await;
        loop {
            let expired = queue
                .front()
                .and_then(|head| head.shown_at)
                .is_some_and(|shown| now.saturating_duration_since(shown) >= NOTIFICATION_TTL);
            if !expired {
                break;
            }
            queue.pop_front();
        }
        let head = queue.front_mut()?;
        let shown = *head.shown_at.get_or_insert(now);
        let remaining = NOTIFICATION_TTL.saturating_sub(now.saturating_duration_since(shown));
        Some(Notification {
            id: head.id,
            severity: head.severity,
            message: head.message.to_owned(),
            remaining_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Remove a notification. Returns whether it was queued.
    pub async fn dismiss(&self, id: u64) -> bool {
        let mut queue = self.notifications.lock().await;
        let before = queue.len();
        queue.retain(|n| n.id != id);
        queue.len() != before
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub async fn images(&self) -> Vec<ImageItem> {
        self.images.items().await
    }

    pub async fn fonts(&self) -> Vec<FontItem> {
        self.fonts.items().await
    }

    pub async fn font_status(&self) -> Vec<FontStatusEntry> {
        let statuses = self.registry.statuses().await;
        self.fonts
            .items()
            .await
            .into_iter()
            .map(|font| FontStatusEntry { status: statuses.get(&font.id).cloned(), id: font.id, name: font.name })
            .collect()
    }

    pub async fn registered_faces(&self) -> Vec<RegisteredFace> {
        self.registry.faces().await
    }

    /// Preview of the working draft against the cached asset lists.
    pub async fn preview(&self) -> (PreviewTree, Vec<FontItem>) {
        let draft = self.working().await;
        let images = self.images.items().await;
        let fonts = self.fonts.items().await;
        (preview::render(&draft, &images, &fonts), fonts)
    }

    pub async fn view(&self) -> EditorView {
        EditorView {
            initial_loading: self.is_initial_loading(),
            saving: self.is_saving(),
            screen: self.working().await,
            notification: self.notification().await,
            images: self.images.items().await,
            fonts: self.fonts.items().await,
            uploading_image: self.images.is_uploading(),
            uploading_font: self.fonts.is_uploading(),
            font_status: self.font_status().await,
        }
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
