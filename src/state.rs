//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the one editor session; the editor in turn owns its store clients,
//! all built over the same backend.

use std::sync::Arc;

use crate::backend::DesignBackend;
use crate::services::assets::AssetStore;
use crate::services::editor::EditorShell;
use crate::services::fonts::{FontRegistry, FontSource};
use crate::services::screens::ScreenStore;

/// Shared application state. Clone is required by Axum; the editor is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub editor: Arc<EditorShell>,
}

impl AppState {
    #[must_use]
    pub fn new(backend: Arc<dyn DesignBackend>, font_source: Arc<dyn FontSource>) -> Self {
        let editor = EditorShell::new(
            AssetStore::new(backend.clone()),
            AssetStore::new(backend.clone()),
            ScreenStore::new(backend),
            FontRegistry::new(font_source),
        );
        Self { editor: Arc::new(editor) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
