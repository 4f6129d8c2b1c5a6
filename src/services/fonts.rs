//! Font loading service: registers uploaded fonts as usable faces.
//!
//! DESIGN
//! ======
//! The registry is the render environment's font table: faces keyed by
//! family name plus a per-font load status. `sync` fetches every font not
//! yet registered, concurrently, and records each outcome on its own so one
//! bad font never blocks the rest.
//!
//! A font that failed is not retried until the font list changes. The
//! `@font-face` rules from [`font_face_css`] are emitted regardless, for
//! renderers that resolve fonts themselves.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::model::FontItem;

/// Family used when no font is selected or the selected one is unavailable.
pub const FALLBACK_FONT_FAMILY: &str = "Arial";

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("font fetch failed: {0}")]
    Fetch(String),
    #[error("font fetch returned status {status}")]
    Status { status: u16 },
    #[error("malformed font data: {0}")]
    Malformed(String),
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// SOURCES
// =============================================================================

/// Where font bytes come from.
#[async_trait::async_trait]
pub trait FontSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FontError>;
}

/// Fetches font files over HTTP.
pub struct HttpFontSource {
    http: reqwest::Client,
}

impl HttpFontSource {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(timeout_secs: u64) -> Result<Self, FontError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FontError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl FontSource for HttpFontSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FontError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FontError::Fetch(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FontError::Status { status });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FontError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Check the container signature of a font file (TrueType, OpenType,
/// collection, WOFF, WOFF2).
///
/// # Errors
///
/// Returns `Malformed` if the bytes do not start with a known signature.
pub fn validate_font_bytes(bytes: &[u8]) -> Result<(), FontError> {
    const SIGNATURES: [&[u8; 4]; 6] = [b"\x00\x01\x00\x00", b"OTTO", b"true", b"ttcf", b"wOFF", b"wOF2"];
    let Some(head) = bytes.get(..4) else {
        return Err(FontError::Malformed(format!("{} bytes is too short for a font", bytes.len())));
    };
    if SIGNATURES.iter().any(|sig| head == sig.as_slice()) {
        Ok(())
    } else {
        Err(FontError::Malformed(format!("unknown signature {head:02x?}")))
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FontLoadStatus {
    Loaded,
    Failed { reason: String },
}

/// A face available to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredFace {
    pub family: String,
    pub url: String,
    pub bytes: usize,
}

/// Outcome counts for one `sync` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub loaded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Default)]
struct RegistryState {
    faces: HashMap<String, RegisteredFace>,
    statuses: HashMap<Uuid, FontLoadStatus>,
    last_list: Option<Vec<Uuid>>,
}

pub struct FontRegistry {
    source: Arc<dyn FontSource>,
    state: Mutex<RegistryState>,
}

impl FontRegistry {
    #[must_use]
    pub fn new(source: Arc<dyn FontSource>) -> Self {
        Self { source, state: Mutex::new(RegistryState::default()) }
    }

    /// Load every font in `fonts` that is not registered yet.
    pub async fn sync(&self, fonts: &[FontItem]) -> SyncReport {
        let mut report = SyncReport::default();

        // PHASE: SELECT PENDING
        // WHY: decide under the lock, fetch without it.
        let pending: Vec<FontItem> = {
            let mut state = self.state.lock().await;
            let list: Vec<Uuid> = fonts.iter().map(|f| f.id).collect();
            let list_changed = state.last_list.as_ref() != Some(&list);
            state.last_list = Some(list);

            let mut pending = Vec::new();
            for font in fonts {
                if state.faces.contains_key(&font.name) {
                    state.statuses.entry(font.id).or_insert(FontLoadStatus::Loaded);
                    report.skipped += 1;
                    continue;
                }
                let failed_before = matches!(state.statuses.get(&font.id), Some(FontLoadStatus::Failed { .. }));
                if failed_before && !list_changed {
                    report.skipped += 1;
                    continue;
                }
                pending.push(font.clone());
            }
            pending
        };

        let results = join_all(pending.iter().map(|font| self.load_one(font))).await;

        let mut state = self.state.lock().await;
        for (font, result) in pending.iter().zip(results) {
            match result {
                Ok(bytes) => {
                    info!(font = %font.name, id = %font.id, bytes, "font registered");
                    state.faces.insert(
                        font.name.clone(),
                        RegisteredFace { family: font.name.clone(), url: font.url.clone(), bytes },
                    );
                    state.statuses.insert(font.id, FontLoadStatus::Loaded);
                    report.loaded += 1;
                }
                Err(e) => {
                    error!(font = %font.name, id = %font.id, error = %e, "font load failed");
                    state.statuses.insert(font.id, FontLoadStatus::Failed { reason: e.to_string() });
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn load_one(&self, font: &FontItem) -> Result<usize, FontError> {
        let bytes = self.source.fetch(&font.url).await?;
        validate_font_bytes(&bytes)?;
        Ok(bytes.len())
    }

    pub async fn is_registered(&self, family: &str) -> bool {
        self.state.lock().await.faces.contains_key(family)
    }

    pub async fn status(&self, id: Uuid) -> Option<FontLoadStatus> {
        self.state.lock().await.statuses.get(&id).cloned()
    }

    pub async fn statuses(&self) -> HashMap<Uuid, FontLoadStatus> {
        self.state.lock().await.statuses.clone()
    }

    pub async fn faces(&self) -> Vec<RegisteredFace> {
        let mut faces: Vec<RegisteredFace> = self.state.lock().await.faces.values().cloned().collect();
        faces.sort_by(|a, b| a.family.cmp(&b.family));
        faces
    }
}

// =============================================================================
// CSS
// =============================================================================

/// Quote a value for use inside a CSS double-quoted string.
pub(crate) fn css_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' | '<' | '>' => {}
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// One `@font-face` rule per font.
#[must_use]
pub fn font_face_css(fonts: &[FontItem]) -> String {
    fonts
        .iter()
        .map(|font| {
            format!(
                "@font-face {{\n  font-family: {};\n  src: url({}) format(\"truetype\");\n  font-weight: normal;\n  font-style: normal;\n}}\n",
                css_string(&font.name),
                css_string(&font.url),
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "fonts_test.rs"]
mod tests;
