//! Domain records shared by the store clients, the renderer, and the routes.
//!
//! DESIGN
//! ======
//! Assets are stored as generic `AssetRow`s and lifted into strongly typed
//! `ImageItem` / `FontItem` values through the `Asset` trait, so one store
//! client implementation serves both kinds. The screen working copy is a
//! `ScreenDraft` whose fields distinguish "absent" from "explicitly cleared".

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// ASSET KIND
// =============================================================================

/// The two asset families. Each owns one metadata table and one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Image,
    Font,
}

impl AssetKind {
    /// Metadata table name.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Font => "fonts",
        }
    }

    /// Object storage bucket name.
    #[must_use]
    pub fn bucket(self) -> &'static str {
        // Buckets and tables share names.
        self.table()
    }
}

/// A metadata row as stored, before it is lifted into a typed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRow {
    pub id: Uuid,
    pub url: String,
    pub name: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Typed view over an `AssetRow`.
pub trait Asset: Clone + Send + Sync + Serialize + 'static {
    const KIND: AssetKind;

    fn from_row(row: AssetRow) -> Self;
    fn id(&self) -> Uuid;
    fn url(&self) -> &str;

    /// Name recorded in the metadata row for an upload of `original_name`.
    fn registered_name(original_name: &str) -> String;
}

// =============================================================================
// IMAGES + FONTS
// =============================================================================

/// An uploaded image. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageItem {
    pub id: Uuid,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Asset for ImageItem {
    const KIND: AssetKind = AssetKind::Image;

    fn from_row(row: AssetRow) -> Self {
        Self { id: row.id, url: row.url, name: row.name }
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn registered_name(original_name: &str) -> String {
        original_name.to_owned()
    }
}

/// An uploaded font. `name` is the family name the font registers under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontItem {
    pub id: Uuid,
    pub url: String,
    pub name: String,
}

impl Asset for FontItem {
    const KIND: AssetKind = AssetKind::Font;

    fn from_row(row: AssetRow) -> Self {
        Self { id: row.id, url: row.url, name: row.name.unwrap_or_default() }
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn registered_name(original_name: &str) -> String {
        sanitize_font_name(original_name)
    }
}

const UNTITLED_FONT: &str = "Untitled Font";

/// Derive a font family name from an uploaded filename.
///
/// Strips the last extension, turns `-` / `_` separators into spaces and
/// collapses whitespace: `"My_Font-Bold.ttf"` becomes `"My Font Bold"`.
#[must_use]
pub fn sanitize_font_name(original_name: &str) -> String {
    let stem = match original_name.rfind('.') {
        Some(idx) if idx > 0 => &original_name[..idx],
        _ => original_name,
    };
    let cleaned = stem
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.is_empty() { UNTITLED_FONT.to_owned() } else { cleaned }
}

// =============================================================================
// SCREEN
// =============================================================================

/// The persisted sign-in screen configuration. At most one row exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub id: Uuid,
    pub background_image_id: Option<Uuid>,
    pub button_image_id: Option<Uuid>,
    pub font_id: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// In-memory working copy of the screen.
///
/// Outer `None` means the field was never set in this session; `Some(None)`
/// means it was explicitly cleared. Absent fields are left alone on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub background_image_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub button_image_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub font_id: Option<Option<Uuid>>,
}

impl ScreenDraft {
    /// Selected background, treating absent and cleared alike.
    #[must_use]
    pub fn background_image_id(&self) -> Option<Uuid> {
        self.background_image_id.flatten()
    }

    #[must_use]
    pub fn button_image_id(&self) -> Option<Uuid> {
        self.button_image_id.flatten()
    }

    #[must_use]
    pub fn font_id(&self) -> Option<Uuid> {
        self.font_id.flatten()
    }

    /// Shallow-merge every field present in `patch` into `self`.
    pub fn merge(&mut self, patch: ScreenDraft) {
        if patch.id.is_some() {
            self.id = patch.id;
        }
        if patch.background_image_id.is_some() {
            self.background_image_id = patch.background_image_id;
        }
        if patch.button_image_id.is_some() {
            self.button_image_id = patch.button_image_id;
        }
        if patch.font_id.is_some() {
            self.font_id = patch.font_id;
        }
    }
}

impl From<Screen> for ScreenDraft {
    fn from(screen: Screen) -> Self {
        Self {
            id: Some(screen.id),
            background_image_id: Some(screen.background_image_id),
            button_image_id: Some(screen.button_image_id),
            font_id: Some(screen.font_id),
        }
    }
}

/// A JSON key that is present deserializes to `Some(..)`, even when `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
