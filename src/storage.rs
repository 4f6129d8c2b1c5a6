//! Object storage: one bucket per asset kind on the local filesystem.
//!
//! DESIGN
//! ======
//! Buckets are directories under a root (`STORAGE_DIR`). Objects are written
//! once under a random key and served read-only by the router at
//! `/storage/{bucket}/{key}`, so a public URL is known as soon as the write
//! returns.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::model::AssetKind;

/// Route prefix the router mounts the bucket root under.
pub const STORAGE_ROUTE: &str = "/storage";

const FALLBACK_EXTENSION: &str = "bin";

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a collision-resistant storage key: `<32 hex chars>.<extension>`.
///
/// The extension is whatever follows the last `.` of `original_name` (the
/// whole name when there is no dot), reduced to ASCII alphanumerics.
#[must_use]
pub fn storage_key(original_name: &str) -> String {
    let bytes: [u8; 16] = rand::rng().random();
    let raw_ext = original_name.rsplit('.').next().unwrap_or_default();
    let ext: String = raw_ext.chars().filter(char::is_ascii_alphanumeric).collect();
    let ext = if ext.is_empty() { FALLBACK_EXTENSION.to_owned() } else { ext };
    format!("{}.{ext}", bytes_to_hex(&bytes))
}

fn valid_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('.') && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}

/// Filesystem-backed bucket store.
#[derive(Debug, Clone)]
pub struct BucketStore {
    root: PathBuf,
    public_base_url: String,
}

impl BucketStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self { root: root.into(), public_base_url: public_base_url.trim_end_matches('/').to_owned() }
    }

    /// Directory served under [`STORAGE_ROUTE`].
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under `key` in the bucket for `kind`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the key is malformed or the write fails.
    pub async fn put(&self, kind: AssetKind, key: &str, bytes: &[u8]) -> std::io::Result<()> {
        if !valid_key(key) {
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("invalid storage key: {key}")));
        }
        let dir = self.root.join(kind.bucket());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(key), bytes).await
    }

    /// Publicly readable URL for an object.
    #[must_use]
    pub fn public_url(&self, kind: AssetKind, key: &str) -> String {
        format!("{}{STORAGE_ROUTE}/{}/{key}", self.public_base_url, kind.bucket())
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
