use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default name of the gallery database file (without extension).
pub const DEFAULT_DATABASE_NAME: &str = "foto-galeria";

/// Default name of the single photo collection.
pub const DEFAULT_STORE_NAME: &str = "fotos";

/// Where and how the gallery persists its collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// SQLite database file. `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,
    /// Table backing the collection; also prefixes its index names.
    pub store_name: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            store_name: DEFAULT_STORE_NAME.to_string(),
        }
    }
}

impl GalleryConfig {
    /// File-backed gallery at `path`.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            database_path: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// File-backed gallery at `<dir>/foto-galeria.sqlite`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at(dir.as_ref().join(format!("{DEFAULT_DATABASE_NAME}.sqlite")))
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = name.into();
        self
    }

    /// The store name is spliced into SQL, so only plain identifiers pass.
    pub fn validate(&self) -> Result<()> {
        let mut chars = self.store_name.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if !valid || self.store_name.starts_with("sqlite_") || self.store_name == "meta" {
            return Err(Error::InvalidStoreName(self.store_name.clone()));
        }
        Ok(())
    }
}
