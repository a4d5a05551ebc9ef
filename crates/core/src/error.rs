use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage unavailable at {}: {reason}", .path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{op} failed, transaction rolled back: {reason}")]
    Write { op: &'static str, reason: String },

    #[error("invalid import document: {0}")]
    InvalidFormat(String),

    #[error("invalid store name {0:?}: expected letters, digits and underscores")]
    InvalidStoreName(String),

    #[error("store schema version {db} is newer than this build supports ({code})")]
    SchemaTooNew { db: u32, code: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl Error {
    pub(crate) fn write(op: &'static str, reason: impl ToString) -> Self {
        Error::Write {
            op,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_format(reason: impl ToString) -> Self {
        Error::InvalidFormat(reason.to_string())
    }

    /// Message suitable for showing to the person using the gallery.
    pub fn user_message(&self) -> String {
        match self {
            Error::StorageUnavailable { .. } | Error::SchemaTooNew { .. } => {
                "Local photo storage is unavailable.".to_string()
            }
            Error::Write { .. } => "Saving the gallery failed. Nothing was changed.".to_string(),
            Error::InvalidFormat(reason) => format!("Import failed: {reason}"),
            Error::InvalidStoreName(_) => "The gallery is misconfigured.".to_string(),
            Error::Database(_) => "Reading the gallery failed.".to_string(),
            Error::Io(e) => format!("File error: {e}"),
            Error::Json(_) => "Writing the export failed.".to_string(),
            Error::WalkDir(e) => format!("Could not read folder: {e}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
