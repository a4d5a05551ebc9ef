/// A photo as persisted in the collection. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRecord {
    pub id: i64,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub blob: Vec<u8>,
}

/// A photo that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub created_at: i64,
    pub blob: Vec<u8>,
}

impl NewPhoto {
    /// Build a record whose `size` is the payload's byte length.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, blob: Vec<u8>, created_at: i64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: blob.len() as u64,
            created_at,
            blob,
        }
    }

    pub fn from_file(file: IncomingFile, created_at: i64) -> Self {
        Self::new(file.name, file.mime_type, file.bytes, created_at)
    }

    /// Check the fields the store refuses to persist.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.mime_type.trim().is_empty() {
            return Err(format!("record {:?} has an empty MIME type", self.name));
        }
        if i64::try_from(self.size).is_err() {
            return Err(format!("record {:?} size {} exceeds storage range", self.name, self.size));
        }
        if self.size != self.blob.len() as u64 {
            return Err(format!(
                "record {:?} declares size {} but carries {} bytes",
                self.name,
                self.size,
                self.blob.len()
            ));
        }
        Ok(())
    }
}

impl From<&PhotoRecord> for NewPhoto {
    fn from(record: &PhotoRecord) -> Self {
        Self {
            name: record.name.clone(),
            mime_type: record.mime_type.clone(),
            size: record.size,
            created_at: record.created_at,
            blob: record.blob.clone(),
        }
    }
}

/// A raw file handed over by the UI layer (drag-drop, file picker, folder scan).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
