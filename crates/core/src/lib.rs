pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod scanner;
pub mod store;
pub mod view;

use std::path::Path;

use codec::ExportDocument;
use config::GalleryConfig;
use domain::*;
use error::Result;
use store::PhotoStore;
use view::GalleryView;

/// Callback events for ingesting files.
pub enum IngestProgress {
    /// A file was stored.
    Added { id: i64, name: String },
    /// A file was ignored because it is not an image.
    Skipped { name: String, mime_type: String },
    /// Ingest finished.
    Complete { added: usize, skipped: usize },
}

/// The main entry point: a photo store paired with the view that renders it.
///
/// Every successful mutation is followed by a full reload of the view.
/// A failed mutation leaves the view as it was; call [`Gallery::reload`]
/// to resynchronize.
///
/// A mutation that returns [`Error::Database`](error::Error::Database) from
/// its reload has already committed: the store holds the change and only the
/// view is stale. Write failures are always reported as
/// [`Error::Write`](error::Error::Write) and commit nothing.
pub struct Gallery {
    store: PhotoStore,
    view: GalleryView,
}

impl Gallery {
    /// Open the store described by `config` and load the initial snapshot.
    pub fn open(config: &GalleryConfig) -> Result<Self> {
        let store = PhotoStore::open(config)?;
        Self::new(store, GalleryView::new())
    }

    /// Open a gallery at the given database path.
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(&GalleryConfig::at(path))
    }

    /// Assemble a gallery from an opened store and a caller-owned view.
    pub fn new(store: PhotoStore, view: GalleryView) -> Result<Self> {
        let mut gallery = Self { store, view };
        gallery.reload()?;
        Ok(gallery)
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    pub fn view(&self) -> &GalleryView {
        &self.view
    }

    /// Hand the view back to the caller.
    pub fn into_parts(self) -> (PhotoStore, GalleryView) {
        (self.store, self.view)
    }

    /// Re-read the whole collection into the view.
    pub fn reload(&mut self) -> Result<()> {
        self.view.load(&self.store)
    }

    /// Set the search term; the visible set is recomputed from the snapshot.
    pub fn search(&mut self, term: &str) -> impl Iterator<Item = &PhotoRecord> + '_ {
        self.view.set_filter(term);
        self.view.visible()
    }

    pub fn visible(&self) -> impl Iterator<Item = &PhotoRecord> + '_ {
        self.view.visible()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Store one photo and return its id. See the type docs for how a
    /// failed reload after a committed write is reported.
    pub fn add(&mut self, photo: &NewPhoto) -> Result<i64> {
        let id = self.store.add(photo)?;
        self.reload()?;
        Ok(id)
    }

    /// Store every image among `files`, one transaction per file, in order.
    /// Non-images are skipped. Reloads once at the end if anything was stored.
    ///
    /// If a file fails to store, the ones before it stay committed and the
    /// error is returned without reloading.
    pub fn ingest(
        &mut self,
        files: Vec<IncomingFile>,
        mut progress_cb: Option<&mut dyn FnMut(IngestProgress)>,
    ) -> Result<usize> {
        let (images, others): (Vec<_>, Vec<_>) = files.into_iter().partition(|f| f.is_image());

        for file in &others {
            log::warn!("ignoring {:?}: {:?} is not an image type", file.name, file.mime_type);
            if let Some(ref mut cb) = progress_cb {
                cb(IngestProgress::Skipped {
                    name: file.name.clone(),
                    mime_type: file.mime_type.clone(),
                });
            }
        }

        let mut added = 0usize;
        for file in images {
            let name = file.name.clone();
            let id = self.store.add(&NewPhoto::from_file(file, now_millis()))?;
            added += 1;
            if let Some(ref mut cb) = progress_cb {
                cb(IngestProgress::Added { id, name });
            }
        }

        if added > 0 {
            self.reload()?;
        }

        if let Some(ref mut cb) = progress_cb {
            cb(IngestProgress::Complete {
                added,
                skipped: others.len(),
            });
        }
        Ok(added)
    }

    /// Ingest every image found under `dir`.
    pub fn ingest_dir(
        &mut self,
        dir: &Path,
        progress_cb: Option<&mut dyn FnMut(IngestProgress)>,
    ) -> Result<usize> {
        let files = scanner::scan_directory(dir)?;
        self.ingest(files, progress_cb)
    }

    /// Remove one photo. Deleting an unknown id is not an error.
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let removed = self.store.delete(id)?;
        self.reload()?;
        Ok(removed)
    }

    /// Remove every photo.
    pub fn clear(&mut self) -> Result<usize> {
        let removed = self.store.clear()?;
        self.reload()?;
        Ok(removed)
    }

    // ── Export / import ──────────────────────────────────────────────

    /// Build the interchange document from the store (not the snapshot).
    pub fn export_document(&self) -> Result<ExportDocument> {
        let records = self.store.all()?;
        let document = codec::encode(&records);
        log::info!("exported {} photos", document.items.len());
        Ok(document)
    }

    pub fn export_json(&self) -> Result<String> {
        codec::to_json(&self.export_document()?)
    }

    /// Write the export to `dir` under a timestamped name and return its path.
    pub fn export_to_dir(&self, dir: &Path) -> Result<std::path::PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(codec::default_export_file_name(chrono::Utc::now()));
        self.export_to_file(&path)?;
        Ok(path)
    }

    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.export_json()?)?;
        Ok(())
    }

    /// Add every item of an interchange document as a new photo. Ids in
    /// the document are ignored; import never overwrites or deduplicates.
    /// The document is fully decoded before anything is written.
    pub fn import_json(&mut self, text: &str) -> Result<usize> {
        let photos = codec::decode(text)?;
        let ids = self.store.bulk_add(&photos)?;
        log::info!("imported {} photos", ids.len());
        self.reload()?;
        Ok(ids.len())
    }

    pub fn import_file(&mut self, path: &Path) -> Result<usize> {
        let text = std::fs::read_to_string(path)?;
        self.import_json(&text)
    }
}
