use crate::domain::PhotoRecord;
use crate::error::Result;
use crate::store::PhotoStore;

/// In-memory snapshot of the whole collection plus the active search term.
///
/// The snapshot is only ever replaced wholesale by [`GalleryView::load`];
/// there is no incremental patch path. After any store mutation the owner
/// must call `load` again before treating the view as current.
#[derive(Debug, Default, Clone)]
pub struct GalleryView {
    snapshot: Vec<PhotoRecord>,
    filter: String,
    visible: Vec<usize>,
}

impl GalleryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with `store.all()` and recompute the visible
    /// set for the active filter. On error the previous snapshot is kept.
    pub fn load(&mut self, store: &PhotoStore) -> Result<()> {
        let records = store.all()?;
        log::debug!("snapshot reloaded: {} photos", records.len());
        self.snapshot = records;
        self.recompute();
        Ok(())
    }

    /// Change the active search term and recompute the visible set.
    pub fn set_filter(&mut self, term: impl Into<String>) {
        self.filter = term.into();
        self.recompute();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn snapshot(&self) -> &[PhotoRecord] {
        &self.snapshot
    }

    /// Records matching the active filter, in snapshot (id) order.
    pub fn visible(&self) -> impl Iterator<Item = &PhotoRecord> + '_ {
        self.visible.iter().map(|&idx| &self.snapshot[idx])
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Records whose name contains `term`, ignoring case. A blank term
    /// returns the whole snapshot. Never touches the store.
    pub fn view(&self, term: &str) -> Vec<&PhotoRecord> {
        let needle = normalize(term);
        self.snapshot
            .iter()
            .filter(|record| matches(record, &needle))
            .collect()
    }

    /// Counter text for the visible set, e.g. "1 item" or "3 itens".
    pub fn summary(&self) -> String {
        match self.visible.len() {
            1 => "1 item".to_string(),
            n => format!("{n} itens"),
        }
    }

    fn recompute(&mut self) {
        let needle = normalize(&self.filter);
        self.visible = self
            .snapshot
            .iter()
            .enumerate()
            .filter(|(_, record)| matches(record, &needle))
            .map(|(idx, _)| idx)
            .collect();
    }
}

fn normalize(term: &str) -> String {
    term.trim().to_lowercase()
}

fn matches(record: &PhotoRecord, needle: &str) -> bool {
    needle.is_empty() || record.name.to_lowercase().contains(needle)
}
