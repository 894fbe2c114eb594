//! Auto-save of the canvas collection.
//!
//! The editor only flips a dirty flag on committed mutations. The host
//! forwards it here and awaits [`AutoSaveManager::maybe_save`] off the
//! interaction path.

use crate::collection::CanvasCollection;
use crate::editor::Editor;
use crate::storage::{
    CANVASES_KEY, FileStorage, Storage, StorageResult, load_persisted_state, save_persisted_state,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum time between two saves. Zero saves after every committed
/// mutation.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::ZERO;

/// Manages automatic persistence of the canvas collection.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    /// Whether there are unsaved changes.
    dirty: bool,
}

impl<S: Storage> AutoSaveManager<S> {
    /// Create a new auto-save manager with the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: DEFAULT_AUTOSAVE_INTERVAL,
            last_save: None,
            dirty: false,
        }
    }

    /// Set the minimum interval between saves.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the collection as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Pull the editor's dirty flag into this manager.
    pub fn track(&mut self, editor: &mut Editor) {
        if editor.take_dirty() {
            self.mark_dirty();
        }
    }

    /// Check if a save is due (dirty and the interval has elapsed).
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if needed. Returns true if a save was performed.
    pub async fn maybe_save(&mut self, collection: &CanvasCollection) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(collection).await?;
        Ok(true)
    }

    /// Save immediately.
    pub async fn save(&mut self, collection: &CanvasCollection) -> StorageResult<()> {
        if let Err(e) = save_persisted_state(self.storage.as_ref(), collection).await {
            log::warn!("Auto-save failed: {}", e);
            return Err(e);
        }
        self.last_save = Some(Instant::now());
        self.dirty = false;
        Ok(())
    }

    /// Load the persisted collection, or a fresh one if nothing was saved.
    pub async fn restore(&mut self) -> StorageResult<CanvasCollection> {
        let collection = load_persisted_state(self.storage.as_ref()).await?;
        self.dirty = false;
        self.last_save = Some(Instant::now());
        Ok(collection)
    }

    /// Whether a persisted collection exists.
    pub async fn has_saved_state(&self) -> StorageResult<bool> {
        self.storage.exists(CANVASES_KEY).await
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

/// Create an auto-save manager backed by files in the platform data dir.
pub fn create_autosave_manager() -> StorageResult<AutoSaveManager<FileStorage>> {
    let storage = FileStorage::default_location()?;
    Ok(AutoSaveManager::new(Arc::new(storage)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ImportedImage;
    use crate::settings::EngineSettings;
    use crate::storage::{MemoryStorage, block_on};

    #[test]
    fn test_autosave_manager_creation() {
        let manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
    }

    #[test]
    fn test_autosave_tracks_editor_mutations() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        let mut editor = Editor::default();

        manager.track(&mut editor);
        assert!(!manager.is_dirty());

        editor.import_images(&[ImportedImage::new("a.png", 10.0, 10.0)]);
        manager.track(&mut editor);
        assert!(manager.should_save());

        assert!(block_on(manager.maybe_save(editor.collection())).unwrap());
        assert!(!manager.is_dirty());
        assert!(!block_on(manager.maybe_save(editor.collection())).unwrap());
    }

    #[test]
    fn test_autosave_interval_debounces() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        manager.set_interval(Duration::from_secs(3600));
        let collection = CanvasCollection::new();

        manager.mark_dirty();
        block_on(manager.save(&collection)).unwrap();
        manager.mark_dirty();
        assert!(!manager.should_save());
    }

    #[test]
    fn test_autosave_restore() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage.clone());
        let mut editor = Editor::default();
        editor.create_canvas(Some("Restored"));
        block_on(manager.save(editor.collection())).unwrap();

        let mut manager2 = AutoSaveManager::new(storage);
        assert!(block_on(manager2.has_saved_state()).unwrap());
        let collection = block_on(manager2.restore()).unwrap();
        let editor = Editor::with_collection(collection, EngineSettings::default());
        assert_eq!(editor.canvas().name, "Restored");
    }
}
