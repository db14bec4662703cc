//! Persistence of the last selected mode

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use settings_store::JsonStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::model::ControllerMode;

/// Where the controller loads its startup mode from and saves transitions to
///
/// `save` is called from the blocking thread pool, never from the controller
/// task, so implementations may do ordinary blocking I/O.
pub trait ModeStore: Send + Sync {
    fn load(&self) -> Result<Option<ControllerMode>>;

    fn save(&self, mode: ControllerMode) -> Result<()>;
}

/// On-disk settings document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSettings {
    pub last_mode: ControllerMode,
}

/// `ModeStore` backed by a JSON settings file
#[derive(Debug, Clone)]
pub struct FileModeStore {
    store: JsonStore<PersistedSettings>,
}

impl FileModeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    /// Store under the user's config directory (`<config>/lumen/settings.json`)
    pub fn user_default() -> Result<Self> {
        let path = JsonStore::<PersistedSettings>::default_path("lumen", "settings.json")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &std::path::Path {
        self.store.path()
    }
}

impl ModeStore for FileModeStore {
    fn load(&self) -> Result<Option<ControllerMode>> {
        Ok(self.store.load()?.map(|settings| settings.last_mode))
    }

    fn save(&self, mode: ControllerMode) -> Result<()> {
        self.store.save(&PersistedSettings { last_mode: mode })?;
        Ok(())
    }
}

/// In-memory `ModeStore` that counts saves
#[derive(Debug, Default)]
pub struct MemoryModeStore {
    mode: Mutex<Option<ControllerMode>>,
    saves: AtomicUsize,
}

impl MemoryModeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a previously persisted mode
    pub fn with_mode(mode: ControllerMode) -> Self {
        Self {
            mode: Mutex::new(Some(mode)),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn stored(&self) -> Option<ControllerMode> {
        *self.mode.lock()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ModeStore for MemoryModeStore {
    fn load(&self) -> Result<Option<ControllerMode>> {
        Ok(*self.mode.lock())
    }

    fn save(&self, mode: ControllerMode) -> Result<()> {
        *self.mode.lock() = Some(mode);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Spawn the task that applies saves in the order they were requested
///
/// Each save runs on the blocking pool so slow storage never stalls a frame.
/// The task ends once every sender has been dropped.
pub(crate) fn spawn_mode_writer(
    store: Arc<dyn ModeStore>,
) -> (mpsc::UnboundedSender<ControllerMode>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ControllerMode>();

    let handle = tokio::spawn(async move {
        while let Some(mode) = rx.recv().await {
            let store = Arc::clone(&store);
            match tokio::task::spawn_blocking(move || store.save(mode)).await {
                Ok(Ok(())) => tracing::debug!("Persisted mode {}", mode),
                Ok(Err(e)) => tracing::warn!("Failed to persist mode {}: {}", mode, e),
                Err(e) => tracing::warn!("Mode save task failed: {}", e),
            }
        }
        tracing::debug!("Mode writer stopped");
    });

    (tx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileModeStore::new(dir.path().join("settings.json"));

        assert_eq!(store.load().unwrap(), None);

        store.save(ControllerMode::ManualLocked).unwrap();
        assert_eq!(store.load().unwrap(), Some(ControllerMode::ManualLocked));
    }

    #[test]
    fn test_file_store_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileModeStore::new(&path);

        store.save(ControllerMode::AudioRaw).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["last_mode"], "audio-raw");
    }

    #[tokio::test]
    async fn test_mode_writer_saves_in_order() {
        let store = Arc::new(MemoryModeStore::new());
        let (tx, handle) = spawn_mode_writer(store.clone());

        tx.send(ControllerMode::Manual).unwrap();
        tx.send(ControllerMode::Pattern).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(store.save_count(), 2);
        assert_eq!(store.stored(), Some(ControllerMode::Pattern));
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemoryModeStore::with_mode(ControllerMode::Pattern);
        assert_eq!(store.load().unwrap(), Some(ControllerMode::Pattern));

        store.save(ControllerMode::Manual).unwrap();
        store.save(ControllerMode::Audio).unwrap();

        assert_eq!(store.stored(), Some(ControllerMode::Audio));
        assert_eq!(store.save_count(), 2);
    }
}
