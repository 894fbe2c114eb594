//! Storage abstraction for persistence.
//!
//! The whole canvas collection is persisted as one value under
//! [`CANVASES_KEY`]. Backends store opaque JSON-serializable state by key.

mod autosave;
mod file;
mod memory;

pub use autosave::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL, create_autosave_manager};
pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::collection::CanvasCollection;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Key under which the canvas collection is stored.
pub const CANVASES_KEY: &str = "__canvases__";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("State not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Trait for persistence backends.
pub trait Storage: Send + Sync {
    /// Save a collection under `key`.
    fn save(&self, key: &str, state: &CanvasCollection) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the collection stored under `key`.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<CanvasCollection>>;

    /// Delete a stored key.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all stored keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Load the persisted canvases. A missing entry yields a fresh collection.
pub async fn load_persisted_state<S: Storage + ?Sized>(storage: &S) -> StorageResult<CanvasCollection> {
    match storage.load(CANVASES_KEY).await {
        Ok(mut collection) => {
            collection.repair();
            log::info!("Loaded {} canvas(es)", collection.len());
            Ok(collection)
        }
        Err(StorageError::NotFound(_)) => {
            log::info!("No persisted canvases, starting fresh");
            Ok(CanvasCollection::new())
        }
        Err(e) => Err(e),
    }
}

/// Persist the canvases.
pub async fn save_persisted_state<S: Storage + ?Sized>(
    storage: &S,
    collection: &CanvasCollection,
) -> StorageResult<()> {
    storage.save(CANVASES_KEY, collection).await
}

#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    // Simple blocking executor for tests
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}
