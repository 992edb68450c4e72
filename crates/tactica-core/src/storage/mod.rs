//! Storage abstraction for persisted diagrams.
//!
//! A diagram is stored as two records under the same id: its metadata
//! ([`Diagram`]) and its attached geometry ([`RawBoard`]). Backends must
//! write and delete the pair together.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::board::RawBoard;
use crate::catalog::{Diagram, DiagramId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Diagram not found: {0}")]
    NotFound(DiagramId),
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

/// Trait for diagram storage backends.
pub trait Storage: Send + Sync {
    /// Write metadata and geometry of a diagram.
    fn save(&self, diagram: &Diagram, board: &RawBoard) -> BoxFuture<'_, StorageResult<()>>;

    /// Replace the metadata of an existing diagram, keeping its geometry.
    fn save_metadata(&self, diagram: &Diagram) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the metadata of a diagram.
    fn load_metadata(&self, id: DiagramId) -> BoxFuture<'_, StorageResult<Diagram>>;

    /// Load the geometry attached to a diagram.
    fn load_board(&self, id: DiagramId) -> BoxFuture<'_, StorageResult<RawBoard>>;

    /// Delete a diagram together with its geometry.
    fn delete(&self, id: DiagramId) -> BoxFuture<'_, StorageResult<()>>;

    /// Metadata of every stored diagram.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<Diagram>>>;
}

#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
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
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
