//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::board::RawBoard;
use crate::catalog::{Diagram, DiagramId};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
///
/// Metadata and geometry live in one map entry, so saves and deletes of the
/// pair are atomic.
#[derive(Default)]
pub struct MemoryStorage {
    diagrams: RwLock<HashMap<DiagramId, (Diagram, RawBoard)>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, diagram: &Diagram, board: &RawBoard) -> BoxFuture<'_, StorageResult<()>> {
        let diagram = diagram.clone();
        let board = board.clone();
        Box::pin(async move {
            let mut map = self.diagrams.write().map_err(lock_error)?;
            map.insert(diagram.id, (diagram, board));
            Ok(())
        })
    }

    fn save_metadata(&self, diagram: &Diagram) -> BoxFuture<'_, StorageResult<()>> {
        let diagram = diagram.clone();
        Box::pin(async move {
            let mut map = self.diagrams.write().map_err(lock_error)?;
            let entry = map
                .get_mut(&diagram.id)
                .ok_or(StorageError::NotFound(diagram.id))?;
            entry.0 = diagram;
            Ok(())
        })
    }

    fn load_metadata(&self, id: DiagramId) -> BoxFuture<'_, StorageResult<Diagram>> {
        Box::pin(async move {
            let map = self.diagrams.read().map_err(lock_error)?;
            map.get(&id)
                .map(|(d, _)| d.clone())
                .ok_or(StorageError::NotFound(id))
        })
    }

    fn load_board(&self, id: DiagramId) -> BoxFuture<'_, StorageResult<RawBoard>> {
        Box::pin(async move {
            let map = self.diagrams.read().map_err(lock_error)?;
            map.get(&id)
                .map(|(_, b)| b.clone())
                .ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: DiagramId) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let mut map = self.diagrams.write().map_err(lock_error)?;
            map.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<Diagram>>> {
        Box::pin(async move {
            let map = self.diagrams.read().map_err(lock_error)?;
            Ok(map.values().map(|(d, _)| d.clone()).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let diagram = Diagram::new("Press", "coach-1", "Coach");
        let board = RawBoard {
            items: vec![serde_json::json!({ "marker": 1 })],
            drawings: vec![],
        };

        block_on(storage.save(&diagram, &board)).unwrap();
        assert_eq!(block_on(storage.load_metadata(diagram.id)).unwrap(), diagram);
        assert_eq!(block_on(storage.load_board(diagram.id)).unwrap(), board);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let id = DiagramId::new_v4();
        assert!(matches!(
            block_on(storage.load_board(id)),
            Err(StorageError::NotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn test_metadata_update_keeps_board() {
        let storage = MemoryStorage::new();
        let mut diagram = Diagram::new("Press", "coach-1", "Coach");
        let board = RawBoard::default();
        block_on(storage.save(&diagram, &board)).unwrap();

        diagram.name = "High press".into();
        block_on(storage.save_metadata(&diagram)).unwrap();
        assert_eq!(block_on(storage.load_metadata(diagram.id)).unwrap().name, "High press");
        assert_eq!(block_on(storage.load_board(diagram.id)).unwrap(), board);
    }

    #[test]
    fn test_delete_removes_both() {
        let storage = MemoryStorage::new();
        let diagram = Diagram::new("Press", "coach-1", "Coach");
        block_on(storage.save(&diagram, &RawBoard::default())).unwrap();
        block_on(storage.delete(diagram.id)).unwrap();

        assert!(block_on(storage.load_metadata(diagram.id)).is_err());
        assert!(block_on(storage.load_board(diagram.id)).is_err());
        assert!(block_on(storage.list()).unwrap().is_empty());
    }
}
