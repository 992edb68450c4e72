//! File-based storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::board::RawBoard;
use crate::catalog::{Diagram, DiagramId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

const METADATA_EXT: &str = ".json";
const BOARD_EXT: &str = ".board.json";

/// File-based storage.
///
/// Each diagram is two JSON files in the base directory: `<id>.json` for
/// the metadata and `<id>.board.json` for the geometry.
pub struct FileStorage {
    /// Base directory for diagram storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/tactica/diagrams/`
    /// On Windows: `%LOCALAPPDATA%\tactica\diagrams\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("tactica").join("diagrams"))
    }

    fn metadata_path(&self, id: DiagramId) -> PathBuf {
        self.base_path.join(format!("{}{}", id, METADATA_EXT))
    }

    fn board_path(&self, id: DiagramId) -> PathBuf {
        self.base_path.join(format!("{}{}", id, BOARD_EXT))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

/// Write through a temporary file so readers never see a half-written record.
fn write_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)
        .and_then(|_| fs::rename(&tmp, path))
        .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

fn read_json<T: DeserializeOwned>(path: &Path, id: DiagramId) -> StorageResult<T> {
    if !path.exists() {
        return Err(StorageError::NotFound(id));
    }
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json).map_err(|e| {
        StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

fn remove_if_exists(path: &Path) -> StorageResult<()> {
    if path.exists() {
        fs::remove_file(path).map_err(|e| {
            StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
        })?;
    }
    Ok(())
}

impl Storage for FileStorage {
    fn save(&self, diagram: &Diagram, board: &RawBoard) -> BoxFuture<'_, StorageResult<()>> {
        let meta_path = self.metadata_path(diagram.id);
        let board_path = self.board_path(diagram.id);
        let diagram = diagram.clone();
        let board = board.clone();

        Box::pin(async move {
            // Geometry first: a metadata record never points at missing geometry.
            write_json(&board_path, &board)?;
            write_json(&meta_path, &diagram)
        })
    }

    fn save_metadata(&self, diagram: &Diagram) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.metadata_path(diagram.id);
        let diagram = diagram.clone();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(diagram.id));
            }
            write_json(&path, &diagram)
        })
    }

    fn load_metadata(&self, id: DiagramId) -> BoxFuture<'_, StorageResult<Diagram>> {
        let path = self.metadata_path(id);
        Box::pin(async move { read_json(&path, id) })
    }

    fn load_board(&self, id: DiagramId) -> BoxFuture<'_, StorageResult<RawBoard>> {
        let meta_path = self.metadata_path(id);
        let board_path = self.board_path(id);

        Box::pin(async move {
            if !meta_path.exists() {
                return Err(StorageError::NotFound(id));
            }
            read_json(&board_path, id)
        })
    }

    fn delete(&self, id: DiagramId) -> BoxFuture<'_, StorageResult<()>> {
        let meta_path = self.metadata_path(id);
        let board_path = self.board_path(id);

        Box::pin(async move {
            // Metadata first: once it is gone the diagram is gone, and a
            // leftover geometry file is never listed.
            remove_if_exists(&meta_path)?;
            remove_if_exists(&board_path)
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<Diagram>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut diagrams = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if !name.ends_with(METADATA_EXT) || name.ends_with(BOARD_EXT) {
                    continue;
                }
                let json = match fs::read_to_string(&path) {
                    Ok(json) => json,
                    Err(e) => {
                        log::warn!("Skipping unreadable {}: {}", path.display(), e);
                        continue;
                    }
                };
                match serde_json::from_str::<Diagram>(&json) {
                    Ok(diagram) => diagrams.push(diagram),
                    Err(e) => log::warn!("Skipping unparsable {}: {}", path.display(), e),
                }
            }
            Ok(diagrams)
        })
    }
}
