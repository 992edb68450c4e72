use tactica_core::{CatalogError, DocumentError, StorageError};
use tactica_render::ExportError;
use thiserror::Error;

/// Errors surfaced by the command-line shell.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no diagram matches {0:?}")]
    UnknownDiagram(String),
    #[error("{0:?} matches more than one diagram; use its id")]
    Ambiguous(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Invalid document: {0}")]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type AppResult<T> = Result<T, AppError>;
