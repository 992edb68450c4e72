//! Tactica Core Library
//!
//! Data model, history, tools and persistence for the Tactica tactics board.

pub mod board;
pub mod catalog;
pub mod config;
pub mod document;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod placement;
pub mod roster;
pub mod storage;
pub mod store;
pub mod tools;

pub use board::{BoardError, BoardItem, BoardResult, BoardState, ColorRef, Drawing, DrawingKind, ItemKind, Rgba};
pub use catalog::{Access, AccessPolicy, Actor, AllowAll, CatalogError, Diagram, DiagramCatalog, DiagramId};
pub use config::{BoardConfig, EraserGranularity};
pub use document::{DocumentError, export_document, export_file_name, import_document};
pub use editor::{Editor, OrientationCause};
pub use geometry::{Orientation, transform_point, transform_rotation, transform_state};
pub use history::History;
pub use placement::{ItemTemplate, PaletteEntry, PlacementMediator};
pub use roster::{RosterPlayer, RosterProvider, StaticRoster};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::BoardStore;
pub use tools::{ToolKind, ToolManager};
