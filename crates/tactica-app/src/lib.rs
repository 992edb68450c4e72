//! Tactica Application
//!
//! Command-line shell over the Tactica core: a file-backed diagram
//! catalog, portable documents, PNG export and printing.

mod commands;
mod config;
mod error;
mod shortcuts;

pub use commands::{DiagramSummary, ImportOptions, Session};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use shortcuts::{Shortcut, ShortcutAction, ShortcutRegistry};
