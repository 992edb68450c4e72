//! Tactica Render Library
//!
//! Raster export and printing for Tactica boards. Rendering happens on the
//! CPU with tiny-skia, so it works without a window or GPU.

mod print;
mod raster;
mod theme;

pub use print::{PageOrientation, PageSetup, PngSpoolPrinter, PrintBackend, PrintSurface, SpoolSurface, print_image};
pub use raster::{ExportConfig, RasterImage, export_png, image_size, rasterize};
pub use theme::Theme;

use thiserror::Error;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: the board is empty")]
    EmptyBoard,
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Print failed: {0}")]
    Print(String),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
