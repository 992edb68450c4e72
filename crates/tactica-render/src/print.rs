//! Printing through a disposable print surface.
//!
//! A print job opens a fresh surface sized for the board's orientation,
//! draws the exported bitmap into it, prints, and disposes of the surface
//! whether or not printing succeeded.

use crate::raster::RasterImage;
use crate::{ExportError, ExportResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tactica_core::geometry::Orientation;

/// Paper orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrientation {
    Landscape,
    Portrait,
}

impl From<Orientation> for PageOrientation {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => PageOrientation::Landscape,
            Orientation::Vertical => PageOrientation::Portrait,
        }
    }
}

/// Page geometry for a print job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub orientation: PageOrientation,
    /// Page width in millimetres.
    pub width_mm: f64,
    /// Page height in millimetres.
    pub height_mm: f64,
}

impl PageSetup {
    /// An A4 page for a board in `orientation`.
    pub fn a4(orientation: Orientation) -> Self {
        let orientation = PageOrientation::from(orientation);
        let (width_mm, height_mm) = match orientation {
            PageOrientation::Landscape => (297.0, 210.0),
            PageOrientation::Portrait => (210.0, 297.0),
        };
        Self {
            orientation,
            width_mm,
            height_mm,
        }
    }
}

/// An isolated surface holding one print job.
pub trait PrintSurface {
    /// Place the image on the page.
    fn draw_image(&mut self, image: &RasterImage) -> ExportResult<()>;

    /// Send the page to the printer.
    fn print(&mut self) -> ExportResult<()>;

    /// Release the surface. Called exactly once, after success or failure.
    fn dispose(&mut self);
}

/// Something that can open print surfaces.
pub trait PrintBackend {
    type Surface: PrintSurface;

    fn open_surface(&self, setup: &PageSetup) -> ExportResult<Self::Surface>;
}

/// Disposes the surface when dropped.
struct SurfaceGuard<S: PrintSurface>(S);

impl<S: PrintSurface> Drop for SurfaceGuard<S> {
    fn drop(&mut self) {
        self.0.dispose();
    }
}

/// Print `image` for a board in `orientation`.
pub fn print_image<B: PrintBackend>(
    backend: &B,
    image: &RasterImage,
    orientation: Orientation,
) -> ExportResult<()> {
    let setup = PageSetup::a4(orientation);
    let mut surface = SurfaceGuard(backend.open_surface(&setup)?);
    surface.0.draw_image(image)?;
    surface.0.print()?;
    log::info!("Printed {}x{} board ({:?})", image.width, image.height, setup.orientation);
    Ok(())
}

/// Backend that "prints" by spooling finished pages as PNG files.
pub struct PngSpoolPrinter {
    spool_dir: PathBuf,
    prefix: String,
}

static JOB_COUNTER: AtomicU64 = AtomicU64::new(0);

impl PngSpoolPrinter {
    /// Spool pages into `spool_dir` as `<prefix>-<n>.png`.
    pub fn new(spool_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> ExportResult<Self> {
        let spool_dir = spool_dir.into();
        fs::create_dir_all(&spool_dir)
            .map_err(|e| ExportError::Print(format!("Failed to create spool directory: {}", e)))?;
        Ok(Self {
            spool_dir,
            prefix: prefix.into(),
        })
    }

    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }
}

/// Surface of a [`PngSpoolPrinter`] job: a staging file that becomes the
/// spooled page on print and is removed on dispose otherwise.
pub struct SpoolSurface {
    setup: PageSetup,
    staging: PathBuf,
    target: PathBuf,
    page: Option<Vec<u8>>,
}

impl SpoolSurface {
    pub fn setup(&self) -> &PageSetup {
        &self.setup
    }
}

impl PrintBackend for PngSpoolPrinter {
    type Surface = SpoolSurface;

    fn open_surface(&self, setup: &PageSetup) -> ExportResult<SpoolSurface> {
        let job = JOB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let stem = format!("{}-{}-{}", self.prefix, std::process::id(), job);
        let staging = self.spool_dir.join(format!("{}.partial", stem));
        fs::write(&staging, [])
            .map_err(|e| ExportError::Print(format!("Failed to open print surface: {}", e)))?;
        Ok(SpoolSurface {
            setup: *setup,
            staging,
            target: self.spool_dir.join(format!("{}.png", stem)),
            page: None,
        })
    }
}

impl PrintSurface for SpoolSurface {
    fn draw_image(&mut self, image: &RasterImage) -> ExportResult<()> {
        let landscape = image.width >= image.height;
        if landscape != (self.setup.orientation == PageOrientation::Landscape) {
            return Err(ExportError::Print(format!(
                "{}x{} image does not fit a {:?} page",
                image.width, image.height, self.setup.orientation
            )));
        }
        self.page = Some(image.encode_png()?);
        Ok(())
    }

    fn print(&mut self) -> ExportResult<()> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| ExportError::Print("nothing drawn on the page".into()))?;
        fs::write(&self.staging, page)
            .and_then(|_| fs::rename(&self.staging, &self.target))
            .map_err(|e| ExportError::Print(format!("Failed to spool {}: {}", self.target.display(), e)))?;
        log::debug!("Spooled page to {}", self.target.display());
        Ok(())
    }

    fn dispose(&mut self) {
        self.page = None;
        if self.staging.exists() {
            if let Err(e) = fs::remove_file(&self.staging) {
                log::warn!("Failed to remove {}: {}", self.staging.display(), e);
            }
        }
    }
}
