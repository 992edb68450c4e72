//! Command implementations, independent of argument parsing.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tactica_core::placement::PaletteEntry;
use tactica_core::{
    Actor, AllowAll, CatalogError, Diagram, DiagramCatalog, DiagramId, Editor, FileStorage, Orientation, RosterProvider,
    Storage, export_file_name,
};
use tactica_render::{PngSpoolPrinter, export_png, print_image, rasterize};
use uuid::Uuid;

/// One-diagram overview for `tactica show`.
#[derive(Debug, Clone)]
pub struct DiagramSummary {
    pub diagram: Diagram,
    pub items: usize,
    pub drawings: usize,
}

impl fmt::Display for DiagramSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.diagram;
        writeln!(f, "{}", d.name)?;
        writeln!(f, "  id:          {}", d.id)?;
        writeln!(f, "  author:      {} ({})", d.author_display_name, d.author_id)?;
        if let Some(team) = &d.team_ref {
            writeln!(f, "  team:        {}", team)?;
        }
        writeln!(f, "  saved as:    {}", d.saved_orientation)?;
        writeln!(f, "  items:       {}", self.items)?;
        writeln!(f, "  drawings:    {}", self.drawings)?;
        writeln!(f, "  preview:     {}", if d.preview_image.is_some() { "yes" } else { "no" })?;
        writeln!(f, "  created:     {}", d.created_at.to_rfc3339())?;
        write!(f, "  updated:     {}", d.updated_at.to_rfc3339())
    }
}

/// Options for `tactica import`.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub name: String,
    pub team_ref: Option<String>,
    /// Replace an existing diagram of the same name instead of failing.
    pub overwrite: bool,
}

/// A catalog plus the settings commands run with.
pub struct Session {
    catalog: DiagramCatalog,
    config: AppConfig,
}

impl Session {
    pub fn new(storage: Arc<dyn Storage>, config: AppConfig) -> Self {
        let actor = Actor {
            id: config.owner_id.clone(),
            display_name: config.display_name.clone(),
        };
        Self {
            catalog: DiagramCatalog::new(storage, Arc::new(AllowAll), actor),
            config,
        }
    }

    /// Session over the file-backed catalog in the configured directory.
    pub fn open_files(config: AppConfig) -> AppResult<Self> {
        let storage = FileStorage::new(config.storage_dir()?)?;
        log::info!("Using diagrams in {}", storage.base_path().display());
        Ok(Self::new(Arc::new(storage), config))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DiagramCatalog {
        &self.catalog
    }

    fn orientation(&self) -> Orientation {
        self.config.orientation
    }

    fn editor(&self) -> Editor {
        Editor::with_orientation(self.config.board.clone(), self.orientation())
    }

    pub async fn list(&self) -> AppResult<Vec<Diagram>> {
        Ok(self.catalog.list(&self.config.owner_id).await?)
    }

    /// Find a diagram by id or by name (ignoring case).
    pub async fn resolve(&self, target: &str) -> AppResult<DiagramId> {
        if let Ok(id) = Uuid::parse_str(target.trim()) {
            return Ok(id);
        }
        let matches: Vec<_> = self
            .list()
            .await?
            .into_iter()
            .filter(|d| d.name_matches(target))
            .collect();
        match matches.as_slice() {
            [] => Err(AppError::UnknownDiagram(target.to_string())),
            [only] => Ok(only.id),
            _ => Err(AppError::Ambiguous(target.to_string())),
        }
    }

    /// An editor with the diagram loaded in the configured orientation.
    pub async fn open(&self, target: &str) -> AppResult<Editor> {
        let id = self.resolve(target).await?;
        let mut editor = self.editor();
        editor.open(&self.catalog, id).await?;
        Ok(editor)
    }

    pub async fn show(&self, target: &str) -> AppResult<DiagramSummary> {
        let editor = self.open(target).await?;
        let board = editor.board();
        let (items, drawings) = (board.items.len(), board.drawings.len());
        let diagram = editor.diagram().cloned().ok_or_else(|| AppError::UnknownDiagram(target.to_string()))?;
        Ok(DiagramSummary {
            diagram,
            items,
            drawings,
        })
    }

    /// Render a diagram to PNG. With `set_preview` the image is also stored
    /// as the diagram's preview.
    pub async fn export_png(&self, target: &str, out: Option<&Path>, set_preview: bool) -> AppResult<PathBuf> {
        let editor = self.open(target).await?;
        let (name, id) = active(&editor, target)?;
        let png = export_png(editor.board(), editor.orientation(), &self.config.theme, &self.config.export)?;

        let path = output_path(out, &export_file_name(&name, "png"));
        fs::write(&path, &png)?;
        log::info!("Exported \"{}\" to {} ({} bytes)", name, path.display(), png.len());

        if set_preview {
            self.catalog.set_preview_image(id, &png).await?;
        }
        Ok(path)
    }

    /// Write a diagram as a portable board document.
    pub async fn export_document(&self, target: &str, out: Option<&Path>) -> AppResult<PathBuf> {
        let editor = self.open(target).await?;
        let (name, _) = active(&editor, target)?;
        let json = editor.export_document()?;

        let path = output_path(out, &export_file_name(&name, "json"));
        fs::write(&path, json)?;
        log::info!("Exported document \"{}\" to {}", name, path.display());
        Ok(path)
    }

    /// Read a portable document and save it as a new diagram.
    pub async fn import(&self, file: &Path, options: &ImportOptions) -> AppResult<Diagram> {
        let json = fs::read_to_string(file)?;
        let mut editor = self.editor();
        editor.import_document(&json)?;

        match editor.save_as(&self.catalog, &options.name, options.team_ref.clone()).await {
            Err(CatalogError::NameExists(name)) if options.overwrite => {
                let id = self.resolve(&name).await?;
                log::info!("Replacing existing diagram \"{}\"", name);
                Ok(editor.overwrite(&self.catalog, id).await?)
            }
            result => Ok(result?),
        }
    }

    pub async fn delete(&self, target: &str) -> AppResult<DiagramId> {
        let id = self.resolve(target).await?;
        let mut editor = self.editor();
        editor.delete(&self.catalog, id).await?;
        Ok(id)
    }

    /// Print a diagram through the spool printer. Returns the spool directory.
    pub async fn print(&self, target: &str) -> AppResult<PathBuf> {
        let editor = self.open(target).await?;
        let image = rasterize(editor.board(), editor.orientation(), &self.config.theme, &self.config.export)?;
        let printer = PngSpoolPrinter::new(self.config.spool_dir()?, "tactica")?;
        print_image(&printer, &image, editor.orientation())?;
        Ok(printer.spool_dir().to_path_buf())
    }

    /// Placement palette for `roster`, against a diagram or an empty board.
    pub async fn palette(&self, target: Option<&str>, roster: &dyn RosterProvider) -> AppResult<Vec<PaletteEntry>> {
        let editor = match target {
            Some(target) => self.open(target).await?,
            None => self.editor(),
        };
        Ok(editor.palette(roster))
    }
}

fn active(editor: &Editor, target: &str) -> AppResult<(String, DiagramId)> {
    editor
        .diagram()
        .map(|d| (d.name.clone(), d.id))
        .ok_or_else(|| AppError::UnknownDiagram(target.to_string()))
}

/// `out` itself, or `file_name` inside `out` when it is a directory.
fn output_path(out: Option<&Path>, file_name: &str) -> PathBuf {
    match out {
        Some(dir) if dir.is_dir() => dir.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactica_core::board::{BoardItem, BoardState, ColorRef, Drawing, DrawingKind, ItemKind, ItemPayload};
    use tactica_core::roster::{RosterPlayer, StaticRoster};
    use tactica_core::{MemoryStorage, export_document};
    use kurbo::Point;

    fn session(dir: &Path) -> Session {
        let config = AppConfig {
            spool_dir: Some(dir.join("spool")),
            ..AppConfig::default()
        };
        Session::new(Arc::new(MemoryStorage::new()), config)
    }

    fn board() -> BoardState {
        BoardState::new()
            .with_item(BoardItem::new(
                ItemKind::Player,
                "p9",
                Point::new(0.8, 0.5),
                ItemPayload::player(ColorRef::theme("home"), Some(9), None),
            ))
            .unwrap()
            .with_drawing(
                Drawing::new(DrawingKind::Arrow, Point::new(0.2, 0.2), ColorRef::theme("ink"), 3.0)
                    .with_points(vec![Point::new(0.2, 0.2), Point::new(0.6, 0.4)]),
            )
            .unwrap()
    }

    fn document_file(dir: &Path) -> PathBuf {
        let path = dir.join("press.json");
        fs::write(&path, export_document(&board(), Orientation::Horizontal).unwrap()).unwrap();
        path
    }

    fn import_options(name: &str) -> ImportOptions {
        ImportOptions {
            name: name.to_string(),
            ..ImportOptions::default()
        }
    }

    #[tokio::test]
    async fn test_import_then_show_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        let saved = session
            .import(&document_file(dir.path()), &import_options("High Press"))
            .await
            .unwrap();

        let summary = session.show("high press").await.unwrap();
        assert_eq!(summary.diagram.id, saved.id);
        assert_eq!((summary.items, summary.drawings), (1, 1));
        assert!(summary.to_string().starts_with("High Press"));
    }

    #[tokio::test]
    async fn test_import_name_collision() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        let file = document_file(dir.path());
        let first = session.import(&file, &import_options("Corner")).await.unwrap();

        let err = session.import(&file, &import_options("corner")).await.unwrap_err();
        assert!(matches!(err, AppError::Catalog(CatalogError::NameExists(_))));

        let replaced = session
            .import(
                &file,
                &ImportOptions {
                    overwrite: true,
                    ..import_options("corner")
                },
            )
            .await
            .unwrap();
        assert_eq!(replaced.id, first.id);
        assert_eq!(session.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_rejects_bad_document() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{ "items": [] }"#).unwrap();

        let err = session.import(&path, &import_options("Broken")).await.unwrap_err();
        assert!(matches!(err, AppError::Document(_)));
        assert!(session.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        assert!(matches!(session.resolve("nothing").await, Err(AppError::UnknownDiagram(_))));
    }

    #[tokio::test]
    async fn test_export_png_and_preview() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        let saved = session
            .import(&document_file(dir.path()), &import_options("Build Up / Phase 1"))
            .await
            .unwrap();

        let path = session
            .export_png(&saved.id.to_string(), Some(dir.path()), true)
            .await
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "Build Up _ Phase 1.png");
        let png = fs::read(&path).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let summary = session.show("Build Up / Phase 1").await.unwrap();
        assert!(summary.diagram.preview_image.unwrap().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_export_document_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session.config.orientation = Orientation::Vertical;
        session
            .import(&document_file(dir.path()), &import_options("Shape"))
            .await
            .unwrap();

        let out = dir.path().join("out.json");
        session.export_document("Shape", Some(&out)).await.unwrap();
        let reimported = tactica_core::import_document(&fs::read_to_string(&out).unwrap(), Orientation::Horizontal)
            .unwrap();
        let original = board();
        let (a, b) = (reimported.items[0].position, original.items[0].position);
        assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_print_spools_one_page() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        session
            .import(&document_file(dir.path()), &import_options("Print me"))
            .await
            .unwrap();

        let spool = session.print("Print me").await.unwrap();
        let pages: Vec<_> = fs::read_dir(&spool).unwrap().collect();
        assert_eq!(pages.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        let saved = session
            .import(&document_file(dir.path()), &import_options("Gone"))
            .await
            .unwrap();

        assert_eq!(session.delete("gone").await.unwrap(), saved.id);
        assert!(session.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_palette_disables_placed_players() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        session
            .import(&document_file(dir.path()), &import_options("Palette"))
            .await
            .unwrap();
        let roster = StaticRoster(vec![
            RosterPlayer {
                id: "p9".into(),
                display_name: "Nine".into(),
                short_name: "Nine".into(),
                jersey_number: Some(9),
                position: None,
                color_preference: None,
                avatar_ref: None,
            },
            RosterPlayer {
                id: "p4".into(),
                display_name: "Four".into(),
                short_name: "Four".into(),
                jersey_number: Some(4),
                position: None,
                color_preference: None,
                avatar_ref: None,
            },
        ]);

        let palette = session.palette(Some("Palette"), &roster).await.unwrap();
        assert!(palette[0].disabled);
        assert!(!palette[1].disabled);

        let empty = session.palette(None, &roster).await.unwrap();
        assert!(empty.iter().all(|e| !e.disabled));
    }
}
