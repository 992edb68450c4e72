//! One editing session: board history, tools, placement and persistence.

use crate::board::{BoardResult, BoardState, ItemId};
use crate::catalog::{CatalogError, CatalogResult, Diagram, DiagramCatalog, DiagramId};
use crate::config::BoardConfig;
use crate::document::{self, DocumentResult};
use crate::geometry::{Orientation, pixel_to_normalized};
use crate::placement::{ItemTemplate, PaletteEntry, PlacementMediator, build_palette};
use crate::roster::RosterProvider;
use crate::store::BoardStore;
use crate::tools::{ToolKind, ToolManager};
use kurbo::{Point, Size};
use std::borrow::Cow;

/// What triggered an orientation change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationCause {
    /// The user pressed the toggle.
    Manual,
    /// The layout switched between compact and wide.
    Viewport,
}

/// The tactics board editor.
pub struct Editor {
    store: BoardStore,
    tools: ToolManager,
    placement: PlacementMediator,
    config: BoardConfig,
    /// Metadata of the diagram being edited, once saved or loaded.
    diagram: Option<Diagram>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}

impl Editor {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            store: BoardStore::new(),
            tools: ToolManager::new(&config),
            placement: PlacementMediator::new(),
            config,
            diagram: None,
        }
    }

    /// An empty editor laid out in `orientation`, with no history step for it.
    pub fn with_orientation(config: BoardConfig, orientation: Orientation) -> Self {
        Self {
            store: BoardStore::with_orientation(orientation),
            ..Self::new(config)
        }
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    pub fn board(&self) -> &BoardState {
        self.store.current()
    }

    /// The board with the gesture in progress applied.
    pub fn view(&self) -> Cow<'_, BoardState> {
        self.tools.preview(self.store.current())
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolManager {
        &mut self.tools
    }

    pub fn placement(&self) -> &PlacementMediator {
        &self.placement
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn orientation(&self) -> Orientation {
        self.store.orientation()
    }

    pub fn diagram(&self) -> Option<&Diagram> {
        self.diagram.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.placement.disarm();
        self.tools.set_tool(tool);
    }

    /// Switch layout. Manual toggles always become a history step; viewport
    /// changes do so only when `auto_orientation_commits` is set.
    pub fn set_orientation(&mut self, orientation: Orientation, cause: OrientationCause) -> bool {
        self.tools.cancel();
        let changed = match cause {
            OrientationCause::Viewport if !self.config.auto_orientation_commits => {
                self.store.rewrite_orientation(orientation)
            }
            _ => self.store.commit_orientation(orientation),
        };
        if changed {
            log::debug!("Orientation set to {} ({:?})", orientation, cause);
        }
        changed
    }

    pub fn toggle_orientation(&mut self) -> bool {
        self.set_orientation(self.orientation().toggled(), OrientationCause::Manual)
    }

    pub fn undo(&mut self) -> bool {
        self.tools.cancel();
        let moved = self.store.undo();
        self.tools.sync_selection(self.store.current());
        moved
    }

    pub fn redo(&mut self) -> bool {
        self.tools.cancel();
        let moved = self.store.redo();
        self.tools.sync_selection(self.store.current());
        moved
    }

    /// Remove everything from the board as one undoable step.
    pub fn clear(&mut self) -> bool {
        self.tools.cancel();
        let changed = self.store.commit(BoardState::cleared);
        self.tools.sync_selection(self.store.current());
        changed
    }

    /// Remove the selected item, if any.
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.tools.selected() else {
            return false;
        };
        let changed = self.store.commit(|s| s.without_item(id));
        self.tools.sync_selection(self.store.current());
        changed
    }

    /// Forget all edits and the active diagram.
    pub fn reset(&mut self) {
        self.tools.cancel();
        self.placement.disarm();
        self.store.reset();
        self.tools.sync_selection(self.store.current());
        self.diagram = None;
    }

    pub fn pointer_down(&mut self, pixel: Point, surface: Size) -> BoardResult<()> {
        let point = pixel_to_normalized(pixel, surface)?;
        self.tools.pointer_down(&mut self.store, point);
        Ok(())
    }

    pub fn pointer_move(&mut self, pixel: Point, surface: Size) -> BoardResult<()> {
        let point = pixel_to_normalized(pixel, surface)?;
        self.tools.pointer_move(&mut self.store, point);
        Ok(())
    }

    pub fn pointer_up(&mut self, pixel: Point, surface: Size) -> BoardResult<bool> {
        let point = pixel_to_normalized(pixel, surface)?;
        Ok(self.tools.pointer_up(&mut self.store, point))
    }

    /// Palette for the current board.
    pub fn palette(&self, roster: &dyn RosterProvider) -> Vec<PaletteEntry> {
        build_palette(&roster.roster(), self.store.current())
    }

    pub fn arm(&mut self, template: ItemTemplate) -> BoardResult<()> {
        self.placement.arm(template, self.store.current())
    }

    pub fn tap(&mut self, pixel: Point, surface: Size) -> BoardResult<ItemId> {
        self.placement.tap(&mut self.store, pixel, surface)
    }

    pub fn drop_template(&mut self, template: &ItemTemplate, pixel: Point, surface: Size) -> BoardResult<ItemId> {
        self.placement.drop_at(&mut self.store, template, pixel, surface)
    }

    /// A dialog or menu opened over the board.
    pub fn on_modal_opened(&mut self) {
        self.placement.on_modal_opened();
        self.tools.cancel();
    }

    /// Load a diagram, replacing the board and its history.
    ///
    /// On failure the editor is left exactly as it was.
    pub async fn open(&mut self, catalog: &DiagramCatalog, id: DiagramId) -> CatalogResult<()> {
        self.on_modal_opened();
        let live = self.orientation();
        let (diagram, state) = catalog.load(id, live).await?;
        self.store.install(state, live, diagram.id);
        self.tools.sync_selection(self.store.current());
        self.diagram = Some(diagram);
        Ok(())
    }

    /// Save the board as a new named diagram.
    pub async fn save_as(
        &mut self,
        catalog: &DiagramCatalog,
        name: &str,
        team_ref: Option<String>,
    ) -> CatalogResult<Diagram> {
        let diagram = catalog
            .create(name, self.store.current(), self.orientation(), team_ref)
            .await?;
        self.store.mark_saved(diagram.id);
        self.diagram = Some(diagram.clone());
        Ok(diagram)
    }

    /// Overwrite the active diagram with the current board.
    pub async fn save(&mut self, catalog: &DiagramCatalog) -> CatalogResult<Diagram> {
        let id = self.store.active_diagram().ok_or(CatalogError::Unsaved)?;
        self.overwrite(catalog, id).await
    }

    /// Overwrite diagram `id`, e.g. after the user confirmed a name collision.
    pub async fn overwrite(&mut self, catalog: &DiagramCatalog, id: DiagramId) -> CatalogResult<Diagram> {
        let diagram = catalog
            .overwrite(id, self.store.current(), self.orientation())
            .await?;
        self.store.mark_saved(diagram.id);
        self.diagram = Some(diagram.clone());
        Ok(diagram)
    }

    /// Delete a diagram; deleting the one being edited resets the editor.
    pub async fn delete(&mut self, catalog: &DiagramCatalog, id: DiagramId) -> CatalogResult<()> {
        catalog.delete(id).await?;
        if self.store.active_diagram() == Some(id) {
            self.reset();
        }
        Ok(())
    }

    pub fn export_document(&self) -> DocumentResult<String> {
        document::export_document(self.store.current(), self.orientation())
    }

    /// Replace the board with an imported document as a fresh, unsaved board.
    ///
    /// A rejected document leaves the board untouched.
    pub fn import_document(&mut self, json: &str) -> DocumentResult<()> {
        let live = self.orientation();
        let state = document::import_document(json, live)?;
        self.tools.cancel();
        self.placement.disarm();
        self.store.replace(state, live);
        self.tools.sync_selection(self.store.current());
        self.diagram = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Actor, AllowAll};
    use crate::roster::{RosterPlayer, StaticRoster};
    use crate::storage::testing::FailingStorage;
    use crate::storage::{MemoryStorage, Storage};
    use std::sync::Arc;

    const SURFACE: Size = Size::new(1000.0, 1000.0);

    fn px(x: f64, y: f64) -> Point {
        Point::new(x * SURFACE.width, y * SURFACE.height)
    }

    fn draw_line(editor: &mut Editor, from: (f64, f64), to: (f64, f64)) {
        editor.set_tool(ToolKind::Line);
        editor.pointer_down(px(from.0, from.1), SURFACE).unwrap();
        editor.pointer_move(px(to.0, to.1), SURFACE).unwrap();
        assert!(editor.pointer_up(px(to.0, to.1), SURFACE).unwrap());
    }

    fn catalog() -> (Arc<MemoryStorage>, DiagramCatalog) {
        let storage = Arc::new(MemoryStorage::new());
        let catalog = DiagramCatalog::new(
            storage.clone(),
            Arc::new(AllowAll),
            Actor {
                id: "coach-1".into(),
                display_name: "Coach".into(),
            },
        );
        (storage, catalog)
    }

    fn assert_close(a: Point, b: Point) {
        assert!(a.distance(b) < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_line_toggle_round_trip() {
        let mut editor = Editor::default();
        draw_line(&mut editor, (0.1, 0.1), (0.9, 0.9));

        assert!(editor.toggle_orientation());
        assert_eq!(editor.orientation(), Orientation::Vertical);
        assert!(editor.toggle_orientation());

        let points = &editor.board().drawings[0].points;
        assert_close(points[0], Point::new(0.1, 0.1));
        assert_close(points[1], Point::new(0.9, 0.9));
    }

    #[test]
    fn test_manual_toggle_is_undoable() {
        let mut editor = Editor::default();
        draw_line(&mut editor, (0.1, 0.1), (0.9, 0.9));
        editor.toggle_orientation();
        assert!(editor.undo());
        assert_eq!(editor.orientation(), Orientation::Horizontal);
    }

    #[test]
    fn test_viewport_toggle_respects_config() {
        let mut committing = Editor::default();
        draw_line(&mut committing, (0.1, 0.1), (0.9, 0.9));
        committing.set_orientation(Orientation::Vertical, OrientationCause::Viewport);
        assert_eq!(committing.store().history().len(), 3);

        let mut quiet = Editor::new(BoardConfig {
            auto_orientation_commits: false,
            ..BoardConfig::default()
        });
        draw_line(&mut quiet, (0.1, 0.1), (0.9, 0.9));
        quiet.set_orientation(Orientation::Vertical, OrientationCause::Viewport);
        assert_eq!(quiet.store().history().len(), 2);
        assert_eq!(quiet.orientation(), Orientation::Vertical);
        assert_close(quiet.board().drawings[0].points[0], Point::new(0.9, 0.1));

        quiet.undo();
        assert!(quiet.board().is_empty());
        assert_eq!(quiet.orientation(), Orientation::Vertical);
    }

    #[test]
    fn test_palette_and_tap_placement() {
        let roster = StaticRoster(vec![RosterPlayer {
            id: "p1".into(),
            display_name: "Sam Diaz".into(),
            short_name: "Diaz".into(),
            jersey_number: Some(1),
            position: Some("GK".into()),
            color_preference: None,
            avatar_ref: None,
        }]);
        let mut editor = Editor::default();
        let entry = editor.palette(&roster).remove(0);
        editor.arm(entry.template.clone()).unwrap();
        editor.tap(px(0.05, 0.5), SURFACE).unwrap();

        assert!(editor.palette(&roster)[0].disabled);
        assert!(editor.arm(entry.template.clone()).is_err());
        assert!(editor.drop_template(&entry.template, px(0.5, 0.5), SURFACE).is_err());
        assert_eq!(editor.board().items.len(), 1);
    }

    #[test]
    fn test_tool_change_disarms_placement() {
        let mut editor = Editor::default();
        editor
            .arm(ItemTemplate::object(crate::board::ItemKind::Ball, Default::default()))
            .unwrap();
        editor.set_tool(ToolKind::Pencil);
        assert!(!editor.placement().is_armed());
    }

    #[test]
    fn test_clear_and_delete_selected() {
        let mut editor = Editor::default();
        editor
            .drop_template(
                &ItemTemplate::object(crate::board::ItemKind::Cone, Default::default()),
                px(0.5, 0.5),
                SURFACE,
            )
            .unwrap();
        draw_line(&mut editor, (0.1, 0.1), (0.3, 0.1));

        editor.set_tool(ToolKind::Select);
        editor.pointer_down(px(0.5, 0.5), SURFACE).unwrap();
        editor.pointer_up(px(0.5, 0.5), SURFACE).unwrap();
        assert!(editor.delete_selected());
        assert!(editor.board().items.is_empty());

        assert!(editor.clear());
        assert!(editor.board().is_empty());
        assert!(editor.undo());
        assert_eq!(editor.board().drawings.len(), 1);
    }

    #[tokio::test]
    async fn test_save_and_reopen_in_other_orientation() {
        let (_, catalog) = catalog();
        let mut editor = Editor::default();
        editor.set_orientation(Orientation::Vertical, OrientationCause::Manual);
        draw_line(&mut editor, (0.2, 0.1), (0.2, 0.9));
        let drawn = editor.board().clone();

        let diagram = editor.save_as(&catalog, "Overlap", None).await.unwrap();
        assert!(!editor.is_dirty());
        assert_eq!(editor.store().active_diagram(), Some(diagram.id));

        let mut viewer = Editor::default();
        viewer.open(&catalog, diagram.id).await.unwrap();
        assert!(!viewer.store().can_undo());
        let loaded = &viewer.board().drawings[0].points;
        assert_close(loaded[0], Point::new(0.1, 0.8));
        assert_close(loaded[1], Point::new(0.9, 0.8));

        viewer.toggle_orientation();
        for (a, b) in viewer.board().points().zip(drawn.points()) {
            assert_close(a, b);
        }
    }

    #[tokio::test]
    async fn test_failed_open_leaves_editor_intact() {
        let (_, catalog) = catalog();
        let mut editor = Editor::default();
        draw_line(&mut editor, (0.1, 0.1), (0.9, 0.9));
        let saved = editor.save_as(&catalog, "Keep", None).await.unwrap();
        draw_line(&mut editor, (0.1, 0.9), (0.9, 0.1));

        assert!(editor.open(&catalog, DiagramId::new_v4()).await.is_err());
        assert_eq!(editor.board().drawings.len(), 2);
        assert!(editor.is_dirty());
        assert_eq!(editor.store().active_diagram(), Some(saved.id));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_board_and_dirty_flag() {
        let storage = Arc::new(FailingStorage::default());
        let catalog = DiagramCatalog::new(
            storage,
            Arc::new(AllowAll),
            Actor {
                id: "coach-1".into(),
                display_name: "Coach".into(),
            },
        );
        let mut editor = Editor::default();
        draw_line(&mut editor, (0.1, 0.1), (0.9, 0.9));
        let before = editor.board().clone();

        assert!(matches!(
            editor.save_as(&catalog, "Lost", None).await,
            Err(CatalogError::Storage(_))
        ));
        assert_eq!(editor.board(), &before);
        assert!(editor.is_dirty());
        assert!(editor.diagram().is_none());
        assert!(editor.store().can_undo());
    }

    #[tokio::test]
    async fn test_save_requires_active_diagram() {
        let (_, catalog) = catalog();
        let mut editor = Editor::default();
        draw_line(&mut editor, (0.1, 0.1), (0.9, 0.9));
        assert!(matches!(editor.save(&catalog).await, Err(CatalogError::Unsaved)));

        editor.save_as(&catalog, "First", None).await.unwrap();
        draw_line(&mut editor, (0.5, 0.1), (0.5, 0.9));
        assert!(editor.is_dirty());
        editor.save(&catalog).await.unwrap();
        assert!(!editor.is_dirty());
    }

    #[tokio::test]
    async fn test_name_collision_then_confirmed_overwrite() {
        let (_, catalog) = catalog();
        let mut first = Editor::default();
        draw_line(&mut first, (0.1, 0.1), (0.9, 0.9));
        let existing = first.save_as(&catalog, "Tactic A", None).await.unwrap();

        let mut second = Editor::default();
        draw_line(&mut second, (0.4, 0.4), (0.6, 0.6));
        assert!(matches!(
            second.save_as(&catalog, "TACTIC A", None).await,
            Err(CatalogError::NameExists(_))
        ));
        assert!(second.is_dirty());

        second.overwrite(&catalog, existing.id).await.unwrap();
        let mut check = Editor::default();
        check.open(&catalog, existing.id).await.unwrap();
        assert_close(check.board().drawings[0].points[0], Point::new(0.4, 0.4));
    }

    #[tokio::test]
    async fn test_deleting_open_diagram_resets() {
        let (storage, catalog) = catalog();
        let mut editor = Editor::default();
        draw_line(&mut editor, (0.1, 0.1), (0.9, 0.9));
        let diagram = editor.save_as(&catalog, "Temp", None).await.unwrap();

        editor.delete(&catalog, diagram.id).await.unwrap();
        assert!(editor.board().is_empty());
        assert!(editor.diagram().is_none());
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_import_rejects_without_touching_board() {
        let mut editor = Editor::default();
        draw_line(&mut editor, (0.1, 0.1), (0.9, 0.9));
        let before = editor.board().clone();

        assert!(editor.import_document(r#"{ "items": [] }"#).is_err());
        assert_eq!(editor.board(), &before);

        let json = editor.export_document().unwrap();
        let mut other = Editor::default();
        other.import_document(&json).unwrap();
        assert_eq!(other.board(), &before);
        assert!(other.is_dirty());
    }
}
