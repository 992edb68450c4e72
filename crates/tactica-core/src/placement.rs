//! Placement of new items, by drag-and-drop or by arm-and-tap.
//!
//! Both input paths end in [`PlacementMediator::place`], so a dropped palette
//! entry and a tapped one produce identical commits.

use crate::board::{
    BoardError, BoardItem, BoardResult, BoardState, ColorRef, ItemId, ItemKind, ItemPayload,
    ShapeKind,
};
use crate::geometry::pixel_to_normalized;
use crate::roster::RosterPlayer;
use crate::store::BoardStore;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Description of an item to be placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTemplate {
    pub kind: ItemKind,
    pub element_ref: String,
    #[serde(default)]
    pub payload: ItemPayload,
}

impl ItemTemplate {
    /// Template for a roster player.
    pub fn player(player: &RosterPlayer) -> Self {
        let color = player
            .color_preference
            .clone()
            .unwrap_or_else(|| ColorRef::theme("home"));
        let mut payload = ItemPayload::player(color, player.jersey_number, player.avatar_ref.clone());
        payload.label = Some(player.short_name.clone());
        Self {
            kind: ItemKind::Player,
            element_ref: player.id.clone(),
            payload,
        }
    }

    /// Template for a generic object; the element ref is a type tag.
    pub fn object(kind: ItemKind, payload: ItemPayload) -> Self {
        let tag = match (kind, payload.shape) {
            (ItemKind::Shape, Some(shape)) => format!("shape:{}", shape_tag(shape)),
            (kind, _) => kind_tag(kind).to_string(),
        };
        Self {
            kind,
            element_ref: tag,
            payload,
        }
    }

    /// Build a board item at a normalized point.
    pub fn instantiate(&self, position: Point) -> BoardItem {
        BoardItem::new(self.kind, self.element_ref.clone(), position, self.payload.clone())
    }

    fn conflicts_with(&self, board: &BoardState) -> bool {
        self.kind == ItemKind::Player && board.has_player(&self.element_ref)
    }
}

fn kind_tag(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Player => "player",
        ItemKind::Ball => "ball",
        ItemKind::Cone => "cone",
        ItemKind::Goal => "goal",
        ItemKind::Text => "text",
        ItemKind::Shape => "shape",
    }
}

fn shape_tag(shape: ShapeKind) -> &'static str {
    match shape {
        ShapeKind::Square => "square",
        ShapeKind::Triangle => "triangle",
        ShapeKind::Mannequin => "mannequin",
        ShapeKind::Ladder => "ladder",
        ShapeKind::Hurdle => "hurdle",
    }
}

/// One entry in the placement palette.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    pub label: String,
    pub template: ItemTemplate,
    /// Already on the board; shown but not placeable.
    pub disabled: bool,
}

/// Build the palette: roster players first, then the fixed objects.
pub fn build_palette(roster: &[RosterPlayer], board: &BoardState) -> Vec<PaletteEntry> {
    let players = roster.iter().map(|p| {
        let template = ItemTemplate::player(p);
        PaletteEntry {
            label: match p.jersey_number {
                Some(n) => format!("{n} {}", p.short_name),
                None => p.short_name.clone(),
            },
            disabled: template.conflicts_with(board),
            template,
        }
    });

    let objects = [
        ("Ball", ItemKind::Ball, ItemPayload::default()),
        ("Cone", ItemKind::Cone, ItemPayload { color: Some(ColorRef::theme("cone")), ..ItemPayload::default() }),
        ("Goal", ItemKind::Goal, ItemPayload::default()),
        ("Text", ItemKind::Text, ItemPayload::text("Text", ColorRef::theme("ink"))),
        ("Square", ItemKind::Shape, ItemPayload::shape(ShapeKind::Square, ColorRef::theme("accent"))),
        ("Triangle", ItemKind::Shape, ItemPayload::shape(ShapeKind::Triangle, ColorRef::theme("accent"))),
        ("Mannequin", ItemKind::Shape, ItemPayload::shape(ShapeKind::Mannequin, ColorRef::theme("accent"))),
        ("Ladder", ItemKind::Shape, ItemPayload::shape(ShapeKind::Ladder, ColorRef::theme("accent"))),
        ("Hurdle", ItemKind::Shape, ItemPayload::shape(ShapeKind::Hurdle, ColorRef::theme("accent"))),
    ]
    .into_iter()
    .map(|(label, kind, payload)| PaletteEntry {
        label: label.to_string(),
        template: ItemTemplate::object(kind, payload),
        disabled: false,
    });

    players.chain(objects).collect()
}

/// Resolves what gets added next, independent of input modality.
#[derive(Debug, Clone, Default)]
pub struct PlacementMediator {
    /// The single armed placement, if any.
    pending: Option<ItemTemplate>,
}

impl PlacementMediator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a template for the next tap, replacing any armed one.
    pub fn arm(&mut self, template: ItemTemplate, board: &BoardState) -> BoardResult<()> {
        if template.conflicts_with(board) {
            return Err(BoardError::DuplicatePlayer(template.element_ref));
        }
        log::debug!("Armed placement of {}", template.element_ref);
        self.pending = Some(template);
        Ok(())
    }

    /// Clear the armed placement without placing anything.
    pub fn disarm(&mut self) {
        if self.pending.take().is_some() {
            log::debug!("Placement disarmed");
        }
    }

    /// Any other modal UI opening cancels the armed placement.
    pub fn on_modal_opened(&mut self) {
        self.disarm();
    }

    pub fn pending(&self) -> Option<&ItemTemplate> {
        self.pending.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Drag path: a palette entry dropped at a pixel position.
    pub fn drop_at(
        &mut self,
        store: &mut BoardStore,
        template: &ItemTemplate,
        pixel: Point,
        surface: Size,
    ) -> BoardResult<ItemId> {
        let point = pixel_to_normalized(pixel, surface)?;
        Self::place(store, template, point)
    }

    /// Tap path: consume the armed placement at a pixel position.
    ///
    /// A tap that resolves to a board point always clears the slot, even
    /// when the placement is then rejected. A tap on a surface without size
    /// keeps it armed.
    pub fn tap(&mut self, store: &mut BoardStore, pixel: Point, surface: Size) -> BoardResult<ItemId> {
        if self.pending.is_none() {
            return Err(BoardError::NothingArmed);
        }
        let point = pixel_to_normalized(pixel, surface)?;
        let template = self.pending.take().ok_or(BoardError::NothingArmed)?;
        Self::place(store, &template, point)
    }

    /// Commit a new item built from `template` at a normalized point.
    pub fn place(store: &mut BoardStore, template: &ItemTemplate, point: Point) -> BoardResult<ItemId> {
        let item = template.instantiate(point);
        let id = item.id;
        store.try_commit(|board| board.with_item(item))?;
        log::debug!("Placed {} at ({:.3}, {:.3})", template.element_ref, point.x, point.y);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<RosterPlayer> {
        vec![
            RosterPlayer {
                id: "p9".into(),
                display_name: "Kim Park".into(),
                short_name: "Park".into(),
                jersey_number: Some(9),
                position: Some("FW".into()),
                color_preference: None,
                avatar_ref: None,
            },
            RosterPlayer {
                id: "p4".into(),
                display_name: "Lee Moss".into(),
                short_name: "Moss".into(),
                jersey_number: None,
                position: None,
                color_preference: Some(ColorRef::theme("away")),
                avatar_ref: Some("avatars/p4.png".into()),
            },
        ]
    }

    const SURFACE: Size = Size::new(600.0, 400.0);

    #[test]
    fn test_drop_converts_pixels() {
        let mut store = BoardStore::new();
        let mut mediator = PlacementMediator::new();
        let template = ItemTemplate::player(&roster()[0]);

        let id = mediator
            .drop_at(&mut store, &template, Point::new(300.0, 100.0), SURFACE)
            .unwrap();
        let item = store.current().item(id).unwrap();
        assert_eq!(item.position, Point::new(0.5, 0.25));
        assert_eq!(item.payload.jersey_number, Some(9));
    }

    #[test]
    fn test_second_placement_of_player_is_rejected() {
        let mut store = BoardStore::new();
        let mut mediator = PlacementMediator::new();
        let template = ItemTemplate::player(&roster()[0]);

        mediator.drop_at(&mut store, &template, Point::new(10.0, 10.0), SURFACE).unwrap();
        let before = store.current().items.clone();
        let err = mediator
            .drop_at(&mut store, &template, Point::new(50.0, 50.0), SURFACE)
            .unwrap_err();
        assert_eq!(err, BoardError::DuplicatePlayer("p9".into()));
        assert_eq!(store.current().items, before);
    }

    #[test]
    fn test_tap_consumes_armed_slot() {
        let mut store = BoardStore::new();
        let mut mediator = PlacementMediator::new();
        let template = ItemTemplate::object(ItemKind::Cone, ItemPayload::default());

        assert_eq!(
            mediator.tap(&mut store, Point::new(10.0, 10.0), SURFACE),
            Err(BoardError::NothingArmed)
        );
        mediator.arm(template, store.current()).unwrap();
        let id = mediator.tap(&mut store, Point::new(60.0, 40.0), SURFACE).unwrap();
        assert!(!mediator.is_armed());
        assert_eq!(store.current().item(id).unwrap().position, Point::new(0.1, 0.1));
    }

    #[test]
    fn test_tap_keeps_slot_only_without_surface() {
        let mut store = BoardStore::new();
        let mut mediator = PlacementMediator::new();
        let template = ItemTemplate::player(&roster()[0]);
        mediator.arm(template.clone(), store.current()).unwrap();

        assert_eq!(
            mediator.tap(&mut store, Point::new(10.0, 10.0), Size::ZERO),
            Err(BoardError::EmptySurface)
        );
        assert!(mediator.is_armed());

        mediator.drop_at(&mut store, &template, Point::new(10.0, 10.0), SURFACE).unwrap();
        assert_eq!(
            mediator.tap(&mut store, Point::new(50.0, 50.0), SURFACE),
            Err(BoardError::DuplicatePlayer("p9".into()))
        );
        assert!(!mediator.is_armed());
        assert_eq!(store.current().items.len(), 1);
    }

    #[test]
    fn test_arming_replaces_previous_slot() {
        let store = BoardStore::new();
        let mut mediator = PlacementMediator::new();
        mediator
            .arm(ItemTemplate::object(ItemKind::Ball, ItemPayload::default()), store.current())
            .unwrap();
        mediator
            .arm(ItemTemplate::object(ItemKind::Goal, ItemPayload::default()), store.current())
            .unwrap();
        assert_eq!(mediator.pending().map(|t| t.kind), Some(ItemKind::Goal));
    }

    #[test]
    fn test_modal_clears_slot_without_placing() {
        let mut store = BoardStore::new();
        let mut mediator = PlacementMediator::new();
        mediator
            .arm(ItemTemplate::object(ItemKind::Ball, ItemPayload::default()), store.current())
            .unwrap();
        mediator.on_modal_opened();
        assert!(!mediator.is_armed());
        assert!(mediator.tap(&mut store, Point::new(10.0, 10.0), SURFACE).is_err());
        assert!(store.current().is_empty());
    }

    #[test]
    fn test_drop_and_tap_produce_same_item() {
        let template = ItemTemplate::object(ItemKind::Shape, ItemPayload::shape(ShapeKind::Ladder, ColorRef::default()));

        let mut dropped = BoardStore::new();
        PlacementMediator::new()
            .drop_at(&mut dropped, &template, Point::new(120.0, 80.0), SURFACE)
            .unwrap();

        let mut tapped = BoardStore::new();
        let mut mediator = PlacementMediator::new();
        mediator.arm(template, tapped.current()).unwrap();
        mediator.tap(&mut tapped, Point::new(120.0, 80.0), SURFACE).unwrap();

        let (a, b) = (&dropped.current().items[0], &tapped.current().items[0]);
        assert_eq!((a.kind, &a.element_ref, a.position, &a.payload), (b.kind, &b.element_ref, b.position, &b.payload));
        assert_eq!(a.element_ref, "shape:ladder");
    }

    #[test]
    fn test_arming_placed_player_is_rejected() {
        let mut store = BoardStore::new();
        let mut mediator = PlacementMediator::new();
        let template = ItemTemplate::player(&roster()[1]);
        PlacementMediator::place(&mut store, &template, Point::new(0.5, 0.5)).unwrap();
        assert!(mediator.arm(template, store.current()).is_err());
        assert!(!mediator.is_armed());
    }

    #[test]
    fn test_palette_disables_placed_players() {
        let mut store = BoardStore::new();
        let roster = roster();
        PlacementMediator::place(&mut store, &ItemTemplate::player(&roster[0]), Point::new(0.5, 0.5)).unwrap();

        let palette = build_palette(&roster, store.current());
        assert_eq!(palette[0].label, "9 Park");
        assert!(palette[0].disabled);
        assert!(!palette[1].disabled);
        assert_eq!(palette[1].template.payload.color, Some(ColorRef::theme("away")));
        assert!(palette[2..].iter().all(|e| !e.disabled));
        assert_eq!(palette.len(), roster.len() + 9);
    }
}
