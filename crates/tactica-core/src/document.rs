//! Portable board documents: `{ "items": [...], "drawings": [...] }`.
//!
//! Documents are written in the canonical orientation and read back into
//! whatever orientation the editor is in.

use crate::board::{BoardError, BoardState};
use crate::geometry::{Orientation, from_canonical, to_canonical};
use serde_json::Value;
use thiserror::Error;

/// Errors reading a portable document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document must be a JSON object")]
    NotAnObject,
    #[error("document has no \"{0}\" field")]
    MissingField(&'static str),
    #[error("document field \"{0}\" is not a list")]
    NotAList(&'static str),
    #[error("document contains an invalid board: {0}")]
    Invalid(#[from] BoardError),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Serialize a live board to a portable document.
pub fn export_document(state: &BoardState, live: Orientation) -> DocumentResult<String> {
    let json = serde_json::to_string_pretty(&to_canonical(state, live))?;
    log::debug!(
        "Exported document with {} items and {} drawings",
        state.items.len(),
        state.drawings.len()
    );
    Ok(json)
}

/// Parse a portable document into a board for the live orientation.
///
/// The whole document is checked before anything is returned; a caller that
/// commits only on `Ok` never sees a partially applied import.
pub fn import_document(json: &str, live: Orientation) -> DocumentResult<BoardState> {
    let value: Value = serde_json::from_str(json)?;
    let object = value.as_object().ok_or(DocumentError::NotAnObject)?;
    for field in ["items", "drawings"] {
        match object.get(field) {
            None => return Err(DocumentError::MissingField(field)),
            Some(Value::Array(_)) => {}
            Some(_) => return Err(DocumentError::NotAList(field)),
        }
    }

    let state: BoardState = serde_json::from_value(value)?;
    state.validate()?;
    log::debug!(
        "Imported document with {} items and {} drawings",
        state.items.len(),
        state.drawings.len()
    );
    Ok(from_canonical(&state, live))
}

/// File name for an export of the diagram called `name`.
///
/// Characters that are unsafe in file names become `_`; a blank name
/// falls back to `tactics-board`.
pub fn export_file_name(name: &str, extension: &str) -> String {
    let safe: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim_matches(|c: char| c == '.' || c == ' ');
    let stem = if safe.is_empty() { "tactics-board" } else { safe };
    format!("{}.{}", stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardItem, ColorRef, Drawing, DrawingKind, ItemKind, ItemPayload};
    use kurbo::Point;

    fn board() -> BoardState {
        BoardState::new()
            .with_item(BoardItem::new(
                ItemKind::Player,
                "p10",
                Point::new(0.25, 0.75),
                ItemPayload::player(ColorRef::theme("home"), Some(10), None),
            ))
            .unwrap()
            .with_drawing(
                Drawing::new(DrawingKind::Text, Point::new(0.5, 0.5), ColorRef::default(), 2.0)
                    .with_text("Press here"),
            )
            .unwrap()
            .with_drawing(
                Drawing::new(DrawingKind::Arrow, Point::new(0.1, 0.2), ColorRef::theme("accent"), 3.0)
                    .with_points(vec![Point::new(0.1, 0.2), Point::new(0.6, 0.4)]),
            )
            .unwrap()
    }

    #[test]
    fn test_export_import_round_trip() {
        let original = board();
        let json = export_document(&original, Orientation::Horizontal).unwrap();
        let imported = import_document(&json, Orientation::Horizontal).unwrap();
        assert_eq!(imported, original);
    }

    #[test]
    fn test_round_trip_from_vertical_editor() {
        let original = board();
        let json = export_document(&original, Orientation::Vertical).unwrap();
        let imported = import_document(&json, Orientation::Vertical).unwrap();
        assert_eq!(imported.items.len(), original.items.len());
        for (a, b) in imported.points().zip(original.points()) {
            assert!(a.distance(b) < 1e-9);
        }
    }

    #[test]
    fn test_document_has_no_envelope() {
        let json = export_document(&board(), Orientation::Horizontal).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["drawings", "items"]);
    }

    #[test]
    fn test_rejects_missing_or_wrong_fields() {
        assert!(matches!(
            import_document(r#"{ "items": [] }"#, Orientation::Horizontal),
            Err(DocumentError::MissingField("drawings"))
        ));
        assert!(matches!(
            import_document(r#"{ "items": {}, "drawings": [] }"#, Orientation::Horizontal),
            Err(DocumentError::NotAList("items"))
        ));
        assert!(matches!(
            import_document("[]", Orientation::Horizontal),
            Err(DocumentError::NotAnObject)
        ));
        assert!(matches!(
            import_document("{ nope", Orientation::Horizontal),
            Err(DocumentError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_board() {
        let mut state = board();
        state.items[0].position = Point::new(1.5, 0.5);
        let json = serde_json::to_string(&state).unwrap();
        assert!(matches!(
            import_document(&json, Orientation::Horizontal),
            Err(DocumentError::Invalid(BoardError::OutOfBounds { .. }))
        ));

        let mut twice = board();
        let mut copy = twice.items[0].clone();
        copy.id = uuid::Uuid::new_v4();
        twice.items.push(copy);
        let json = serde_json::to_string(&twice).unwrap();
        assert!(matches!(
            import_document(&json, Orientation::Horizontal),
            Err(DocumentError::Invalid(BoardError::DuplicatePlayer(_)))
        ));
    }

    #[test]
    fn test_rejects_drawings_with_too_few_points() {
        let arrow = serde_json::to_value(&board().drawings[1]).unwrap();

        let mut line = arrow.clone();
        line["kind"] = serde_json::json!("line");
        line["points"] = serde_json::json!([{ "x": 0.1, "y": 0.1 }]);
        let json = serde_json::json!({ "items": [], "drawings": [line] }).to_string();
        assert!(matches!(
            import_document(&json, Orientation::Horizontal),
            Err(DocumentError::Invalid(BoardError::MalformedDrawing { .. }))
        ));

        let mut curve = arrow;
        curve["kind"] = serde_json::json!("curved-arrow");
        curve["points"] = serde_json::json!([]);
        let json = serde_json::json!({ "items": [], "drawings": [curve] }).to_string();
        assert!(import_document(&json, Orientation::Horizontal).is_err());
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Corner A/B", "png"), "Corner A_B.png");
        assert_eq!(export_file_name("  ", "json"), "tactics-board.json");
        assert_eq!(export_file_name("..", "json"), "tactics-board.json");
    }
}
