//! Board state store: the current board, its history and its save status.

use crate::board::BoardState;
use crate::catalog::DiagramId;
use crate::geometry::{Orientation, reorient};
use crate::history::History;

/// Holds the versioned board of one editing session.
///
/// Every snapshot remembers the orientation its geometry is expressed in,
/// so undoing an orientation change also restores the layout.
#[derive(Debug, Clone)]
pub struct BoardStore {
    history: History,
    /// Orientation of each snapshot, parallel to `history`.
    orientations: Vec<Orientation>,
    /// History index of the snapshot that matches storage, if any.
    saved: Option<usize>,
    /// Diagram the board was loaded from or last saved as.
    active: Option<DiagramId>,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardStore {
    pub fn new() -> Self {
        Self::with_orientation(Orientation::default())
    }

    /// An empty store laid out in `orientation`.
    pub fn with_orientation(orientation: Orientation) -> Self {
        Self {
            history: History::default(),
            orientations: vec![orientation],
            saved: Some(0),
            active: None,
        }
    }

    /// The current board.
    pub fn current(&self) -> &BoardState {
        self.history.current()
    }

    /// Orientation the current board is expressed in.
    pub fn orientation(&self) -> Orientation {
        self.orientations[self.history.index()]
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Produce a new board from the current one and push it onto history.
    ///
    /// Structurally equal results are dropped. Returns true if the board changed.
    pub fn commit(&mut self, producer: impl FnOnce(&BoardState) -> BoardState) -> bool {
        let orientation = self.orientation();
        self.push(producer(self.current()), orientation)
    }

    /// Like [`commit`](Self::commit) for producers that can reject the change.
    /// A rejected producer leaves the store untouched.
    pub fn try_commit<E>(
        &mut self,
        producer: impl FnOnce(&BoardState) -> Result<BoardState, E>,
    ) -> Result<bool, E> {
        let next = producer(self.current())?;
        Ok(self.commit(|_| next))
    }

    /// Commit the current board re-expressed in `to` as a history step.
    ///
    /// Returns true if the orientation changed.
    pub fn commit_orientation(&mut self, to: Orientation) -> bool {
        let from = self.orientation();
        if from == to {
            return false;
        }
        let next = reorient(self.current(), from, to);
        if !self.push(next, to) {
            // Geometry is symmetric under the turn: only the layout changes.
            let index = self.history.index();
            self.orientations[index] = to;
        }
        true
    }

    /// Re-express every snapshot in `to` without adding a history step.
    ///
    /// Returns true if the orientation changed.
    pub fn rewrite_orientation(&mut self, to: Orientation) -> bool {
        if self.orientation() == to {
            return false;
        }
        let orientations = std::mem::replace(&mut self.orientations, vec![to; self.history.len()]);
        self.history
            .map_all(|i, state| reorient(state, orientations[i], to));
        log::debug!("Rewrote {} snapshots to {}", self.history.len(), to);
        true
    }

    fn push(&mut self, next: BoardState, orientation: Orientation) -> bool {
        if !self.history.push(next) {
            return false;
        }
        let index = self.history.index();
        self.orientations.truncate(index);
        self.orientations.push(orientation);
        // A saved snapshot on the discarded redo branch is gone for good.
        if self.saved.is_some_and(|saved| saved >= index) {
            self.saved = None;
        }
        log::debug!("Committed board state {} of {}", index + 1, self.history.len());
        true
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        if moved {
            log::debug!("Undo to state {}", self.history.index() + 1);
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        if moved {
            log::debug!("Redo to state {}", self.history.index() + 1);
        }
        moved
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether the current board differs from the last saved or loaded one.
    pub fn is_dirty(&self) -> bool {
        self.saved != Some(self.history.index())
    }

    pub fn active_diagram(&self) -> Option<DiagramId> {
        self.active
    }

    /// Start over with an empty board and no active diagram, keeping the
    /// current layout.
    pub fn reset(&mut self) {
        *self = Self::with_orientation(self.orientation());
        log::debug!("Board store reset");
    }

    /// Replace history with a freshly loaded board expressed in `orientation`.
    pub fn install(&mut self, state: BoardState, orientation: Orientation, diagram: DiagramId) {
        self.history = History::new(state);
        self.orientations = vec![orientation];
        self.saved = Some(0);
        self.active = Some(diagram);
    }

    /// Replace history with an unsaved board, e.g. an imported document.
    pub fn replace(&mut self, state: BoardState, orientation: Orientation) {
        self.history = History::new(state);
        self.orientations = vec![orientation];
        self.saved = None;
        self.active = None;
    }

    /// Record a successful save of the current board.
    pub fn mark_saved(&mut self, diagram: DiagramId) {
        self.saved = Some(self.history.index());
        self.active = Some(diagram);
    }
}
