//! Linear undo/redo log of board snapshots.

use crate::board::BoardState;

/// Snapshot log with a cursor.
///
/// `snapshots[index]` is the current board. Pushing a new snapshot drops the
/// redo branch after `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    snapshots: Vec<BoardState>,
    index: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(BoardState::new())
    }
}

impl History {
    /// Start a log whose first snapshot is `initial`.
    pub fn new(initial: BoardState) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
        }
    }

    /// The current snapshot.
    pub fn current(&self) -> &BoardState {
        &self.snapshots[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Append `next` unless it equals the current snapshot.
    /// Returns true if the log grew.
    pub fn push(&mut self, next: BoardState) -> bool {
        if next == *self.current() {
            return false;
        }
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(next);
        self.index = self.snapshots.len() - 1;
        true
    }

    /// Step back. Returns true if the cursor moved.
    pub fn undo(&mut self) -> bool {
        if self.can_undo() {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Step forward. Returns true if the cursor moved.
    pub fn redo(&mut self) -> bool {
        if self.can_redo() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// Rewrite every snapshot in place, keeping length and cursor.
    /// The closure receives each snapshot's position in the log.
    pub fn map_all(&mut self, mut f: impl FnMut(usize, &BoardState) -> BoardState) {
        for (i, snapshot) in self.snapshots.iter_mut().enumerate() {
            *snapshot = f(i, snapshot);
        }
    }
}
