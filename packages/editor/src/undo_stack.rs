//! # Undo/Redo Stack
//!
//! Bounded history of whole-design snapshots.
//!
//! ## Design
//!
//! - Every committed change records a snapshot at the front (index 0)
//! - `position` points at the snapshot matching the live design
//! - Undo moves `position` toward older snapshots, redo back toward 0
//! - Recording after an undo discards the undone snapshots
//! - Navigation never records, so undo/redo alone cannot grow the stack
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//! stack.record(&design);          // baseline
//! stack.record(&edited);
//!
//! let previous = stack.undo().unwrap();   // == design
//! let restored = stack.redo().unwrap();   // == edited
//! ```

use crate::document::Design;
use std::collections::VecDeque;

/// Default number of snapshots kept
pub const DEFAULT_HISTORY_DEPTH: usize = 10;

/// Snapshot history for undo/redo
#[derive(Debug)]
pub struct UndoStack {
    /// Snapshots, most recent first
    snapshots: VecDeque<Design>,

    /// Index of the snapshot the live design corresponds to
    position: usize,

    /// Maximum number of snapshots kept (at least 1)
    max_levels: usize,
}

/// Availability summary handed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub depth: usize,
    pub position: usize,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_HISTORY_DEPTH)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            position: 0,
            max_levels: max_levels.max(1),
        }
    }

    /// Checkpoint the current design
    pub fn record(&mut self, design: &Design) {
        // Undone states are no longer reachable
        self.snapshots.drain(..self.position);
        self.snapshots.push_front(design.clone());
        self.position = 0;
        self.snapshots.truncate(self.max_levels);
    }

    /// Forget everything and start over from `baseline`
    pub fn reset(&mut self, baseline: &Design) {
        self.clear();
        self.snapshots.push_front(baseline.clone());
    }

    /// Step back one snapshot, returning the design to restore
    pub fn undo(&mut self) -> Option<Design> {
        if !self.can_undo() {
            return None;
        }
        self.position += 1;
        self.snapshots.get(self.position).cloned()
    }

    /// Step forward one snapshot, returning the design to restore
    pub fn redo(&mut self) -> Option<Design> {
        if !self.can_redo() {
            return None;
        }
        self.position -= 1;
        self.snapshots.get(self.position).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.position + 1 < self.snapshots.len()
    }

    pub fn can_redo(&self) -> bool {
        self.position > 0
    }

    /// Number of snapshots held
    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            depth: self.depth(),
            position: self.position,
        }
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.position = 0;
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
