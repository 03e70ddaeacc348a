use std::collections::VecDeque;

use crate::limits::MAX_HISTORY;

/// Which document a history belongs to. Used for metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Content,
    Party,
}

impl DocumentKind {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Content => "content",
            DocumentKind::Party => "party",
        }
    }
}

/// Bounded linear undo/redo over whole-document snapshots.
///
/// Snapshots are owned values: pushing takes a clone of the live document, so
/// later edits never reach into a stored snapshot.
///
/// Invariants:
/// 1. `undo_depth() <= capacity` after every operation; the oldest snapshot
///    is evicted first.
/// 2. `push` clears the redo stack (no redo tree).
/// 3. `undo` followed by `redo` restores the document that was live before
///    the undo.
#[derive(Debug, Clone)]
pub struct History<T> {
    kind: DocumentKind,
    undo_stack: VecDeque<T>,
    redo_stack: Vec<T>,
    capacity: usize,
}

impl<T> History<T> {
    pub fn new(kind: DocumentKind) -> Self {
        Self::with_capacity(kind, MAX_HISTORY)
    }

    pub fn with_capacity(kind: DocumentKind, capacity: usize) -> Self {
        Self {
            kind,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Record the pre-mutation document.
    pub fn push(&mut self, snapshot: T) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
            metrics::counter!(crate::observability::HISTORY_EVICTIONS_TOTAL, "document" => self.kind.label())
                .increment(1);
        }
        self.redo_stack.clear();
    }

    /// Install the most recent snapshot into `live`; the replaced document
    /// becomes the next redo target. Returns false when there is nothing to undo.
    pub fn undo(&mut self, live: &mut T) -> bool {
        let Some(snapshot) = self.undo_stack.pop_back() else {
            return false;
        };
        let current = std::mem::replace(live, snapshot);
        self.redo_stack.push(current);
        metrics::counter!(crate::observability::UNDO_TOTAL, "document" => self.kind.label()).increment(1);
        true
    }

    /// Mirror of [`undo`](Self::undo).
    pub fn redo(&mut self, live: &mut T) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(live, snapshot);
        self.undo_stack.push_back(current);
        metrics::counter!(crate::observability::REDO_TOTAL, "document" => self.kind.label()).increment(1);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
