//! Undo/Redo snapshot history.
//!
//! Every committed mutation pushes a full copy of the state as it was just
//! before the change. Undo swaps the current state with the newest past
//! snapshot; redo swaps it back. Whether a mutation "changed" anything is
//! decided by value equality, so a mutator that leaves the state equal to
//! what it was never creates an undo step.
//!
//! Drag gestures may be grouped with `begin_batch`/`end_batch`: the state is
//! captured when the gesture starts and pushed once when it ends, if the
//! gesture actually moved something.

use log::debug;

/// Linear undo/redo over snapshots of `S`.
#[derive(Debug, Clone)]
pub struct History<S> {
    past: Vec<S>,
    future: Vec<S>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// State captured at the start of the outermost batch.
    batch_snapshot: Option<S>,
}

impl<S: Clone + PartialEq> History<S> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_snapshot: None,
        }
    }

    /// Apply `mutator` to `state`. If the result differs from the previous
    /// state, the previous state becomes an undo step and the redo stack is
    /// discarded. Inside a batch the change is applied live and left for
    /// `end_batch` to record.
    ///
    /// Returns whether the state changed.
    pub fn commit(&mut self, state: &mut S, mutator: impl FnOnce(&mut S)) -> bool {
        let before = state.clone();
        mutator(state);
        if *state == before {
            return false;
        }
        if self.batch_depth > 0 {
            return true;
        }
        self.push_past(before);
        debug!("history: commit (undo depth {})", self.past.len());
        true
    }

    /// Apply `mutator` without touching either stack. Used for per-frame
    /// drag updates.
    pub fn apply_without_history(&mut self, state: &mut S, mutator: impl FnOnce(&mut S)) -> bool {
        let before = state.clone();
        mutator(state);
        *state != before
    }

    /// Restore the newest past snapshot. Any open batch is abandoned.
    pub fn undo(&mut self, state: &mut S) -> bool {
        self.reset_batch();
        let Some(previous) = self.past.pop() else {
            return false;
        };
        let current = std::mem::replace(state, previous);
        self.future.push(current);
        debug!(
            "history: undo (undo depth {}, redo depth {})",
            self.past.len(),
            self.future.len()
        );
        true
    }

    /// Re-apply the newest undone snapshot.
    pub fn redo(&mut self, state: &mut S) -> bool {
        self.reset_batch();
        let Some(next) = self.future.pop() else {
            return false;
        };
        let current = std::mem::replace(state, next);
        self.past.push(current);
        debug!(
            "history: redo (undo depth {}, redo depth {})",
            self.past.len(),
            self.future.len()
        );
        true
    }

    /// Start a batch group. Commits until the matching `end_batch` are
    /// applied live and recorded as one undo step.
    pub fn begin_batch(&mut self, state: &S) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(state.clone());
        }
        self.batch_depth += 1;
    }

    /// Close a batch group. When the outermost batch closes and `state`
    /// differs from the captured snapshot, one undo step is pushed.
    ///
    /// Returns whether an undo step was recorded.
    pub fn end_batch(&mut self, state: &S) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        match self.batch_snapshot.take() {
            Some(before) if before != *state => {
                self.push_past(before);
                debug!("history: batch committed (undo depth {})", self.past.len());
                true
            }
            _ => false,
        }
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// Forget every snapshot, e.g. when a different document is adopted.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.reset_batch();
    }

    fn push_past(&mut self, snapshot: S) {
        self.past.push(snapshot);
        if self.past.len() > self.max_depth {
            self.past.remove(0);
        }
        self.future.clear();
    }

    fn reset_batch(&mut self) {
        self.batch_depth = 0;
        self.batch_snapshot = None;
    }
}

impl<S: Clone + PartialEq> Default for History<S> {
    fn default() -> Self {
        Self::new(100)
    }
}
