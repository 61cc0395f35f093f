//! # Edit Session Management
//!
//! An EditSession exclusively owns one document while it is being edited.
//! Every mutation goes through [`EditSession::apply`], which records it and
//! then normalizes the tree to a fixpoint unless normalization is deferred
//! with [`EditSession::without_normalizing`].
//!
//! ## Normalization loop
//!
//! Applying a mutation queues the paths it may have invalidated. The loop
//! pops one path at a time (deepest last-queued first), applies at most one
//! repair to that node, and lets the repair's own mutations queue whatever
//! they touched. The node itself is re-queued after a repair so it is checked
//! again against every rule. The loop ends when the queue is empty.

use crate::normalizer::{self, NormalizerContext};
use crate::{Document, Mutation, MutationError};
use tracing::{debug, error, trace};
use trellis_model::{Marks, Range};

/// Upper bound on loop iterations per queued path before giving up
const MAX_PASSES_PER_PATH: usize = 42;

/// Single-owner edit session over one document
pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    /// Document being edited
    pub document: Document,

    context: NormalizerContext,

    /// Nesting depth of `without_normalizing` calls
    defer_depth: usize,
    normalizing: bool,

    /// Every mutation applied so far, in order
    operations: Vec<Mutation>,

    /// Marks the next typed text will carry when the caret is collapsed
    pending_marks: Option<Marks>,
}

impl EditSession {
    /// Create new edit session with the default editing context
    pub fn new(id: impl Into<String>, document: Document) -> Self {
        Self::with_context(id, document, NormalizerContext::default())
    }

    /// Create an edit session whose normalizer honours `context`
    pub fn with_context(id: impl Into<String>, document: Document, context: NormalizerContext) -> Self {
        Self {
            id: id.into(),
            document,
            context,
            defer_depth: 0,
            normalizing: false,
            operations: Vec::new(),
            pending_marks: None,
        }
    }

    pub fn context(&self) -> &NormalizerContext {
        &self.context
    }

    pub fn selection(&self) -> Option<&Range> {
        self.document.selection()
    }

    /// Apply one primitive mutation, then normalize unless deferred
    pub fn apply(&mut self, mutation: Mutation) -> Result<(), MutationError> {
        self.document.apply(&mutation)?;
        if matches!(mutation, Mutation::SetSelection { .. }) {
            self.pending_marks = None;
        }
        trace!(?mutation, version = self.document.version, "applied");
        self.operations.push(mutation);

        if self.defer_depth == 0 {
            self.normalize();
        }
        Ok(())
    }

    /// Run `f` with normalization deferred; the queue is processed once
    /// when the outermost call returns.
    pub fn without_normalizing<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.defer_depth += 1;
        let result = f(self);
        self.defer_depth -= 1;
        if self.defer_depth == 0 {
            self.normalize();
        }
        result
    }

    pub fn is_normalizing_deferred(&self) -> bool {
        self.defer_depth > 0
    }

    /// Process the normalization queue until it is empty.
    ///
    /// A failing repair is logged and abandoned; the tree keeps whatever
    /// the completed repairs produced.
    pub fn normalize(&mut self) {
        if self.normalizing || self.defer_depth > 0 {
            return;
        }
        self.normalizing = true;

        let mut budget = self.document.pending_len() * MAX_PASSES_PER_PATH;
        let mut iterations = 0;

        while let Some(path) = self.document.pop_pending() {
            if iterations > budget {
                // Repairs may have grown the tree; the budget tracks its current size
                budget = (self.document.node_count() + self.document.pending_len() + 1) * MAX_PASSES_PER_PATH;
            }
            if iterations > budget {
                error!(
                    iterations,
                    "normalization did not settle; dropping remaining queue"
                );
                self.document.clear_pending();
                break;
            }
            iterations += 1;

            if !self.document.has(&path) {
                continue;
            }

            let requeued = self.document.mark_pending(path.clone());
            let version = self.document.version;

            match normalizer::normalize_node(self, &path) {
                Ok(true) => debug!(path = %path, "repaired"),
                Ok(false) => {}
                Err(e) => error!(path = %path, error = %e, "normalization step failed"),
            }

            if requeued && self.document.version == version {
                self.document.unmark_pending(&path);
            }
        }

        self.normalizing = false;
    }

    /// Re-check every node in the document, not just recently touched ones
    pub fn normalize_all(&mut self) {
        self.document.mark_all_pending();
        self.normalize();
    }

    pub fn operations(&self) -> &[Mutation] {
        &self.operations
    }

    /// Drain the mutation log (for a host undo stack or change feed)
    pub fn take_operations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.operations)
    }

    pub fn pending_marks(&self) -> Option<Marks> {
        self.pending_marks
    }

    pub(crate) fn set_pending_marks(&mut self, marks: Option<Marks>) {
        self.pending_marks = marks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_model::{Path, Point};

    fn session(json: &str) -> EditSession {
        EditSession::new("test", Document::from_json("test", json).unwrap())
    }

    #[test]
    fn test_apply_records_operations() {
        let mut s = session(r#"[{"type":"p","id":"a","children":[{"text":"hi"}]}]"#);
        s.apply(Mutation::InsertText {
            path: Path::new(vec![0, 0]),
            offset: 2,
            text: "!".into(),
        })
        .unwrap();

        assert_eq!(s.operations().len(), 1);
        assert_eq!(s.take_operations().len(), 1);
        assert!(s.operations().is_empty());
    }

    #[test]
    fn test_without_normalizing_defers_repairs() {
        let mut s = session(r#"[{"type":"p","id":"a","children":[{"text":"hi"}]}]"#);

        s.without_normalizing(|s| {
            s.apply(Mutation::RemoveNode {
                path: Path::new(vec![0]),
            })
            .unwrap();
            assert!(s.document.children().is_empty());
            assert!(s.is_normalizing_deferred());
        });

        // The trailing paragraph comes back once the deferred queue runs
        assert_eq!(s.document.children().len(), 1);
    }

    #[test]
    fn test_selection_change_clears_pending_marks() {
        let mut s = session(r#"[{"type":"p","id":"a","children":[{"text":"hi"}]}]"#);
        s.set_pending_marks(Some(Marks::default()));
        s.apply(Mutation::SetSelection {
            selection: Some(Range::collapsed(Point::new(vec![0, 0], 0))),
        })
        .unwrap();
        assert_eq!(s.pending_marks(), None);
    }
}
