//! # Composite Transforms
//!
//! Editing operations built from primitive mutations. Multi-step transforms
//! run inside [`EditSession::without_normalizing`] so the normalizer only
//! sees their finished result.

use crate::mutations::NodeUpdate;
use crate::{EditSession, Mutation, MutationError};
use trellis_model::{builders, schema, Element, Mark, Marks, Node, Path, Point, Range, Text};

impl EditSession {
    pub fn insert_node(&mut self, at: &Path, node: impl Into<Node>) -> Result<(), MutationError> {
        self.apply(Mutation::InsertNode {
            path: at.clone(),
            node: node.into(),
        })
    }

    /// Insert `nodes` as consecutive siblings starting at `at`
    pub fn insert_nodes(&mut self, at: &Path, nodes: Vec<Node>) -> Result<(), MutationError> {
        self.without_normalizing(|s| {
            let mut path = at.clone();
            for node in nodes {
                s.insert_node(&path, node)?;
                path = path.next();
            }
            Ok(())
        })
    }

    pub fn remove_node(&mut self, at: &Path) -> Result<(), MutationError> {
        self.apply(Mutation::RemoveNode { path: at.clone() })
    }

    pub fn set_node(&mut self, at: &Path, update: NodeUpdate) -> Result<(), MutationError> {
        self.apply(Mutation::SetNode {
            path: at.clone(),
            update,
        })
    }

    pub fn move_node(&mut self, from: &Path, to: &Path) -> Result<(), MutationError> {
        self.apply(Mutation::MoveNode {
            path: from.clone(),
            new_path: to.clone(),
        })
    }

    /// Split one node at `position`; a split element's second half gets a fresh id
    pub fn split_node(&mut self, at: &Path, position: usize) -> Result<(), MutationError> {
        let id = match self.document.node(at) {
            Some(Node::Element(_)) => Some(self.document.new_id()),
            Some(Node::Text(_)) => None,
            None => return Err(MutationError::NodeNotFound(at.clone())),
        };
        self.apply(Mutation::SplitNode {
            path: at.clone(),
            position,
            id,
        })
    }

    /// Merge the node at `at` into its previous sibling
    pub fn merge_node(&mut self, at: &Path) -> Result<(), MutationError> {
        let previous = at
            .previous()
            .ok_or_else(|| MutationError::InvalidPath(at.clone()))?;
        let position = match self.document.node(&previous) {
            Some(Node::Text(text)) => text.len(),
            Some(Node::Element(element)) => element.children.len(),
            None => return Err(MutationError::NodeNotFound(previous)),
        };
        self.apply(Mutation::MergeNode {
            path: at.clone(),
            position,
        })
    }

    /// Split nodes from the text at `point` up to and including `top`.
    /// Returns the path of `top`'s second half.
    pub fn split_nodes(&mut self, point: &Point, top: &Path) -> Result<Path, MutationError> {
        if !top.contains(&point.path) || top.is_root() {
            return Err(MutationError::InvalidPath(top.clone()));
        }
        self.without_normalizing(|s| {
            let mut path = point.path.clone();
            let mut position = point.offset;
            loop {
                s.split_node(&path, position)?;
                if path == *top {
                    break;
                }
                position = path.last().map_or(0, |i| i + 1);
                path = path
                    .parent()
                    .ok_or_else(|| MutationError::InvalidPath(path.clone()))?;
            }
            Ok(top.next())
        })
    }

    /// Insert `wrapper` at `at` and move the node there into it
    pub fn wrap_node(&mut self, at: &Path, wrapper: Element) -> Result<(), MutationError> {
        let mut wrapper = wrapper;
        wrapper.children.clear();
        self.without_normalizing(|s| {
            s.insert_node(at, wrapper)?;
            s.move_node(&at.next(), &at.child(0))
        })
    }

    /// Wrap children `start..end` of `parent` into `wrapper`
    pub fn wrap_children(
        &mut self,
        parent: &Path,
        start: usize,
        end: usize,
        wrapper: Element,
    ) -> Result<(), MutationError> {
        let mut wrapper = wrapper;
        wrapper.children.clear();
        let at = parent.child(start);
        self.without_normalizing(|s| {
            s.insert_node(&at, wrapper)?;
            for k in 0..end.saturating_sub(start) {
                s.move_node(&parent.child(start + 1), &at.child(k))?;
            }
            Ok(())
        })
    }

    /// Replace the element at `at` with its own children
    pub fn unwrap_node(&mut self, at: &Path) -> Result<(), MutationError> {
        let count = self
            .document
            .element(at)
            .ok_or_else(|| MutationError::NotElement(at.clone()))?
            .children
            .len();
        let (parent, index) = parent_and_index(at)?;
        self.without_normalizing(|s| {
            for i in 0..count {
                let wrapper = parent.child(index + i);
                s.move_node(&wrapper.child(0), &wrapper)?;
            }
            s.remove_node(&parent.child(index + count))
        })
    }

    /// Move a node up one level: out of its parent, splitting the parent
    /// when the node sits in the middle of it
    pub fn lift_node(&mut self, at: &Path) -> Result<(), MutationError> {
        let (parent, index) = parent_and_index(at)?;
        if parent.is_root() {
            return Err(MutationError::InvalidPath(at.clone()));
        }
        let length = self
            .document
            .children_of(&parent)
            .ok_or_else(|| MutationError::NodeNotFound(parent.clone()))?
            .len();

        self.without_normalizing(|s| {
            if length == 1 {
                s.move_node(at, &parent.next())?;
                s.remove_node(&parent)
            } else if index == 0 {
                s.move_node(at, &parent)
            } else if index == length - 1 {
                s.move_node(at, &parent.next())
            } else {
                s.split_node(&parent, index + 1)?;
                s.move_node(at, &parent.next())
            }
        })
    }

    pub fn select(&mut self, range: Range) -> Result<(), MutationError> {
        self.apply(Mutation::SetSelection {
            selection: Some(range),
        })
    }

    /// Collapse the selection at the start of the node at `at`
    pub fn select_start(&mut self, at: &Path) -> Result<(), MutationError> {
        let point = self
            .document
            .start(at)
            .ok_or_else(|| MutationError::NodeNotFound(at.clone()))?;
        self.select(Range::collapsed(point))
    }

    /// Collapse the selection at the end of the node at `at`
    pub fn select_end(&mut self, at: &Path) -> Result<(), MutationError> {
        let point = self
            .document
            .end(at)
            .ok_or_else(|| MutationError::NodeNotFound(at.clone()))?;
        self.select(Range::collapsed(point))
    }

    pub fn deselect(&mut self) -> Result<(), MutationError> {
        self.apply(Mutation::SetSelection { selection: None })
    }

    /// Remove the selected text in every run the selection touches, then
    /// collapse to its start. Emptied blocks are kept.
    pub fn delete_selection(&mut self) -> Result<(), MutationError> {
        let Some(selection) = self.selection().cloned() else {
            return Ok(());
        };
        if selection.is_collapsed() {
            return Ok(());
        }
        let spans = text_spans(self, &selection);
        let start = selection.start().clone();
        self.without_normalizing(|s| {
            for (path, from, to) in spans.into_iter().rev() {
                if to > from {
                    s.apply(Mutation::RemoveText {
                        path,
                        offset: from,
                        len: to - from,
                    })?;
                }
            }
            s.select(Range::collapsed(start))
        })
    }

    /// Type text at the caret. Pending marks from a collapsed-selection
    /// toggle go into a new run instead of extending the current one.
    pub fn insert_text(&mut self, text: &str) -> Result<(), MutationError> {
        self.delete_selection()?;
        let Some(point) = self.selection().map(|r| r.anchor.clone()) else {
            return Ok(());
        };
        let current = self
            .document
            .text(&point.path)
            .ok_or_else(|| MutationError::NotText(point.path.clone()))?;
        let current_marks = current.marks;
        let current_len = current.len();

        match self.pending_marks() {
            Some(marks) if marks != current_marks => {
                self.set_pending_marks(None);
                self.without_normalizing(|s| {
                    let at = if point.offset == 0 {
                        point.path.clone()
                    } else if point.offset == current_len {
                        point.path.next()
                    } else {
                        s.split_node(&point.path, point.offset)?;
                        point.path.next()
                    };
                    s.insert_node(&at, Text::marked(text, marks))?;
                    s.select(Range::collapsed(Point::new(at, text.len())))
                })
            }
            _ => self.apply(Mutation::InsertText {
                path: point.path,
                offset: point.offset,
                text: text.to_string(),
            }),
        }
    }

    /// Default Enter: split the nearest block at the caret and move the
    /// caret into the second half. On a void block, add a paragraph after it.
    pub fn insert_break(&mut self) -> Result<(), MutationError> {
        self.delete_selection()?;
        let Some(point) = self.selection().map(|r| r.anchor.clone()) else {
            return Ok(());
        };
        let Some((block_path, block)) = self.document.nearest_block(&point.path) else {
            return Ok(());
        };

        if schema::is_void(&block.kind) {
            let para = builders::p(self.document.ids_mut(), "");
            let at = block_path.next();
            return self.without_normalizing(|s| {
                s.insert_node(&at, para)?;
                s.select_start(&at)
            });
        }

        let second = self.split_nodes(&point, &block_path)?;
        self.select_start(&second)
    }

    /// Toggle a mark over the selection; on a collapsed caret, toggle the
    /// marks the next typed text will carry
    pub fn toggle_mark(&mut self, mark: Mark) -> Result<(), MutationError> {
        let Some(selection) = self.selection().cloned() else {
            return Ok(());
        };

        if selection.is_collapsed() {
            let base = match self.pending_marks() {
                Some(marks) => marks,
                None => self
                    .document
                    .text(&selection.anchor.path)
                    .map(|t| t.marks)
                    .unwrap_or_default(),
            };
            let mut marks = base;
            marks.set(mark, !base.has(mark));
            self.set_pending_marks(Some(marks));
            return Ok(());
        }

        let spans = text_spans(self, &selection);
        let active = !spans.is_empty()
            && spans.iter().all(|(path, _, _)| {
                self.document
                    .text(path)
                    .map_or(false, |t| t.marks.has(mark))
            });

        self.without_normalizing(|s| {
            for (path, from, to) in spans.into_iter().rev() {
                let len = s.document.text(&path).map_or(0, Text::len);
                if from == to && len > 0 {
                    continue;
                }
                if to < len {
                    s.split_node(&path, to)?;
                }
                let target = if from > 0 {
                    s.split_node(&path, from)?;
                    path.next()
                } else {
                    path
                };
                let mut marks: Marks = s.document.text(&target).map(|t| t.marks).unwrap_or_default();
                marks.set(mark, !active);
                s.set_node(&target, NodeUpdate::marks(marks))?;
            }
            Ok(())
        })
    }
}

/// `(path, from, to)` byte spans of every text run inside `range`
fn text_spans(session: &EditSession, range: &Range) -> Vec<(Path, usize, usize)> {
    let start = range.start();
    let end = range.end();
    session
        .document
        .texts()
        .into_iter()
        .filter(|(path, _)| *path >= start.path && *path <= end.path)
        .map(|(path, text)| {
            let from = if path == start.path { start.offset.min(text.len()) } else { 0 };
            let to = if path == end.path { end.offset.min(text.len()) } else { text.len() };
            (path, from, to.max(from))
        })
        .collect()
}

fn parent_and_index(path: &Path) -> Result<(Path, usize), MutationError> {
    match (path.parent(), path.last()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        _ => Err(MutationError::InvalidPath(path.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use trellis_model::ElementType;

    fn session(json: &str) -> EditSession {
        EditSession::new("t", Document::from_json("t", json).unwrap())
    }

    fn kinds(s: &EditSession) -> Vec<String> {
        s.document
            .children()
            .iter()
            .map(|n| n.kind().map_or("text".to_string(), |k| k.to_string()))
            .collect()
    }

    #[test]
    fn test_insert_break_splits_paragraph() {
        let mut s = session(r#"[{"type":"p","id":"a","children":[{"text":"hello"}]}]"#);
        s.select(Range::collapsed(Point::new(vec![0, 0], 2))).unwrap();
        s.insert_break().unwrap();

        assert_eq!(s.document.children()[0].text_content(), "he");
        assert_eq!(s.document.children()[1].text_content(), "llo");
        assert_eq!(s.selection(), Some(&Range::collapsed(Point::new(vec![1, 0], 0))));
    }

    #[test]
    fn test_lift_middle_child_splits_parent() {
        let mut s = session(
            r#"[{"type":"blockquote","id":"q","children":[
                {"type":"p","id":"a","children":[{"text":"a"}]},
                {"type":"p","id":"b","children":[{"text":"b"}]},
                {"type":"p","id":"c","children":[{"text":"c"}]}
            ]},{"type":"p","id":"t","children":[{"text":""}]}]"#,
        );
        s.without_normalizing(|s| s.lift_node(&Path::new(vec![0, 1]))).unwrap();

        assert_eq!(kinds(&s), vec!["blockquote", "p", "blockquote", "p"]);
        assert_eq!(s.document.children()[1].text_content(), "b");
    }

    #[test]
    fn test_unwrap_replaces_with_children() {
        let mut s = session(
            r#"[{"type":"blockquote","id":"q","children":[
                {"type":"p","id":"a","children":[{"text":"a"}]},
                {"type":"p","id":"b","children":[{"text":"b"}]}
            ]}]"#,
        );
        s.without_normalizing(|s| s.unwrap_node(&Path::new(vec![0]))).unwrap();
        assert_eq!(kinds(&s), vec!["p", "p"]);
        assert_eq!(s.document.children()[1].text_content(), "b");
    }

    #[test]
    fn test_wrap_node_moves_into_wrapper() {
        let mut s = session(r#"[{"type":"p","id":"a","children":[{"text":"a"}]}]"#);
        let quote = Element::new("q", ElementType::Blockquote, vec![]);
        s.wrap_node(&Path::new(vec![0]), quote).unwrap();

        let quote = s.document.element(&Path::new(vec![0])).unwrap();
        assert_eq!(quote.kind, ElementType::Blockquote);
        assert_eq!(quote.children[0].as_element().unwrap().id, "a");
    }

    #[test]
    fn test_toggle_mark_over_partial_run() {
        let mut s = session(r#"[{"type":"p","id":"a","children":[{"text":"hello"}]}]"#);
        s.select(Range::new(Point::new(vec![0, 0], 1), Point::new(vec![0, 0], 3)))
            .unwrap();
        s.toggle_mark(Mark::Strong).unwrap();

        let para = s.document.element(&Path::new(vec![0])).unwrap();
        let runs: Vec<_> = para
            .children
            .iter()
            .map(|n| {
                let t = n.as_text().unwrap();
                (t.text.as_str(), t.marks.strong)
            })
            .collect();
        assert_eq!(runs, vec![("h", false), ("el", true), ("lo", false)]);
    }

    #[test]
    fn test_pending_marks_apply_to_typed_text() {
        let mut s = session(r#"[{"type":"p","id":"a","children":[{"text":"ab"}]}]"#);
        s.select(Range::collapsed(Point::new(vec![0, 0], 2))).unwrap();
        s.toggle_mark(Mark::Em).unwrap();
        s.insert_text("c").unwrap();

        let para = s.document.element(&Path::new(vec![0])).unwrap();
        assert_eq!(para.children.len(), 2);
        assert!(para.children[1].as_text().unwrap().marks.em);
        assert_eq!(s.pending_marks(), None);
    }
}
