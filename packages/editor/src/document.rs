//! # Document Handle
//!
//! A Document is the root child list of one rich-text document plus its
//! editing state: the current selection, the id generator used for nodes
//! the editor creates, and the queue of paths awaiting normalization.
//!
//! Documents can be:
//! - **Memory-backed**: built from nodes or JSON, for tests and tools
//! - **File-backed**: loaded from a `.json` file and saved back to it
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Apply mutations → Normalize → Save
//!   ↓          ↓               ↓         ↓
//! JSON   tree + selection   repairs    JSON
//! ```

use crate::{EditorError, Mutation, MutationError};
use std::collections::HashSet;
use std::path::PathBuf;
use trellis_model::visitor::{walk_element, walk_element_mut};
use trellis_model::{
    schema, Affinity, Element, IdGenerator, Node, Path, Point, Range, Text, TextCollector, Visitor,
    VisitorMut,
};

/// Editable rich-text document
#[derive(Debug, Clone)]
pub struct Document {
    /// Name the id seed is derived from
    pub name: String,

    /// Source file (if any)
    pub path: Option<PathBuf>,

    /// Current version number (increments on each tree mutation)
    pub version: u64,

    children: Vec<Node>,
    selection: Option<Range>,
    ids: IdGenerator,

    /// Paths awaiting normalization, processed from the end
    pending: Vec<Path>,
    pending_set: HashSet<Path>,

    unsaved: bool,
}

impl Document {
    /// Create a memory-backed document. Elements without an id get one.
    pub fn new(name: &str, children: Vec<Node>) -> Self {
        let mut ids = IdGenerator::new(name);
        let mut existing = IdCollector(Vec::new());
        existing.visit_children(&children, &Path::root());
        ids.resume_after(existing.0.iter().map(String::as_str));

        let mut children = children;
        let mut assign = AssignIds { ids: &mut ids };
        assign.visit_children_mut(&mut children);

        Self {
            name: name.to_string(),
            path: None,
            version: 0,
            children,
            selection: None,
            ids,
            pending: Vec::new(),
            pending_set: HashSet::new(),
            unsaved: false,
        }
    }

    /// Parse a document from its JSON form: an array of root nodes
    pub fn from_json(name: &str, json: &str) -> Result<Self, EditorError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_array() {
            return Err(EditorError::InvalidRoot);
        }
        let children: Vec<Node> = serde_json::from_value(value)?;
        Ok(Self::new(name, children))
    }

    /// Load document from file (file-backed)
    pub fn load(path: PathBuf) -> Result<Self, EditorError> {
        let source = std::fs::read_to_string(&path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        let mut doc = Self::from_json(&name, &source)?;
        doc.path = Some(path);
        Ok(doc)
    }

    /// Save document to disk (if file-backed)
    pub fn save(&mut self) -> Result<(), EditorError> {
        let path = self.path.clone().ok_or(EditorError::NotFileBacked)?;
        std::fs::write(path, self.to_json(true)?)?;
        self.unsaved = false;
        Ok(())
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, EditorError> {
        let json = if pretty {
            serde_json::to_string_pretty(&self.children)?
        } else {
            serde_json::to_string(&self.children)?
        };
        Ok(json)
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.unsaved
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Node> {
        self.children
    }

    pub fn node(&self, path: &Path) -> Option<&Node> {
        node_at(&self.children, path)
    }

    pub fn element(&self, path: &Path) -> Option<&Element> {
        self.node(path)?.as_element()
    }

    pub fn text(&self, path: &Path) -> Option<&Text> {
        self.node(path)?.as_text()
    }

    /// Children of the element at `path`; the root's children for `[]`
    pub fn children_of(&self, path: &Path) -> Option<&[Node]> {
        children_at(&self.children, path)
    }

    pub fn has(&self, path: &Path) -> bool {
        path.is_root() || self.node(path).is_some()
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    pub fn new_id(&mut self) -> String {
        self.ids.new_id()
    }

    pub fn ids_mut(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    /// Every text run in document order
    pub fn texts(&self) -> Vec<(Path, &Text)> {
        TextCollector::collect(&self.children, &Path::root())
    }

    /// Text runs at or below `path`
    pub fn texts_under(&self, path: &Path) -> Vec<(Path, &Text)> {
        match self.node(path) {
            _ if path.is_root() => self.texts(),
            Some(Node::Text(text)) => vec![(path.clone(), text)],
            Some(Node::Element(element)) => TextCollector::collect(&element.children, path),
            None => Vec::new(),
        }
    }

    /// The root followed by every node path in document order
    pub fn paths(&self) -> Vec<Path> {
        let mut all = PathCollector(vec![Path::root()]);
        all.visit_children(&self.children, &Path::root());
        all.0
    }

    /// First caret position inside `path`
    pub fn start(&self, path: &Path) -> Option<Point> {
        let texts = self.texts_under(path);
        let (path, _) = texts.first()?;
        Some(Point::new(path.clone(), 0))
    }

    /// Last caret position inside `path`
    pub fn end(&self, path: &Path) -> Option<Point> {
        let texts = self.texts_under(path);
        let (path, text) = texts.last()?;
        Some(Point::new(path.clone(), text.len()))
    }

    /// The lowest strict ancestor of `path` matching `pred`
    pub fn above(&self, path: &Path, pred: impl Fn(&Element) -> bool) -> Option<(Path, &Element)> {
        for ancestor in path.ancestors().into_iter().rev() {
            if ancestor.is_root() {
                continue;
            }
            if let Some(element) = self.element(&ancestor) {
                if pred(element) {
                    return Some((ancestor, element));
                }
            }
        }
        None
    }

    /// The lowest block element containing `path`
    pub fn nearest_block(&self, path: &Path) -> Option<(Path, &Element)> {
        self.above(path, |e| schema::is_block(&e.kind))
    }

    /// Apply one primitive mutation.
    ///
    /// The tree changes first; the selection and the normalization queue
    /// are then carried through the mutation. A caret whose text was
    /// removed moves to the end of the previous text run, or the start of
    /// the next one.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<(), MutationError> {
        if let Mutation::SetSelection { selection } = mutation {
            self.selection = selection.clone();
            return Ok(());
        }

        mutation.apply_to(&mut self.children)?;

        let pending = std::mem::take(&mut self.pending);
        self.pending_set.clear();
        for path in pending {
            if let Some(path) = mutation.transform_path(&path, Some(Affinity::Forward)) {
                self.mark_pending(path);
            }
        }
        for path in mutation.dirty_paths() {
            self.mark_pending(path);
        }

        if let Some(selection) = self.selection.take() {
            self.selection = self.carry_selection(mutation, &selection);
        }

        self.version += 1;
        self.unsaved = true;
        Ok(())
    }

    fn carry_selection(&self, mutation: &Mutation, selection: &Range) -> Option<Range> {
        let (anchor, focus) = mutation.transform_range(selection);
        let removed = match mutation {
            Mutation::RemoveNode { path } => Some(path),
            _ => None,
        };
        let anchor = anchor.or_else(|| removed.and_then(|p| self.nearest_text(p)))?;
        let focus = focus.or_else(|| removed.and_then(|p| self.nearest_text(p)))?;
        Some(Range::new(anchor, focus))
    }

    /// Replacement caret for a node that was just removed from `removed`
    fn nearest_text(&self, removed: &Path) -> Option<Point> {
        let mut prev = None;
        let mut next = None;
        for (path, text) in self.texts() {
            if path < *removed {
                prev = Some((path, text.len()));
            } else {
                next = Some(path);
                break;
            }
        }

        let prefer_next = match (&prev, &next) {
            (Some((prev_path, _)), Some(next_path)) => {
                if next_path == removed {
                    next_path.previous().is_none()
                } else {
                    prev_path.common(removed).len() < next_path.common(removed).len()
                }
            }
            _ => false,
        };

        match (prev, next) {
            (Some((path, len)), _) if !prefer_next => Some(Point::new(path, len)),
            (_, Some(path)) => Some(Point::new(path, 0)),
            _ => None,
        }
    }

    /// Queue a path for normalization; false when it was already queued
    pub(crate) fn mark_pending(&mut self, path: Path) -> bool {
        if self.pending_set.insert(path.clone()) {
            self.pending.push(path);
            true
        } else {
            false
        }
    }

    pub(crate) fn unmark_pending(&mut self, path: &Path) {
        if self.pending_set.remove(path) {
            if let Some(index) = self.pending.iter().rposition(|p| p == path) {
                self.pending.remove(index);
            }
        }
    }

    pub(crate) fn pop_pending(&mut self) -> Option<Path> {
        let path = self.pending.pop()?;
        self.pending_set.remove(&path);
        Some(path)
    }

    /// Number of nodes in the tree, root included
    pub(crate) fn node_count(&self) -> usize {
        self.paths().len()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending.clear();
        self.pending_set.clear();
    }

    /// Queue every node (and the root) so the whole tree is re-checked.
    /// Deeper paths come last so they are popped first.
    pub(crate) fn mark_all_pending(&mut self) {
        let mut all = self.paths();
        all.sort_by_key(|p| p.len());
        for path in all {
            self.mark_pending(path);
        }
    }
}

struct IdCollector(Vec<String>);

impl Visitor for IdCollector {
    fn visit_element(&mut self, element: &Element, path: &Path) {
        if !element.id.is_empty() {
            self.0.push(element.id.clone());
        }
        walk_element(self, element, path);
    }
}

struct PathCollector(Vec<Path>);

impl Visitor for PathCollector {
    fn visit_element(&mut self, element: &Element, path: &Path) {
        self.0.push(path.clone());
        walk_element(self, element, path);
    }

    fn visit_text(&mut self, _text: &Text, path: &Path) {
        self.0.push(path.clone());
    }
}

struct AssignIds<'a> {
    ids: &'a mut IdGenerator,
}

impl VisitorMut for AssignIds<'_> {
    fn visit_element_mut(&mut self, element: &mut Element) {
        if element.id.is_empty() {
            element.id = self.ids.new_id();
        }
        walk_element_mut(self, element);
    }
}

pub(crate) fn node_at<'a>(root: &'a [Node], path: &Path) -> Option<&'a Node> {
    let (first, rest) = path.as_slice().split_first()?;
    let mut node = root.get(*first)?;
    for &index in rest {
        node = node.children().get(index)?;
    }
    Some(node)
}

pub(crate) fn node_at_mut<'a>(root: &'a mut [Node], path: &Path) -> Option<&'a mut Node> {
    let (first, rest) = path.as_slice().split_first()?;
    let mut node = root.get_mut(*first)?;
    for &index in rest {
        node = node.as_element_mut()?.children.get_mut(index)?;
    }
    Some(node)
}

pub(crate) fn children_at<'a>(root: &'a [Node], path: &Path) -> Option<&'a [Node]> {
    if path.is_root() {
        return Some(root);
    }
    node_at(root, path)?.as_element().map(|e| e.children.as_slice())
}

pub(crate) fn children_at_mut<'a>(root: &'a mut Vec<Node>, path: &Path) -> Option<&'a mut Vec<Node>> {
    if path.is_root() {
        return Some(root);
    }
    node_at_mut(root, path)?.as_element_mut().map(|e| &mut e.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_model::ElementType;

    fn sample() -> Document {
        Document::from_json(
            "sample",
            r#"[
                {"type":"p","id":"a","children":[{"text":"one"}]},
                {"type":"p","children":[{"text":"two"}]},
                {"type":"p","id":"c","children":[{"text":"three"}]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_missing_ids_are_assigned() {
        let doc = sample();
        let second = doc.element(&Path::new(vec![1])).unwrap();
        assert!(!second.id.is_empty());
        assert_ne!(second.id, "a");
        assert_eq!(doc.version, 0);
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_non_array_root_is_rejected() {
        let err = Document::from_json("x", r#"{"type":"p"}"#).unwrap_err();
        assert!(matches!(err, EditorError::InvalidRoot));
    }

    #[test]
    fn test_version_increments_on_tree_mutation() {
        let mut doc = sample();
        doc.apply(&Mutation::InsertText {
            path: Path::new(vec![0, 0]),
            offset: 3,
            text: "!".into(),
        })
        .unwrap();
        assert_eq!(doc.version, 1);
        assert!(doc.is_dirty());
        assert_eq!(doc.text(&Path::new(vec![0, 0])).unwrap().text, "one!");
    }

    #[test]
    fn test_selection_moves_to_previous_text_on_remove() {
        let mut doc = sample();
        doc.apply(&Mutation::SetSelection {
            selection: Some(Range::collapsed(Point::new(vec![2, 0], 1))),
        })
        .unwrap();

        doc.apply(&Mutation::RemoveNode {
            path: Path::new(vec![2]),
        })
        .unwrap();

        assert_eq!(
            doc.selection(),
            Some(&Range::collapsed(Point::new(vec![1, 0], 3)))
        );
    }

    #[test]
    fn test_selection_moves_to_next_text_when_first_removed() {
        let mut doc = sample();
        doc.apply(&Mutation::SetSelection {
            selection: Some(Range::collapsed(Point::new(vec![0, 0], 2))),
        })
        .unwrap();

        doc.apply(&Mutation::RemoveNode {
            path: Path::new(vec![0]),
        })
        .unwrap();

        assert_eq!(
            doc.selection(),
            Some(&Range::collapsed(Point::new(vec![0, 0], 0)))
        );
    }

    #[test]
    fn test_pending_paths_follow_mutations() {
        let mut doc = sample();
        doc.mark_pending(Path::new(vec![2]));
        doc.apply(&Mutation::RemoveNode {
            path: Path::new(vec![0]),
        })
        .unwrap();

        let mut popped = Vec::new();
        while let Some(path) = doc.pop_pending() {
            popped.push(path);
        }
        assert!(popped.contains(&Path::new(vec![1])));
        assert!(popped.contains(&Path::root()));
        assert!(!popped.contains(&Path::new(vec![2])));
    }

    #[test]
    fn test_nearest_block_and_edges() {
        let doc = Document::new(
            "edges",
            vec![Element::new(
                "l",
                ElementType::UnorderedList,
                vec![Element::new(
                    "i",
                    ElementType::ListItem,
                    vec![Element::new("p", ElementType::Paragraph, vec![Node::text("hey")]).into()],
                )
                .into()],
            )
            .into()],
        );

        let text = Path::new(vec![0, 0, 0, 0]);
        let (path, block) = doc.nearest_block(&text).unwrap();
        assert_eq!(path, Path::new(vec![0, 0, 0]));
        assert_eq!(block.kind, ElementType::Paragraph);

        let (item, _) = doc.above(&text, |e| e.kind == ElementType::ListItem).unwrap();
        assert_eq!(item, Path::new(vec![0, 0]));
        assert_eq!(doc.end(&Path::new(vec![0])), Some(Point::new(text, 3)));
    }
}
