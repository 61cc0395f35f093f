//! # Primitive Mutations
//!
//! The nine low-level operations every edit is built from. Composite
//! transforms (wrap, unwrap, lift, split-up-to-block, ...) in
//! [`crate::transforms`] are sequences of these.
//!
//! ## Mutation Semantics
//!
//! ### Paths
//! - Every mutation addresses nodes by [`Path`]
//! - A mutation knows how it shifts any other path ([`Mutation::transform_path`])
//!   and any caret ([`Mutation::transform_point`]), so the document can keep
//!   its selection and pending normalization work in step with the tree
//!
//! ### Validation
//! - A mutation is checked against the tree before anything changes
//! - A rejected mutation leaves the tree untouched
//!
//! ### Text offsets
//! - Offsets are byte offsets into a text run and must fall on a char boundary

use crate::document::{children_at, children_at_mut, node_at, node_at_mut};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trellis_model::{Affinity, Attributes, Element, ElementType, Marks, Node, Path, Point, Range, Text};

/// Primitive tree operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    /// Insert a node so that it ends up at `path`
    InsertNode { path: Path, node: Node },

    /// Remove the node at `path` with all its descendants
    RemoveNode { path: Path },

    /// Change an element's type/attributes or a text run's marks
    SetNode { path: Path, update: NodeUpdate },

    /// Relocate a node; `new_path` is where it would land if it were
    /// inserted there before the removal
    MoveNode { path: Path, new_path: Path },

    /// Split a node at `position` (byte offset for text, child index for
    /// elements); the second half becomes the next sibling
    SplitNode {
        path: Path,
        position: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Merge a node into its previous sibling; `position` is the previous
    /// sibling's length (text bytes or child count) before the merge
    MergeNode { path: Path, position: usize },

    InsertText { path: Path, offset: usize, text: String },

    RemoveText { path: Path, offset: usize, len: usize },

    SetSelection { selection: Option<Range> },
}

/// Property changes carried by [`Mutation::SetNode`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ElementType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Marks>,
}

impl NodeUpdate {
    pub fn kind(kind: ElementType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn attrs(attrs: Attributes) -> Self {
        Self {
            attrs: Some(attrs),
            ..Self::default()
        }
    }

    pub fn marks(marks: Marks) -> Self {
        Self {
            marks: Some(marks),
            ..Self::default()
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(Path),

    #[error("Invalid path: {0}")]
    InvalidPath(Path),

    #[error("Node is not text: {0}")]
    NotText(Path),

    #[error("Node is not an element: {0}")]
    NotElement(Path),

    #[error("Offset {offset} out of bounds at {path}")]
    OffsetOutOfBounds { path: Path, offset: usize },

    #[error("Cannot move {0} into itself")]
    MoveIntoSelf(Path),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

impl Mutation {
    /// Check the mutation against the tree without changing anything
    pub fn validate(&self, root: &[Node]) -> Result<(), MutationError> {
        match self {
            Mutation::InsertNode { path, .. } => {
                let (parent, index) = split_path(path)?;
                let siblings =
                    children_at(root, &parent).ok_or_else(|| MutationError::NodeNotFound(parent.clone()))?;
                if index > siblings.len() {
                    return Err(MutationError::InvalidPath(path.clone()));
                }
                Ok(())
            }

            Mutation::RemoveNode { path } => {
                split_path(path)?;
                existing(root, path).map(|_| ())
            }

            Mutation::SetNode { path, update } => match existing(root, path)? {
                Node::Element(_) if update.marks.is_some() => Err(MutationError::NotText(path.clone())),
                Node::Text(_) if update.kind.is_some() || update.attrs.is_some() => {
                    Err(MutationError::NotElement(path.clone()))
                }
                _ => Ok(()),
            },

            Mutation::MoveNode { path, new_path } => {
                split_path(path)?;
                split_path(new_path)?;
                existing(root, path)?;
                if path.is_ancestor_of(new_path) {
                    return Err(MutationError::MoveIntoSelf(path.clone()));
                }
                Ok(())
            }

            Mutation::SplitNode { path, position, .. } => {
                split_path(path)?;
                let fits = match existing(root, path)? {
                    Node::Text(text) => *position <= text.len() && text.text.is_char_boundary(*position),
                    Node::Element(element) => *position <= element.children.len(),
                };
                if !fits {
                    return Err(MutationError::OffsetOutOfBounds {
                        path: path.clone(),
                        offset: *position,
                    });
                }
                Ok(())
            }

            Mutation::MergeNode { path, position } => {
                let previous = path
                    .previous()
                    .ok_or_else(|| MutationError::InvalidPath(path.clone()))?;
                let node = existing(root, path)?;
                let prev = existing(root, &previous)?;
                match (prev, node) {
                    (Node::Text(prev), Node::Text(_)) if prev.len() == *position => Ok(()),
                    (Node::Element(prev), Node::Element(_)) if prev.children.len() == *position => Ok(()),
                    _ => Err(MutationError::InvalidStructure(format!(
                        "cannot merge {} into {}",
                        path, previous
                    ))),
                }
            }

            Mutation::InsertText { path, offset, .. } => {
                let text = existing_text(root, path)?;
                if *offset > text.len() || !text.text.is_char_boundary(*offset) {
                    return Err(MutationError::OffsetOutOfBounds {
                        path: path.clone(),
                        offset: *offset,
                    });
                }
                Ok(())
            }

            Mutation::RemoveText { path, offset, len } => {
                let text = existing_text(root, path)?;
                let end = offset + len;
                if end > text.len() || !text.text.is_char_boundary(*offset) || !text.text.is_char_boundary(end) {
                    return Err(MutationError::OffsetOutOfBounds {
                        path: path.clone(),
                        offset: end,
                    });
                }
                Ok(())
            }

            Mutation::SetSelection { .. } => Ok(()),
        }
    }

    /// Apply the mutation to a root child list, validating first
    pub fn apply_to(&self, root: &mut Vec<Node>) -> Result<(), MutationError> {
        self.validate(root)?;

        match self {
            Mutation::InsertNode { path, node } => {
                let (parent, index) = split_path(path)?;
                siblings_mut(root, &parent)?.insert(index, node.clone());
            }

            Mutation::RemoveNode { path } => {
                let (parent, index) = split_path(path)?;
                siblings_mut(root, &parent)?.remove(index);
            }

            Mutation::SetNode { path, update } => match node_at_mut(root, path) {
                Some(Node::Element(element)) => {
                    if let Some(kind) = &update.kind {
                        element.kind = kind.clone();
                    }
                    if let Some(attrs) = &update.attrs {
                        element.attrs = attrs.clone();
                    }
                }
                Some(Node::Text(text)) => {
                    if let Some(marks) = update.marks {
                        text.marks = marks;
                    }
                }
                None => return Err(MutationError::NodeNotFound(path.clone())),
            },

            Mutation::MoveNode { path, new_path } => {
                if path == new_path {
                    return Ok(());
                }
                let (parent, index) = split_path(path)?;
                let node = siblings_mut(root, &parent)?.remove(index);

                let target = self
                    .transform_path(path, None)
                    .ok_or_else(|| MutationError::InvalidPath(new_path.clone()))?;
                let (target_parent, target_index) = split_path(&target)?;
                let fits = children_at(root, &target_parent).map_or(false, |s| target_index <= s.len());
                if !fits {
                    siblings_mut(root, &parent)?.insert(index, node);
                    return Err(MutationError::InvalidPath(new_path.clone()));
                }
                siblings_mut(root, &target_parent)?.insert(target_index, node);
            }

            Mutation::SplitNode { path, position, id } => {
                let (parent, index) = split_path(path)?;
                let rest = match node_at_mut(root, path) {
                    Some(Node::Text(text)) => {
                        let tail = text.text.split_off(*position);
                        Node::Text(Text::marked(tail, text.marks))
                    }
                    Some(Node::Element(element)) => {
                        let tail = element.children.split_off(*position);
                        Node::Element(Element {
                            kind: element.kind.clone(),
                            id: id.clone().unwrap_or_default(),
                            children: tail,
                            attrs: element.attrs.clone(),
                        })
                    }
                    None => return Err(MutationError::NodeNotFound(path.clone())),
                };
                siblings_mut(root, &parent)?.insert(index + 1, rest);
            }

            Mutation::MergeNode { path, .. } => {
                let (parent, index) = split_path(path)?;
                let siblings = siblings_mut(root, &parent)?;
                let node = siblings.remove(index);
                let rejected = match (&mut siblings[index - 1], node) {
                    (Node::Text(prev), Node::Text(text)) => {
                        prev.text.push_str(&text.text);
                        None
                    }
                    (Node::Element(prev), Node::Element(element)) => {
                        prev.children.extend(element.children);
                        None
                    }
                    (_, node) => Some(node),
                };
                if let Some(node) = rejected {
                    siblings.insert(index, node);
                    return Err(MutationError::InvalidStructure(format!("cannot merge {}", path)));
                }
            }

            Mutation::InsertText { path, offset, text } => {
                text_mut(root, path)?.text.insert_str(*offset, text);
            }

            Mutation::RemoveText { path, offset, len } => {
                text_mut(root, path)?.text.replace_range(*offset..offset + len, "");
            }

            Mutation::SetSelection { .. } => {}
        }

        Ok(())
    }

    /// Where `path` ends up after this mutation, or `None` when the node it
    /// addresses no longer exists. `affinity` only matters for a split of
    /// the node itself: forward follows the second half, backward stays,
    /// `None` drops the path.
    pub fn transform_path(&self, path: &Path, affinity: Option<Affinity>) -> Option<Path> {
        if path.is_root() {
            return Some(path.clone());
        }
        let mut p = path.0.clone();

        match self {
            Mutation::InsertNode { path: op, .. } => {
                if op.is_root() {
                    return Some(path.clone());
                }
                if op == path || op.ends_before(path) || op.is_ancestor_of(path) {
                    p[op.len() - 1] += 1;
                }
            }

            Mutation::RemoveNode { path: op } => {
                if op.contains(path) {
                    return None;
                }
                if op.ends_before(path) {
                    p[op.len() - 1] -= 1;
                }
            }

            Mutation::MergeNode { path: op, position } => {
                if op.is_root() {
                    return Some(path.clone());
                }
                if op == path || op.ends_before(path) {
                    p[op.len() - 1] -= 1;
                } else if op.is_ancestor_of(path) {
                    p[op.len() - 1] -= 1;
                    p[op.len()] += position;
                }
            }

            Mutation::SplitNode { path: op, position, .. } => {
                if op.is_root() {
                    return Some(path.clone());
                }
                if op == path {
                    match affinity {
                        Some(Affinity::Forward) => p[op.len() - 1] += 1,
                        Some(Affinity::Backward) => {}
                        None => return None,
                    }
                } else if op.ends_before(path) {
                    p[op.len() - 1] += 1;
                } else if op.is_ancestor_of(path) && path.0[op.len()] >= *position {
                    p[op.len() - 1] += 1;
                    p[op.len()] -= position;
                }
            }

            Mutation::MoveNode { path: op, new_path: onp } => {
                if op == onp || op.is_root() || onp.is_root() {
                    return Some(path.clone());
                }
                if op.contains(path) {
                    let mut moved = onp.0.clone();
                    if op.ends_before(onp) && op.len() < onp.len() {
                        moved[op.len() - 1] -= 1;
                    }
                    moved.extend_from_slice(&path.0[op.len()..]);
                    return Some(Path(moved));
                } else if op.is_sibling(onp) && onp.contains(path) {
                    if op.ends_before(path) {
                        p[op.len() - 1] -= 1;
                    } else {
                        p[op.len() - 1] += 1;
                    }
                } else if onp.ends_before(path) || onp == path || onp.is_ancestor_of(path) {
                    if op.ends_before(path) {
                        p[op.len() - 1] -= 1;
                    }
                    p[onp.len() - 1] += 1;
                } else if op.ends_before(path) {
                    p[op.len() - 1] -= 1;
                }
            }

            Mutation::SetNode { .. }
            | Mutation::InsertText { .. }
            | Mutation::RemoveText { .. }
            | Mutation::SetSelection { .. } => {}
        }

        Some(Path(p))
    }

    /// Where a caret ends up after this mutation, or `None` when the text
    /// it sat in was removed
    pub fn transform_point(&self, point: &Point, affinity: Option<Affinity>) -> Option<Point> {
        let mut path = point.path.clone();
        let mut offset = point.offset;

        match self {
            Mutation::InsertText {
                path: op,
                offset: at,
                text,
            } => {
                if *op == path && (*at < offset || (*at == offset && affinity == Some(Affinity::Forward))) {
                    offset += text.len();
                }
            }

            Mutation::RemoveText { path: op, offset: at, len } => {
                if *op == path && *at <= offset {
                    offset -= (offset - at).min(*len);
                }
            }

            Mutation::MergeNode { path: op, position } => {
                if *op == path {
                    offset += position;
                }
                path = self.transform_path(&path, affinity)?;
            }

            Mutation::SplitNode { path: op, position, .. } => {
                if *op == path {
                    if *position == offset && affinity.is_none() {
                        return None;
                    }
                    if *position < offset || (*position == offset && affinity == Some(Affinity::Forward)) {
                        offset -= position;
                        path = self.transform_path(&path, Some(Affinity::Forward))?;
                    }
                } else {
                    path = self.transform_path(&path, affinity)?;
                }
            }

            _ => {
                path = self.transform_path(&path, affinity)?;
            }
        }

        Some(Point { path, offset })
    }

    /// Transform a selection with inward affinity: a collapsed caret leans
    /// forward, an expanded range shrinks toward its contents. Points whose
    /// text was removed come back as `None` for the caller to relocate.
    pub fn transform_range(&self, range: &Range) -> (Option<Point>, Option<Point>) {
        let (anchor_affinity, focus_affinity) = if range.is_collapsed() {
            (Affinity::Forward, Affinity::Forward)
        } else if range.is_backward() {
            (Affinity::Backward, Affinity::Forward)
        } else {
            (Affinity::Forward, Affinity::Backward)
        };
        (
            self.transform_point(&range.anchor, Some(anchor_affinity)),
            self.transform_point(&range.focus, Some(focus_affinity)),
        )
    }

    /// Paths whose normalization may be affected by this mutation, in the
    /// coordinates of the tree after it is applied
    pub fn dirty_paths(&self) -> Vec<Path> {
        match self {
            Mutation::InsertText { path, .. }
            | Mutation::RemoveText { path, .. }
            | Mutation::SetNode { path, .. } => levels(path),

            Mutation::InsertNode { path, node } => {
                let mut paths = levels(path);
                descendant_paths(node, path, &mut paths);
                paths
            }

            Mutation::RemoveNode { path } => path.ancestors(),

            Mutation::MergeNode { path, .. } => {
                let mut paths = path.ancestors();
                paths.extend(path.previous());
                paths
            }

            Mutation::SplitNode { path, .. } => {
                let mut paths = levels(path);
                paths.push(path.next());
                paths
            }

            Mutation::MoveNode { path, new_path } => {
                if path == new_path {
                    return Vec::new();
                }
                let old_ancestors: Vec<Path> = path
                    .ancestors()
                    .iter()
                    .filter_map(|a| self.transform_path(a, Some(Affinity::Forward)))
                    .collect();
                let new_ancestors: Vec<Path> = new_path
                    .ancestors()
                    .iter()
                    .filter_map(|a| self.transform_path(a, Some(Affinity::Forward)))
                    .collect();
                let mut paths = old_ancestors;
                if let (Some(parent), Some(index)) = (new_ancestors.last(), new_path.last()) {
                    let landed = parent.child(index);
                    paths.extend(new_ancestors.iter().cloned());
                    paths.push(landed);
                }
                paths
            }

            Mutation::SetSelection { .. } => Vec::new(),
        }
    }

    /// Whether this mutation changes the tree (as opposed to only the selection)
    pub fn is_structural(&self) -> bool {
        !matches!(self, Mutation::SetSelection { .. })
    }
}

/// The path's ancestors followed by the path itself
fn levels(path: &Path) -> Vec<Path> {
    let mut paths = path.ancestors();
    paths.push(path.clone());
    paths
}

fn descendant_paths(node: &Node, path: &Path, out: &mut Vec<Path>) {
    for (index, child) in node.children().iter().enumerate() {
        let child_path = path.child(index);
        descendant_paths(child, &child_path, out);
        out.push(child_path);
    }
}

fn split_path(path: &Path) -> Result<(Path, usize), MutationError> {
    match (path.parent(), path.last()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        _ => Err(MutationError::InvalidPath(path.clone())),
    }
}

fn existing<'a>(root: &'a [Node], path: &Path) -> Result<&'a Node, MutationError> {
    node_at(root, path).ok_or_else(|| MutationError::NodeNotFound(path.clone()))
}

fn existing_text<'a>(root: &'a [Node], path: &Path) -> Result<&'a Text, MutationError> {
    existing(root, path)?
        .as_text()
        .ok_or_else(|| MutationError::NotText(path.clone()))
}

fn siblings_mut<'a>(root: &'a mut Vec<Node>, parent: &Path) -> Result<&'a mut Vec<Node>, MutationError> {
    children_at_mut(root, parent).ok_or_else(|| MutationError::NodeNotFound(parent.clone()))
}

fn text_mut<'a>(root: &'a mut [Node], path: &Path) -> Result<&'a mut Text, MutationError> {
    match node_at_mut(root, path) {
        Some(Node::Text(text)) => Ok(text),
        Some(Node::Element(_)) => Err(MutationError::NotText(path.clone())),
        None => Err(MutationError::NodeNotFound(path.clone())),
    }
}
