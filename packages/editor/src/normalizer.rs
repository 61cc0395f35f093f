//! # Tree Normalizer
//!
//! Repairs schema violations one node at a time. [`diagnose`] inspects a
//! single node and names the first rule it breaks together with the one
//! repair that fixes it; [`normalize_node`] applies that repair. The fixpoint
//! loop that drives this lives in [`crate::EditSession::normalize`].
//!
//! ## Rule priority
//!
//! 1. Restricted elements are removed unless the context allows them
//! 2. The root's last child must be a paragraph
//! 3. A block must be accepted by its (non-root) parent
//! 4. A block that may not sit at the root is unwrapped there
//! 5. Adjacent spaced blocks get an empty paragraph between them
//! 6. Table rows are padded to the table's effective width
//! 7. Structural defaults: empty containers, loose inline content, text runs

use crate::table;
use crate::{Document, EditSession, MutationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use trellis_model::{builders, schema, Element, ElementType, Node, Path};

/// Types that are removed unless the editing context allows them
pub const RESTRICTED: [ElementType; 1] = [ElementType::InputRef];

/// Per-session normalizer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizerContext {
    /// Restricted types this context permits anyway
    #[serde(default)]
    pub allow_list: Vec<ElementType>,
}

impl NormalizerContext {
    pub fn allowing(kinds: impl IntoIterator<Item = ElementType>) -> Self {
        Self {
            allow_list: kinds.into_iter().collect(),
        }
    }

    pub fn allows(&self, kind: &ElementType) -> bool {
        self.allow_list.contains(kind)
    }

    pub fn is_restricted(&self, kind: &ElementType) -> bool {
        RESTRICTED.contains(kind) && !self.allows(kind)
    }
}

/// The rule a node violates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    RestrictedElement,
    TrailingParagraph,
    InvalidChild,
    NotTopLevel,
    BlockSpacing,
    TableRowLength,
    EmptyContainer,
    LooseInline,
    AdjacentText,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::RestrictedElement => "restricted-element",
            Rule::TrailingParagraph => "trailing-paragraph",
            Rule::InvalidChild => "invalid-child",
            Rule::NotTopLevel => "not-top-level",
            Rule::BlockSpacing => "block-spacing",
            Rule::TableRowLength => "table-row-length",
            Rule::EmptyContainer => "empty-container",
            Rule::LooseInline => "loose-inline",
            Rule::AdjacentText => "adjacent-text",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single corrective change
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Remove(Path),
    Unwrap(Path),
    InsertParagraph(Path),
    InsertCell(Path),
    /// Insert the container's default child, or an empty text run
    InsertDefaultChild { at: Path, kind: Option<ElementType> },
    /// Wrap `parent`'s children `start..end` into a new `kind` element
    Wrap {
        parent: Path,
        start: usize,
        end: usize,
        kind: ElementType,
    },
    /// Merge the text at this path into the previous one
    MergeTexts(Path),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Repair {
    pub rule: Rule,
    pub action: Action,
}

impl Repair {
    fn new(rule: Rule, action: Action) -> Self {
        Self { rule, action }
    }

    pub fn describe(&self) -> String {
        match &self.action {
            Action::Remove(path) => format!("remove node at {}", path),
            Action::Unwrap(path) => format!("unwrap node at {}", path),
            Action::InsertParagraph(path) => format!("insert empty paragraph at {}", path),
            Action::InsertCell(path) => format!("insert empty cell at {}", path),
            Action::InsertDefaultChild { at, kind } => match kind {
                Some(kind) => format!("insert empty {} at {}", kind, at),
                None => format!("insert empty text at {}", at),
            },
            Action::Wrap {
                parent,
                start,
                end,
                kind,
            } => format!("wrap children {}..{} of {} in {}", start, end, parent, kind),
            Action::MergeTexts(path) => format!("merge text at {} into previous", path),
        }
    }
}

/// Types that need an empty paragraph between adjacent siblings
pub fn needs_spacing(kind: &ElementType) -> bool {
    use ElementType::*;
    matches!(
        kind,
        Image | YouTube | Audio | Video | Blockquote | Code | Table | Webpage | PageLink
    )
}

fn is_block_node(node: &Node) -> bool {
    node.as_element().map_or(false, |e| schema::is_block(&e.kind))
}

/// The first rule the node at `path` breaks, with its repair
pub fn diagnose(doc: &Document, context: &NormalizerContext, path: &Path) -> Option<Repair> {
    if path.is_root() {
        return diagnose_root(doc.children());
    }

    let element = doc.node(path)?.as_element()?;
    let kind = &element.kind;
    let entry = schema::lookup(kind);

    if context.is_restricted(kind) {
        return Some(Repair::new(Rule::RestrictedElement, Action::Remove(path.clone())));
    }

    let parent_path = path.parent()?;
    if entry.is_block {
        if parent_path.is_root() {
            if !entry.is_top_level {
                return Some(Repair::new(Rule::NotTopLevel, Action::Unwrap(path.clone())));
            }
        } else if let Some(parent) = doc.element(&parent_path) {
            // Unknown parents predate the schema; leave their content alone
            let known = !matches!(parent.kind, ElementType::Unknown(_));
            if known && !schema::lookup(&parent.kind).accepts(kind) {
                let target = if *kind == ElementType::Paragraph && parent.kind == ElementType::Code {
                    parent_path
                } else {
                    path.clone()
                };
                return Some(Repair::new(Rule::InvalidChild, Action::Remove(target)));
            }
        }
    }

    if needs_spacing(kind) {
        let next_spaced = doc
            .node(&path.next())
            .and_then(Node::kind)
            .map_or(false, needs_spacing);
        if next_spaced {
            return Some(Repair::new(Rule::BlockSpacing, Action::InsertParagraph(path.next())));
        }
    }

    if *kind == ElementType::Table {
        if let Some((row, len)) = table::short_row(element) {
            return Some(Repair::new(
                Rule::TableRowLength,
                Action::InsertCell(path.child(row).child(len)),
            ));
        }
    }

    diagnose_structure(element, path)
}

fn diagnose_root(children: &[Node]) -> Option<Repair> {
    let ends_with_paragraph = children
        .last()
        .map_or(false, |n| n.is_kind(&ElementType::Paragraph));
    if !ends_with_paragraph {
        return Some(Repair::new(
            Rule::TrailingParagraph,
            Action::InsertParagraph(Path::new(vec![children.len()])),
        ));
    }

    let start = children.iter().position(|n| !is_block_node(n))?;
    let run = children[start..].iter().take_while(|n| !is_block_node(n)).count();
    Some(Repair::new(
        Rule::LooseInline,
        Action::Wrap {
            parent: Path::root(),
            start,
            end: start + run,
            kind: ElementType::Paragraph,
        },
    ))
}

fn diagnose_structure(element: &Element, path: &Path) -> Option<Repair> {
    let kind = &element.kind;
    let children = &element.children;

    if children.is_empty() {
        let action = if schema::requires_element_children(kind) {
            Action::Remove(path.clone())
        } else {
            Action::InsertDefaultChild {
                at: path.child(0),
                kind: schema::default_child(kind),
            }
        };
        return Some(Repair::new(Rule::EmptyContainer, action));
    }

    if schema::requires_element_children(kind) {
        if let Some(index) = children.iter().position(|n| !is_block_node(n)) {
            return Some(Repair::new(Rule::LooseInline, Action::Remove(path.child(index))));
        }
    } else if let Some(default) = schema::default_child(kind) {
        if !children.iter().any(is_block_node) {
            return Some(Repair::new(
                Rule::LooseInline,
                Action::Wrap {
                    parent: path.clone(),
                    start: 0,
                    end: children.len(),
                    kind: default,
                },
            ));
        }
        if let Some(index) = children.iter().position(|n| !is_block_node(n)) {
            return Some(Repair::new(Rule::LooseInline, Action::Remove(path.child(index))));
        }
    }

    for index in 1..children.len() {
        let (Some(prev), Some(text)) = (children[index - 1].as_text(), children[index].as_text()) else {
            continue;
        };
        if prev.marks == text.marks {
            return Some(Repair::new(Rule::AdjacentText, Action::MergeTexts(path.child(index))));
        }
        if text.is_empty() {
            return Some(Repair::new(Rule::AdjacentText, Action::Remove(path.child(index))));
        }
        if prev.is_empty() {
            return Some(Repair::new(Rule::AdjacentText, Action::Remove(path.child(index - 1))));
        }
    }

    None
}

/// Apply at most one repair to the node at `path`; true when something changed
pub fn normalize_node(session: &mut EditSession, path: &Path) -> Result<bool, MutationError> {
    let Some(repair) = diagnose(&session.document, session.context(), path) else {
        return Ok(false);
    };
    tracing::debug!(rule = %repair.rule, "{}", repair.describe());
    apply_repair(session, repair.action)?;
    Ok(true)
}

fn apply_repair(session: &mut EditSession, action: Action) -> Result<(), MutationError> {
    match action {
        Action::Remove(path) => session.remove_node(&path),
        Action::Unwrap(path) => session.unwrap_node(&path),
        Action::InsertParagraph(at) => {
            let para = builders::p(session.document.ids_mut(), "");
            session.insert_node(&at, para)
        }
        Action::InsertCell(at) => {
            let cell = builders::td(session.document.ids_mut(), "");
            session.insert_node(&at, cell)
        }
        Action::InsertDefaultChild { at, kind } => {
            let child: Node = match kind {
                Some(kind) => builders::element(session.document.ids_mut(), kind, vec![Node::text("")]).into(),
                None => Node::text(""),
            };
            session.insert_node(&at, child)
        }
        Action::Wrap {
            parent,
            start,
            end,
            kind,
        } => {
            let wrapper = builders::element(session.document.ids_mut(), kind, Vec::new());
            session.wrap_children(&parent, start, end, wrapper)
        }
        Action::MergeTexts(path) => session.merge_node(&path),
    }
}
