//! # List Structural Editor
//!
//! Indent, outdent and Enter handling for `ul`/`ol`. There is no list state
//! besides the tree: each operation starts from the list item holding the
//! caret and re-derives every path it needs.
//!
//! Sub-lists are siblings of the items they belong under:
//!
//! ```text
//! ul
//! ├── li  "parent"
//! └── ul
//!     └── li  "child"
//! ```

use crate::{Document, EditSession, MutationError};
use tracing::{debug, info};
use trellis_model::{builders, Element, ElementType, Node, Path, Point, Range};

fn is_list(node: &Node) -> bool {
    node.kind().map_or(false, ElementType::is_list)
}

/// The innermost list item holding the caret, when the selection is collapsed
pub fn selected_list_item(doc: &Document) -> Option<Path> {
    let selection = doc.selection()?;
    if !selection.is_collapsed() {
        return None;
    }
    doc.above(&selection.anchor.path, |e| e.kind == ElementType::ListItem)
        .map(|(path, _)| path)
}

pub fn is_inside_list(doc: &Document) -> bool {
    doc.selection()
        .and_then(|range| doc.above(&range.anchor.path, |e| e.kind.is_list()))
        .is_some()
}

/// Exactly one paragraph child holding a single blank text run
pub fn is_empty_item(item: &Element) -> bool {
    match item.children.as_slice() {
        [Node::Element(para)] if para.kind == ElementType::Paragraph => match para.children.as_slice() {
            [Node::Text(text)] => text.text.trim().is_empty(),
            _ => false,
        },
        _ => false,
    }
}

pub fn is_last_item(doc: &Document, item: &Path) -> bool {
    match (item.parent(), item.last()) {
        (Some(parent), Some(index)) => doc
            .children_of(&parent)
            .map_or(false, |siblings| index + 1 == siblings.len()),
        _ => false,
    }
}

fn caret_at(doc: &Document, point: Option<Point>) -> bool {
    match (doc.selection(), point) {
        (Some(selection), Some(point)) => selection.anchor == point,
        _ => false,
    }
}

/// The item under the caret when the caret sits at its very start
fn item_at_start(doc: &Document) -> Option<Path> {
    let item = selected_list_item(doc)?;
    caret_at(doc, doc.start(&item)).then_some(item)
}

/// Whether the item and its parent list sit inside another list
fn is_nested(doc: &Document, item: &Path) -> bool {
    let Some(parent) = item.parent() else {
        return false;
    };
    let Some(grandparent) = parent.parent() else {
        return false;
    };
    let parent_is_list = doc.node(&parent).map_or(false, is_list);
    let grandparent_is_list = !grandparent.is_root() && doc.node(&grandparent).map_or(false, is_list);
    parent_is_list && grandparent_is_list
}

/// Tab at the start of an item: nest it in a new sub-list.
///
/// The new list takes the type of a sub-list already following the item,
/// or the parent list's type. Returns whether anything changed.
pub fn indent(session: &mut EditSession) -> Result<bool, MutationError> {
    let Some(item) = item_at_start(&session.document) else {
        return Ok(false);
    };
    let Some(parent_path) = item.parent() else {
        return Ok(false);
    };
    let Some(parent) = session.document.element(&parent_path).filter(|e| e.kind.is_list()) else {
        return Ok(false);
    };
    let index = item.last().unwrap_or(0);
    if index == 0 {
        return Ok(false);
    }

    let kind = parent.children[index + 1..]
        .iter()
        .find_map(|n| n.kind().filter(|k| k.is_list()))
        .unwrap_or(&parent.kind)
        .clone();

    debug!(item = %item, kind = %kind, "indent list item");
    let wrapper = builders::list(session.document.ids_mut(), kind, Some(Vec::new()));
    session.wrap_node(&item, wrapper)?;
    Ok(true)
}

/// Shift+Tab at the start of a nested item: lift it into the enclosing list
pub fn outdent(session: &mut EditSession) -> Result<bool, MutationError> {
    let Some(item) = item_at_start(&session.document) else {
        return Ok(false);
    };
    if !is_nested(&session.document, &item) {
        return Ok(false);
    }
    debug!(item = %item, "outdent list item");
    session.lift_node(&item)?;
    Ok(true)
}

/// Enter inside a list item: terminate the list on an empty last item,
/// otherwise add or split off a new item
pub fn enter(session: &mut EditSession) -> Result<bool, MutationError> {
    let Some(item) = selected_list_item(&session.document) else {
        return Ok(false);
    };
    let Some(element) = session.document.element(&item) else {
        return Ok(false);
    };

    if is_empty_item(element) && is_last_item(&session.document, &item) {
        info!(item = %item, "terminate list");
        terminate_list(session, &item)?;
    } else {
        info!(item = %item, "append list item");
        create_list_item(session, &item)?;
    }
    Ok(true)
}

/// Leave the list from an empty last item. Nested, this is an outdent;
/// otherwise the item becomes a paragraph after the list.
pub fn terminate_list(session: &mut EditSession, item: &Path) -> Result<(), MutationError> {
    if is_nested(&session.document, item) {
        session.lift_node(item)?;
        return Ok(());
    }
    let list = item
        .parent()
        .ok_or_else(|| MutationError::InvalidPath(item.clone()))?;
    let para = builders::p(session.document.ids_mut(), "");
    let after = list.next();

    session.without_normalizing(|s| {
        s.remove_node(item)?;
        s.insert_node(&after, para)?;
        s.select_start(&after)
    })
}

/// Start a new item from the caret position inside `item`
pub fn create_list_item(session: &mut EditSession, item: &Path) -> Result<(), MutationError> {
    let doc = &session.document;
    let at_start = caret_at(doc, doc.start(item));
    let at_end = caret_at(doc, doc.end(item));
    let new_item = builders::li(session.document.ids_mut(), "");
    let next = item.next();

    if at_start {
        debug!(item = %item, "insert item before");
        return session.insert_node(item, new_item);
    }
    if at_end {
        debug!(item = %item, "insert item after");
        return session.without_normalizing(|s| {
            s.insert_node(&next, new_item)?;
            s.select_start(&next)
        });
    }

    let Some(point) = session.selection().map(|r| r.anchor.clone()) else {
        return Ok(());
    };
    let Some((block, _)) = session.document.nearest_block(&point.path) else {
        return Ok(());
    };
    if !item.is_ancestor_of(&block) {
        return Ok(());
    }
    debug!(item = %item, block = %block, "split item");

    session.without_normalizing(|s| {
        s.split_nodes(&point, &block)?;
        s.insert_node(&next, new_item)?;

        // Everything after the split point, the second half included,
        // moves into the new item ahead of its seed paragraph
        let tail = block.next();
        let mut count = 0;
        while s.document.has(&tail) {
            s.move_node(&tail, &next.child(count))?;
            count += 1;
        }
        s.remove_node(&next.child(count))?;
        s.select(Range::collapsed(Point::new(next.concat(&[0, 0]), 0)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_model::Point;

    fn session(json: &str) -> EditSession {
        EditSession::new("t", Document::from_json("t", json).unwrap())
    }

    fn caret(s: &mut EditSession, path: &[usize], offset: usize) {
        s.select(Range::collapsed(Point::new(path.to_vec(), offset))).unwrap();
    }

    const FLAT: &str = r#"[{"type":"ul","id":"l","children":[
        {"type":"li","id":"a","children":[{"type":"p","id":"pa","children":[{"text":"one"}]}]},
        {"type":"li","id":"b","children":[{"type":"p","id":"pb","children":[{"text":"two"}]}]}
    ]},{"type":"p","id":"t","children":[{"text":""}]}]"#;

    #[test]
    fn test_indent_first_item_is_noop() {
        let mut s = session(FLAT);
        caret(&mut s, &[0, 0, 0, 0], 0);
        assert!(!indent(&mut s).unwrap());
    }

    #[test]
    fn test_indent_requires_caret_at_start() {
        let mut s = session(FLAT);
        caret(&mut s, &[0, 1, 0, 0], 1);
        assert!(!indent(&mut s).unwrap());
    }

    #[test]
    fn test_indent_then_outdent_restores_flat_list() {
        let mut s = session(FLAT);
        caret(&mut s, &[0, 1, 0, 0], 0);
        assert!(indent(&mut s).unwrap());

        let nested = s.document.element(&Path::new(vec![0, 1])).unwrap();
        assert_eq!(nested.kind, ElementType::UnorderedList);
        assert_eq!(nested.children.len(), 1);

        assert!(outdent(&mut s).unwrap());
        let list = s.document.element(&Path::new(vec![0])).unwrap();
        assert_eq!(list.children.len(), 2);
        assert!(list.children.iter().all(|n| n.is_kind(&ElementType::ListItem)));
    }

    #[test]
    fn test_outdent_top_level_item_is_noop() {
        let mut s = session(FLAT);
        caret(&mut s, &[0, 1, 0, 0], 0);
        assert!(!outdent(&mut s).unwrap());
    }

    #[test]
    fn test_enter_mid_item_splits_text() {
        let mut s = session(FLAT);
        caret(&mut s, &[0, 0, 0, 0], 1);
        enter(&mut s).unwrap();

        let list = s.document.element(&Path::new(vec![0])).unwrap();
        assert_eq!(list.children.len(), 3);
        assert_eq!(list.children[0].text_content(), "o");
        assert_eq!(list.children[1].text_content(), "ne");
        assert_eq!(list.children[1].children().len(), 1);
        assert_eq!(s.selection(), Some(&Range::collapsed(Point::new(vec![0, 1, 0, 0], 0))));
    }

    #[test]
    fn test_enter_at_end_selects_new_item() {
        let mut s = session(FLAT);
        caret(&mut s, &[0, 1, 0, 0], 3);
        enter(&mut s).unwrap();

        let list = s.document.element(&Path::new(vec![0])).unwrap();
        assert_eq!(list.children.len(), 3);
        assert_eq!(s.selection().unwrap().anchor.path, Path::new(vec![0, 2, 0, 0]));
    }

    #[test]
    fn test_enter_at_start_inserts_before() {
        let mut s = session(FLAT);
        caret(&mut s, &[0, 1, 0, 0], 0);
        enter(&mut s).unwrap();

        let list = s.document.element(&Path::new(vec![0])).unwrap();
        assert_eq!(list.children[1].text_content(), "");
        assert_eq!(list.children[2].text_content(), "two");
    }

    #[test]
    fn test_is_empty_item() {
        let mut ids = trellis_model::IdGenerator::from_seed("t");
        assert!(is_empty_item(&builders::li(&mut ids, "  ")));
        assert!(!is_empty_item(&builders::li(&mut ids, "x")));
    }
}
