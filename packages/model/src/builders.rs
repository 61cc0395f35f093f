//! Constructors for the nodes the editor creates on its own: default
//! paragraphs, filler table cells, seeded lists.

use crate::id_generator::IdGenerator;
use crate::node::{Element, ElementType, Node};

pub fn element(ids: &mut IdGenerator, kind: ElementType, children: Vec<Node>) -> Element {
    Element::new(ids.new_id(), kind, children)
}

pub fn p(ids: &mut IdGenerator, text: &str) -> Element {
    element(ids, ElementType::Paragraph, vec![Node::text(text)])
}

pub fn heading(ids: &mut IdGenerator, kind: ElementType, text: &str) -> Element {
    element(ids, kind, vec![Node::text(text)])
}

pub fn li(ids: &mut IdGenerator, text: &str) -> Element {
    let para = p(ids, text);
    element(ids, ElementType::ListItem, vec![para.into()])
}

/// A list seeded with one empty item, or holding `items` when given
pub fn list(ids: &mut IdGenerator, kind: ElementType, items: Option<Vec<Node>>) -> Element {
    let children = match items {
        Some(items) => items,
        None => vec![li(ids, "").into()],
    };
    element(ids, kind, children)
}

pub fn td(ids: &mut IdGenerator, text: &str) -> Element {
    let para = p(ids, text);
    element(ids, ElementType::TableData, vec![para.into()])
}

pub fn th(ids: &mut IdGenerator, text: &str) -> Element {
    let para = p(ids, text);
    element(ids, ElementType::TableHeader, vec![para.into()])
}

pub fn tr(ids: &mut IdGenerator, cells: Vec<Element>) -> Element {
    element(
        ids,
        ElementType::TableRow,
        cells.into_iter().map(Node::Element).collect(),
    )
}

/// A `rows` x `cols` table of empty data cells
pub fn table(ids: &mut IdGenerator, rows: usize, cols: usize) -> Element {
    let rows = (0..rows)
        .map(|_| {
            let cells = (0..cols).map(|_| td(ids, "")).collect();
            tr(ids, cells).into()
        })
        .collect();
    element(ids, ElementType::Table, rows)
}
