//! # Table Grid Engine
//!
//! Cell merge/split and row/column commands, all reasoned about through the
//! [`VisualGrid`] projection rather than storage order.
//!
//! The `can_*` predicates are pure and meant for enabling UI actions. The
//! mutating functions re-check their precondition and fail with
//! [`MutationError::InvalidStructure`] instead of producing a ragged grid.
//!
//! Any operation that removes a cell from a row other than the one being
//! edited rebuilds the table and swaps it in as one unit, so stored row and
//! cell indexes never shift underneath a half-finished edit.

mod commands;
mod grid;

pub use commands::TableCommand;
pub use grid::{effective_columns, short_row, stored_cells, CellRef, VisualGrid};

use crate::mutations::NodeUpdate;
use crate::{Document, EditSession, MutationError};
use serde::Serialize;
use trellis_model::{builders, Element, ElementType, Node, Path, Range};

/// Where a cell sits: its table's path plus storage row and index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellLocation {
    pub table: Path,
    pub row: usize,
    pub index: usize,
}

impl CellLocation {
    /// Resolve a td/th path; `None` unless it sits in a tr inside a table
    pub fn of(doc: &Document, cell: &Path) -> Option<Self> {
        let index = cell.last()?;
        let row_path = cell.parent()?;
        let row = row_path.last()?;
        let table = row_path.parent()?;

        let is_cell = doc.element(cell)?.kind.is_table_cell();
        let is_row = doc.element(&row_path)?.kind == ElementType::TableRow;
        let is_table = doc.element(&table)?.kind == ElementType::Table;
        (is_cell && is_row && is_table).then_some(Self { table, row, index })
    }

    pub fn row_path(&self) -> Path {
        self.table.child(self.row)
    }

    pub fn cell_path(&self) -> Path {
        self.row_path().child(self.index)
    }
}

/// The cell containing the selection anchor
pub fn selected_cell(doc: &Document) -> Option<Path> {
    let anchor = &doc.selection()?.anchor;
    doc.above(&anchor.path, |e| e.kind.is_table_cell()).map(|(path, _)| path)
}

/// Render-layer attributes for a cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col_span: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_span: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_class: Option<String>,
}

/// Spans only when they exceed 1; alignment as a `text-*` class
pub fn cell_attributes(cell: &Element) -> CellAttributes {
    CellAttributes {
        col_span: Some(cell.colspan()).filter(|&n| n > 1),
        row_span: Some(cell.rowspan()).filter(|&n| n > 1),
        align_class: cell
            .attrs
            .align
            .as_deref()
            .filter(|a| !a.is_empty())
            .map(|a| format!("text-{}", a)),
    }
}

fn locate(doc: &Document, cell: &Path) -> Result<CellLocation, MutationError> {
    CellLocation::of(doc, cell).ok_or_else(|| MutationError::NotElement(cell.clone()))
}

fn table_at<'a>(doc: &'a Document, loc: &CellLocation) -> Result<&'a Element, MutationError> {
    doc.element(&loc.table)
        .ok_or_else(|| MutationError::NodeNotFound(loc.table.clone()))
}

fn precondition(what: &str, cell: &Path) -> MutationError {
    MutationError::InvalidStructure(format!("cannot {} cell at {}", what, cell))
}

/// Storage index of the right-hand neighbor a merge-right would absorb
fn right_neighbor(table: &Element, loc: &CellLocation) -> Option<usize> {
    let grid = VisualGrid::compute(table);
    let (r, c) = grid.position_of(loc.row, loc.index)?;
    let current = grid.get(r, c)?;
    let right = grid.right_of(loc.row, loc.index)?;
    let same_row = right.row == loc.row;
    (same_row && right.cell.rowspan() == current.cell.rowspan()).then_some(right.index)
}

/// `(row, index)` of the neighbor a merge-down would absorb
fn lower_neighbor(table: &Element, loc: &CellLocation) -> Option<(usize, usize)> {
    let grid = VisualGrid::compute(table);
    let (r, c) = grid.position_of(loc.row, loc.index)?;
    let current = grid.get(r, c)?;
    let below = grid.below(loc.row, loc.index)?;
    let (_, below_col) = grid.position_of(below.row, below.index)?;
    (below.cell.colspan() == current.cell.colspan() && below_col == c).then_some((below.row, below.index))
}

pub fn can_expand_right(doc: &Document, cell: &Path) -> bool {
    CellLocation::of(doc, cell)
        .and_then(|loc| right_neighbor(doc.element(&loc.table)?, &loc))
        .is_some()
}

pub fn can_expand_down(doc: &Document, cell: &Path) -> bool {
    CellLocation::of(doc, cell)
        .and_then(|loc| lower_neighbor(doc.element(&loc.table)?, &loc))
        .is_some()
}

pub fn can_split(doc: &Document, cell: &Path) -> bool {
    CellLocation::of(doc, cell)
        .and_then(|_| doc.element(cell))
        .map_or(false, |c| c.colspan() > 1 || c.rowspan() > 1)
}

/// Absorb the cell to the right: its children are appended, this cell's
/// colspan grows by one, and the neighbor is removed from the row. A wider
/// neighbor leaves the row short; the row-length repair refills it.
pub fn expand_cell_right(session: &mut EditSession, cell: &Path) -> Result<(), MutationError> {
    let loc = locate(&session.document, cell)?;
    let table = table_at(&session.document, &loc)?;
    let right_index = right_neighbor(table, &loc).ok_or_else(|| precondition("expand right", cell))?;

    let right_path = loc.row_path().child(right_index);
    let current = session
        .document
        .element(cell)
        .ok_or_else(|| MutationError::NodeNotFound(cell.clone()))?;
    let right = session
        .document
        .element(&right_path)
        .ok_or_else(|| MutationError::NodeNotFound(right_path.clone()))?;

    let mut attrs = current.attrs.clone();
    attrs.colspan = Some(current.colspan() as u32 + 1);
    let offset = current.children.len();
    let absorbed = right.children.clone();

    session.without_normalizing(|s| {
        s.set_node(cell, NodeUpdate::attrs(attrs))?;
        for (k, child) in absorbed.into_iter().enumerate() {
            s.insert_node(&cell.child(offset + k), child)?;
        }
        s.remove_node(&right_path)
    })
}

/// Absorb the cell below, growing this cell's rowspan by one. The table is
/// rebuilt with the merged cell and without the absorbed one, then swapped
/// in as a whole.
pub fn expand_cell_down(session: &mut EditSession, cell: &Path) -> Result<(), MutationError> {
    let loc = locate(&session.document, cell)?;
    let table = table_at(&session.document, &loc)?;
    let (below_row, below_index) = lower_neighbor(table, &loc).ok_or_else(|| precondition("expand down", cell))?;

    let mut rebuilt = table.clone();
    let absorbed = match rebuilt.children.get_mut(below_row).and_then(Node::as_element_mut) {
        Some(row) if below_index < row.children.len() => row.children.remove(below_index),
        _ => return Err(precondition("expand down", cell)),
    };
    let Node::Element(absorbed) = absorbed else {
        return Err(precondition("expand down", cell));
    };

    let merged = rebuilt
        .children
        .get_mut(loc.row)
        .and_then(Node::as_element_mut)
        .and_then(|row| row.children.get_mut(loc.index))
        .and_then(Node::as_element_mut)
        .ok_or_else(|| MutationError::NodeNotFound(cell.clone()))?;
    merged.attrs.rowspan = Some(merged.rowspan() as u32 + 1);
    merged.children.extend(absorbed.children);

    let had_selection = session.selection().is_some();
    replace_table(session, &loc.table, rebuilt)?;
    if had_selection {
        if let Some(start) = session.document.start(cell) {
            session.select(Range::collapsed(start))?;
        }
    }
    Ok(())
}

/// Reset both spans to 1 and refill the vacated slots with empty cells:
/// `colspan - 1` right after the cell, `colspan` in each row it covered below
pub fn split_cell(session: &mut EditSession, cell: &Path) -> Result<(), MutationError> {
    if !can_split(&session.document, cell) {
        return Err(precondition("split", cell));
    }
    let loc = locate(&session.document, cell)?;
    let table = table_at(&session.document, &loc)?;
    let grid = VisualGrid::compute(table);
    let (_, col) = grid
        .position_of(loc.row, loc.index)
        .ok_or_else(|| precondition("split", cell))?;

    let current = session
        .document
        .element(cell)
        .ok_or_else(|| MutationError::NodeNotFound(cell.clone()))?;
    let colspan = current.colspan();
    let rowspan = current.rowspan();
    let mut attrs = current.attrs.clone();
    attrs.colspan = None;
    attrs.rowspan = None;

    // Computed up front: inserts into one row never shift another row
    let refills: Vec<Path> = (loc.row + 1..(loc.row + rowspan).min(table.children.len()))
        .filter_map(|r| {
            let row = grid::as_row(&table.children[r])?;
            let index = insertion_index(&grid, row, r, col);
            Some(loc.table.child(r).child(index))
        })
        .collect();

    session.without_normalizing(|s| {
        s.set_node(cell, NodeUpdate::attrs(attrs))?;
        for _ in 1..colspan {
            let filler = builders::td(s.document.ids_mut(), "");
            s.insert_node(&cell.next(), filler)?;
        }
        for at in &refills {
            for _ in 0..colspan {
                let filler = builders::td(s.document.ids_mut(), "");
                s.insert_node(at, filler)?;
            }
        }
        Ok(())
    })
}

/// Child index in stored row `r` where a cell starting at grid column `col`
/// belongs: before the first stored cell that starts at or after it
fn insertion_index(grid: &VisualGrid<'_>, row: &Element, r: usize, col: usize) -> usize {
    stored_cells(row)
        .find(|(index, _)| grid.position_of(r, *index).map_or(true, |(_, c)| c >= col))
        .map_or(row.children.len(), |(index, _)| index)
}

/// Swap a whole table node for a rebuilt copy
fn replace_table(session: &mut EditSession, at: &Path, table: Element) -> Result<(), MutationError> {
    session.without_normalizing(|s| {
        s.remove_node(at)?;
        s.insert_node(at, table)
    })
}
