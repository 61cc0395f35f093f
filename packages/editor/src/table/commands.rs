//! Row, column and styling commands offered by the table menu

use super::grid::{as_row, stored_cells, VisualGrid};
use super::{
    can_expand_down, can_expand_right, can_split, effective_columns, expand_cell_down, expand_cell_right,
    insertion_index, locate, replace_table, split_cell, table_at, CellLocation,
};
use crate::mutations::NodeUpdate;
use crate::{Document, EditSession, MutationError};
use serde::{Deserialize, Serialize};
use trellis_model::{builders, Element, ElementType, Node, Path};

/// A table menu action applied relative to one cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum TableCommand {
    ExpandRight,
    ExpandDown,
    Split,
    InsertRowBefore,
    InsertRowAfter,
    InsertColumnBefore,
    InsertColumnAfter,
    DeleteRow,
    DeleteColumn,
    DeleteTable,
    ToggleHeader,
    Align(String),
    Border(String),
    RowStyle(String),
}

impl TableCommand {
    /// Whether the command makes sense for the cell at `cell`
    pub fn can_apply(&self, doc: &Document, cell: &Path) -> bool {
        let Some(loc) = CellLocation::of(doc, cell) else {
            return false;
        };
        let Some(table) = doc.element(&loc.table) else {
            return false;
        };

        match self {
            TableCommand::ExpandRight => can_expand_right(doc, cell),
            TableCommand::ExpandDown => can_expand_down(doc, cell),
            TableCommand::Split => can_split(doc, cell),
            TableCommand::InsertRowBefore => new_row_width(table, loc.row) > 0,
            TableCommand::InsertRowAfter => new_row_width(table, loc.row + 1) > 0,
            TableCommand::DeleteRow => {
                let rowspan = doc.element(cell).map_or(1, Element::rowspan);
                rowspan == 1 && table.children.len() > 1
            }
            TableCommand::DeleteColumn => {
                let colspan = doc.element(cell).map_or(1, Element::colspan);
                colspan == 1 && VisualGrid::compute(table).width() > 1
            }
            TableCommand::InsertColumnBefore
            | TableCommand::InsertColumnAfter
            | TableCommand::DeleteTable
            | TableCommand::ToggleHeader
            | TableCommand::Align(_)
            | TableCommand::Border(_)
            | TableCommand::RowStyle(_) => true,
        }
    }

    pub fn apply(&self, session: &mut EditSession, cell: &Path) -> Result<(), MutationError> {
        tracing::debug!(command = ?self, cell = %cell, "table command");
        match self {
            TableCommand::ExpandRight => expand_cell_right(session, cell),
            TableCommand::ExpandDown => expand_cell_down(session, cell),
            TableCommand::Split => split_cell(session, cell),
            TableCommand::InsertRowBefore => insert_row(session, cell, false),
            TableCommand::InsertRowAfter => insert_row(session, cell, true),
            TableCommand::InsertColumnBefore => insert_column(session, cell, false),
            TableCommand::InsertColumnAfter => insert_column(session, cell, true),
            TableCommand::DeleteRow => delete_row(session, cell),
            TableCommand::DeleteColumn => delete_column(session, cell),
            TableCommand::DeleteTable => {
                let loc = locate(&session.document, cell)?;
                session.remove_node(&loc.table)
            }
            TableCommand::ToggleHeader => {
                let current = element(&session.document, cell)?;
                let kind = if current.kind == ElementType::TableHeader {
                    ElementType::TableData
                } else {
                    ElementType::TableHeader
                };
                session.set_node(cell, NodeUpdate::kind(kind))
            }
            TableCommand::Align(align) => {
                let mut attrs = element(&session.document, cell)?.attrs.clone();
                attrs.align = non_empty(align);
                session.set_node(cell, NodeUpdate::attrs(attrs))
            }
            TableCommand::Border(border) => {
                let loc = locate(&session.document, cell)?;
                let mut attrs = table_at(&session.document, &loc)?.attrs.clone();
                attrs.border = non_empty(border);
                session.set_node(&loc.table, NodeUpdate::attrs(attrs))
            }
            TableCommand::RowStyle(style) => {
                let loc = locate(&session.document, cell)?;
                let mut attrs = table_at(&session.document, &loc)?.attrs.clone();
                attrs.rowstyle = non_empty(style);
                session.set_node(&loc.table, NodeUpdate::attrs(attrs))
            }
        }
    }
}

fn element<'a>(doc: &'a Document, path: &Path) -> Result<&'a Element, MutationError> {
    doc.element(path)
        .ok_or_else(|| MutationError::NodeNotFound(path.clone()))
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

/// Cells stored above row `at` whose rowspan reaches into it, as
/// `(row, index, colspan)`
fn spanning_into(table: &Element, at: usize) -> Vec<(usize, usize, usize)> {
    table
        .children
        .iter()
        .enumerate()
        .take(at)
        .filter_map(|(r, node)| Some((r, as_row(node)?)))
        .flat_map(|(r, row)| {
            stored_cells(row)
                .filter(move |(_, cell)| r + cell.rowspan() > at)
                .map(move |(index, cell)| (r, index, cell.colspan()))
        })
        .collect()
}

/// Cells a row inserted at `at` needs of its own
fn new_row_width(table: &Element, at: usize) -> usize {
    let width = effective_columns(table).into_iter().max().unwrap_or(0);
    let carried: usize = spanning_into(table, at).iter().map(|(_, _, colspan)| colspan).sum();
    width.saturating_sub(carried)
}

/// Insert an empty row; cells spanning across the insertion point grow by
/// one row so the grid stays rectangular
fn insert_row(session: &mut EditSession, cell: &Path, after: bool) -> Result<(), MutationError> {
    let loc = locate(&session.document, cell)?;
    let table = table_at(&session.document, &loc)?;
    let at = if after { loc.row + 1 } else { loc.row };

    let width = new_row_width(table, at);
    if width == 0 {
        return Err(MutationError::InvalidStructure(format!(
            "row at {} would be fully covered by spanning cells",
            at
        )));
    }
    let stretched: Vec<(Path, NodeUpdate)> = spanning_into(table, at)
        .into_iter()
        .filter_map(|(r, index, _)| {
            let path = loc.table.child(r).child(index);
            let cell = session.document.element(&path)?;
            let mut attrs = cell.attrs.clone();
            attrs.rowspan = Some(cell.rowspan() as u32 + 1);
            Some((path, NodeUpdate::attrs(attrs)))
        })
        .collect();

    session.without_normalizing(|s| {
        for (path, update) in stretched {
            s.set_node(&path, update)?;
        }
        let ids = s.document.ids_mut();
        let cells = (0..width).map(|_| builders::td(ids, "")).collect();
        let row = builders::tr(ids, cells);
        s.insert_node(&loc.table.child(at), row)
    })
}

/// Insert an empty column at the cell's left or right edge. A cell that
/// straddles the new column widens instead of getting a neighbor.
fn insert_column(session: &mut EditSession, cell: &Path, after: bool) -> Result<(), MutationError> {
    let loc = locate(&session.document, cell)?;
    let table = table_at(&session.document, &loc)?;
    let grid = VisualGrid::compute(table);
    let (_, col) = grid
        .position_of(loc.row, loc.index)
        .ok_or_else(|| MutationError::NodeNotFound(cell.clone()))?;
    let current = element(&session.document, cell)?;
    let x = if after { col + current.colspan() } else { col };

    let mut widen = Vec::new();
    let mut fill = Vec::new();
    for (r, node) in table.children.iter().enumerate() {
        let Some(row) = as_row(node) else {
            continue;
        };
        let straddling = match (x.checked_sub(1).and_then(|c| grid.get(r, c)), grid.get(r, x)) {
            (Some(left), Some(right)) if left == right => Some(left),
            _ => None,
        };
        match straddling {
            Some(spanning) if spanning.row == r => {
                let mut attrs = spanning.cell.attrs.clone();
                attrs.colspan = Some(spanning.cell.colspan() as u32 + 1);
                widen.push((loc.table.child(r).child(spanning.index), NodeUpdate::attrs(attrs)));
            }
            Some(_) => {}
            None => fill.push(loc.table.child(r).child(insertion_index(&grid, row, r, x))),
        }
    }

    session.without_normalizing(|s| {
        for (path, update) in widen {
            s.set_node(&path, update)?;
        }
        for at in fill {
            let filler = builders::td(s.document.ids_mut(), "");
            s.insert_node(&at, filler)?;
        }
        Ok(())
    })
}

/// Remove the cell's row. Cells spanning into it shrink by one row; cells
/// stored in it that span further down move to the next row.
fn delete_row(session: &mut EditSession, cell: &Path) -> Result<(), MutationError> {
    let loc = locate(&session.document, cell)?;
    let table = table_at(&session.document, &loc)?;
    let grid = VisualGrid::compute(table);
    let r = loc.row;

    let mut rebuilt = table.clone();
    for (row, index, _) in spanning_into(table, r) {
        if let Some(spanning) = cell_mut(&mut rebuilt, row, index) {
            spanning.attrs.rowspan = Some(spanning.rowspan() as u32 - 1);
        }
    }

    let deleted = table.children.get(r).and_then(as_row);
    let next = table.children.get(r + 1).and_then(as_row);
    if let (Some(deleted), Some(next)) = (deleted, next) {
        let mut moved: Vec<(usize, usize, Element)> = stored_cells(deleted)
            .filter(|(_, c)| c.rowspan() > 1)
            .filter_map(|(index, c)| {
                let (_, col) = grid.position_of(r, index)?;
                let mut carried = c.clone();
                carried.attrs.rowspan = Some(c.rowspan() as u32 - 1);
                Some((col, insertion_index(&grid, next, r + 1, col), carried))
            })
            .collect();
        moved.sort_by(|a, b| b.0.cmp(&a.0));
        if let Some(target) = rebuilt.children.get_mut(r + 1).and_then(Node::as_element_mut) {
            for (_, index, carried) in moved {
                target.children.insert(index.min(target.children.len()), carried.into());
            }
        }
    }
    rebuilt.children.remove(r);

    replace_table(session, &loc.table, rebuilt)
}

/// Remove the cell's column. Cells wider than one column narrow instead.
fn delete_column(session: &mut EditSession, cell: &Path) -> Result<(), MutationError> {
    let loc = locate(&session.document, cell)?;
    let table = table_at(&session.document, &loc)?;
    let grid = VisualGrid::compute(table);
    let (_, col) = grid
        .position_of(loc.row, loc.index)
        .ok_or_else(|| MutationError::NodeNotFound(cell.clone()))?;

    let mut affected = Vec::new();
    for r in 0..grid.row_count() {
        if let Some(slot) = grid.get(r, col) {
            if !affected.contains(&slot) {
                affected.push(slot);
            }
        }
    }

    let mut rebuilt = table.clone();
    let mut removals: Vec<(usize, usize)> = Vec::new();
    for slot in affected {
        if slot.cell.colspan() > 1 {
            if let Some(narrowed) = cell_mut(&mut rebuilt, slot.row, slot.index) {
                narrowed.attrs.colspan = Some(slot.cell.colspan() as u32 - 1);
            }
        } else {
            removals.push((slot.row, slot.index));
        }
    }
    removals.sort_by(|a, b| b.cmp(a));
    for (row, index) in removals {
        if let Some(row) = rebuilt.children.get_mut(row).and_then(Node::as_element_mut) {
            row.children.remove(index);
        }
    }

    replace_table(session, &loc.table, rebuilt)
}

fn cell_mut(table: &mut Element, row: usize, index: usize) -> Option<&mut Element> {
    table
        .children
        .get_mut(row)?
        .as_element_mut()?
        .children
        .get_mut(index)?
        .as_element_mut()
}
