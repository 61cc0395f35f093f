//! # Visual Grid
//!
//! Projects a table's stored rows onto a 2-D slot grid. A cell occupying
//! `colspan × rowspan` slots appears in every one of them, so "the cell to
//! the right" or "the cell below" is a slot lookup rather than a storage
//! index walk.

use std::fmt;
use trellis_model::{Element, ElementType, Node};

/// A stored cell as seen from the grid: its storage row and index within
/// that row's children. Two refs are equal when they name the same stored
/// cell, however many slots it covers.
#[derive(Clone, Copy)]
pub struct CellRef<'a> {
    pub row: usize,
    pub index: usize,
    pub cell: &'a Element,
}

impl PartialEq for CellRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.row == other.row && self.index == other.index
    }
}

impl Eq for CellRef<'_> {}

impl fmt::Debug for CellRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellRef({}, {}, {:?})", self.row, self.index, self.cell.id)
    }
}

pub(crate) fn as_row(node: &Node) -> Option<&Element> {
    node.as_element().filter(|e| e.kind == ElementType::TableRow)
}

/// `(index, cell)` for every td/th stored in a row, skipping anything else
pub fn stored_cells(row: &Element) -> impl Iterator<Item = (usize, &Element)> {
    row.children
        .iter()
        .enumerate()
        .filter_map(|(i, n)| n.as_element().filter(|e| e.kind.is_table_cell()).map(|e| (i, e)))
}

#[derive(Debug, Clone)]
pub struct VisualGrid<'a> {
    rows: Vec<Vec<Option<CellRef<'a>>>>,
}

impl<'a> VisualGrid<'a> {
    /// Grid rows line up with the table's children. Rowspans that run past
    /// the last row are clipped, and trailing empty slots are trimmed.
    pub fn compute(table: &'a Element) -> Self {
        let height = table.children.len();
        let mut rows: Vec<Vec<Option<CellRef<'a>>>> = vec![Vec::new(); height];

        for (r, node) in table.children.iter().enumerate() {
            let Some(row) = as_row(node) else {
                continue;
            };
            let mut col = 0;
            for (index, cell) in stored_cells(row) {
                while rows[r].get(col).map_or(false, Option::is_some) {
                    col += 1;
                }
                let cell_ref = CellRef { row: r, index, cell };
                for covered in rows.iter_mut().skip(r).take(cell.rowspan()) {
                    for c in col..col + cell.colspan() {
                        if covered.len() <= c {
                            covered.resize(c + 1, None);
                        }
                        if covered[c].is_none() {
                            covered[c] = Some(cell_ref);
                        }
                    }
                }
                col += cell.colspan();
            }
        }

        for row in rows.iter_mut() {
            while matches!(row.last(), Some(None)) {
                row.pop();
            }
        }

        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Option<CellRef<'a>>>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row, in slots
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<CellRef<'a>> {
        self.rows.get(row)?.get(col).copied().flatten()
    }

    /// Top-left slot of a stored cell
    pub fn position_of(&self, row: usize, index: usize) -> Option<(usize, usize)> {
        let col = self.rows.get(row)?.iter().position(|slot| {
            slot.map_or(false, |c| c.row == row && c.index == index)
        })?;
        Some((row, col))
    }

    /// The cell occupying the slot just past this cell's right edge
    pub fn right_of(&self, row: usize, index: usize) -> Option<CellRef<'a>> {
        let (r, c) = self.position_of(row, index)?;
        let current = self.get(r, c)?;
        self.get(r, c + current.cell.colspan())
    }

    /// The first different cell below this one in its first column
    pub fn below(&self, row: usize, index: usize) -> Option<CellRef<'a>> {
        let (r, c) = self.position_of(row, index)?;
        let current = self.get(r, c)?;
        for rr in r + 1..self.rows.len() {
            match self.get(rr, c) {
                Some(slot) if slot == current => continue,
                other => return other,
            }
        }
        None
    }

    /// Ids per slot, for display and assertions
    pub fn ids(&self) -> Vec<Vec<Option<&'a str>>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|slot| slot.map(|c| c.cell.id.as_str())).collect())
            .collect()
    }
}

/// Effective width of each row: its own colspans plus the colspans of
/// cells from earlier rows whose rowspan reaches into it. Entries for
/// non-row children are 0.
pub fn effective_columns(table: &Element) -> Vec<usize> {
    let height = table.children.len();
    let mut carried = vec![0usize; height];
    let mut widths = vec![0usize; height];

    for (r, node) in table.children.iter().enumerate() {
        let Some(row) = as_row(node) else {
            continue;
        };
        let own: usize = stored_cells(row).map(|(_, cell)| cell.colspan()).sum();
        widths[r] = own + carried[r];
        for (_, cell) in stored_cells(row) {
            for slot in carried.iter_mut().take(height.min(r + cell.rowspan())).skip(r + 1) {
                *slot += cell.colspan();
            }
        }
    }

    widths
}

/// First row narrower than the widest one, with the child index a filler
/// cell should be appended at
pub fn short_row(table: &Element) -> Option<(usize, usize)> {
    let widths = effective_columns(table);
    let max = widths.iter().copied().max()?;
    table
        .children
        .iter()
        .enumerate()
        .find_map(|(r, node)| {
            let row = as_row(node)?;
            (widths[r] < max).then_some((r, row.children.len()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_model::Attributes;

    fn cell(id: &str, colspan: u32, rowspan: u32) -> Element {
        Element::new(id, ElementType::TableData, vec![]).with_attrs(Attributes {
            colspan: Some(colspan),
            rowspan: Some(rowspan),
            ..Attributes::default()
        })
    }

    fn table(rows: Vec<Vec<Element>>) -> Element {
        Element::new(
            "t",
            ElementType::Table,
            rows.into_iter()
                .enumerate()
                .map(|(i, cells)| {
                    Element::new(
                        format!("r{}", i),
                        ElementType::TableRow,
                        cells.into_iter().map(Node::Element).collect(),
                    )
                    .into()
                })
                .collect(),
        )
    }

    #[test]
    fn test_spanning_cell_fills_every_slot() {
        let t = table(vec![
            vec![cell("a", 2, 2), cell("b", 1, 1)],
            vec![cell("c", 1, 1)],
        ]);
        let grid = VisualGrid::compute(&t);

        assert_eq!(
            grid.ids(),
            vec![
                vec![Some("a"), Some("a"), Some("b")],
                vec![Some("a"), Some("a"), Some("c")],
            ]
        );
        assert_eq!(grid.get(1, 0), grid.get(0, 1));
        assert_eq!(grid.position_of(1, 0), Some((1, 2)));
    }

    #[test]
    fn test_rowspan_clipped_at_table_bottom() {
        let t = table(vec![vec![cell("a", 1, 5)]]);
        let grid = VisualGrid::compute(&t);
        assert_eq!(grid.row_count(), 1);
        assert_eq!(grid.width(), 1);
    }

    #[test]
    fn test_neighbors() {
        let t = table(vec![
            vec![cell("a", 2, 1), cell("b", 1, 1)],
            vec![cell("c", 1, 1), cell("d", 1, 1), cell("e", 1, 1)],
        ]);
        let grid = VisualGrid::compute(&t);

        assert_eq!(grid.right_of(0, 0).unwrap().cell.id, "b");
        assert!(grid.right_of(0, 1).is_none());
        assert_eq!(grid.below(0, 0).unwrap().cell.id, "c");
        assert_eq!(grid.below(0, 1).unwrap().cell.id, "e");
        assert!(grid.below(1, 0).is_none());
    }

    #[test]
    fn test_effective_columns_count_carried_rowspans() {
        let t = table(vec![
            vec![cell("a", 1, 2), cell("b", 2, 1)],
            vec![cell("c", 2, 1)],
            vec![cell("d", 1, 1)],
        ]);
        assert_eq!(effective_columns(&t), vec![3, 3, 1]);
        assert_eq!(short_row(&t), Some((2, 1)));
    }
}
