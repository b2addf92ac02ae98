//! Table normalization
//!
//! Source tables describe merged cells with row/column spans. Word wants a
//! rectangular grid where horizontal merges are `w:gridSpan` and vertical
//! merges are a `w:vMerge` restart cell followed by continue cells.

use crate::model::Table;

/// Twips per pixel at 96 DPI
pub const TWIPS_PER_PIXEL: u32 = 15;

/// Grid column definition
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridColumn {
    /// Width in twips
    pub width: u32,
}

/// Vertical merge type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VMerge {
    /// Start of a new vertical merge group
    Restart,
    /// Continuation of a vertical merge
    Continue,
}

impl VMerge {
    pub fn as_str(&self) -> &'static str {
        match self {
            VMerge::Restart => "restart",
            VMerge::Continue => "continue",
        }
    }
}

/// One `w:tc` of the normalized grid
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridCell {
    /// A source cell; `row`/`cell` index into the source table
    Content {
        row: usize,
        cell: usize,
        grid_span: u32,
        v_merge: Option<VMerge>,
    },
    /// Continuation of a cell merged from a row above
    Merged { grid_span: u32 },
    /// Empty cell padding a short row
    Padding,
}

impl GridCell {
    pub fn grid_span(&self) -> u32 {
        match self {
            GridCell::Content { grid_span, .. } | GridCell::Merged { grid_span } => *grid_span,
            GridCell::Padding => 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridRow {
    pub cells: Vec<GridCell>,
    /// Repeated as header row on each page
    pub header: bool,
}

/// A table laid out on a rectangular grid
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableGrid {
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    /// Top-left slot of source cell (row, cell) with its effective spans
    Origin { row: usize, cell: usize, col_span: u32, row_span: u32 },
    /// Covered by the cell whose origin is at (row, col)
    Covered { row: usize, col: usize },
}

impl TableGrid {
    /// Lay out `table` and divide `text_width` (pixels) evenly between columns
    pub fn normalize(table: &Table, text_width: u32) -> Self {
        let row_count = table.rows.len();
        let mut slots: Vec<Vec<Option<Slot>>> = vec![Vec::new(); row_count];

        for (r, row) in table.rows.iter().enumerate() {
            let mut col = 0;
            for (i, cell) in row.cells.iter().enumerate() {
                while is_taken(&slots[r], col) {
                    col += 1;
                }

                // Spans are clamped to the rows that exist and to the free
                // columns left of the next cell merged from above
                let row_span = (cell.row_span.max(1) as usize).min(row_count - r);
                let mut col_span = 0;
                while col_span < cell.col_span.max(1) as usize && !is_taken(&slots[r], col + col_span) {
                    col_span += 1;
                }
                let col_span = col_span.max(1);

                for (dr, slot_row) in slots.iter_mut().skip(r).take(row_span).enumerate() {
                    for dc in 0..col_span {
                        let slot = if dr == 0 && dc == 0 {
                            Slot::Origin {
                                row: r,
                                cell: i,
                                col_span: col_span as u32,
                                row_span: row_span as u32,
                            }
                        } else {
                            Slot::Covered { row: r, col }
                        };
                        put(slot_row, col + dc, slot);
                    }
                }
                col += col_span;
            }
        }

        let width = slots.iter().map(Vec::len).max().unwrap_or(0).max(1);

        let rows = slots
            .iter()
            .enumerate()
            .map(|(r, slot_row)| GridRow {
                cells: grid_cells(r, slot_row, width, &slots),
                header: r < table.header_rows,
            })
            .collect();

        let total = text_width.max(1) * TWIPS_PER_PIXEL;
        let columns = vec![GridColumn { width: total / width as u32 }; width];

        TableGrid { columns, rows }
    }

    /// Number of grid columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Total width in twips
    pub fn total_width(&self) -> u32 {
        self.columns.iter().map(|c| c.width).sum()
    }
}

fn is_taken(row: &[Option<Slot>], col: usize) -> bool {
    matches!(row.get(col), Some(Some(_)))
}

fn put(row: &mut Vec<Option<Slot>>, col: usize, slot: Slot) {
    if row.len() <= col {
        row.resize(col + 1, None);
    }
    row[col] = Some(slot);
}

fn grid_cells(r: usize, row: &[Option<Slot>], width: usize, all: &[Vec<Option<Slot>>]) -> Vec<GridCell> {
    let mut cells = Vec::new();
    let mut col = 0;
    while col < width {
        match row.get(col).copied().flatten() {
            Some(Slot::Origin {
                row,
                cell,
                col_span,
                row_span,
            }) => {
                cells.push(GridCell::Content {
                    row,
                    cell,
                    grid_span: col_span,
                    v_merge: (row_span > 1).then_some(VMerge::Restart),
                });
                col += col_span as usize;
            }
            Some(Slot::Covered { row: origin_row, col: origin_col }) if origin_row < r => {
                let span = match all[origin_row][origin_col] {
                    Some(Slot::Origin { col_span, .. }) => col_span,
                    _ => 1,
                };
                cells.push(GridCell::Merged { grid_span: span });
                col += span as usize;
            }
            // Same-row coverage is consumed by the origin's span
            Some(Slot::Covered { .. }) => col += 1,
            None => {
                cells.push(GridCell::Padding);
                col += 1;
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TableCell, TableRow};
    use pretty_assertions::assert_eq;

    fn cell() -> TableCell {
        TableCell::new("x")
    }

    #[test]
    fn test_uneven_rows_are_padded() {
        let table = Table::new(vec![
            TableRow::new(vec![cell(), cell(), cell()]),
            TableRow::new(vec![cell()]),
        ]);
        let grid = TableGrid::normalize(&table, 600);

        assert_eq!(grid.width(), 3);
        assert_eq!(grid.rows[1].cells.len(), 3);
        assert_eq!(grid.rows[1].cells[1], GridCell::Padding);
        assert_eq!(grid.columns[0].width, 3000);
    }

    #[test]
    fn test_row_and_col_spans() {
        // A spans two rows, B spans two columns
        let table = Table::new(vec![
            TableRow::new(vec![cell().with_span(1, 2), cell().with_span(2, 1)]),
            TableRow::new(vec![cell(), cell()]),
        ]);
        let grid = TableGrid::normalize(&table, 300);

        assert_eq!(grid.width(), 3);
        assert_eq!(
            grid.rows[0].cells,
            vec![
                GridCell::Content { row: 0, cell: 0, grid_span: 1, v_merge: Some(VMerge::Restart) },
                GridCell::Content { row: 0, cell: 1, grid_span: 2, v_merge: None },
            ]
        );
        assert_eq!(
            grid.rows[1].cells,
            vec![
                GridCell::Merged { grid_span: 1 },
                GridCell::Content { row: 1, cell: 0, grid_span: 1, v_merge: None },
                GridCell::Content { row: 1, cell: 1, grid_span: 1, v_merge: None },
            ]
        );
    }

    #[test]
    fn test_overflowing_row_span_is_clamped() {
        let table = Table::new(vec![
            TableRow::new(vec![cell().with_span(1, 5), cell()]),
            TableRow::new(vec![cell()]),
        ]);
        let grid = TableGrid::normalize(&table, 300);

        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[1].cells[0], GridCell::Merged { grid_span: 1 });
        assert_eq!(
            grid.rows[1].cells[1],
            GridCell::Content { row: 1, cell: 0, grid_span: 1, v_merge: None }
        );
    }

    #[test]
    fn test_col_span_stops_at_merged_cell() {
        let table = Table::new(vec![
            TableRow::new(vec![cell(), cell().with_span(1, 2)]),
            TableRow::new(vec![cell().with_span(3, 1)]),
        ]);
        let grid = TableGrid::normalize(&table, 300);

        assert_eq!(grid.width(), 2);
        assert_eq!(
            grid.rows[1].cells,
            vec![
                GridCell::Content { row: 1, cell: 0, grid_span: 1, v_merge: None },
                GridCell::Merged { grid_span: 1 },
            ]
        );
    }
}
