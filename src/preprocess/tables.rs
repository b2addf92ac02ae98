//! Table repair

use crate::model::{Block, Paragraph, Table};
use crate::warning::{WarningKind, Warnings};

/// Repair every table in `blocks`, dropping tables that cannot be repaired
pub(super) fn repair_tables(blocks: &mut Vec<Block>, warnings: &mut Warnings) {
    for block in blocks.iter_mut() {
        match block {
            Block::Table(table) => repair_table(table, warnings),
            Block::List(list) => {
                for item in &mut list.items {
                    repair_tables(&mut item.content, warnings);
                }
            }
            _ => {}
        }
    }

    blocks.retain(|block| match block {
        Block::Table(table) if table.rows.is_empty() => {
            warnings.push(WarningKind::MalformedNodeDropped, "dropped table without rows");
            false
        }
        _ => true,
    });
}

fn repair_table(table: &mut Table, warnings: &mut Warnings) {
    let before = table.rows.len();
    table.rows.retain(|row| !row.cells.is_empty());
    for _ in table.rows.len()..before {
        warnings.push(WarningKind::MalformedNodeDropped, "dropped table row without cells");
    }
    table.header_rows = table.header_rows.min(table.rows.len());

    for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
        cell.col_span = cell.col_span.max(1);
        cell.row_span = cell.row_span.max(1);
        repair_tables(&mut cell.content, warnings);
        // A cell must contain at least one paragraph
        if cell.content.is_empty() {
            cell.content.push(Block::Paragraph(Paragraph::default()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TableCell, TableRow};

    #[test]
    fn test_repair_spans_and_empty_cells() {
        let mut blocks = vec![Block::Table(Table::new(vec![
            TableRow::new(vec![TableCell::default().with_span(0, 0)]),
            TableRow::new(vec![]),
        ]))];

        let mut warnings = Warnings::new();
        repair_tables(&mut blocks, &mut warnings);

        let Block::Table(table) = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 1);
        let cell = &table.rows[0].cells[0];
        assert_eq!((cell.col_span, cell.row_span), (1, 1));
        assert_eq!(cell.content, vec![Block::Paragraph(Paragraph::default())]);
        assert_eq!(warnings.count(WarningKind::MalformedNodeDropped), 1);
    }

    #[test]
    fn test_table_without_rows_is_dropped() {
        let mut blocks = vec![
            Block::Table(Table::new(vec![TableRow::new(vec![])])),
            Block::Paragraph(Paragraph::new("after")),
        ];

        let mut warnings = Warnings::new();
        repair_tables(&mut blocks, &mut warnings);

        assert_eq!(blocks.len(), 1);
        assert_eq!(warnings.count(WarningKind::MalformedNodeDropped), 2);
    }
}
