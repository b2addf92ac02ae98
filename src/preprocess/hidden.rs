//! Hidden node removal

use crate::model::{Block, Comment, Inline, Paragraph};
use crate::warning::{WarningKind, Warnings};

/// Remove hidden blocks, list items and paragraphs at any depth
pub(super) fn remove_hidden(blocks: &mut Vec<Block>, warnings: &mut Warnings) {
    blocks.retain(|block| {
        if block.is_hidden() {
            warnings.push(
                WarningKind::HiddenNodeDropped,
                format!("dropped hidden {}", block.kind()),
            );
            false
        } else {
            true
        }
    });

    for block in blocks.iter_mut() {
        match block {
            Block::Paragraph(p) => remove_hidden_in_inlines(&mut p.inlines, warnings),
            Block::Heading(h) => remove_hidden_in_inlines(&mut h.inlines, warnings),
            Block::List(list) => {
                list.items.retain(|item| {
                    if item.hidden {
                        warnings.push(WarningKind::HiddenNodeDropped, "dropped hidden list item");
                    }
                    !item.hidden
                });
                for item in &mut list.items {
                    remove_hidden(&mut item.content, warnings);
                }
            }
            Block::Table(table) => {
                for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                    remove_hidden(&mut cell.content, warnings);
                }
            }
            Block::Figure(f) => remove_hidden_in_inlines(&mut f.caption, warnings),
            Block::Math(_) | Block::Bibliography | Block::PageBreak => {}
        }
    }

    // A list whose items were all hidden has nothing left to render
    blocks.retain(|block| match block {
        Block::List(list) if list.items.is_empty() => {
            warnings.push(WarningKind::MalformedNodeDropped, "dropped list without items");
            false
        }
        _ => true,
    });
}

/// Footnote content can hold hidden paragraphs too
fn remove_hidden_in_inlines(inlines: &mut [Inline], warnings: &mut Warnings) {
    for inline in inlines.iter_mut() {
        match inline {
            Inline::Footnote(f) => remove_hidden_paragraphs(&mut f.content, warnings),
            Inline::Link(l) => remove_hidden_in_inlines(&mut l.children, warnings),
            Inline::Comment(c) => remove_hidden_in_inlines(&mut c.children, warnings),
            _ => {}
        }
    }
}

fn remove_hidden_paragraphs(paragraphs: &mut Vec<Paragraph>, warnings: &mut Warnings) {
    paragraphs.retain(|p| {
        if p.hidden {
            warnings.push(WarningKind::HiddenNodeDropped, "dropped hidden paragraph");
        }
        !p.hidden
    });
    for p in paragraphs.iter_mut() {
        remove_hidden_in_inlines(&mut p.inlines, warnings);
    }
}

pub(super) fn remove_hidden_in_comment(comment: &mut Comment, warnings: &mut Warnings) {
    remove_hidden_paragraphs(&mut comment.content, warnings);
    for reply in &mut comment.replies {
        remove_hidden_in_comment(reply, warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{List, ListItem, ListStyle, MathBlock};

    #[test]
    fn test_nested_hidden_nodes() {
        let mut hidden_item = ListItem::new("gone");
        hidden_item.hidden = true;
        let mut math = MathBlock::new("x");
        math.hidden = true;

        let mut blocks = vec![
            Block::List(List::new(
                ListStyle::bullet(),
                vec![ListItem::new("kept"), hidden_item],
            )),
            Block::Math(math),
            Block::Paragraph(Paragraph::from_inlines(vec![Inline::footnote(vec![
                Paragraph::new("a"),
                Paragraph::new("b").hidden(),
            ])])),
        ];

        let mut warnings = Warnings::new();
        remove_hidden(&mut blocks, &mut warnings);

        assert_eq!(blocks.len(), 2);
        let Block::List(list) = &blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 1);
        let Block::Paragraph(p) = &blocks[1] else {
            panic!("expected paragraph");
        };
        let Inline::Footnote(f) = &p.inlines[0] else {
            panic!("expected footnote");
        };
        assert_eq!(f.content.len(), 1);
        assert_eq!(warnings.count(WarningKind::HiddenNodeDropped), 3);
    }

    #[test]
    fn test_list_emptied_by_hidden_items_is_dropped() {
        let mut item = ListItem::new("gone");
        item.hidden = true;
        let mut blocks = vec![Block::List(List::new(ListStyle::bullet(), vec![item]))];

        let mut warnings = Warnings::new();
        remove_hidden(&mut blocks, &mut warnings);

        assert!(blocks.is_empty());
        assert_eq!(warnings.count(WarningKind::MalformedNodeDropped), 1);
    }
}
