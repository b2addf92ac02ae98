//! Anchor numbering

use crate::model::{Block, Comment, Inline, NodeId, Paragraph};

/// Hands out dense NodeIds in visiting order
struct Numberer {
    next: u32,
}

impl Numberer {
    fn assign(&mut self, id: &mut NodeId) {
        *id = NodeId(self.next);
        self.next += 1;
    }

    fn blocks(&mut self, blocks: &mut [Block]) {
        for block in blocks {
            match block {
                Block::Paragraph(p) => self.inlines(&mut p.inlines),
                Block::Heading(h) => self.inlines(&mut h.inlines),
                Block::List(list) => {
                    self.assign(&mut list.id);
                    for item in &mut list.items {
                        self.blocks(&mut item.content);
                    }
                }
                Block::Table(table) => {
                    self.assign(&mut table.id);
                    for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                        self.blocks(&mut cell.content);
                    }
                }
                Block::Figure(f) => {
                    self.assign(&mut f.image.id);
                    self.inlines(&mut f.caption);
                }
                Block::Math(m) => self.assign(&mut m.id),
                Block::Bibliography | Block::PageBreak => {}
            }
        }
    }

    fn inlines(&mut self, inlines: &mut [Inline]) {
        for inline in inlines {
            match inline {
                Inline::Citation(c) => self.assign(&mut c.id),
                Inline::Footnote(f) => {
                    self.assign(&mut f.id);
                    self.paragraphs(&mut f.content);
                }
                Inline::Comment(c) => {
                    self.assign(&mut c.id);
                    self.inlines(&mut c.children);
                }
                Inline::Image(img) => self.assign(&mut img.id),
                Inline::Math(m) => self.assign(&mut m.id),
                Inline::Link(l) => self.inlines(&mut l.children),
                Inline::Text(_) | Inline::LineBreak => {}
            }
        }
    }

    fn paragraphs(&mut self, paragraphs: &mut [Paragraph]) {
        for p in paragraphs {
            self.inlines(&mut p.inlines);
        }
    }

    fn comment(&mut self, comment: &mut Comment) {
        self.paragraphs(&mut comment.content);
        for reply in &mut comment.replies {
            self.comment(reply);
        }
    }
}

/// Number lists, tables, figures, math, citations, footnotes, comment
/// ranges and images. Returns the number of ids assigned.
pub(super) fn number_anchors(blocks: &mut [Block], comments: &mut [Comment]) -> u32 {
    let mut numberer = Numberer { next: 0 };
    numberer.blocks(blocks);
    for comment in comments {
        numberer.comment(comment);
    }
    numberer.next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MathBlock, Table, TableCell, TableRow};

    #[test]
    fn test_dense_document_order() {
        let mut blocks = vec![
            Block::Paragraph(Paragraph::from_inlines(vec![
                Inline::cite(["a"]),
                Inline::footnote(vec![Paragraph::from_inlines(vec![Inline::cite(["b"])])]),
            ])),
            Block::Table(Table::new(vec![TableRow::new(vec![TableCell::new("x")])])),
            Block::Math(MathBlock::new("x^2")),
        ];
        let mut comments = vec![];

        let count = number_anchors(&mut blocks, &mut comments);
        assert_eq!(count, 5);

        let Block::Paragraph(p) = &blocks[0] else {
            panic!("expected paragraph");
        };
        let Inline::Citation(first) = &p.inlines[0] else {
            panic!("expected citation");
        };
        let Inline::Footnote(note) = &p.inlines[1] else {
            panic!("expected footnote");
        };
        let Inline::Citation(inner) = &note.content[0].inlines[0] else {
            panic!("expected citation");
        };
        assert_eq!(first.id, NodeId(0));
        assert_eq!(note.id, NodeId(1));
        assert_eq!(inner.id, NodeId(2));
        assert!(matches!(&blocks[1], Block::Table(t) if t.id == NodeId(3)));
        assert!(matches!(&blocks[2], Block::Math(m) if m.id == NodeId(4)));
    }
}
