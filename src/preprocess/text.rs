//! Control character cleanup
//!
//! XML 1.0 cannot carry most C0 control characters. In text runs a
//! vertical tab or form feed becomes a line break; everything else that
//! XML rejects is removed. Comment authors and initials are stripped.

use crate::model::{Block, Comment, Inline, Paragraph};
use crate::warning::{WarningKind, Warnings};
use crate::xml::is_xml_char;

pub(super) fn clean_blocks(blocks: &mut [Block], warnings: &mut Warnings) {
    for block in blocks.iter_mut() {
        match block {
            Block::Paragraph(p) => clean_inlines(&mut p.inlines, warnings),
            Block::Heading(h) => clean_inlines(&mut h.inlines, warnings),
            Block::Figure(f) => clean_inlines(&mut f.caption, warnings),
            Block::List(list) => {
                for item in &mut list.items {
                    clean_blocks(&mut item.content, warnings);
                }
            }
            Block::Table(table) => {
                for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                    clean_blocks(&mut cell.content, warnings);
                }
            }
            Block::Math(_) | Block::Bibliography | Block::PageBreak => {}
        }
    }
}

fn clean_paragraphs(paragraphs: &mut [Paragraph], warnings: &mut Warnings) {
    for p in paragraphs.iter_mut() {
        clean_inlines(&mut p.inlines, warnings);
    }
}

fn clean_inlines(inlines: &mut [Inline], warnings: &mut Warnings) {
    for inline in inlines.iter_mut() {
        match inline {
            Inline::Text(t) => {
                if let Some(cleaned) = clean(&t.text, Some('\n')) {
                    warnings.push(
                        WarningKind::MalformedNodeDropped,
                        format!("removed control characters from text '{}'", cleaned),
                    );
                    t.text = cleaned;
                }
            }
            Inline::Link(l) => clean_inlines(&mut l.children, warnings),
            Inline::Comment(c) => clean_inlines(&mut c.children, warnings),
            Inline::Footnote(f) => clean_paragraphs(&mut f.content, warnings),
            _ => {}
        }
    }
}

pub(super) fn clean_comment(comment: &mut Comment, warnings: &mut Warnings) {
    let mut fields = vec![&mut comment.author];
    fields.extend(comment.initials.as_mut());
    for field in fields {
        if let Some(cleaned) = clean(field, None) {
            warnings.push(
                WarningKind::MalformedNodeDropped,
                format!("removed control characters from comment '{}'", comment.id),
            );
            *field = cleaned;
        }
    }
    clean_paragraphs(&mut comment.content, warnings);
    for reply in &mut comment.replies {
        clean_comment(reply, warnings);
    }
}

/// Cleaned copy of `text`, or `None` when it is already valid
fn clean(text: &str, line_break: Option<char>) -> Option<String> {
    if text.chars().all(is_xml_char) {
        return None;
    }
    let cleaned = text
        .chars()
        .filter_map(|c| match c {
            '\u{0B}' | '\u{0C}' => line_break,
            c if is_xml_char(c) => Some(c),
            _ => None,
        })
        .collect();
    Some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vertical_tab_becomes_line_break() {
        let mut blocks = vec![Block::Paragraph(Paragraph::from_inlines(vec![
            Inline::text("a\u{0B}b\u{07}c"),
            Inline::text("fine\ttext"),
        ]))];
        let mut warnings = Warnings::new();

        clean_blocks(&mut blocks, &mut warnings);

        let expected = vec![Block::Paragraph(Paragraph::from_inlines(vec![
            Inline::text("a\nbc"),
            Inline::text("fine\ttext"),
        ]))];
        assert_eq!(blocks, expected);
        assert_eq!(warnings.count(WarningKind::MalformedNodeDropped), 1);
    }

    #[test]
    fn test_comment_fields_are_stripped() {
        let mut comment = Comment::new("c1", "Ann\u{0B}Lee", "ok")
            .with_reply(Comment::new("c2", "Bob", "x\u{1F}y"));
        comment.initials = Some("A\u{0}L".to_string());
        let mut warnings = Warnings::new();

        clean_comment(&mut comment, &mut warnings);

        assert_eq!(comment.author, "AnnLee");
        assert_eq!(comment.initials.as_deref(), Some("AL"));
        assert_eq!(comment.replies[0].content[0].inlines, vec![Inline::text("xy")]);
        assert_eq!(warnings.count(WarningKind::MalformedNodeDropped), 3);
    }

    #[test]
    fn test_valid_text_untouched() {
        assert_eq!(clean("line\none\r\n", Some('\n')), None);
    }
}
