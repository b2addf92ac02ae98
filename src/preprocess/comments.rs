//! Comment range relocation
//!
//! Word cannot anchor a comment inside a footnote. A range found there is
//! unwrapped in place and the footnote marker in the enclosing paragraph is
//! wrapped in the same range instead.

use crate::model::{Block, Comment, Inline, Paragraph};
use crate::warning::{WarningKind, Warnings};
use std::collections::BTreeSet;

pub(super) fn relocate_footnote_comments(blocks: &mut [Block], warnings: &mut Warnings) {
    for block in blocks.iter_mut() {
        match block {
            Block::Paragraph(p) => relocate_in_inlines(&mut p.inlines, warnings),
            Block::Heading(h) => relocate_in_inlines(&mut h.inlines, warnings),
            Block::Figure(f) => relocate_in_inlines(&mut f.caption, warnings),
            Block::List(list) => {
                for item in &mut list.items {
                    relocate_footnote_comments(&mut item.content, warnings);
                }
            }
            Block::Table(table) => {
                for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                    relocate_footnote_comments(&mut cell.content, warnings);
                }
            }
            Block::Math(_) | Block::Bibliography | Block::PageBreak => {}
        }
    }
}

fn relocate_in_inlines(inlines: &mut [Inline], warnings: &mut Warnings) {
    for inline in inlines.iter_mut() {
        let ranges = match inline {
            Inline::Footnote(f) => {
                let mut ranges = Vec::new();
                for p in &mut f.content {
                    p.inlines = unwrap_ranges(std::mem::take(&mut p.inlines), &mut ranges, warnings);
                }
                ranges
            }
            Inline::Link(l) => {
                relocate_in_inlines(&mut l.children, warnings);
                continue;
            }
            Inline::Comment(c) => {
                relocate_in_inlines(&mut c.children, warnings);
                continue;
            }
            _ => continue,
        };

        if ranges.is_empty() {
            continue;
        }

        // The first range found ends up outermost
        let mut wrapped = std::mem::replace(inline, Inline::LineBreak);
        for comment_id in ranges.into_iter().rev() {
            warnings.push(
                WarningKind::CommentRelocated,
                format!("comment '{}' moved from footnote content to its marker", comment_id),
            );
            wrapped = Inline::comment(comment_id, vec![wrapped]);
        }
        *inline = wrapped;
    }
}

/// Replace comment ranges by their children, collecting the comment ids.
/// Footnote markers cannot nest and are dropped.
fn unwrap_ranges(
    inlines: Vec<Inline>,
    ranges: &mut Vec<String>,
    warnings: &mut Warnings,
) -> Vec<Inline> {
    let mut out = Vec::with_capacity(inlines.len());
    for inline in inlines {
        match inline {
            Inline::Comment(c) => {
                ranges.push(c.comment_id);
                out.extend(unwrap_ranges(c.children, ranges, warnings));
            }
            Inline::Link(mut l) => {
                l.children = unwrap_ranges(l.children, ranges, warnings);
                out.push(Inline::Link(l));
            }
            Inline::Footnote(_) => {
                warnings.push(WarningKind::MalformedNodeDropped, "dropped nested footnote");
            }
            other => out.push(other),
        }
    }
    out
}

/// Comment content cannot hold comment ranges or footnotes
pub(super) fn flatten_comment_content(comment: &mut Comment, warnings: &mut Warnings) {
    let mut nested = Vec::new();
    for p in &mut comment.content {
        p.inlines = unwrap_ranges(std::mem::take(&mut p.inlines), &mut nested, warnings);
    }
    for id in nested {
        warnings.push(
            WarningKind::MalformedNodeDropped,
            format!("dropped range of comment '{}' inside comment '{}'", id, comment.id),
        );
    }
    if comment.content.is_empty() {
        comment.content.push(Paragraph::default());
    }
    for reply in &mut comment.replies {
        flatten_comment_content(reply, warnings);
    }
}

/// Drop comment threads no range of the body points at. A thread is kept
/// when a range points at the comment or at any of its replies.
pub(super) fn drop_unreferenced(blocks: &[Block], comments: &mut Vec<Comment>) {
    let mut referenced = BTreeSet::new();
    collect_block_refs(blocks, &mut referenced);

    let before = comments.len();
    comments.retain(|c| referenced.iter().any(|id| c.find(id).is_some()));
    if comments.len() < before {
        log::debug!("dropped {} unreferenced comments", before - comments.len());
    }
}

fn collect_block_refs<'a>(blocks: &'a [Block], out: &mut BTreeSet<&'a str>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => collect_inline_refs(&p.inlines, out),
            Block::Heading(h) => collect_inline_refs(&h.inlines, out),
            Block::Figure(f) => collect_inline_refs(&f.caption, out),
            Block::List(list) => {
                for item in &list.items {
                    collect_block_refs(&item.content, out);
                }
            }
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|r| r.cells.iter()) {
                    collect_block_refs(&cell.content, out);
                }
            }
            Block::Math(_) | Block::Bibliography | Block::PageBreak => {}
        }
    }
}

fn collect_inline_refs<'a>(inlines: &'a [Inline], out: &mut BTreeSet<&'a str>) {
    for inline in inlines {
        match inline {
            Inline::Comment(c) => {
                out.insert(c.comment_id.as_str());
                collect_inline_refs(&c.children, out);
            }
            Inline::Link(l) => collect_inline_refs(&l.children, out),
            _ => {}
        }
    }
}
