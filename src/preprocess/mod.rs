//! Content preprocessing
//!
//! Turns the input content tree into the tree every later phase reads:
//!
//! 1. hidden nodes are removed
//! 2. control characters XML cannot carry are removed from text
//! 3. malformed tables are repaired or dropped
//! 4. comment ranges inside footnotes are moved onto the footnote marker,
//!    and comments no range points at are dropped
//! 5. anchor nodes are numbered in document order
//!
//! Nothing here fails: problems become warnings.

mod anchors;
mod comments;
mod hidden;
mod tables;
mod text;

use crate::model::{Block, Comment, Document, Inline, Paragraph};
use crate::opc::{well_known, PartUri};
use crate::warning::Warnings;

/// The preprocessed content of a document
#[derive(Clone, Debug, Default)]
pub struct ContentTree {
    pub title: Option<String>,
    pub path: Option<String>,
    pub blocks: Vec<Block>,
    /// Comments with their content preprocessed the same way as the body
    pub comments: Vec<Comment>,
    /// Number of NodeIds handed out
    pub anchor_count: u32,
}

impl ContentTree {
    /// Visit every block and inline in document order.
    ///
    /// Footnote content is visited at the position of its marker; comment
    /// content is visited after the body.
    pub fn walk<'a, V: Visitor<'a>>(&'a self, visitor: &mut V) {
        walk_blocks(Story::Body, &self.blocks, visitor);
        for comment in &self.comments {
            walk_comment(comment, visitor);
        }
    }

    /// Look up a comment or a reply at any depth by id
    pub fn comment(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find_map(|c| c.find(id))
    }
}

/// The story a node belongs to, which decides the part that owns its
/// relationships
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Story {
    Body,
    Footnotes,
    Comments,
}

impl Story {
    /// URI of the part holding this story, given the main document URI
    pub fn part_uri(&self, document: &PartUri) -> PartUri {
        match self {
            Story::Body => document.clone(),
            Story::Footnotes => well_known::footnotes(),
            Story::Comments => well_known::comments(),
        }
    }
}

/// Callbacks for [`ContentTree::walk`]
pub trait Visitor<'a> {
    fn visit_block(&mut self, _story: Story, _block: &'a Block) {}
    fn visit_inline(&mut self, _story: Story, _inline: &'a Inline) {}
}

fn walk_blocks<'a, V: Visitor<'a>>(story: Story, blocks: &'a [Block], visitor: &mut V) {
    for block in blocks {
        visitor.visit_block(story, block);
        match block {
            Block::Paragraph(p) => walk_inlines(story, &p.inlines, visitor),
            Block::Heading(h) => walk_inlines(story, &h.inlines, visitor),
            Block::List(list) => {
                for item in &list.items {
                    walk_blocks(story, &item.content, visitor);
                }
            }
            Block::Table(table) => {
                for row in &table.rows {
                    for cell in &row.cells {
                        walk_blocks(story, &cell.content, visitor);
                    }
                }
            }
            Block::Figure(f) => walk_inlines(story, &f.caption, visitor),
            Block::Math(_) | Block::Bibliography | Block::PageBreak => {}
        }
    }
}

fn walk_inlines<'a, V: Visitor<'a>>(story: Story, inlines: &'a [Inline], visitor: &mut V) {
    for inline in inlines {
        visitor.visit_inline(story, inline);
        match inline {
            Inline::Link(l) => walk_inlines(story, &l.children, visitor),
            Inline::Comment(c) => walk_inlines(story, &c.children, visitor),
            Inline::Footnote(f) => walk_paragraphs(Story::Footnotes, &f.content, visitor),
            Inline::Text(_)
            | Inline::Citation(_)
            | Inline::Image(_)
            | Inline::Math(_)
            | Inline::LineBreak => {}
        }
    }
}

fn walk_paragraphs<'a, V: Visitor<'a>>(story: Story, paragraphs: &'a [Paragraph], visitor: &mut V) {
    for p in paragraphs {
        walk_inlines(story, &p.inlines, visitor);
    }
}

fn walk_comment<'a, V: Visitor<'a>>(comment: &'a Comment, visitor: &mut V) {
    walk_paragraphs(Story::Comments, &comment.content, visitor);
    for reply in &comment.replies {
        walk_comment(reply, visitor);
    }
}

/// Run all preprocessing steps over a document
pub fn preprocess(doc: &Document) -> (ContentTree, Warnings) {
    let mut warnings = Warnings::new();

    let mut blocks = doc.content.clone();
    let mut comments = doc.comments.clone();

    hidden::remove_hidden(&mut blocks, &mut warnings);
    for comment in &mut comments {
        hidden::remove_hidden_in_comment(comment, &mut warnings);
    }

    text::clean_blocks(&mut blocks, &mut warnings);
    for comment in &mut comments {
        text::clean_comment(comment, &mut warnings);
    }

    tables::repair_tables(&mut blocks, &mut warnings);

    comments::relocate_footnote_comments(&mut blocks, &mut warnings);
    for comment in &mut comments {
        comments::flatten_comment_content(comment, &mut warnings);
    }
    comments::drop_unreferenced(&blocks, &mut comments);

    let anchor_count = anchors::number_anchors(&mut blocks, &mut comments);

    log::debug!(
        "preprocessed {} blocks, {} anchors, {} warnings",
        blocks.len(),
        anchor_count,
        warnings.len()
    );

    (
        ContentTree {
            title: doc.title.clone(),
            path: doc.path.clone(),
            blocks,
            comments,
            anchor_count,
        },
        warnings,
    )
}
