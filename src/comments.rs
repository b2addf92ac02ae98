//! Comment builder
//!
//! Each comment range of the body produces one `w:comment` for the comment
//! and one per reply, all anchored to the same range. Ids are dense from 0.

use crate::error::Result;
use crate::export::ExportContext;
use crate::model::{Comment, NodeId, Paragraph};
use crate::preprocess::Story;
use crate::render::{NoteMark, Renderer};
use crate::xml::{self, document_namespaces};
use std::collections::BTreeMap;

/// Paragraph style of comment text
pub const COMMENT_TEXT_STYLE: &str = "CommentText";

/// One `w:comment`
#[derive(Clone, Debug, PartialEq)]
pub struct CommentEntry {
    pub id: u32,
    /// The range this comment is attached to
    pub anchor: NodeId,
    pub author: String,
    pub initials: String,
    /// W3CDTF date
    pub date: String,
    pub content: Vec<Paragraph>,
}

#[derive(Clone, Debug, Default)]
pub struct CommentBuilder {
    entries: Vec<CommentEntry>,
    by_anchor: BTreeMap<NodeId, Vec<u32>>,
}

impl CommentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single comment on range `anchor` and return its id
    pub fn add_entry(&mut self, anchor: NodeId, comment: &Comment, default_date: &str) -> u32 {
        let id = self.entries.len() as u32;
        self.entries.push(CommentEntry {
            id,
            anchor,
            author: comment.author.clone(),
            initials: comment.initials(),
            date: comment
                .date
                .clone()
                .unwrap_or_else(|| default_date.to_string()),
            content: comment.content.clone(),
        });
        self.by_anchor.entry(anchor).or_default().push(id);
        id
    }

    /// Add a comment and, depth first, all of its replies
    pub fn add_thread(&mut self, anchor: NodeId, comment: &Comment, default_date: &str) -> Vec<u32> {
        let mut ids = vec![self.add_entry(anchor, comment, default_date)];
        for reply in &comment.replies {
            ids.extend(self.add_thread(anchor, reply, default_date));
        }
        ids
    }

    /// Comment ids attached to a range; empty for unknown ranges
    pub fn ids_for(&self, anchor: NodeId) -> &[u32] {
        self.by_anchor.get(&anchor).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entries(&self) -> &[CommentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize `word/comments.xml`
    pub fn to_xml(&self, ctx: &ExportContext) -> Result<String> {
        let mut renderer = Renderer::new(ctx, Story::Comments)?;
        xml::start(renderer.writer(), "w:comments", &document_namespaces())?;

        for entry in &self.entries {
            let id = entry.id.to_string();
            xml::start(
                renderer.writer(),
                "w:comment",
                &[
                    ("w:id", id.as_str()),
                    ("w:author", entry.author.as_str()),
                    ("w:date", entry.date.as_str()),
                    ("w:initials", entry.initials.as_str()),
                ],
            )?;

            if entry.content.is_empty() {
                renderer.note_paragraph(COMMENT_TEXT_STYLE, Some(NoteMark::Comment), &[])?;
            }
            for (i, paragraph) in entry.content.iter().enumerate() {
                let mark = (i == 0).then_some(NoteMark::Comment);
                renderer.note_paragraph(COMMENT_TEXT_STYLE, mark, &paragraph.inlines)?;
            }

            xml::end(renderer.writer(), "w:comment")?;
        }

        xml::end(renderer.writer(), "w:comments")?;
        renderer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_thread_shares_anchor() {
        let comment = Comment::new("c1", "Ann Lee", "first")
            .with_reply(Comment::new("c2", "Bob", "reply").with_reply(Comment::new("c3", "Ann Lee", "again")));
        let mut builder = CommentBuilder::new();

        let ids = builder.add_thread(NodeId(5), &comment, "2024-01-01T00:00:00Z");
        let other = builder.add_entry(NodeId(9), &Comment::new("c4", "Cy", "x"), "2024-01-01T00:00:00Z");

        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(other, 3);
        assert_eq!(builder.ids_for(NodeId(5)), &[0, 1, 2]);
        assert_eq!(builder.ids_for(NodeId(6)), &[] as &[u32]);
        assert_eq!(builder.entries()[1].initials, "B");
        assert_eq!(builder.entries()[0].date, "2024-01-01T00:00:00Z");
    }
}
