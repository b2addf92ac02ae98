//! Footnote builder
//!
//! Every footnote marker of the body becomes one `w:footnote` entry of
//! `word/footnotes.xml`. Ids -1 and 0 are taken by the separator entries
//! Word expects; real notes are numbered from 1 in marker order.

use crate::error::Result;
use crate::export::ExportContext;
use crate::model::{NodeId, Paragraph};
use crate::preprocess::Story;
use crate::render::{NoteMark, Renderer};
use crate::xml::{self, document_namespaces};
use std::collections::BTreeMap;

/// Paragraph style of footnote text
pub const FOOTNOTE_TEXT_STYLE: &str = "FootnoteText";

/// One footnote
#[derive(Clone, Debug, PartialEq)]
pub struct FootnoteEntry {
    pub id: i32,
    /// The marker this note belongs to
    pub anchor: NodeId,
    pub content: Vec<Paragraph>,
}

#[derive(Clone, Debug, Default)]
pub struct FootnoteBuilder {
    entries: Vec<FootnoteEntry>,
    by_anchor: BTreeMap<NodeId, i32>,
}

impl FootnoteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the note of marker `anchor` and return its id.
    ///
    /// Adding the same anchor twice returns the first id.
    pub fn add_entry(&mut self, anchor: NodeId, content: Vec<Paragraph>) -> i32 {
        if let Some(id) = self.by_anchor.get(&anchor) {
            return *id;
        }
        let id = self.entries.len() as i32 + 1;
        self.entries.push(FootnoteEntry {
            id,
            anchor,
            content,
        });
        self.by_anchor.insert(anchor, id);
        id
    }

    /// Footnote id of a marker
    pub fn id_for(&self, anchor: NodeId) -> Option<i32> {
        self.by_anchor.get(&anchor).copied()
    }

    pub fn entries(&self) -> &[FootnoteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize `word/footnotes.xml`
    pub fn to_xml(&self, ctx: &ExportContext) -> Result<String> {
        let mut renderer = Renderer::new(ctx, Story::Footnotes)?;

        let w = renderer.writer();
        xml::start(w, "w:footnotes", &document_namespaces())?;
        separator(w, "separator", "-1", "w:separator")?;
        separator(w, "continuationSeparator", "0", "w:continuationSeparator")?;

        for entry in &self.entries {
            let id = entry.id.to_string();
            xml::start(renderer.writer(), "w:footnote", &[("w:id", &id)])?;

            if entry.content.is_empty() {
                renderer.note_paragraph(FOOTNOTE_TEXT_STYLE, Some(NoteMark::Footnote), &[])?;
            }
            for (i, paragraph) in entry.content.iter().enumerate() {
                let mark = (i == 0).then_some(NoteMark::Footnote);
                renderer.note_paragraph(FOOTNOTE_TEXT_STYLE, mark, &paragraph.inlines)?;
            }

            xml::end(renderer.writer(), "w:footnote")?;
        }

        xml::end(renderer.writer(), "w:footnotes")?;
        renderer.finish()
    }
}

fn separator<W: std::io::Write>(
    w: &mut quick_xml::Writer<W>,
    kind: &str,
    id: &str,
    mark: &str,
) -> Result<()> {
    xml::start(w, "w:footnote", &[("w:type", kind), ("w:id", id)])?;
    xml::start(w, "w:p", &[])?;
    xml::start(w, "w:r", &[])?;
    xml::empty(w, mark, &[])?;
    xml::end(w, "w:r")?;
    xml::end(w, "w:p")?;
    xml::end(w, "w:footnote")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one() {
        let mut builder = FootnoteBuilder::new();
        assert_eq!(builder.add_entry(NodeId(3), vec![Paragraph::new("a")]), 1);
        assert_eq!(builder.add_entry(NodeId(7), vec![Paragraph::new("b")]), 2);
        assert_eq!(builder.add_entry(NodeId(3), vec![]), 1);

        assert_eq!(builder.len(), 2);
        assert_eq!(builder.id_for(NodeId(7)), Some(2));
        assert_eq!(builder.id_for(NodeId(8)), None);
    }
}
