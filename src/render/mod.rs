//! WordprocessingML rendering
//!
//! A [`Renderer`] writes one story (body, footnotes or comments) of the
//! preprocessed tree. It only reads the [`ExportContext`]: every citation,
//! relationship, footnote id, comment id, numbering and table layout must
//! have been registered by an earlier phase. A missing lookup is a bug in
//! that phase and fails with [`Error::UnresolvedReference`].

mod drawing;
mod inline;

pub use drawing::Picture;

use crate::citation::BibliographyPlacement;
use crate::error::{Error, Result};
use crate::export::ExportContext;
use crate::math::{omath_para, MathOutput};
use crate::model::{Block, Figure, Heading, Inline, List, Marks, MathBlock, Table};
use crate::numbering::NumberingInfo;
use crate::opc::PartUri;
use crate::preprocess::{ContentTree, Story};
use crate::table::GridCell;
use crate::xml::{self, document_namespaces};
use quick_xml::Writer;

pub const LIST_PARAGRAPH_STYLE: &str = "ListParagraph";
pub const CAPTION_STYLE: &str = "Caption";
pub const BIBLIOGRAPHY_STYLE: &str = "Bibliography";
pub const TABLE_STYLE: &str = "TableGrid";
pub const HYPERLINK_STYLE: &str = "Hyperlink";
pub const FOOTNOTE_REFERENCE_STYLE: &str = "FootnoteReference";
pub const COMMENT_REFERENCE_STYLE: &str = "CommentReference";

/// Reference mark opening the first paragraph of a note
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteMark {
    /// `w:footnoteRef`
    Footnote,
    /// `w:annotationRef`
    Comment,
}

/// Writes WordprocessingML for one story
pub struct Renderer<'a> {
    ctx: &'a ExportContext,
    story: Story,
    /// Part owning the relationships this story may reference
    part: PartUri,
    w: Writer<Vec<u8>>,
    next_bookmark: u32,
    bibliography_done: bool,
}

impl<'a> Renderer<'a> {
    pub fn new(ctx: &'a ExportContext, story: Story) -> Result<Self> {
        Ok(Self {
            ctx,
            story,
            part: story.part_uri(&ctx.document_uri),
            w: xml::part_writer()?,
            next_bookmark: 0,
            bibliography_done: false,
        })
    }

    /// The underlying writer, for the part's wrapper elements
    pub fn writer(&mut self) -> &mut Writer<Vec<u8>> {
        &mut self.w
    }

    pub fn part(&self) -> &PartUri {
        &self.part
    }

    /// Return the XML written so far
    pub fn finish(self) -> Result<String> {
        xml::finish(self.w)
    }

    fn unresolved(&self, reference: impl Into<String>) -> Error {
        Error::UnresolvedReference {
            part: self.part.to_string(),
            reference: reference.into(),
        }
    }

    pub fn blocks(&mut self, blocks: &[Block]) -> Result<()> {
        for block in blocks {
            self.block(block)?;
        }
        Ok(())
    }

    fn block(&mut self, block: &Block) -> Result<()> {
        match block {
            Block::Paragraph(p) => self.paragraph(p.style.as_deref(), None, &p.inlines),
            Block::Heading(h) => self.heading(h),
            Block::List(list) => self.list(list),
            Block::Table(table) => self.table(table),
            Block::Figure(figure) => self.figure(figure),
            Block::Math(math) => self.math_block(math),
            Block::Bibliography => self.bibliography_placeholder(),
            Block::PageBreak => self.page_break(),
        }
    }

    fn start_paragraph(&mut self, style: Option<&str>, numbering: Option<NumberingInfo>) -> Result<()> {
        let w = &mut self.w;
        xml::start(w, "w:p", &[])?;
        if style.is_none() && numbering.is_none() {
            return Ok(());
        }

        xml::start(w, "w:pPr", &[])?;
        if let Some(style) = style {
            xml::w_val(w, "w:pStyle", style)?;
        }
        if let Some(info) = numbering {
            xml::start(w, "w:numPr", &[])?;
            xml::w_val(w, "w:ilvl", &info.level.to_string())?;
            xml::w_val(w, "w:numId", &info.num_id.to_string())?;
            xml::end(w, "w:numPr")?;
        }
        xml::end(w, "w:pPr")
    }

    fn end_paragraph(&mut self) -> Result<()> {
        xml::end(&mut self.w, "w:p")
    }

    fn empty_paragraph(&mut self) -> Result<()> {
        xml::empty(&mut self.w, "w:p", &[])
    }

    fn paragraph(
        &mut self,
        style: Option<&str>,
        numbering: Option<NumberingInfo>,
        inlines: &[Inline],
    ) -> Result<()> {
        self.start_paragraph(style, numbering)?;
        self.inlines(inlines)?;
        self.end_paragraph()
    }

    /// Paragraph of a footnote or comment
    pub fn note_paragraph(&mut self, style: &str, mark: Option<NoteMark>, inlines: &[Inline]) -> Result<()> {
        self.start_paragraph(Some(style), None)?;
        match mark {
            Some(NoteMark::Footnote) => {
                self.reference_run(FOOTNOTE_REFERENCE_STYLE, "w:footnoteRef", &[])?;
                self.text_run(" ", &Marks::default(), None)?;
            }
            Some(NoteMark::Comment) => {
                self.reference_run(COMMENT_REFERENCE_STYLE, "w:annotationRef", &[])?;
            }
            None => {}
        }
        self.inlines(inlines)?;
        self.end_paragraph()
    }

    fn heading(&mut self, heading: &Heading) -> Result<()> {
        let style = format!("Heading{}", heading.level.clamp(1, 6));
        self.start_paragraph(Some(&style), None)?;

        let bookmark = match heading.anchor.as_deref().filter(|a| !a.is_empty()) {
            Some(name) => {
                let id = self.next_bookmark.to_string();
                self.next_bookmark += 1;
                xml::empty(&mut self.w, "w:bookmarkStart", &[("w:id", &id), ("w:name", name)])?;
                Some(id)
            }
            None => None,
        };

        self.inlines(&heading.inlines)?;

        if let Some(id) = bookmark {
            xml::empty(&mut self.w, "w:bookmarkEnd", &[("w:id", &id)])?;
        }
        self.end_paragraph()
    }

    /// Items carry the list's numbering on their first paragraph; further
    /// blocks of an item are indented but unnumbered
    fn list(&mut self, list: &List) -> Result<()> {
        let info = self
            .ctx
            .numbering
            .numbering(list.id)
            .ok_or_else(|| self.unresolved(format!("numbering of list {}", list.id)))?;

        for item in &list.items {
            let mut rest = item.content.iter();
            match item.content.first() {
                Some(Block::Paragraph(p)) => {
                    rest.next();
                    let style = p.style.as_deref().unwrap_or(LIST_PARAGRAPH_STYLE);
                    self.paragraph(Some(style), Some(info), &p.inlines)?;
                }
                _ => self.paragraph(Some(LIST_PARAGRAPH_STYLE), Some(info), &[])?,
            }

            for block in rest {
                match block {
                    Block::Paragraph(p) => {
                        let style = p.style.as_deref().unwrap_or(LIST_PARAGRAPH_STYLE);
                        self.paragraph(Some(style), None, &p.inlines)?;
                    }
                    other => self.block(other)?,
                }
            }
        }
        Ok(())
    }

    fn table(&mut self, table: &Table) -> Result<()> {
        let ctx = self.ctx;
        let grid = ctx
            .tables
            .get(&table.id)
            .ok_or_else(|| self.unresolved(format!("layout of table {}", table.id)))?;

        let total = grid.total_width().to_string();
        xml::start(&mut self.w, "w:tbl", &[])?;
        xml::start(&mut self.w, "w:tblPr", &[])?;
        xml::w_val(&mut self.w, "w:tblStyle", TABLE_STYLE)?;
        xml::empty(&mut self.w, "w:tblW", &[("w:w", &total), ("w:type", "dxa")])?;
        xml::end(&mut self.w, "w:tblPr")?;

        xml::start(&mut self.w, "w:tblGrid", &[])?;
        for column in &grid.columns {
            xml::empty(&mut self.w, "w:gridCol", &[("w:w", &column.width.to_string())])?;
        }
        xml::end(&mut self.w, "w:tblGrid")?;

        for row in &grid.rows {
            xml::start(&mut self.w, "w:tr", &[])?;
            if row.header {
                xml::start(&mut self.w, "w:trPr", &[])?;
                xml::empty(&mut self.w, "w:tblHeader", &[])?;
                xml::end(&mut self.w, "w:trPr")?;
            }

            let mut col = 0;
            for cell in &row.cells {
                let span = cell.grid_span() as usize;
                let end = (col + span).min(grid.columns.len());
                let width: u32 = grid.columns[col.min(end)..end].iter().map(|c| c.width).sum();
                col += span;

                xml::start(&mut self.w, "w:tc", &[])?;
                xml::start(&mut self.w, "w:tcPr", &[])?;
                xml::empty(&mut self.w, "w:tcW", &[("w:w", &width.to_string()), ("w:type", "dxa")])?;
                if span > 1 {
                    xml::w_val(&mut self.w, "w:gridSpan", &span.to_string())?;
                }
                match cell {
                    GridCell::Content {
                        v_merge: Some(merge),
                        ..
                    } => xml::w_val(&mut self.w, "w:vMerge", merge.as_str())?,
                    GridCell::Merged { .. } => xml::w_val(&mut self.w, "w:vMerge", "continue")?,
                    _ => {}
                }
                xml::end(&mut self.w, "w:tcPr")?;

                match cell {
                    GridCell::Content { row, cell, .. } => {
                        let content = table
                            .rows
                            .get(*row)
                            .and_then(|r| r.cells.get(*cell))
                            .map(|c| c.content.as_slice())
                            .ok_or_else(|| self.unresolved(format!("cell {}:{} of table {}", row, cell, table.id)))?;
                        self.blocks(content)?;
                        // A cell must end with a paragraph
                        if !matches!(content.last(), Some(b) if !matches!(b, Block::Table(_))) {
                            self.empty_paragraph()?;
                        }
                    }
                    GridCell::Merged { .. } | GridCell::Padding => self.empty_paragraph()?,
                }
                xml::end(&mut self.w, "w:tc")?;
            }
            xml::end(&mut self.w, "w:tr")?;
        }

        xml::end(&mut self.w, "w:tbl")
    }

    fn figure(&mut self, figure: &Figure) -> Result<()> {
        xml::start(&mut self.w, "w:p", &[])?;
        xml::start(&mut self.w, "w:pPr", &[])?;
        if !figure.caption.is_empty() {
            xml::empty(&mut self.w, "w:keepNext", &[])?;
        }
        xml::w_val(&mut self.w, "w:jc", "center")?;
        xml::end(&mut self.w, "w:pPr")?;
        self.image(&figure.image)?;
        self.end_paragraph()?;

        if !figure.caption.is_empty() {
            self.paragraph(Some(CAPTION_STYLE), None, &figure.caption)?;
        }
        Ok(())
    }

    fn math_block(&mut self, math: &MathBlock) -> Result<()> {
        let ctx = self.ctx;
        match ctx.math.get(&math.id) {
            Some(MathOutput::Omml(element)) => {
                self.start_paragraph(None, None)?;
                omath_para(element.clone()).write_to(&mut self.w)?;
                self.end_paragraph()
            }
            Some(MathOutput::Fallback(source)) => {
                self.start_paragraph(None, None)?;
                self.text_run(source, &Marks::default(), None)?;
                self.end_paragraph()
            }
            None => Err(self.unresolved(format!("formula {}", math.id))),
        }
    }

    fn page_break(&mut self) -> Result<()> {
        xml::start(&mut self.w, "w:p", &[])?;
        xml::start(&mut self.w, "w:r", &[])?;
        xml::empty(&mut self.w, "w:br", &[("w:type", "page")])?;
        xml::end(&mut self.w, "w:r")?;
        self.end_paragraph()
    }

    fn bibliography_placeholder(&mut self) -> Result<()> {
        if self.story == Story::Body
            && !self.bibliography_done
            && self.ctx.citations.placement == BibliographyPlacement::Placeholder
        {
            self.bibliography()?;
        }
        Ok(())
    }

    fn appended_bibliography(&mut self) -> Result<()> {
        let ctx = self.ctx;
        if self.bibliography_done || ctx.citations.placement != BibliographyPlacement::Appended {
            return Ok(());
        }
        if let Some(heading) = ctx.options.bibliography_heading.as_deref() {
            self.paragraph(Some("Heading1"), None, &[Inline::text(heading)])?;
        }
        self.bibliography()
    }

    /// Entries as `Bibliography` paragraphs inside one BIBLIOGRAPHY field
    fn bibliography(&mut self) -> Result<()> {
        self.bibliography_done = true;
        let ctx = self.ctx;
        let entries = &ctx.citations.bibliography;
        let last = entries.len().saturating_sub(1);

        for (i, entry) in entries.iter().enumerate() {
            self.start_paragraph(Some(BIBLIOGRAPHY_STYLE), None)?;
            if i == 0 {
                self.field_begin(" BIBLIOGRAPHY ")?;
            }
            self.text_run(&entry.text, &Marks::default(), None)?;
            if i == last {
                self.field_end()?;
            }
            self.end_paragraph()?;
        }
        Ok(())
    }
}

/// Render `word/document.xml`
pub fn document_xml(tree: &ContentTree, ctx: &ExportContext) -> Result<String> {
    let mut renderer = Renderer::new(ctx, Story::Body)?;

    let attrs = root_attributes(&ctx.skeleton.root_attributes);
    let attrs: Vec<(&str, &str)> = attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    xml::start(renderer.writer(), "w:document", &attrs)?;
    xml::start(renderer.writer(), "w:body", &[])?;

    renderer.blocks(&tree.blocks)?;
    renderer.appended_bibliography()?;

    if let Some(sect_pr) = &ctx.skeleton.sect_pr {
        sect_pr.write_to(renderer.writer())?;
    }

    xml::end(renderer.writer(), "w:body")?;
    xml::end(renderer.writer(), "w:document")?;
    renderer.finish()
}

/// Skeleton root attributes plus any namespace the renderer needs
fn root_attributes(skeleton: &[(String, String)]) -> Vec<(String, String)> {
    let mut attrs = skeleton.to_vec();
    for (name, uri) in document_namespaces() {
        if !attrs.iter().any(|(k, _)| k == name) {
            attrs.push((name.to_string(), uri.to_string()));
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root_attributes_keep_skeleton_order() {
        let skeleton = vec![
            ("xmlns:w".to_string(), "urn:custom-w".to_string()),
            ("mc:Ignorable".to_string(), "w14".to_string()),
        ];
        let attrs = root_attributes(&skeleton);

        assert_eq!(attrs[0], skeleton[0]);
        assert_eq!(attrs[1], skeleton[1]);
        assert_eq!(attrs.iter().filter(|(k, _)| k == "xmlns:w").count(), 1);
        assert!(attrs.iter().any(|(k, _)| k == "xmlns:m"));
    }
}
