//! Inline content: runs, fields, links, notes, images and inline math

use super::{Picture, Renderer, COMMENT_REFERENCE_STYLE, FOOTNOTE_REFERENCE_STYLE, HYPERLINK_STYLE};
use crate::citation::RenderedCitation;
use crate::error::Result;
use crate::math::MathOutput;
use crate::media::display_size;
use crate::model::{Citation, CommentRange, Footnote, ImageRef, Inline, InlineMath, Link, Marks};
use crate::xml;

const CODE_FONT: &str = "Consolas";

impl Renderer<'_> {
    pub(crate) fn inlines(&mut self, inlines: &[Inline]) -> Result<()> {
        self.styled_inlines(inlines, None)
    }

    /// Render inlines with a character style applied to their text runs
    fn styled_inlines(&mut self, inlines: &[Inline], run_style: Option<&str>) -> Result<()> {
        for inline in inlines {
            match inline {
                Inline::Text(t) => self.text_run(&t.text, &t.marks, run_style)?,
                Inline::Link(link) => self.link(link)?,
                Inline::Citation(citation) => self.citation(citation)?,
                Inline::Footnote(note) => self.footnote_reference(note)?,
                Inline::Comment(range) => self.comment_range(range, run_style)?,
                Inline::Image(image) => self.image(image)?,
                Inline::Math(math) => self.inline_math(math, run_style)?,
                Inline::LineBreak => {
                    xml::start(&mut self.w, "w:r", &[])?;
                    xml::empty(&mut self.w, "w:br", &[])?;
                    xml::end(&mut self.w, "w:r")?;
                }
            }
        }
        Ok(())
    }

    /// A run of text; `\n` becomes a line break and `\t` a tab
    pub(crate) fn text_run(&mut self, text: &str, marks: &Marks, style: Option<&str>) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        xml::start(&mut self.w, "w:r", &[])?;
        self.run_properties(marks, style)?;
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                xml::empty(&mut self.w, "w:br", &[])?;
            }
            for (j, segment) in line.split('\t').enumerate() {
                if j > 0 {
                    xml::empty(&mut self.w, "w:tab", &[])?;
                }
                if !segment.is_empty() {
                    xml::preserved_text(&mut self.w, "w:t", segment)?;
                }
            }
        }
        xml::end(&mut self.w, "w:r")
    }

    fn run_properties(&mut self, marks: &Marks, style: Option<&str>) -> Result<()> {
        if marks.is_plain() && style.is_none() {
            return Ok(());
        }

        let w = &mut self.w;
        xml::start(w, "w:rPr", &[])?;
        if let Some(style) = style {
            xml::w_val(w, "w:rStyle", style)?;
        }
        if marks.code {
            xml::empty(
                w,
                "w:rFonts",
                &[("w:ascii", CODE_FONT), ("w:hAnsi", CODE_FONT), ("w:cs", CODE_FONT)],
            )?;
        }
        if marks.bold {
            xml::empty(w, "w:b", &[])?;
        }
        if marks.italic {
            xml::empty(w, "w:i", &[])?;
        }
        if marks.strike {
            xml::empty(w, "w:strike", &[])?;
        }
        if marks.underline {
            xml::w_val(w, "w:u", "single")?;
        }
        if marks.superscript {
            xml::w_val(w, "w:vertAlign", "superscript")?;
        } else if marks.subscript {
            xml::w_val(w, "w:vertAlign", "subscript")?;
        }
        xml::end(w, "w:rPr")
    }

    /// `<w:r><w:rPr><w:rStyle/></w:rPr><element/></w:r>`
    pub(crate) fn reference_run(&mut self, style: &str, element: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let w = &mut self.w;
        xml::start(w, "w:r", &[])?;
        xml::start(w, "w:rPr", &[])?;
        xml::w_val(w, "w:rStyle", style)?;
        xml::end(w, "w:rPr")?;
        xml::empty(w, element, attrs)?;
        xml::end(w, "w:r")
    }

    fn field_char(&mut self, kind: &str) -> Result<()> {
        xml::start(&mut self.w, "w:r", &[])?;
        xml::empty(&mut self.w, "w:fldChar", &[("w:fldCharType", kind)])?;
        xml::end(&mut self.w, "w:r")
    }

    /// Open a complex field: begin, instruction, separate
    pub(crate) fn field_begin(&mut self, instruction: &str) -> Result<()> {
        self.field_char("begin")?;
        xml::start(&mut self.w, "w:r", &[])?;
        xml::preserved_text(&mut self.w, "w:instrText", instruction)?;
        xml::end(&mut self.w, "w:r")?;
        self.field_char("separate")
    }

    pub(crate) fn field_end(&mut self) -> Result<()> {
        self.field_char("end")
    }

    fn link(&mut self, link: &Link) -> Result<()> {
        match link.internal_anchor() {
            Some(anchor) => xml::start(&mut self.w, "w:hyperlink", &[("w:anchor", anchor)])?,
            None => {
                let ctx = self.ctx;
                let id = ctx
                    .hyperlink(&self.part, &link.href)
                    .ok_or_else(|| self.unresolved(format!("hyperlink {}", link.href)))?;
                xml::start(&mut self.w, "w:hyperlink", &[("r:id", id)])?;
            }
        }
        self.styled_inlines(&link.children, Some(HYPERLINK_STYLE))?;
        xml::end(&mut self.w, "w:hyperlink")
    }

    fn citation(&mut self, citation: &Citation) -> Result<()> {
        let ctx = self.ctx;
        match ctx.citations.get(citation.id) {
            Some(RenderedCitation::Field {
                instruction,
                result,
            }) => {
                self.field_begin(instruction)?;
                self.text_run(result, &Marks::default(), None)?;
                self.field_end()
            }
            Some(RenderedCitation::Fallback(text)) => self.text_run(text, &Marks::default(), None),
            None => Err(self.unresolved(format!("citation {}", citation.id))),
        }
    }

    fn footnote_reference(&mut self, note: &Footnote) -> Result<()> {
        let id = self
            .ctx
            .footnotes
            .id_for(note.id)
            .ok_or_else(|| self.unresolved(format!("footnote {}", note.id)))?
            .to_string();
        self.reference_run(FOOTNOTE_REFERENCE_STYLE, "w:footnoteReference", &[("w:id", &id)])
    }

    /// Range markers around the children, then one reference per comment.
    /// Ranges without comments render their children only.
    fn comment_range(&mut self, range: &CommentRange, run_style: Option<&str>) -> Result<()> {
        let ctx = self.ctx;
        let ids: Vec<String> = ctx.comments.ids_for(range.id).iter().map(u32::to_string).collect();

        for id in &ids {
            xml::empty(&mut self.w, "w:commentRangeStart", &[("w:id", id)])?;
        }
        self.styled_inlines(&range.children, run_style)?;
        for id in &ids {
            xml::empty(&mut self.w, "w:commentRangeEnd", &[("w:id", id)])?;
        }
        for id in &ids {
            self.reference_run(COMMENT_REFERENCE_STYLE, "w:commentReference", &[("w:id", id)])?;
        }
        Ok(())
    }

    pub(crate) fn image(&mut self, image: &ImageRef) -> Result<()> {
        let ctx = self.ctx;
        let rel_id = ctx
            .media
            .rel_id(&self.part, &image.image_id)
            .ok_or_else(|| self.unresolved(format!("image '{}'", image.image_id)))?;

        let intrinsic = ctx.media.part(&image.image_id).and_then(|p| p.size);
        let options = &ctx.options;
        let size = display_size(
            image,
            intrinsic,
            (options.default_image_width, options.default_image_height),
            options.text_width,
        );

        let picture = Picture {
            node: image.id,
            rel_id,
            size,
            alt: image.alt.as_deref(),
        };
        xml::start(&mut self.w, "w:r", &[])?;
        picture.write_to(&mut self.w)?;
        xml::end(&mut self.w, "w:r")
    }

    fn inline_math(&mut self, math: &InlineMath, run_style: Option<&str>) -> Result<()> {
        let ctx = self.ctx;
        match ctx.math.get(&math.id) {
            Some(MathOutput::Omml(element)) => element.write_to(&mut self.w),
            Some(MathOutput::Fallback(source)) => self.text_run(source, &Marks::default(), run_style),
            None => Err(self.unresolved(format!("formula {}", math.id))),
        }
    }
}
