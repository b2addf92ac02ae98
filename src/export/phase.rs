//! The export pipeline
//!
//! Phases run in a fixed order, each with exclusive access to the
//! [`ExportContext`]. Everything the renderer resolves is registered before
//! [`Phase::Body`]; [`Phase::Validate`] re-reads what the body produced.

use super::context::{ExportContext, ExportInputs};
use super::validate;
use crate::citation::{sources, CitationBuilder};
use crate::error::{Error, Result};
use crate::math;
use crate::metadata::{format_timestamp, Metadata};
use crate::model::{BibEntry, Block, CommentRange, Footnote, ImageRef, Inline, Link, Table};
use crate::numbering::NumberingBuilder;
use crate::opc::{content_types, rel_types, well_known, PartUri, TargetMode};
use crate::preprocess::{ContentTree, Story, Visitor};
use crate::render;
use crate::table::TableGrid;
use crate::warning::WarningKind;
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Citations,
    Metadata,
    Tables,
    Math,
    Hyperlinks,
    Media,
    Comments,
    Lists,
    Footnotes,
    Body,
    Validate,
}

impl Phase {
    /// Execution order
    pub const ALL: [Phase; 11] = [
        Phase::Citations,
        Phase::Metadata,
        Phase::Tables,
        Phase::Math,
        Phase::Hyperlinks,
        Phase::Media,
        Phase::Comments,
        Phase::Lists,
        Phase::Footnotes,
        Phase::Body,
        Phase::Validate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Citations => "citations",
            Phase::Metadata => "metadata",
            Phase::Tables => "tables",
            Phase::Math => "math",
            Phase::Hyperlinks => "hyperlinks",
            Phase::Media => "media",
            Phase::Comments => "comments",
            Phase::Lists => "lists",
            Phase::Footnotes => "footnotes",
            Phase::Body => "body",
            Phase::Validate => "validate",
        }
    }

    pub fn run(&self, tree: &ContentTree, inputs: &ExportInputs<'_>, ctx: &mut ExportContext) -> Result<()> {
        match self {
            Phase::Citations => citations(tree, inputs, ctx),
            Phase::Metadata => metadata(tree, ctx),
            Phase::Tables => tables(tree, ctx),
            Phase::Math => {
                ctx.math = math::convert_all(tree, &mut ctx.warnings);
                Ok(())
            }
            Phase::Hyperlinks => hyperlinks(tree, ctx),
            Phase::Media => media(tree, inputs, ctx),
            Phase::Comments => comments(tree, ctx),
            Phase::Lists => lists(tree, ctx),
            Phase::Footnotes => footnotes(tree, ctx),
            Phase::Body => {
                let xml = render::document_xml(tree, ctx)?;
                ctx.add_part(ctx.document_uri.clone(), content_types::MAIN_DOCUMENT, xml);
                Ok(())
            }
            Phase::Validate => validate::validate(ctx),
        }
    }
}

/// Run every phase in order
pub fn run_phases(tree: &ContentTree, inputs: &ExportInputs<'_>, ctx: &mut ExportContext) -> Result<()> {
    for phase in Phase::ALL {
        log::debug!("running phase {}", phase.name());
        phase.run(tree, inputs, ctx)?;
    }
    Ok(())
}

fn citations(tree: &ContentTree, inputs: &ExportInputs<'_>, ctx: &mut ExportContext) -> Result<()> {
    let output = CitationBuilder::new(inputs.bibliography, inputs.processor).build(
        tree,
        &ctx.options,
        &mut ctx.warnings,
    )?;

    if !output.cited_keys.is_empty() {
        let entries: Vec<&BibEntry> = output
            .cited_keys
            .iter()
            .filter_map(|key| inputs.bibliography.get(key))
            .collect();
        let (item, props) = custom_xml_uris(&ctx.skeleton_parts)?;

        ctx.registry
            .register_part(&ctx.document_uri, rel_types::CUSTOM_XML, &item);
        ctx.registry
            .register_part(&item, rel_types::CUSTOM_XML_PROPS, &props);
        ctx.add_part(item, content_types::XML, sources::sources_xml(&entries)?);
        ctx.add_part(
            props,
            content_types::CUSTOM_XML_PROPS,
            sources::item_props_xml(&output.cited_keys)?,
        );
    }

    ctx.citations = output;
    Ok(())
}

/// First free `/customXml/itemN.xml` and its properties part
fn custom_xml_uris(taken: &BTreeSet<PartUri>) -> Result<(PartUri, PartUri)> {
    for n in 1.. {
        let item = PartUri::new(&format!("/customXml/item{}.xml", n))?;
        let props = PartUri::new(&format!("/customXml/itemProps{}.xml", n))?;
        if !taken.contains(&item) && !taken.contains(&props) {
            return Ok((item, props));
        }
    }
    Err(Error::InvalidPartUri("no free custom XML part name".into()))
}

fn metadata(tree: &ContentTree, ctx: &mut ExportContext) -> Result<()> {
    let metadata = Metadata::build(tree, &ctx.options, ctx.timestamp);
    ctx.add_part(ctx.core_uri.clone(), content_types::CORE_PROPERTIES, metadata.core_xml()?);
    ctx.metadata = Some(metadata);
    Ok(())
}

#[derive(Default)]
struct Tables<'a>(Vec<&'a Table>);

impl<'a> Visitor<'a> for Tables<'a> {
    fn visit_block(&mut self, _story: Story, block: &'a Block) {
        if let Block::Table(table) = block {
            self.0.push(table);
        }
    }
}

fn tables(tree: &ContentTree, ctx: &mut ExportContext) -> Result<()> {
    let mut found = Tables::default();
    tree.walk(&mut found);
    for table in found.0 {
        let grid = TableGrid::normalize(table, ctx.options.text_width);
        ctx.tables.insert(table.id, grid);
    }
    Ok(())
}

#[derive(Default)]
struct Links<'a>(Vec<(Story, &'a Link)>);

impl<'a> Visitor<'a> for Links<'a> {
    fn visit_inline(&mut self, story: Story, inline: &'a Inline) {
        if let Inline::Link(link) = inline {
            if link.internal_anchor().is_none() {
                self.0.push((story, link));
            }
        }
    }
}

/// One external relationship per distinct target and owning part
fn hyperlinks(tree: &ContentTree, ctx: &mut ExportContext) -> Result<()> {
    let mut found = Links::default();
    tree.walk(&mut found);

    for (story, link) in found.0 {
        let part = story.part_uri(&ctx.document_uri);
        let key = (part, link.href.clone());
        if ctx.hyperlinks.contains_key(&key) {
            continue;
        }
        let id = ctx
            .registry
            .register(&key.0, rel_types::HYPERLINK, &link.href, TargetMode::External);
        ctx.hyperlinks.insert(key, id);
    }
    Ok(())
}

#[derive(Default)]
struct Images<'a>(Vec<(Story, &'a ImageRef)>);

impl<'a> Visitor<'a> for Images<'a> {
    fn visit_block(&mut self, story: Story, block: &'a Block) {
        if let Block::Figure(figure) = block {
            self.0.push((story, &figure.image));
        }
    }

    fn visit_inline(&mut self, story: Story, inline: &'a Inline) {
        if let Inline::Image(image) = inline {
            self.0.push((story, image));
        }
    }
}

fn media(tree: &ContentTree, inputs: &ExportInputs<'_>, ctx: &mut ExportContext) -> Result<()> {
    let mut found = Images::default();
    tree.walk(&mut found);

    for (story, image) in found.0 {
        let owner = story.part_uri(&ctx.document_uri);
        ctx.media.register(
            &mut ctx.registry,
            &owner,
            &image.image_id,
            inputs.images,
            &mut ctx.warnings,
        );
    }
    Ok(())
}

#[derive(Default)]
struct Ranges<'a>(Vec<&'a CommentRange>);

impl<'a> Visitor<'a> for Ranges<'a> {
    fn visit_inline(&mut self, story: Story, inline: &'a Inline) {
        match inline {
            Inline::Comment(range) if story == Story::Body => self.0.push(range),
            _ => {}
        }
    }
}

fn comments(tree: &ContentTree, ctx: &mut ExportContext) -> Result<()> {
    let mut found = Ranges::default();
    tree.walk(&mut found);

    let default_date = format_timestamp(&ctx.timestamp);
    for range in found.0 {
        match tree.comment(&range.comment_id) {
            Some(comment) => {
                ctx.comments.add_thread(range.id, comment, &default_date);
            }
            None => ctx.warnings.push(
                WarningKind::UnknownComment,
                format!("comment '{}' does not exist, range kept as plain content", range.comment_id),
            ),
        }
    }

    if ctx.comments.is_empty() {
        return Ok(());
    }
    let uri = well_known::comments();
    ctx.registry
        .ensure_part(&ctx.document_uri, rel_types::COMMENTS, &uri);
    let xml = ctx.comments.to_xml(ctx)?;
    ctx.add_part(uri, content_types::COMMENTS, xml);
    Ok(())
}

/// Register every list with its nesting depth
fn register_lists(blocks: &[Block], depth: u8, numbering: &mut NumberingBuilder) {
    for block in blocks {
        match block {
            Block::List(list) => {
                numbering.add_list(list.id, &list.style, depth);
                for item in &list.items {
                    register_lists(&item.content, depth.saturating_add(1), numbering);
                }
            }
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|r| r.cells.iter()) {
                    register_lists(&cell.content, depth, numbering);
                }
            }
            _ => {}
        }
    }
}

fn lists(tree: &ContentTree, ctx: &mut ExportContext) -> Result<()> {
    register_lists(&tree.blocks, 0, &mut ctx.numbering);
    if ctx.numbering.is_empty() {
        return Ok(());
    }

    let uri = ctx.numbering_uri.clone();
    ctx.registry
        .ensure_part(&ctx.document_uri, rel_types::NUMBERING, &uri);
    ctx.add_part(uri, content_types::NUMBERING, ctx.numbering.to_xml()?);
    Ok(())
}

#[derive(Default)]
struct Notes<'a>(Vec<&'a Footnote>);

impl<'a> Visitor<'a> for Notes<'a> {
    fn visit_inline(&mut self, story: Story, inline: &'a Inline) {
        match inline {
            Inline::Footnote(note) if story == Story::Body => self.0.push(note),
            _ => {}
        }
    }
}

fn footnotes(tree: &ContentTree, ctx: &mut ExportContext) -> Result<()> {
    let mut found = Notes::default();
    tree.walk(&mut found);
    for note in found.0 {
        ctx.footnotes.add_entry(note.id, note.content.clone());
    }

    if ctx.footnotes.is_empty() {
        return Ok(());
    }
    let uri = well_known::footnotes();
    ctx.registry
        .ensure_part(&ctx.document_uri, rel_types::FOOTNOTES, &uri);
    let xml = ctx.footnotes.to_xml(ctx)?;
    ctx.add_part(uri, content_types::FOOTNOTES, xml);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_xml_skips_taken_names() {
        let taken: BTreeSet<PartUri> = [PartUri::new("/customXml/item1.xml").unwrap()]
            .into_iter()
            .collect();
        let (item, props) = custom_xml_uris(&taken).unwrap();
        assert_eq!(item.as_str(), "/customXml/item2.xml");
        assert_eq!(props.as_str(), "/customXml/itemProps2.xml");
    }

    #[test]
    fn test_phase_order() {
        let names: Vec<&str> = Phase::ALL.iter().map(Phase::name).collect();
        assert_eq!(names.first(), Some(&"citations"));
        assert_eq!(&names[names.len() - 2..], &["body", "validate"]);
    }
}
