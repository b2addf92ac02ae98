//! End-to-end export tests: build a document, export it, reopen the package

use chrono::{TimeZone, Utc};
use linch_docx_export::citation::{BibliographyItem, CitationCluster, ProcessedCitations};
use linch_docx_export::model::{
    Figure, ImageRef, List, ListItem, ListKind, ListStyle, Table, TableCell, TableRow,
};
use linch_docx_export::opc::{rel_types, PartUri};
use linch_docx_export::{
    BibEntry, BibliographyDb, Block, BytesSkeleton, CitationProcessor, Comment, Document,
    ExportOptions, ExportedDocx, Exporter, FileSink, FileSkeleton, Heading, ImageData, ImageDb,
    Inline, Package, Paragraph, WarningKind,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::io::Cursor;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fixed_options() -> ExportOptions {
    ExportOptions::default()
        .with_author("Ada Lovelace")
        .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
}

fn uri(path: &str) -> PartUri {
    PartUri::new(path).unwrap()
}

fn open(docx: &ExportedDocx) -> Package {
    Package::from_bytes(&docx.bytes).unwrap()
}

fn part_text(package: &Package, path: &str) -> String {
    package
        .part(&uri(path))
        .unwrap_or_else(|| panic!("missing part {}", path))
        .data_as_str()
        .unwrap()
        .to_string()
}

fn para(inlines: Vec<Inline>) -> Block {
    Block::Paragraph(Paragraph::from_inlines(inlines))
}

/// 8x4 PNG
fn png() -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image::RgbImage::new(8, 4)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

fn bibliography() -> BibliographyDb {
    BibliographyDb::new()
        .with_entry(
            BibEntry::new("doe2020", "article-journal")
                .with_title("On Things")
                .with_author("Doe", "Jane")
                .with_year(2020),
        )
        .with_entry(
            BibEntry::new("roe2019", "book")
                .with_title("More Things")
                .with_author("Roe", "Rick")
                .with_year(2019),
        )
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn test_plain_document_has_no_optional_parts() {
    init();
    let doc = Document::new()
        .with_title("Field Notes")
        .with_block(para(vec![Inline::text("Hello")]));

    let docx = Exporter::default().with_options(fixed_options()).export(&doc).unwrap();
    assert_eq!(docx.filename, "field-notes.docx");
    assert!(docx.warnings.is_empty());

    let package = open(&docx);
    for absent in [
        "/word/footnotes.xml",
        "/word/comments.xml",
        "/word/numbering.xml",
        "/customXml/item1.xml",
    ] {
        assert!(!package.contains(&uri(absent)), "{} should not exist", absent);
    }

    let document = part_text(&package, "/word/document.xml");
    assert!(document.contains("<w:t>Hello</w:t>"));
    assert!(document.contains("<w:sectPr"));

    let core = part_text(&package, "/docProps/core.xml");
    assert!(core.contains("<dc:title>Field Notes</dc:title>"));
    assert!(core.contains("<dc:creator>Ada Lovelace</dc:creator>"));
    assert!(core.contains("2024-03-01T12:00:00Z"));
    assert_eq!(
        package.uri_by_rel_type(rel_types::CORE_PROPERTIES),
        Some(uri("/docProps/core.xml"))
    );
}

#[test]
fn test_citations_become_fields_with_unique_bibliography() {
    init();
    let doc = Document::new()
        .with_title("Cited")
        .with_block(para(vec![Inline::text("First "), Inline::cite(["doe2020"])]))
        .with_block(para(vec![
            Inline::text("Both "),
            Inline::cite(["doe2020", "roe2019"]),
        ]));

    let docx = Exporter::default()
        .with_bibliography(bibliography())
        .with_options(fixed_options())
        .export(&doc)
        .unwrap();
    assert!(docx.warnings.is_empty());

    let package = open(&docx);
    let document = part_text(&package, "/word/document.xml");
    assert!(document.contains(" CITATION doe2020 "));
    assert!(document.contains(" CITATION doe2020 \\m roe2019 "));
    assert!(document.contains("<w:t>(Doe 2020)</w:t>"));
    assert!(document.contains("<w:t>(Doe 2020; Roe 2019)</w:t>"));

    // appended under the default heading, one paragraph per source
    assert!(document.contains("<w:t>References</w:t>"));
    assert_eq!(count(&document, "<w:pStyle w:val=\"Bibliography\"/>"), 2);
    assert_eq!(count(&document, " BIBLIOGRAPHY "), 1);

    let sources = part_text(&package, "/customXml/item1.xml");
    assert_eq!(count(&sources, "<b:Tag>doe2020</b:Tag>"), 1);
    assert_eq!(count(&sources, "<b:Tag>roe2019</b:Tag>"), 1);
    assert!(package.contains(&uri("/customXml/itemProps1.xml")));
}

/// Numbers sources in order of first citation
struct NumericProcessor;

impl CitationProcessor for NumericProcessor {
    fn process(
        &self,
        clusters: &[CitationCluster<'_>],
    ) -> linch_docx_export::Result<ProcessedCitations> {
        let mut order: Vec<&str> = Vec::new();
        let mut citations = Vec::new();
        for cluster in clusters {
            let mut numbers = Vec::new();
            for item in &cluster.items {
                let key = item.entry.id.as_str();
                let n = match order.iter().position(|k| *k == key) {
                    Some(i) => i + 1,
                    None => {
                        order.push(key);
                        order.len()
                    }
                };
                numbers.push(n.to_string());
            }
            citations.push(format!("[{}]", numbers.join(", ")));
        }
        let bibliography = order
            .iter()
            .enumerate()
            .map(|(i, key)| BibliographyItem {
                key: key.to_string(),
                text: format!("[{}] {}", i + 1, key),
            })
            .collect();
        Ok(ProcessedCitations {
            citations,
            bibliography,
        })
    }
}

#[test]
fn test_custom_processor_output_is_field_result() {
    init();
    let doc = Document::new()
        .with_title("Numbered")
        .with_block(para(vec![Inline::text("Later "), Inline::cite(["roe2019"])]))
        .with_block(para(vec![Inline::cite(["roe2019", "doe2020"])]));

    let docx = Exporter::default()
        .with_processor(Box::new(NumericProcessor))
        .with_bibliography(bibliography())
        .with_options(fixed_options())
        .export(&doc)
        .unwrap();
    assert!(docx.warnings.is_empty());

    let document = part_text(&open(&docx), "/word/document.xml");
    assert!(document.contains(" CITATION roe2019 "));
    assert!(document.contains(" CITATION roe2019 \\m doe2020 "));
    assert!(document.contains("<w:t>[1]</w:t>"));
    assert!(document.contains("<w:t>[1, 2]</w:t>"));
    assert!(document.contains("<w:t>[2] doe2020</w:t>"));
    assert!(!document.contains("(Roe 2019)"));
}

#[test]
fn test_unknown_citation_key_falls_back_to_text() {
    init();
    let doc = Document::new()
        .with_title("Ghost")
        .with_block(para(vec![Inline::cite(["ghost"])]));

    let docx = Exporter::default()
        .with_bibliography(bibliography())
        .with_options(fixed_options())
        .export(&doc)
        .unwrap();

    assert_eq!(docx.warnings.len(), 1);
    assert_eq!(docx.warnings[0].kind, WarningKind::UnresolvedCitation);

    let package = open(&docx);
    let document = part_text(&package, "/word/document.xml");
    assert!(document.contains("<w:t>[ghost?]</w:t>"));
    assert!(!document.contains("CITATION"));
    assert!(!document.contains("BIBLIOGRAPHY"));
    assert!(!package.contains(&uri("/customXml/item1.xml")));
}

#[test]
fn test_footnote_and_comment_entries_match_references() {
    init();
    let thread = Comment::new("c1", "Grace Hopper", "Check this")
        .with_reply(Comment::new("c1r", "Ada Lovelace", "Checked"));
    let doc = Document::new()
        .with_title("Notes")
        .with_comment(thread)
        .with_block(para(vec![
            Inline::text("Claim"),
            Inline::footnote(vec![Paragraph::new("First note")]),
            Inline::comment("c1", vec![Inline::text(" under review")]),
        ]))
        .with_block(para(vec![
            Inline::text("Another"),
            Inline::footnote(vec![Paragraph::new("Second note")]),
        ]));

    let docx = Exporter::default().with_options(fixed_options()).export(&doc).unwrap();
    assert!(docx.warnings.is_empty());

    let package = open(&docx);
    let document = part_text(&package, "/word/document.xml");
    let footnotes = part_text(&package, "/word/footnotes.xml");
    let comments = part_text(&package, "/word/comments.xml");

    assert_eq!(count(&document, "<w:footnoteReference "), 2);
    assert_eq!(count(&footnotes, "<w:footnote w:id="), 2);
    assert!(footnotes.contains("<w:t>Second note</w:t>"));

    assert_eq!(count(&document, "<w:commentReference "), 2);
    assert_eq!(count(&document, "<w:commentRangeStart "), 2);
    assert_eq!(count(&comments, "<w:comment "), 2);
    assert!(comments.contains("w:author=\"Grace Hopper\""));
    assert!(comments.contains("w:initials=\"GH\""));

    let rels = package
        .part(&uri("/word/document.xml"))
        .and_then(|p| p.relationships())
        .unwrap();
    assert!(rels.by_type(rel_types::FOOTNOTES).is_some());
    assert!(rels.by_type(rel_types::COMMENTS).is_some());
}

#[test]
fn test_unknown_comment_keeps_content() {
    init();
    let doc = Document::new()
        .with_title("Orphan")
        .with_block(para(vec![Inline::comment("nope", vec![Inline::text("kept")])]));

    let docx = Exporter::default().with_options(fixed_options()).export(&doc).unwrap();
    assert!(docx
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::UnknownComment));

    let package = open(&docx);
    let document = part_text(&package, "/word/document.xml");
    assert!(document.contains("<w:t>kept</w:t>"));
    assert!(!document.contains("commentReference"));
    assert!(!package.contains(&uri("/word/comments.xml")));
}

#[test]
fn test_control_characters_are_cleaned() {
    init();
    let thread = Comment::new("c1", "Grace\u{1B}Hopper", "Look\u{0C}here");
    let doc = Document::new()
        .with_title("Pasted")
        .with_comment(thread)
        .with_block(Block::Paragraph(Paragraph::new("a\u{0B}b\u{07}c")))
        .with_block(para(vec![Inline::comment("c1", vec![Inline::text("marked")])]));

    let docx = Exporter::default().with_options(fixed_options()).export(&doc).unwrap();
    let cleaned: Vec<_> = docx
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::MalformedNodeDropped)
        .collect();
    assert_eq!(cleaned.len(), 3, "{:?}", docx.warnings);

    let package = open(&docx);
    let document = part_text(&package, "/word/document.xml");
    let comments = part_text(&package, "/word/comments.xml");
    for xml in [&document, &comments] {
        assert!(!xml.chars().any(|c| c < ' ' && !matches!(c, '\t' | '\n' | '\r')));
    }
    assert!(document.contains("<w:t>a</w:t><w:br/><w:t>bc</w:t>"));
    assert!(comments.contains("w:author=\"GraceHopper\""));
    assert!(comments.contains("<w:t>Look</w:t><w:br/><w:t>here</w:t>"));
}

#[test]
fn test_range_on_reply_exports_reply_thread() {
    init();
    let thread = Comment::new("c1", "Grace Hopper", "Root remark").with_reply(
        Comment::new("c2", "Ada Lovelace", "Reply remark")
            .with_reply(Comment::new("c3", "Alan Turing", "Nested remark")),
    );
    let doc = Document::new()
        .with_title("Replies")
        .with_comment(thread)
        .with_block(para(vec![Inline::comment("c2", vec![Inline::text("anchored")])]));

    let docx = Exporter::default().with_options(fixed_options()).export(&doc).unwrap();
    assert!(docx.warnings.is_empty(), "{:?}", docx.warnings);

    let package = open(&docx);
    let document = part_text(&package, "/word/document.xml");
    let comments = part_text(&package, "/word/comments.xml");

    assert_eq!(count(&comments, "<w:comment "), 2);
    assert!(comments.contains("<w:t>Reply remark</w:t>"));
    assert!(comments.contains("<w:t>Nested remark</w:t>"));
    assert!(!comments.contains("Root remark"));
    assert_eq!(count(&document, "<w:commentReference "), 2);
    assert!(document.contains("<w:t>anchored</w:t>"));
}

#[test]
fn test_shared_image_is_stored_once() {
    init();
    let figure = |caption: &str| {
        Block::Figure(Figure {
            image: ImageRef::new("logo"),
            caption: vec![Inline::text(caption)],
            hidden: false,
        })
    };
    let doc = Document::new()
        .with_title("Logos")
        .with_block(figure("One"))
        .with_block(para(vec![Inline::image("logo"), Inline::link("https://example.com", vec![Inline::text("site")])]))
        .with_block(figure("Two"));
    let images = ImageDb::new().with_image("logo", ImageData::new(png()));

    let docx = Exporter::default()
        .with_images(images)
        .with_options(fixed_options())
        .export(&doc)
        .unwrap();
    assert!(docx.warnings.is_empty());

    let package = open(&docx);
    let media: Vec<&PartUri> = package
        .part_uris()
        .filter(|u| u.as_str().starts_with("/word/media/"))
        .collect();
    assert_eq!(media.len(), 1);
    assert_eq!(
        package.content_types().get(media[0]),
        Some("image/png")
    );

    let rels = package
        .part(&uri("/word/document.xml"))
        .and_then(|p| p.relationships())
        .unwrap();
    assert_eq!(rels.all_by_type(rel_types::IMAGE).len(), 1);
    let ids: BTreeSet<&str> = rels.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), rels.len());

    let document = part_text(&package, "/word/document.xml");
    let image_rel = rels.all_by_type(rel_types::IMAGE)[0].id.clone();
    assert_eq!(count(&document, &format!("r:embed=\"{}\"", image_rel)), 3);
    let link_rel = rels.by_type(rel_types::HYPERLINK).unwrap();
    assert_eq!(link_rel.target, "https://example.com");
    assert!(document.contains(&format!("<w:hyperlink r:id=\"{}\">", link_rel.id)));
}

#[test]
fn test_missing_image_uses_placeholder() {
    init();
    let doc = Document::new()
        .with_title("Missing")
        .with_block(para(vec![Inline::image("absent")]));

    let docx = Exporter::default().with_options(fixed_options()).export(&doc).unwrap();
    assert_eq!(docx.warnings.len(), 1);
    assert_eq!(docx.warnings[0].kind, WarningKind::MissingImage);
    assert!(open(&docx).contains(&uri("/word/media/image1.png")));
}

#[test]
fn test_hidden_paragraph_merged_table_and_image() {
    init();
    let table = Table {
        header_rows: 1,
        ..Table::new(vec![
            TableRow::new(vec![TableCell::new("Wide").with_span(2, 1)]),
            TableRow::new(vec![TableCell::new("Tall").with_span(1, 2), TableCell::new("b")]),
            TableRow::new(vec![TableCell::new("c")]),
            TableRow::new(vec![TableCell::new("d")]),
        ])
    };
    let doc = Document::new()
        .with_title("Mixed")
        .with_block(Block::Paragraph(Paragraph::new("secret").hidden()))
        .with_block(Block::Table(table))
        .with_block(para(vec![Inline::image("pic")]));
    let images = ImageDb::new().with_image("pic", ImageData::new(png()));

    let docx = Exporter::default()
        .with_images(images)
        .with_options(fixed_options())
        .export(&doc)
        .unwrap();
    assert_eq!(docx.warnings.len(), 1);
    assert_eq!(docx.warnings[0].kind, WarningKind::HiddenNodeDropped);

    let package = open(&docx);
    let document = part_text(&package, "/word/document.xml");
    assert!(!document.contains("secret"));
    assert!(document.contains("<w:gridSpan w:val=\"2\"/>"));
    assert!(document.contains("<w:vMerge w:val=\"restart\"/>"));
    assert!(document.contains("<w:tblHeader/>"));
    assert_eq!(count(&document, "<w:gridCol "), 2);
    // the short last row is padded to the full grid
    assert_eq!(count(&document, "<w:tc>"), 7);

    let media = uri("/word/media/image1.png");
    assert!(package.contains(&media));
    assert!(package.content_types().has_override(&media));
}

#[test]
fn test_lists_get_numbering() {
    init();
    let nested = List::new(ListStyle::bullet(), vec![ListItem::new("inner")]);
    let outer = List::new(
        ListStyle::ordered(ListKind::Decimal, 3),
        vec![
            ListItem::from_blocks(vec![
                Block::Paragraph(Paragraph::new("first")),
                Block::List(nested),
            ]),
            ListItem::new("second"),
        ],
    );
    let doc = Document::new()
        .with_title("Lists")
        .with_block(Block::List(outer));

    let docx = Exporter::default().with_options(fixed_options()).export(&doc).unwrap();
    let package = open(&docx);
    let numbering = part_text(&package, "/word/numbering.xml");
    assert!(numbering.contains("<w:abstractNum "));
    assert!(numbering.contains("<w:startOverride w:val=\"3\"/>"));

    let document = part_text(&package, "/word/document.xml");
    assert_eq!(count(&document, "<w:numPr>"), 3);
    assert!(document.contains("<w:ilvl w:val=\"1\"/>"));
}

#[test]
fn test_export_is_deterministic() {
    init();
    let doc = Document::new()
        .with_title("Same")
        .with_block(Block::Heading(Heading::new(1, "Intro").with_anchor("intro")))
        .with_block(para(vec![
            Inline::cite(["roe2019"]),
            Inline::footnote(vec![Paragraph::new("note")]),
            Inline::math("x^2"),
            Inline::link("#intro", vec![Inline::text("back")]),
        ]));
    let exporter = Exporter::default()
        .with_bibliography(bibliography())
        .with_options(fixed_options());

    let first = open(&exporter.export(&doc).unwrap());
    let second = open(&exporter.export(&doc).unwrap());
    for path in ["/word/document.xml", "/word/footnotes.xml", "/docProps/core.xml"] {
        assert_eq!(part_text(&first, path), part_text(&second, path));
    }
    assert!(part_text(&first, "/word/document.xml").contains("<w:hyperlink w:anchor=\"intro\">"));
}

#[test]
fn test_custom_skeleton_is_kept() {
    init();
    let template = Exporter::default()
        .with_options(fixed_options())
        .export(&Document::new().with_title("Template"))
        .unwrap();

    let doc = Document::new()
        .with_title("From template")
        .with_block(para(vec![Inline::text("body")]));
    let docx = Exporter::default()
        .with_skeleton(Box::new(BytesSkeleton::new(template.bytes)))
        .with_options(fixed_options())
        .export(&doc)
        .unwrap();

    let package = open(&docx);
    let document = part_text(&package, "/word/document.xml");
    assert!(document.contains("<w:t>body</w:t>"));
    assert_eq!(count(&document, "<w:sectPr"), 1);
    assert!(package.contains(&uri("/word/styles.xml")));
}

#[test]
fn test_unreadable_skeleton_is_external_error() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let err = Exporter::default()
        .with_skeleton(Box::new(FileSkeleton::new(dir.path().join("missing.dotx"))))
        .export(&Document::new())
        .unwrap_err();
    assert!(err.is_external());
}

#[test]
fn test_export_to_file_sink() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let mut sink = FileSink::new(dir.path());
    let doc = Document::new().with_title("Report 2024");

    let docx = Exporter::default()
        .with_options(fixed_options())
        .export_to(&doc, &mut sink)
        .unwrap();

    let path = dir.path().join("report-2024.docx");
    assert_eq!(docx.filename, "report-2024.docx");
    assert_eq!(std::fs::read(&path).unwrap(), docx.bytes);
}
