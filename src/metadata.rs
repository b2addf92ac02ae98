//! Document metadata: core properties and the suggested filename

use crate::error::Result;
use crate::model::Block;
use crate::options::ExportOptions;
use crate::preprocess::ContentTree;
use crate::xml::{self, CP, DC, DCTERMS, XSI};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesText, Event};
use quick_xml::Writer;

/// Title used when the document has neither a title nor a heading
pub const UNTITLED: &str = "Untitled";

/// Values written to `docProps/core.xml`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub creator: Option<String>,
    pub language: String,
    /// Source location of the document
    pub identifier: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// Suggested download name
    pub filename: String,
}

impl Metadata {
    pub fn build(tree: &ContentTree, options: &ExportOptions, timestamp: DateTime<Utc>) -> Self {
        let title = document_title(tree);
        let filename = suggested_filename(&title);
        Self {
            title,
            creator: options.author.clone(),
            language: options.language.clone(),
            identifier: tree.path.clone(),
            created: timestamp,
            modified: timestamp,
            filename,
        }
    }

    /// Serialize `docProps/core.xml`
    pub fn core_xml(&self) -> Result<String> {
        let mut w = xml::part_writer()?;
        xml::start(
            &mut w,
            "cp:coreProperties",
            &[
                ("xmlns:cp", CP),
                ("xmlns:dc", DC),
                ("xmlns:dcterms", DCTERMS),
                ("xmlns:xsi", XSI),
            ],
        )?;

        xml::text_element(&mut w, "dc:title", &self.title)?;
        if let Some(creator) = &self.creator {
            xml::text_element(&mut w, "dc:creator", creator)?;
            xml::text_element(&mut w, "cp:lastModifiedBy", creator)?;
        }
        xml::text_element(&mut w, "dc:language", &self.language)?;
        if let Some(identifier) = &self.identifier {
            xml::text_element(&mut w, "dc:identifier", identifier)?;
        }
        w3cdtf(&mut w, "dcterms:created", &self.created)?;
        w3cdtf(&mut w, "dcterms:modified", &self.modified)?;

        xml::end(&mut w, "cp:coreProperties")?;
        xml::finish(w)
    }
}

fn w3cdtf(w: &mut Writer<Vec<u8>>, name: &str, time: &DateTime<Utc>) -> Result<()> {
    xml::start(w, name, &[("xsi:type", "dcterms:W3CDTF")])?;
    w.write_event(Event::Text(BytesText::new(&format_timestamp(time))))?;
    xml::end(w, name)
}

/// W3CDTF timestamp in UTC with second precision
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Title, else the first heading's text, else [`UNTITLED`]
pub fn document_title(tree: &ContentTree) -> String {
    let explicit = tree
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    explicit
        .or_else(|| {
            tree.blocks.iter().find_map(|block| match block {
                Block::Heading(h) => {
                    let text = h.text();
                    let text = text.trim();
                    (!text.is_empty()).then(|| text.to_string())
                }
                _ => None,
            })
        })
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Lowercase slug of the Unicode letters and digits of `text`, with runs
/// of anything else collapsed to `-`
pub fn slugify(text: &str) -> String {
    text.chars()
        .flat_map(|c| {
            let keep = if c.is_alphanumeric() { c } else { '-' };
            keep.to_lowercase()
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// `<slug>.docx`, falling back to the slug of [`UNTITLED`]
pub fn suggested_filename(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}.docx", slugify(UNTITLED))
    } else {
        format!("{}.docx", slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, Heading};
    use crate::preprocess::preprocess;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn tree(doc: Document) -> ContentTree {
        preprocess(&doc).0
    }

    #[test]
    fn test_title_fallbacks() {
        let heading = Document::new().with_block(Block::Heading(Heading::new(2, " Intro ")));
        assert_eq!(document_title(&tree(heading.clone())), "Intro");
        assert_eq!(document_title(&tree(heading.with_title("Report"))), "Report");
        assert_eq!(document_title(&tree(Document::new().with_title("  "))), UNTITLED);
    }

    #[test]
    fn test_filenames() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(suggested_filename("Über  Résumé 2024"), "über-résumé-2024.docx");
        assert_eq!(suggested_filename("研究 / 笔记"), "研究-笔记.docx");
        assert_eq!(slugify("ΑΛΦΑ-beta"), "αλφα-beta");
        assert_eq!(suggested_filename("???"), "untitled.docx");
    }

    #[test]
    fn test_core_xml() {
        let mut doc = Document::new().with_title("A & B");
        doc.path = Some("notes/a.json".into());
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let options = ExportOptions::default().with_author("Ada");

        let metadata = Metadata::build(&tree(doc), &options, time);
        let xml = metadata.core_xml().unwrap();

        assert_eq!(metadata.filename, "a-b.docx");
        assert!(xml.contains("<dc:title>A &amp; B</dc:title>"));
        assert!(xml.contains("<dc:creator>Ada</dc:creator><cp:lastModifiedBy>Ada</cp:lastModifiedBy>"));
        assert!(xml.contains("<dc:language>en-US</dc:language>"));
        assert!(xml.contains("<dc:identifier>notes/a.json</dc:identifier>"));
        assert!(xml.contains(
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">2024-03-01T12:30:00Z</dcterms:created>"#
        ));
    }
}
