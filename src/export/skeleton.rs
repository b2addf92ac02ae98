//! Package skeletons
//!
//! The skeleton is the baseline package (styles, settings, section layout)
//! that generated parts are injected into.

use crate::error::{Error, Result};
use crate::opc::{content_types, rel_types, well_known, Package, Part};
use crate::xml::{self, XmlElement, W};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::PathBuf;

/// Source of the baseline package
pub trait SkeletonLoader {
    /// Human readable location, used in error messages
    fn locator(&self) -> String;

    /// Load the package
    fn load(&self) -> Result<Package>;
}

/// Skeleton read from a `.docx`/`.dotx` file
#[derive(Clone, Debug)]
pub struct FileSkeleton {
    path: PathBuf,
}

impl FileSkeleton {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SkeletonLoader for FileSkeleton {
    fn locator(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Package> {
        Package::open(&self.path).map_err(|e| Error::external(self.locator(), e))
    }
}

/// Skeleton held in memory
#[derive(Clone, Debug)]
pub struct BytesSkeleton {
    bytes: Vec<u8>,
}

impl BytesSkeleton {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl SkeletonLoader for BytesSkeleton {
    fn locator(&self) -> String {
        format!("<{} bytes in memory>", self.bytes.len())
    }

    fn load(&self) -> Result<Package> {
        Package::from_bytes(&self.bytes).map_err(|e| Error::external(self.locator(), e))
    }
}

/// Built-in skeleton: an empty document with the styles the exporter uses
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSkeleton;

impl SkeletonLoader for DefaultSkeleton {
    fn locator(&self) -> String {
        "<default skeleton>".to_string()
    }

    fn load(&self) -> Result<Package> {
        default_package()
    }
}

/// What the exporter keeps from the skeleton's main document
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkeletonDocument {
    /// Attributes of the root element (namespace declarations, ignorables)
    pub root_attributes: Vec<(String, String)>,
    /// Final section properties of the body
    pub sect_pr: Option<XmlElement>,
}

impl SkeletonDocument {
    /// Read the root attributes and the body-level `w:sectPr`
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut doc = SkeletonDocument::default();
        let mut depth = 0usize;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    match (depth, e.name().as_ref()) {
                        (0, _) => {
                            doc.root_attributes = XmlElement::from_empty(&e)?.attributes;
                        }
                        // Direct child of w:body
                        (2, b"w:sectPr") => {
                            doc.sect_pr = Some(XmlElement::from_reader(&mut reader, &e)?);
                            buf.clear();
                            continue;
                        }
                        _ => {}
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    if depth == 2 && e.name().as_ref() == b"w:sectPr" {
                        doc.sect_pr = Some(XmlElement::from_empty(&e)?);
                    }
                }
                Event::End(_) => depth = depth.saturating_sub(1),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(doc)
    }
}

struct StyleDef {
    id: &'static str,
    name: &'static str,
    kind: &'static str,
    based_on: Option<&'static str>,
    /// Half-points
    size: Option<&'static str>,
    bold: bool,
    italic: bool,
    color: Option<&'static str>,
    /// Space before, space after (twips)
    spacing: Option<(&'static str, &'static str)>,
    outline_level: Option<&'static str>,
}

const fn paragraph(id: &'static str, name: &'static str) -> StyleDef {
    StyleDef {
        id,
        name,
        kind: "paragraph",
        based_on: Some("Normal"),
        size: None,
        bold: false,
        italic: false,
        color: None,
        spacing: None,
        outline_level: None,
    }
}

const fn character(id: &'static str, name: &'static str) -> StyleDef {
    StyleDef {
        kind: "character",
        based_on: None,
        ..paragraph(id, name)
    }
}

const fn heading(id: &'static str, name: &'static str, size: &'static str, level: &'static str) -> StyleDef {
    StyleDef {
        size: Some(size),
        bold: true,
        color: Some("1F3864"),
        spacing: Some(("240", "80")),
        outline_level: Some(level),
        ..paragraph(id, name)
    }
}

const STYLES: &[StyleDef] = &[
    StyleDef {
        based_on: None,
        size: Some("22"),
        spacing: Some(("0", "160")),
        ..paragraph("Normal", "Normal")
    },
    StyleDef {
        size: Some("56"),
        spacing: Some(("0", "240")),
        ..paragraph("Title", "Title")
    },
    heading("Heading1", "heading 1", "32", "0"),
    heading("Heading2", "heading 2", "28", "1"),
    heading("Heading3", "heading 3", "26", "2"),
    heading("Heading4", "heading 4", "24", "3"),
    heading("Heading5", "heading 5", "22", "4"),
    heading("Heading6", "heading 6", "22", "5"),
    paragraph("ListParagraph", "List Paragraph"),
    StyleDef {
        size: Some("18"),
        italic: true,
        color: Some("44546A"),
        ..paragraph("Caption", "caption")
    },
    StyleDef {
        size: Some("20"),
        spacing: Some(("0", "0")),
        ..paragraph("FootnoteText", "footnote text")
    },
    StyleDef {
        size: Some("20"),
        ..paragraph("CommentText", "annotation text")
    },
    paragraph("Bibliography", "Bibliography"),
    character("FootnoteReference", "footnote reference"),
    StyleDef {
        size: Some("16"),
        ..character("CommentReference", "annotation reference")
    },
    StyleDef {
        color: Some("0563C1"),
        ..character("Hyperlink", "Hyperlink")
    },
];

fn styles_xml() -> Result<String> {
    let mut w = xml::part_writer()?;
    xml::start(&mut w, "w:styles", &[("xmlns:w", W)])?;

    for style in STYLES {
        let mut attrs = vec![("w:type", style.kind), ("w:styleId", style.id)];
        if style.id == "Normal" {
            attrs.push(("w:default", "1"));
        }
        xml::start(&mut w, "w:style", &attrs)?;
        xml::w_val(&mut w, "w:name", style.name)?;
        if let Some(base) = style.based_on {
            xml::w_val(&mut w, "w:basedOn", base)?;
        }
        if style.kind == "paragraph" && style.id != "Normal" {
            xml::w_val(&mut w, "w:qFormat", "1")?;
        }

        if style.spacing.is_some() || style.outline_level.is_some() {
            xml::start(&mut w, "w:pPr", &[])?;
            if let Some((before, after)) = style.spacing {
                xml::empty(&mut w, "w:spacing", &[("w:before", before), ("w:after", after)])?;
            }
            if let Some(level) = style.outline_level {
                xml::w_val(&mut w, "w:outlineLvl", level)?;
            }
            xml::end(&mut w, "w:pPr")?;
        }

        if style.bold || style.italic || style.size.is_some() || style.color.is_some() || style.id == "FootnoteReference" {
            xml::start(&mut w, "w:rPr", &[])?;
            if style.bold {
                xml::empty(&mut w, "w:b", &[])?;
            }
            if style.italic {
                xml::empty(&mut w, "w:i", &[])?;
            }
            if let Some(color) = style.color {
                xml::w_val(&mut w, "w:color", color)?;
            }
            if let Some(size) = style.size {
                xml::w_val(&mut w, "w:sz", size)?;
            }
            if style.id == "FootnoteReference" {
                xml::w_val(&mut w, "w:vertAlign", "superscript")?;
            }
            if style.id == "Hyperlink" {
                xml::w_val(&mut w, "w:u", "single")?;
            }
            xml::end(&mut w, "w:rPr")?;
        }
        xml::end(&mut w, "w:style")?;
    }

    // Table style with single borders on every edge
    xml::start(&mut w, "w:style", &[("w:type", "table"), ("w:styleId", "TableGrid")])?;
    xml::w_val(&mut w, "w:name", "Table Grid")?;
    xml::start(&mut w, "w:tblPr", &[])?;
    xml::start(&mut w, "w:tblBorders", &[])?;
    for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        xml::empty(
            &mut w,
            edge,
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
        )?;
    }
    xml::end(&mut w, "w:tblBorders")?;
    xml::end(&mut w, "w:tblPr")?;
    xml::end(&mut w, "w:style")?;

    xml::end(&mut w, "w:styles")?;
    xml::finish(w)
}

fn settings_xml() -> Result<String> {
    let mut w = xml::part_writer()?;
    xml::start(&mut w, "w:settings", &[("xmlns:w", W)])?;
    xml::w_val(&mut w, "w:defaultTabStop", "720")?;
    xml::w_val(&mut w, "w:characterSpacingControl", "doNotCompress")?;
    xml::end(&mut w, "w:settings")?;
    xml::finish(w)
}

fn document_xml() -> Result<String> {
    let mut w = xml::part_writer()?;
    xml::start(&mut w, "w:document", &xml::document_namespaces())?;
    xml::start(&mut w, "w:body", &[])?;
    xml::start(&mut w, "w:sectPr", &[])?;
    // Letter, 1in margins
    xml::empty(&mut w, "w:pgSz", &[("w:w", "12240"), ("w:h", "15840")])?;
    xml::empty(
        &mut w,
        "w:pgMar",
        &[
            ("w:top", "1440"),
            ("w:right", "1440"),
            ("w:bottom", "1440"),
            ("w:left", "1440"),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ],
    )?;
    xml::end(&mut w, "w:sectPr")?;
    xml::end(&mut w, "w:body")?;
    xml::end(&mut w, "w:document")?;
    xml::finish(w)
}

/// Build the built-in skeleton package
pub fn default_package() -> Result<Package> {
    let mut package = Package::new();

    let document = well_known::document();
    let mut part = Part::new(
        document.clone(),
        content_types::MAIN_DOCUMENT,
        document_xml()?.into_bytes(),
    );
    let rels = part.ensure_relationships();
    rels.add(rel_types::STYLES, "styles.xml");
    rels.add(rel_types::SETTINGS, "settings.xml");
    package.add_part(part);

    package.add_part(Part::new(
        well_known::styles(),
        content_types::STYLES,
        styles_xml()?.into_bytes(),
    ));
    package.add_part(Part::new(
        well_known::settings(),
        content_types::SETTINGS,
        settings_xml()?.into_bytes(),
    ));

    package.add_relationship(rel_types::OFFICE_DOCUMENT, "word/document.xml");
    Ok(package)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_package_has_main_document() {
        let package = DefaultSkeleton.load().unwrap();
        assert_eq!(package.main_document_uri(), Some(well_known::document()));

        let styles = package.part(&well_known::styles()).unwrap().data_as_str().unwrap();
        for id in ["Heading1", "FootnoteText", "CommentReference", "Bibliography", "TableGrid"] {
            assert!(styles.contains(&format!(r#"w:styleId="{}""#, id)), "missing {}", id);
        }
    }

    #[test]
    fn test_skeleton_document_keeps_body_sect_pr() {
        let xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="urn:w" xmlns:w14="urn:w14" mc:Ignorable="w14">
  <w:body>
    <w:p><w:pPr><w:sectPr><w:pgSz w:w="1"/></w:sectPr></w:pPr></w:p>
    <w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:cols w:space="720"/></w:sectPr>
  </w:body>
</w:document>"#;

        let doc = SkeletonDocument::parse(xml).unwrap();
        assert_eq!(doc.root_attributes.len(), 3);
        assert_eq!(doc.root_attributes[1], ("xmlns:w14".to_string(), "urn:w14".to_string()));

        let sect = doc.sect_pr.unwrap();
        assert_eq!(sect.children_named("w:pgSz").next().unwrap().attr("w:w"), Some("12240"));
        assert_eq!(sect.children_named("w:cols").count(), 1);
    }

    #[test]
    fn test_bytes_skeleton_error_is_external() {
        let err = BytesSkeleton::new(b"not a zip".to_vec()).load().unwrap_err();
        assert!(err.is_external());
    }
}
