//! Relationships handling for OPC packages
//!
//! Parses and generates `.rels` files. Relationships keep insertion order so
//! the serialized XML is stable between exports.

use crate::error::{Error, Result};
use crate::xml::sanitize_text;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;
use std::io::{BufRead, Write};

/// Collection of relationships belonging to one source part
#[derive(Clone, Debug)]
pub struct Relationships {
    /// Relationships in insertion order
    items: Vec<Relationship>,
    /// Every id handed out so far, including removed ones
    used_ids: HashSet<String>,
    /// Next auto-generated ID number
    next_id: u32,
}

impl Default for Relationships {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            used_ids: HashSet::new(),
            next_id: 1, // Start from 1, not 0
        }
    }
}

/// A single relationship
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative to the source part) or external URI
    pub target: String,
    /// Target mode
    pub target_mode: TargetMode,
}

/// Target mode for relationships
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetMode {
    /// Internal target (part within the package)
    #[default]
    Internal,
    /// External target (hyperlink, etc.)
    External,
}

impl Relationships {
    /// Create empty relationships
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from XML string
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        Self::from_reader(&mut reader)
    }

    /// Parse from a reader
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut rels = Self::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => {
                    if e.name().local_name().as_ref() == b"Relationship" {
                        let rel = parse_relationship(&e)?;
                        rels.insert(rel)?;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        rels.update_next_id();
        Ok(rels)
    }

    /// Serialize to XML string
    pub fn to_xml(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::InvalidDocument(e.to_string()))
    }

    /// Write to a writer
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml = Writer::new(writer);

        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut rels_elem = BytesStart::new("Relationships");
        rels_elem.push_attribute(("xmlns", NS_RELATIONSHIPS));
        xml.write_event(Event::Start(rels_elem))?;

        for rel in &self.items {
            let mut rel_elem = BytesStart::new("Relationship");
            rel_elem.push_attribute(("Id", rel.id.as_str()));
            rel_elem.push_attribute(("Type", rel.rel_type.as_str()));
            rel_elem.push_attribute(("Target", sanitize_text(&rel.target).as_ref()));

            if rel.target_mode == TargetMode::External {
                rel_elem.push_attribute(("TargetMode", "External"));
            }

            xml.write_event(Event::Empty(rel_elem))?;
        }

        xml.write_event(Event::End(BytesEnd::new("Relationships")))?;

        Ok(())
    }

    /// Get a relationship by ID
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// Check whether an ID is in use
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Get a relationship by type (returns first match)
    pub fn by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    /// Get the first relationship of a type pointing at `target`
    pub fn by_target(&self, rel_type: &str, target: &str) -> Option<&Relationship> {
        self.items
            .iter()
            .find(|r| r.rel_type == rel_type && r.target == target)
    }

    /// Get all relationships of a given type
    pub fn all_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.items
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .collect()
    }

    /// Add a relationship (auto-generates ID)
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        self.add_with_mode(rel_type, target, TargetMode::Internal)
    }

    /// Add an external relationship
    pub fn add_external(&mut self, rel_type: &str, target: &str) -> String {
        self.add_with_mode(rel_type, target, TargetMode::External)
    }

    /// Add a relationship with an auto-generated ID and the given mode
    pub fn add_with_mode(&mut self, rel_type: &str, target: &str, mode: TargetMode) -> String {
        let id = self.generate_id();
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: mode,
        });
        id
    }

    /// Add a relationship with a specific ID.
    ///
    /// Fails if the ID was ever used in this collection.
    pub fn add_with_id(
        &mut self,
        id: &str,
        rel_type: &str,
        target: &str,
        mode: TargetMode,
    ) -> Result<()> {
        self.insert(Relationship {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: mode,
        })?;
        self.update_next_id();
        Ok(())
    }

    /// Remove a relationship by ID. The ID is not handed out again.
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.items.iter().position(|r| r.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Iterate over all relationships in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn insert(&mut self, rel: Relationship) -> Result<()> {
        if !self.used_ids.insert(rel.id.clone()) {
            return Err(Error::InvalidRelationship(format!(
                "duplicate relationship id '{}'",
                rel.id
            )));
        }
        self.items.push(rel);
        Ok(())
    }

    /// Generate a new unique ID
    fn generate_id(&mut self) -> String {
        loop {
            let id = format!("rId{}", self.next_id);
            self.next_id += 1;
            if self.used_ids.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Update next_id based on existing relationships
    fn update_next_id(&mut self) {
        let max_id = self
            .used_ids
            .iter()
            .filter_map(|id| id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        self.next_id = self.next_id.max(max_id + 1);
    }
}

/// Parse a single Relationship element
fn parse_relationship(element: &BytesStart) -> Result<Relationship> {
    let mut id = None;
    let mut rel_type = None;
    let mut target = None;
    let mut target_mode = TargetMode::Internal;

    for attr in element.attributes() {
        let attr = attr?;
        let key = attr.key.local_name();
        let value = attr.unescape_value()?.to_string();

        match key.as_ref() {
            b"Id" => id = Some(value),
            b"Type" => rel_type = Some(value),
            b"Target" => target = Some(value),
            b"TargetMode" => {
                if value == "External" {
                    target_mode = TargetMode::External;
                }
            }
            _ => {}
        }
    }

    let missing = |attr: &str| Error::MissingAttribute {
        element: "Relationship".into(),
        attr: attr.into(),
    };

    Ok(Relationship {
        id: id.ok_or_else(|| missing("Id"))?,
        rel_type: rel_type.ok_or_else(|| missing("Type"))?,
        target: target.ok_or_else(|| missing("Target"))?,
        target_mode,
    })
}

// Namespace
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

// Well-known relationship types
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const SETTINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
    pub const NUMBERING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
    pub const FOOTNOTES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footnotes";
    pub const COMMENTS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const CUSTOM_XML: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/customXml";
    pub const CUSTOM_XML_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/customXmlProps";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relationships() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>
</Relationships>"#;

        let rels = Relationships::from_xml(xml).unwrap();

        assert_eq!(rels.len(), 2);

        let r1 = rels.get("rId1").unwrap();
        assert_eq!(r1.target, "word/document.xml");
        assert_eq!(r1.target_mode, TargetMode::Internal);

        let r2 = rels.get("rId2").unwrap();
        assert_eq!(r2.target, "https://example.com/?a=1&b=2");
        assert_eq!(r2.target_mode, TargetMode::External);
    }

    #[test]
    fn test_parsed_ids_continue_after_max() {
        let xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId7" Type="t" Target="styles.xml"/>
  <Relationship Id="rId3" Type="t" Target="settings.xml"/>
</Relationships>"#;

        let mut rels = Relationships::from_xml(xml).unwrap();
        assert_eq!(rels.add(rel_types::IMAGE, "media/image1.png"), "rId8");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut rels = Relationships::new();
        rels.add_with_id("rId1", rel_types::STYLES, "styles.xml", TargetMode::Internal)
            .unwrap();
        let err = rels
            .add_with_id("rId1", rel_types::NUMBERING, "numbering.xml", TargetMode::Internal)
            .unwrap_err();
        assert!(err.is_packaging());
    }

    #[test]
    fn test_removed_id_not_reused() {
        let mut rels = Relationships::new();
        let id1 = rels.add(rel_types::STYLES, "styles.xml");
        rels.remove(&id1);
        let id2 = rels.add(rel_types::STYLES, "styles.xml");
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_roundtrip_keeps_order() {
        let mut rels = Relationships::new();
        rels.add(rel_types::STYLES, "styles.xml");
        rels.add_external(rel_types::HYPERLINK, "https://example.com");
        rels.add(rel_types::NUMBERING, "numbering.xml");

        let xml = rels.to_xml().unwrap();
        let rels2 = Relationships::from_xml(&xml).unwrap();

        let ids: Vec<_> = rels2.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["rId1", "rId2", "rId3"]);
        assert_eq!(
            rels2.by_type(rel_types::HYPERLINK).unwrap().target_mode,
            TargetMode::External
        );
    }
}
