//! Numbering definitions (numbering.xml)
//!
//! Lists are drawn through numbering definitions: an abstract definition
//! describes how each of the nine levels looks, and numbering instances
//! (`w:num`) point at one definition. Paragraphs refer to an instance and a
//! level through `w:numPr`.
//!
//! Visually identical lists share one abstract definition. Every ordered
//! list gets its own instance with a start override so it restarts at its
//! own first number; bullet lists share one instance.

mod abstract_num;
mod level;
mod num;
mod types;

pub use abstract_num::{AbstractNum, MAX_LEVELS};
pub use level::{Level, LevelOverride};
pub use num::Num;
pub use types::{NumberFormat, NumberingInfo};

use crate::error::Result;
use crate::model::{ListKind, ListStyle, NodeId};
use crate::xml::{self, XmlElement, W};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{BTreeMap, HashMap};

/// Builds `word/numbering.xml`, keeping the definitions of a skeleton
/// numbering part
#[derive(Clone, Debug)]
pub struct NumberingBuilder {
    /// Root attributes of the skeleton part (namespace declarations)
    root_attributes: Vec<(String, String)>,
    /// Skeleton elements that must precede the definitions (w:numPicBullet)
    preserved_leading: Vec<XmlElement>,
    preserved_abstracts: Vec<XmlElement>,
    preserved_nums: Vec<XmlElement>,
    /// Skeleton elements after the instances (w:numIdMacAtCleanup)
    preserved_trailing: Vec<XmlElement>,
    abstracts: Vec<AbstractNum>,
    nums: Vec<Num>,
    definitions: HashMap<ListKind, u32>,
    shared_nums: HashMap<u32, u32>,
    lists: BTreeMap<NodeId, NumberingInfo>,
    next_abstract_id: u32,
    next_num_id: u32,
}

impl Default for NumberingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NumberingBuilder {
    /// Create a builder with no existing definitions
    pub fn new() -> Self {
        Self {
            root_attributes: Vec::new(),
            preserved_leading: Vec::new(),
            preserved_abstracts: Vec::new(),
            preserved_nums: Vec::new(),
            preserved_trailing: Vec::new(),
            abstracts: Vec::new(),
            nums: Vec::new(),
            definitions: HashMap::new(),
            shared_nums: HashMap::new(),
            lists: BTreeMap::new(),
            next_abstract_id: 0,
            // numId 0 means "no numbering"
            next_num_id: 1,
        }
    }

    /// Parse an existing numbering.xml; its definitions are kept and new ids
    /// continue after the highest existing ones
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut builder = NumberingBuilder::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    if e.name().local_name().as_ref() == b"numbering" {
                        builder.root_attributes = XmlElement::from_empty(&e)?.attributes;
                    } else {
                        let element = XmlElement::from_reader(&mut reader, &e)?;
                        builder.preserve(element);
                    }
                }
                Event::Empty(e) => {
                    let element = XmlElement::from_empty(&e)?;
                    if e.name().local_name().as_ref() == b"numbering" {
                        builder.root_attributes = element.attributes;
                    } else {
                        builder.preserve(element);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        log::debug!(
            "skeleton numbering: {} abstract definitions, {} instances",
            builder.preserved_abstracts.len(),
            builder.preserved_nums.len()
        );
        Ok(builder)
    }

    fn preserve(&mut self, element: XmlElement) {
        let local = element
            .name
            .rsplit(':')
            .next()
            .unwrap_or(element.name.as_str())
            .to_string();
        match local.as_str() {
            "abstractNum" => {
                if let Some(id) = id_attr(&element, "w:abstractNumId") {
                    self.next_abstract_id = self.next_abstract_id.max(id + 1);
                }
                self.preserved_abstracts.push(element);
            }
            "num" => {
                if let Some(id) = id_attr(&element, "w:numId") {
                    self.next_num_id = self.next_num_id.max(id + 1);
                }
                self.preserved_nums.push(element);
            }
            "numPicBullet" => self.preserved_leading.push(element),
            _ => self.preserved_trailing.push(element),
        }
    }

    /// Abstract definition for `style`, created on first use
    pub fn get_or_create_definition(&mut self, style: &ListStyle) -> u32 {
        if let Some(id) = self.definitions.get(&style.kind) {
            return *id;
        }
        let id = self.next_abstract_id;
        self.next_abstract_id += 1;
        self.abstracts
            .push(AbstractNum::with_format(id, NumberFormat::from(style.kind)));
        self.definitions.insert(style.kind, id);
        log::debug!("numbering definition {} for {:?}", id, style.kind);
        id
    }

    /// Register the list `list` drawn at nesting `depth`; returns its numId
    pub fn add_list(&mut self, list: NodeId, style: &ListStyle, depth: u8) -> u32 {
        let abstract_id = self.get_or_create_definition(style);
        let level = depth.min(MAX_LEVELS - 1);

        let num_id = if style.is_ordered() {
            let num_id = self.next_num();
            self.nums.push(
                Num::new(num_id, abstract_id)
                    .with_override(LevelOverride::new(level, style.start)),
            );
            num_id
        } else if let Some(num_id) = self.shared_nums.get(&abstract_id) {
            *num_id
        } else {
            let num_id = self.next_num();
            self.nums.push(Num::new(num_id, abstract_id));
            self.shared_nums.insert(abstract_id, num_id);
            num_id
        };

        self.lists.insert(list, NumberingInfo::new(num_id, level));
        num_id
    }

    fn next_num(&mut self) -> u32 {
        let id = self.next_num_id;
        self.next_num_id += 1;
        id
    }

    /// Numbering of a registered list
    pub fn numbering(&self, list: NodeId) -> Option<NumberingInfo> {
        self.lists.get(&list).copied()
    }

    /// Whether no new definitions were created
    pub fn is_empty(&self) -> bool {
        self.nums.is_empty()
    }

    /// Serialize to XML: all abstract definitions precede all instances
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = xml::part_writer()?;

        let mut root: Vec<(&str, &str)> = self
            .root_attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if !root.iter().any(|(k, _)| *k == "xmlns:w") {
            root.push(("xmlns:w", W));
        }
        xml::start(&mut writer, "w:numbering", &root)?;

        for element in &self.preserved_leading {
            element.write_to(&mut writer)?;
        }
        for element in &self.preserved_abstracts {
            element.write_to(&mut writer)?;
        }
        for abs in &self.abstracts {
            abs.write_to(&mut writer)?;
        }
        for element in &self.preserved_nums {
            element.write_to(&mut writer)?;
        }
        for num in &self.nums {
            num.write_to(&mut writer)?;
        }
        for element in &self.preserved_trailing {
            element.write_to(&mut writer)?;
        }

        xml::end(&mut writer, "w:numbering")?;
        xml::finish(writer)
    }
}

fn id_attr(element: &XmlElement, name: &str) -> Option<u32> {
    element.attr(name)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identical_styles_share_definition() {
        let mut numbering = NumberingBuilder::new();
        let a = numbering.get_or_create_definition(&ListStyle::ordered(ListKind::Decimal, 1));
        let b = numbering.get_or_create_definition(&ListStyle::ordered(ListKind::Decimal, 5));
        let c = numbering.get_or_create_definition(&ListStyle::bullet());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_ordered_lists_restart_and_bullets_share() {
        let mut numbering = NumberingBuilder::new();
        let first = numbering.add_list(NodeId(0), &ListStyle::ordered(ListKind::Decimal, 1), 0);
        let second = numbering.add_list(NodeId(1), &ListStyle::ordered(ListKind::Decimal, 3), 0);
        let bullet_a = numbering.add_list(NodeId(2), &ListStyle::bullet(), 0);
        let bullet_b = numbering.add_list(NodeId(3), &ListStyle::bullet(), 1);

        assert_ne!(first, second);
        assert_eq!(bullet_a, bullet_b);
        assert_eq!(numbering.numbering(NodeId(3)), Some(NumberingInfo::new(bullet_a, 1)));

        let xml = numbering.to_xml().unwrap();
        assert!(xml.contains(
            r#"<w:num w:numId="2"><w:abstractNumId w:val="0"/><w:lvlOverride w:ilvl="0"><w:startOverride w:val="3"/></w:lvlOverride></w:num>"#
        ));
        let last_abstract = xml.rfind("<w:abstractNum ").unwrap();
        let first_num = xml.find("<w:num ").unwrap();
        assert!(last_abstract < first_num);
    }

    #[test]
    fn test_skeleton_definitions_are_kept() {
        let skeleton = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:w15="http://schemas.microsoft.com/office/word/2012/wordml">
  <w:abstractNum w:abstractNumId="4"><w:multiLevelType w:val="singleLevel"/></w:abstractNum>
  <w:num w:numId="7"><w:abstractNumId w:val="4"/></w:num>
</w:numbering>"#;

        let mut numbering = NumberingBuilder::from_xml(skeleton).unwrap();
        let num_id = numbering.add_list(NodeId(0), &ListStyle::bullet(), 0);
        assert_eq!(num_id, 8);

        let xml = numbering.to_xml().unwrap();
        assert!(xml.contains(r#"xmlns:w15="http://schemas.microsoft.com/office/word/2012/wordml""#));
        assert!(xml.contains(r#"<w:abstractNum w:abstractNumId="4">"#));
        assert!(xml.contains(r#"<w:abstractNum w:abstractNumId="5">"#));
        assert!(xml.contains(r#"<w:num w:numId="7">"#));
        assert!(xml.contains(r#"<w:num w:numId="8"><w:abstractNumId w:val="5"/></w:num>"#));
    }

    #[test]
    fn test_depth_is_clamped() {
        let mut numbering = NumberingBuilder::new();
        numbering.add_list(NodeId(0), &ListStyle::bullet(), 12);
        assert_eq!(numbering.numbering(NodeId(0)).unwrap().level, 8);
    }
}
