//! XML utilities shared by the part builders

mod element;
mod namespace;

pub use element::{XmlElement, XmlNode};
pub use namespace::*;

use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::Write;

/// Helper to get attribute value from BytesStart
pub fn get_attr(element: &BytesStart, name: &str) -> Option<String> {
    element
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

/// Create a writer over an in-memory buffer with the standalone XML declaration
pub fn part_writer() -> Result<Writer<Vec<u8>>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

/// Finish a writer created by [`part_writer`] and return the XML text
pub fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner()).map_err(|e| Error::InvalidDocument(e.to_string()))
}

/// Whether `c` may appear in XML 1.0 content
pub fn is_xml_char(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => true,
        '\u{0}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}' => false,
        _ => true,
    }
}

/// Remove characters XML 1.0 cannot carry. Every text and attribute writer
/// here goes through this, so no part ever holds them.
pub fn sanitize_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

fn push_attributes(elem: &mut BytesStart, attrs: &[(&str, &str)]) {
    for (key, value) in attrs {
        elem.push_attribute((*key, sanitize_text(value).as_ref()));
    }
}

/// Write `<name attrs...>`
pub fn start<W: Write>(writer: &mut Writer<W>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut elem = BytesStart::new(name);
    push_attributes(&mut elem, attrs);
    writer.write_event(Event::Start(elem))?;
    Ok(())
}

/// Write `</name>`
pub fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Write `<name attrs.../>`
pub fn empty<W: Write>(writer: &mut Writer<W>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut elem = BytesStart::new(name);
    push_attributes(&mut elem, attrs);
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

/// Write `<name w:val="value"/>`
pub fn w_val<W: Write>(writer: &mut Writer<W>, name: &str, value: &str) -> Result<()> {
    empty(writer, name, &[("w:val", value)])
}

/// Write `<name>text</name>` with escaping
pub fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(&sanitize_text(text))))?;
    end(writer, name)
}

/// Write a `w:t`/`w:instrText` style element, preserving significant spaces
pub fn preserved_text<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    let text = sanitize_text(text);
    let mut elem = BytesStart::new(name);
    if text.starts_with(' ') || text.ends_with(' ') || text.contains("  ") {
        elem.push_attribute(("xml:space", "preserve"));
    }
    writer.write_event(Event::Start(elem))?;
    writer.write_event(Event::Text(BytesText::new(&text)))?;
    end(writer, name)
}
