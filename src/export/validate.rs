//! Consistency checks over the generated parts
//!
//! Runs after the body is rendered: every note reference has exactly one
//! entry, every entry one reference, and every `r:id`/`r:embed` written
//! into a story part resolves in that part's relationships.

use super::context::ExportContext;
use crate::error::{Error, Result};
use crate::opc::{well_known, PartUri};
use crate::xml::get_attr;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeSet;

/// Ids and references found in one part
#[derive(Debug, Default)]
struct Scan {
    footnote_refs: Vec<String>,
    footnotes: Vec<String>,
    comment_refs: Vec<String>,
    comment_starts: Vec<String>,
    comment_ends: Vec<String>,
    comments: Vec<String>,
    rel_ids: Vec<String>,
}

fn scan(xml: &str) -> Result<Scan> {
    let mut reader = Reader::from_str(xml);
    let mut found = Scan::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let id = get_attr(&e, "w:id");
                let list = match e.name().as_ref() {
                    b"w:footnoteReference" => Some(&mut found.footnote_refs),
                    // separators carry a w:type
                    b"w:footnote" if get_attr(&e, "w:type").is_none() => Some(&mut found.footnotes),
                    b"w:commentReference" => Some(&mut found.comment_refs),
                    b"w:commentRangeStart" => Some(&mut found.comment_starts),
                    b"w:commentRangeEnd" => Some(&mut found.comment_ends),
                    b"w:comment" => Some(&mut found.comments),
                    _ => None,
                };
                if let (Some(list), Some(id)) = (list, id) {
                    list.push(id);
                }

                for attr in e.attributes() {
                    let attr = attr?;
                    if matches!(attr.key.as_ref(), b"r:id" | b"r:embed") {
                        found.rel_ids.push(attr.unescape_value()?.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(found)
}

/// References and entries must be the same set, each id used once
fn check_entries(kind: &'static str, references: &[String], entries: &[String]) -> Result<()> {
    let ref_set: BTreeSet<&String> = references.iter().collect();
    let entry_set: BTreeSet<&String> = entries.iter().collect();

    if ref_set.len() != references.len() || entry_set.len() != entries.len() || ref_set != entry_set {
        return Err(Error::EntryMismatch {
            kind,
            references: references.len(),
            entries: entries.len(),
        });
    }
    Ok(())
}

fn check_relationships(ctx: &ExportContext, part: &PartUri, found: &Scan) -> Result<()> {
    for id in &found.rel_ids {
        if ctx.registry.resolve(part, id).is_none() {
            return Err(Error::UnresolvedReference {
                part: part.to_string(),
                reference: id.clone(),
            });
        }
    }
    Ok(())
}

/// Validate the rendered document against the footnote and comment parts
pub fn validate(ctx: &ExportContext) -> Result<()> {
    let document = ctx
        .part_xml(&ctx.document_uri)
        .ok_or_else(|| Error::MissingPart(ctx.document_uri.to_string()))?;
    let body = scan(document)?;

    let footnotes_uri = well_known::footnotes();
    let notes = match ctx.part_xml(&footnotes_uri) {
        Some(xml) => scan(xml)?,
        None => Scan::default(),
    };
    let comments_uri = well_known::comments();
    let comments = match ctx.part_xml(&comments_uri) {
        Some(xml) => scan(xml)?,
        None => Scan::default(),
    };

    check_entries("footnote", &body.footnote_refs, &notes.footnotes)?;
    check_entries("comment", &body.comment_refs, &comments.comments)?;
    check_entries("comment range start", &body.comment_starts, &comments.comments)?;
    check_entries("comment range end", &body.comment_ends, &comments.comments)?;

    check_relationships(ctx, &ctx.document_uri, &body)?;
    check_relationships(ctx, &footnotes_uri, &notes)?;
    check_relationships(ctx, &comments_uri, &comments)?;

    log::debug!(
        "validated {} footnotes, {} comments, {} relationship references",
        notes.footnotes.len(),
        comments.comments.len(),
        body.rel_ids.len() + notes.rel_ids.len() + comments.rel_ids.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FOOTNOTES: &str = r#"<w:footnotes>
        <w:footnote w:type="separator" w:id="-1"/>
        <w:footnote w:type="continuationSeparator" w:id="0"/>
        <w:footnote w:id="1"><w:p/></w:footnote>
    </w:footnotes>"#;

    #[test]
    fn test_scan_skips_separators() {
        let found = scan(FOOTNOTES).unwrap();
        assert_eq!(found.footnotes, vec!["1".to_string()]);
    }

    #[test]
    fn test_scan_collects_relationship_references() {
        let xml = r#"<w:p><w:hyperlink r:id="rId4"/><a:blip r:embed="rId5"/></w:p>"#;
        let found = scan(xml).unwrap();
        assert_eq!(found.rel_ids, vec!["rId4".to_string(), "rId5".to_string()]);
    }

    #[test]
    fn test_reference_without_entry() {
        let err = check_entries("footnote", &["1".into(), "2".into()], &["1".into()]).unwrap_err();
        assert!(matches!(
            err,
            Error::EntryMismatch {
                kind: "footnote",
                references: 2,
                entries: 1
            }
        ));
    }

    #[test]
    fn test_duplicate_reference() {
        let refs = vec!["0".to_string(), "0".to_string()];
        let entries = vec!["0".to_string(), "1".to_string()];
        assert!(check_entries("comment", &refs, &entries).is_err());
        assert!(check_entries("comment", &entries, &entries).is_ok());
    }
}
