//! Word bibliography sources part
//!
//! Word keeps the sources behind its own citation tools in a custom XML part
//! (`/customXml/itemN.xml`, root `b:Sources`) with a properties part that
//! names the bibliography schema.

use crate::error::Result;
use crate::model::{BibEntry, Person};
use crate::xml::{self, B, DS};
use quick_xml::Writer;
use uuid::Uuid;

/// Word source type for a CSL item type
fn source_type(entry_type: &str) -> &'static str {
    match entry_type {
        "book" => "Book",
        "chapter" => "BookSection",
        "article-journal" => "JournalArticle",
        "article-magazine" | "article-newspaper" => "ArticleInAPeriodical",
        "paper-conference" => "ConferenceProceedings",
        "report" | "thesis" => "Report",
        "webpage" | "post-weblog" => "InternetSite",
        _ => "Misc",
    }
}

/// Element carrying the container title for a source type
fn container_element(source_type: &str) -> &'static str {
    match source_type {
        "BookSection" => "b:BookTitle",
        "JournalArticle" => "b:JournalName",
        "ConferenceProceedings" => "b:ConferenceName",
        "InternetSite" => "b:InternetSiteTitle",
        _ => "b:PeriodicalTitle",
    }
}

/// Build `itemN.xml` holding one `b:Source` per entry
pub fn sources_xml(entries: &[&BibEntry]) -> Result<String> {
    let mut w = xml::part_writer()?;
    xml::start(
        &mut w,
        "b:Sources",
        &[
            ("SelectedStyle", ""),
            ("xmlns:b", B),
            ("xmlns", B),
        ],
    )?;

    for (index, entry) in entries.iter().enumerate() {
        write_source(&mut w, entry, index + 1)?;
    }

    xml::end(&mut w, "b:Sources")?;
    xml::finish(w)
}

fn write_source(w: &mut Writer<Vec<u8>>, entry: &BibEntry, order: usize) -> Result<()> {
    let kind = source_type(&entry.entry_type);

    xml::start(w, "b:Source", &[])?;
    xml::text_element(w, "b:Tag", &entry.id)?;
    xml::text_element(w, "b:SourceType", kind)?;

    if !entry.author.is_empty() || !entry.editor.is_empty() {
        xml::start(w, "b:Author", &[])?;
        write_names(w, "b:Author", &entry.author)?;
        write_names(w, "b:Editor", &entry.editor)?;
        xml::end(w, "b:Author")?;
    }

    let fields = [
        ("b:Title", entry.title.as_deref()),
        (container_element(kind), entry.container_title.as_deref()),
        ("b:Publisher", entry.publisher.as_deref()),
        ("b:City", entry.publisher_place.as_deref()),
        ("b:Volume", entry.volume.as_deref()),
        ("b:Issue", entry.issue.as_deref()),
        ("b:Pages", entry.page.as_deref()),
        ("b:URL", entry.url.as_deref()),
        ("b:DOI", entry.doi.as_deref()),
    ];
    if let Some(year) = entry.year() {
        xml::text_element(w, "b:Year", &year.to_string())?;
    }
    for (name, value) in fields {
        if let Some(value) = value {
            xml::text_element(w, name, value)?;
        }
    }

    xml::text_element(w, "b:RefOrder", &order.to_string())?;
    xml::end(w, "b:Source")
}

fn write_names(w: &mut Writer<Vec<u8>>, role: &str, people: &[Person]) -> Result<()> {
    if people.is_empty() {
        return Ok(());
    }
    xml::start(w, role, &[])?;

    // Institutions go in b:Corporate; Word allows one per role
    if let Some(corporate) = people.iter().find_map(|p| p.literal.as_deref()) {
        xml::text_element(w, "b:Corporate", corporate)?;
    } else {
        xml::start(w, "b:NameList", &[])?;
        for person in people {
            xml::start(w, "b:Person", &[])?;
            xml::text_element(w, "b:Last", &person.family)?;
            if let Some(given) = &person.given {
                xml::text_element(w, "b:First", given)?;
            }
            xml::end(w, "b:Person")?;
        }
        xml::end(w, "b:NameList")?;
    }

    xml::end(w, role)
}

/// Build `itemPropsN.xml` for the sources part
pub fn item_props_xml(keys: &[String]) -> Result<String> {
    let mut w = xml::part_writer()?;
    let guid = item_guid(keys);
    xml::start(
        &mut w,
        "ds:datastoreItem",
        &[("ds:itemID", guid.as_str()), ("xmlns:ds", DS)],
    )?;
    xml::start(&mut w, "ds:schemaRefs", &[])?;
    xml::empty(&mut w, "ds:schemaRef", &[("ds:uri", B)])?;
    xml::end(&mut w, "ds:schemaRefs")?;
    xml::end(&mut w, "ds:datastoreItem")?;
    xml::finish(w)
}

/// Stable name-based (v5) GUID derived from the cited keys, so repeated
/// exports produce identical parts
fn item_guid(keys: &[String]) -> String {
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, keys.join("\0").as_bytes());
    format!("{{{}}}", uuid.hyphenated().to_string().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Person;

    #[test]
    fn test_sources_xml() {
        let mut corp = BibEntry::new("acme", "report").with_title("Annual <Report>");
        corp.author.push(Person {
            literal: Some("ACME Corp".into()),
            ..Default::default()
        });
        let article = BibEntry::new("doe2020", "article-journal")
            .with_author("Doe", "Jane")
            .with_container("Journal of Things")
            .with_year(2020);

        let xml = sources_xml(&[&article, &corp]).unwrap();

        assert!(xml.contains("<b:Tag>doe2020</b:Tag><b:SourceType>JournalArticle</b:SourceType>"));
        assert!(xml.contains("<b:Person><b:Last>Doe</b:Last><b:First>Jane</b:First></b:Person>"));
        assert!(xml.contains("<b:JournalName>Journal of Things</b:JournalName>"));
        assert!(xml.contains("<b:Year>2020</b:Year>"));
        assert!(xml.contains("<b:Corporate>ACME Corp</b:Corporate>"));
        assert!(xml.contains("<b:Title>Annual &lt;Report&gt;</b:Title>"));
        assert!(xml.contains("<b:RefOrder>2</b:RefOrder>"));
    }

    #[test]
    fn test_item_props_guid_is_stable() {
        let keys = vec!["a".to_string(), "b".to_string()];
        let first = item_props_xml(&keys).unwrap();
        assert_eq!(first, item_props_xml(&keys).unwrap());
        assert_ne!(first, item_props_xml(&["c".to_string()]).unwrap());

        let guid = item_guid(&keys);
        assert_eq!(guid.len(), 38);
        assert!(guid.starts_with('{') && guid.ends_with('}'));
        assert_eq!(guid, guid.to_uppercase());

        let parsed = Uuid::parse_str(&guid[1..37]).unwrap();
        assert_eq!(parsed.get_version_num(), 5);
        // key boundaries are part of the name
        assert_ne!(guid, item_guid(&["ab".to_string()]));
    }
}
