//! Built-in author-date citation style

use super::{BibliographyItem, CitationCluster, CitationItem, CitationProcessor, ProcessedCitations};
use crate::error::Result;
use crate::model::{BibEntry, Person};
use std::collections::HashSet;

/// Author-date citations, e.g. "(Doe 2020, p. 4; Roe and Poe 2019)", with an
/// alphabetical reference list
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthorDateProcessor;

impl CitationProcessor for AuthorDateProcessor {
    fn process(&self, clusters: &[CitationCluster<'_>]) -> Result<ProcessedCitations> {
        let citations = clusters
            .iter()
            .map(|cluster| {
                let parts: Vec<String> = cluster.items.iter().map(in_text).collect();
                format!("({})", parts.join("; "))
            })
            .collect();

        let mut seen = HashSet::new();
        let mut entries: Vec<&BibEntry> = clusters
            .iter()
            .flat_map(|c| c.items.iter().map(|i| i.entry))
            .filter(|e| seen.insert(e.id.as_str()))
            .collect();
        entries.sort_by_key(|e| sort_key(e));

        let bibliography = entries
            .into_iter()
            .map(|entry| BibliographyItem {
                key: entry.id.clone(),
                text: reference(entry),
            })
            .collect();

        Ok(ProcessedCitations {
            citations,
            bibliography,
        })
    }
}

fn in_text(item: &CitationItem<'_>) -> String {
    let mut out = String::new();
    if let Some(prefix) = item.prefix {
        out.push_str(prefix);
        out.push(' ');
    }
    out.push_str(&short_authors(item.entry));
    out.push(' ');
    out.push_str(&year(item.entry));
    if let Some(locator) = item.locator {
        out.push_str(", ");
        out.push_str(locator);
    }
    out
}

fn short_authors(entry: &BibEntry) -> String {
    match entry.author.as_slice() {
        [] => entry.title.clone().unwrap_or_else(|| entry.id.clone()),
        [one] => one.short_name().to_string(),
        [a, b] => format!("{} and {}", a.short_name(), b.short_name()),
        [first, ..] => format!("{} et al.", first.short_name()),
    }
}

fn year(entry: &BibEntry) -> String {
    entry
        .year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "n.d.".to_string())
}

fn sort_key(entry: &BibEntry) -> (String, String, String) {
    let author = entry
        .author
        .first()
        .map(|p| p.short_name().to_lowercase())
        .unwrap_or_default();
    let title = entry.title.clone().unwrap_or_default().to_lowercase();
    (author, year(entry), title)
}

fn full_name(person: &Person) -> String {
    match (&person.literal, person.given_initials()) {
        (Some(literal), _) => literal.clone(),
        (None, Some(initials)) => format!("{}, {}", person.family, initials),
        (None, None) => person.family.clone(),
    }
}

fn author_list(authors: &[Person]) -> String {
    let names: Vec<String> = authors.iter().map(full_name).collect();
    match names.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{}, & {}", init.join(", "), last),
    }
}

/// Reference list entry
fn reference(entry: &BibEntry) -> String {
    let mut parts = Vec::new();

    let authors = author_list(&entry.author);
    let title = entry.title.clone().unwrap_or_else(|| entry.id.clone());
    if authors.is_empty() {
        parts.push(format!("{} ({}).", title, year(entry)));
    } else {
        parts.push(format!("{} ({}).", authors, year(entry)));
        parts.push(format!("{}.", title));
    }

    if let Some(container) = &entry.container_title {
        let mut source = container.clone();
        if let Some(volume) = &entry.volume {
            source.push_str(", ");
            source.push_str(volume);
            if let Some(issue) = &entry.issue {
                source.push_str(&format!("({})", issue));
            }
        }
        if let Some(page) = &entry.page {
            source.push_str(", ");
            source.push_str(page);
        }
        parts.push(format!("{}.", source));
    }

    match (&entry.publisher_place, &entry.publisher) {
        (Some(place), Some(publisher)) => parts.push(format!("{}: {}.", place, publisher)),
        (None, Some(publisher)) => parts.push(format!("{}.", publisher)),
        _ => {}
    }

    if let Some(doi) = &entry.doi {
        parts.push(format!("https://doi.org/{}", doi));
    } else if let Some(url) = &entry.url {
        parts.push(url.clone());
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeId;
    use pretty_assertions::assert_eq;

    fn item(entry: &BibEntry) -> CitationItem<'_> {
        CitationItem {
            entry,
            prefix: None,
            locator: None,
        }
    }

    #[test]
    fn test_in_text_forms() {
        let one = BibEntry::new("doe", "book").with_author("Doe", "Jane").with_year(2020);
        let two = BibEntry::new("rp", "book")
            .with_author("Roe", "R")
            .with_author("Poe", "P")
            .with_year(2019);
        let many = BibEntry::new("m", "book")
            .with_author("Ann", "A")
            .with_author("Bob", "B")
            .with_author("Cy", "C");

        let mut located = item(&one);
        located.locator = Some("p. 4");
        located.prefix = Some("see");

        let clusters = [
            CitationCluster {
                id: NodeId(0),
                items: vec![located, item(&two)],
            },
            CitationCluster {
                id: NodeId(1),
                items: vec![item(&many)],
            },
        ];

        let out = AuthorDateProcessor.process(&clusters).unwrap();
        assert_eq!(
            out.citations,
            vec![
                "(see Doe 2020, p. 4; Roe and Poe 2019)".to_string(),
                "(Ann et al. n.d.)".to_string(),
            ]
        );
        let keys: Vec<&str> = out.bibliography.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["m", "doe", "rp"]);
    }

    #[test]
    fn test_reference_text() {
        let mut entry = BibEntry::new("doe", "article-journal")
            .with_author("Doe", "Jane Ann")
            .with_author("Smith", "Bo")
            .with_title("On Things")
            .with_container("Journal of Things")
            .with_year(2020);
        entry.volume = Some("12".into());
        entry.issue = Some("3".into());
        entry.page = Some("1-10".into());
        entry.doi = Some("10.1000/xyz".into());

        assert_eq!(
            reference(&entry),
            "Doe, J. A., & Smith, B. (2020). On Things. Journal of Things, 12(3), 1-10. https://doi.org/10.1000/xyz"
        );
    }

    #[test]
    fn test_each_source_listed_once() {
        let entry = BibEntry::new("doe", "book").with_author("Doe", "J");
        let clusters = [
            CitationCluster {
                id: NodeId(0),
                items: vec![item(&entry)],
            },
            CitationCluster {
                id: NodeId(1),
                items: vec![item(&entry)],
            },
        ];
        let out = AuthorDateProcessor.process(&clusters).unwrap();
        assert_eq!(out.citations.len(), 2);
        assert_eq!(out.bibliography.len(), 1);
    }
}
