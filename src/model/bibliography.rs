//! Bibliography database in CSL-JSON form

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sources available for citation, keyed by citation key
#[derive(Clone, Debug, Default)]
pub struct BibliographyDb {
    entries: BTreeMap<String, BibEntry>,
}

impl BibliographyDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a CSL-JSON array of items
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let items: Vec<BibEntry> = serde_json::from_str(json)?;
        let mut db = Self::new();
        for item in items {
            db.insert(item);
        }
        log::debug!("loaded {} bibliography entries", db.len());
        Ok(db)
    }

    /// Add an entry, replacing one with the same key
    pub fn insert(&mut self, entry: BibEntry) {
        self.entries.insert(entry.id.clone(), entry);
    }

    pub fn with_entry(mut self, entry: BibEntry) -> Self {
        self.insert(entry);
        self
    }

    pub fn get(&self, key: &str) -> Option<&BibEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BibEntry> {
        self.entries.values()
    }
}

/// A bibliographic source (CSL-JSON item subset)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BibEntry {
    /// Citation key
    pub id: String,
    /// CSL item type ("book", "article-journal", ...)
    #[serde(rename = "type")]
    pub entry_type: String,
    pub title: Option<String>,
    pub author: Vec<Person>,
    pub editor: Vec<Person>,
    pub issued: Option<DateParts>,
    pub container_title: Option<String>,
    pub publisher: Option<String>,
    pub publisher_place: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(rename = "DOI")]
    pub doi: Option<String>,
}

impl BibEntry {
    pub fn new(id: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entry_type: entry_type.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, family: impl Into<String>, given: impl Into<String>) -> Self {
        self.author.push(Person {
            family: family.into(),
            given: Some(given.into()),
            literal: None,
        });
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.issued = Some(DateParts {
            date_parts: vec![vec![year]],
        });
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container_title = Some(container.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// Year of publication
    pub fn year(&self) -> Option<i32> {
        self.issued.as_ref().and_then(DateParts::year)
    }
}

/// A name in CSL-JSON form
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub family: String,
    pub given: Option<String>,
    /// Institutional name used instead of family/given
    pub literal: Option<String>,
}

impl Person {
    /// Name used in in-text citations
    pub fn short_name(&self) -> &str {
        match &self.literal {
            Some(literal) => literal,
            None => &self.family,
        }
    }

    /// Initials of the given names, e.g. "J. R."
    pub fn given_initials(&self) -> Option<String> {
        let given = self.given.as_deref()?;
        let initials: Vec<String> = given
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter_map(|part| part.chars().next())
            .map(|c| format!("{}.", c))
            .collect();
        if initials.is_empty() {
            None
        } else {
            Some(initials.join(" "))
        }
    }
}

/// CSL date in `date-parts` form
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DateParts {
    pub date_parts: Vec<Vec<i32>>,
}

impl DateParts {
    pub fn year(&self) -> Option<i32> {
        self.date_parts.first()?.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_csl_json() {
        let json = r#"[
            {
                "id": "doe2020",
                "type": "article-journal",
                "title": "On Things",
                "author": [{"family": "Doe", "given": "Jane Ann"}],
                "issued": {"date-parts": [[2020, 5]]},
                "container-title": "Journal of Things",
                "DOI": "10.1000/xyz"
            },
            {"id": "acme", "type": "report", "author": [{"literal": "ACME Corp"}]}
        ]"#;

        let db = BibliographyDb::from_json(json).unwrap();
        assert_eq!(db.len(), 2);

        let doe = db.get("doe2020").unwrap();
        assert_eq!(doe.year(), Some(2020));
        assert_eq!(doe.container_title.as_deref(), Some("Journal of Things"));
        assert_eq!(doe.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(doe.author[0].given_initials().as_deref(), Some("J. A."));

        let acme = db.get("acme").unwrap();
        assert_eq!(acme.author[0].short_name(), "ACME Corp");
        assert_eq!(acme.year(), None);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = BibliographyDb::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }
}
