//! Citations and bibliography
//!
//! Citation markers are resolved against the [`BibliographyDb`] and handed
//! to a [`CitationProcessor`] in one call. Each marker becomes a Word
//! `CITATION` field whose result is the processor's text; markers with no
//! resolvable source become a plain fallback marker.

mod author_date;
pub mod sources;

pub use author_date::AuthorDateProcessor;

use crate::error::{Error, Result};
use crate::model::{BibEntry, BibliographyDb, Block, Citation, Inline, NodeId};
use crate::options::ExportOptions;
use crate::preprocess::{ContentTree, Story, Visitor};
use crate::warning::{WarningKind, Warnings};
use std::collections::{BTreeMap, HashSet};

/// One cited source inside a cluster
#[derive(Clone, Debug)]
pub struct CitationItem<'a> {
    pub entry: &'a BibEntry,
    pub prefix: Option<&'a str>,
    pub locator: Option<&'a str>,
}

/// The resolvable sources of one citation marker
#[derive(Clone, Debug)]
pub struct CitationCluster<'a> {
    pub id: NodeId,
    pub items: Vec<CitationItem<'a>>,
}

/// One formatted bibliography entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BibliographyItem {
    pub key: String,
    pub text: String,
}

/// Output of a [`CitationProcessor`]
#[derive(Clone, Debug, Default)]
pub struct ProcessedCitations {
    /// One in-text string per cluster, in cluster order
    pub citations: Vec<String>,
    /// One entry per cited source, in the processor's order
    pub bibliography: Vec<BibliographyItem>,
}

/// Formats citations and the bibliography (a CSL engine, or the built-in
/// [`AuthorDateProcessor`])
pub trait CitationProcessor {
    fn process(&self, clusters: &[CitationCluster<'_>]) -> Result<ProcessedCitations>;
}

/// What a citation marker renders as
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderedCitation {
    /// Complex field with instruction and cached result
    Field { instruction: String, result: String },
    /// Plain text for markers without resolvable sources
    Fallback(String),
}

/// Where the bibliography goes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BibliographyPlacement {
    #[default]
    None,
    /// At the first `Block::Bibliography`
    Placeholder,
    /// After the last block
    Appended,
}

/// Everything the renderers need about citations
#[derive(Clone, Debug, Default)]
pub struct CitationOutput {
    rendered: BTreeMap<NodeId, RenderedCitation>,
    pub bibliography: Vec<BibliographyItem>,
    pub placement: BibliographyPlacement,
    /// Cited entries in bibliography order
    pub cited_keys: Vec<String>,
}

impl CitationOutput {
    pub fn get(&self, id: NodeId) -> Option<&RenderedCitation> {
        self.rendered.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    /// Number of markers rendered as fields
    pub fn field_count(&self) -> usize {
        self.rendered
            .values()
            .filter(|r| matches!(r, RenderedCitation::Field { .. }))
            .count()
    }
}

/// Word field instruction citing `keys`
pub fn field_instruction(keys: &[&str]) -> String {
    let mut instruction = String::from(" CITATION");
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            instruction.push_str(" \\m");
        }
        instruction.push(' ');
        instruction.push_str(key);
    }
    instruction.push(' ');
    instruction
}

/// Text shown for a marker whose sources are all unknown
pub fn fallback_marker(keys: &[&str]) -> String {
    if keys.is_empty() {
        return "[?]".to_string();
    }
    let keys: Vec<String> = keys.iter().map(|k| format!("{}?", k)).collect();
    format!("[{}]", keys.join("; "))
}

#[derive(Default)]
struct Markers<'a> {
    citations: Vec<&'a Citation>,
    placeholders: usize,
}

impl<'a> Visitor<'a> for Markers<'a> {
    fn visit_block(&mut self, _story: Story, block: &'a Block) {
        if matches!(block, Block::Bibliography) {
            self.placeholders += 1;
        }
    }

    fn visit_inline(&mut self, _story: Story, inline: &'a Inline) {
        if let Inline::Citation(c) = inline {
            self.citations.push(c);
        }
    }
}

/// Resolves citation markers and formats the bibliography
pub struct CitationBuilder<'a> {
    db: &'a BibliographyDb,
    processor: &'a dyn CitationProcessor,
}

impl<'a> CitationBuilder<'a> {
    pub fn new(db: &'a BibliographyDb, processor: &'a dyn CitationProcessor) -> Self {
        Self { db, processor }
    }

    pub fn build(
        &self,
        tree: &ContentTree,
        options: &ExportOptions,
        warnings: &mut Warnings,
    ) -> Result<CitationOutput> {
        let mut markers = Markers::default();
        tree.walk(&mut markers);

        let mut output = CitationOutput::default();
        let mut clusters = Vec::new();
        let mut cluster_keys = Vec::new();

        for citation in &markers.citations {
            let mut items = Vec::new();
            let mut keys = Vec::new();
            for reference in &citation.references {
                match self.db.get(&reference.key) {
                    Some(entry) => {
                        items.push(CitationItem {
                            entry,
                            prefix: reference.prefix.as_deref(),
                            locator: reference.locator.as_deref(),
                        });
                        keys.push(reference.key.as_str());
                    }
                    None => warnings.push(
                        WarningKind::UnresolvedCitation,
                        format!("no bibliography entry for '{}'", reference.key),
                    ),
                }
            }

            if items.is_empty() {
                if citation.references.is_empty() {
                    warnings.push(WarningKind::UnresolvedCitation, "citation without references");
                }
                let all: Vec<&str> = citation.keys().collect();
                output
                    .rendered
                    .insert(citation.id, RenderedCitation::Fallback(fallback_marker(&all)));
            } else {
                clusters.push(CitationCluster {
                    id: citation.id,
                    items,
                });
                cluster_keys.push(keys);
            }
        }

        if !clusters.is_empty() {
            let processed = self.processor.process(&clusters)?;
            if processed.citations.len() != clusters.len() {
                return Err(Error::external(
                    "citation processor",
                    Error::InvalidDocument(format!(
                        "{} results for {} citations",
                        processed.citations.len(),
                        clusters.len()
                    )),
                ));
            }

            for ((cluster, keys), result) in clusters
                .iter()
                .zip(&cluster_keys)
                .zip(processed.citations)
            {
                output.rendered.insert(
                    cluster.id,
                    RenderedCitation::Field {
                        instruction: field_instruction(keys),
                        result,
                    },
                );
            }

            // One entry per unique source, whatever the processor returned
            let mut seen = HashSet::new();
            output.bibliography = processed
                .bibliography
                .into_iter()
                .filter(|item| seen.insert(item.key.clone()))
                .collect();
            output.cited_keys = output.bibliography.iter().map(|b| b.key.clone()).collect();
        }

        if markers.placeholders > 1 {
            for _ in 1..markers.placeholders {
                warnings.push(
                    WarningKind::DuplicateBibliography,
                    "only the first bibliography placeholder is rendered",
                );
            }
        }

        output.placement = if markers.placeholders > 0 {
            BibliographyPlacement::Placeholder
        } else if options.append_bibliography && !output.bibliography.is_empty() {
            BibliographyPlacement::Appended
        } else {
            BibliographyPlacement::None
        };

        log::debug!(
            "resolved {} citation markers ({} fields), {} bibliography entries",
            markers.citations.len(),
            output.field_count(),
            output.bibliography.len()
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, Paragraph};
    use crate::preprocess::preprocess;

    struct Fixed;

    impl CitationProcessor for Fixed {
        fn process(&self, clusters: &[CitationCluster<'_>]) -> Result<ProcessedCitations> {
            let mut bibliography = Vec::new();
            for cluster in clusters {
                for item in &cluster.items {
                    bibliography.push(BibliographyItem {
                        key: item.entry.id.clone(),
                        text: format!("entry {}", item.entry.id),
                    });
                }
            }
            Ok(ProcessedCitations {
                citations: clusters.iter().map(|c| format!("cite{}", c.id.0)).collect(),
                bibliography,
            })
        }
    }

    fn db() -> BibliographyDb {
        BibliographyDb::new()
            .with_entry(BibEntry::new("a", "book"))
            .with_entry(BibEntry::new("b", "book"))
    }

    fn tree(inlines: Vec<Inline>, blocks: Vec<Block>) -> ContentTree {
        let mut doc = Document::new().with_block(Block::Paragraph(Paragraph::from_inlines(inlines)));
        doc.content.extend(blocks);
        preprocess(&doc).0
    }

    #[test]
    fn test_field_instruction_format() {
        assert_eq!(field_instruction(&["a"]), " CITATION a ");
        assert_eq!(field_instruction(&["a", "b", "c"]), " CITATION a \\m b \\m c ");
        assert_eq!(fallback_marker(&["x"]), "[x?]");
        assert_eq!(fallback_marker(&["x", "y"]), "[x?; y?]");
    }

    #[test]
    fn test_fields_and_unique_bibliography() {
        let tree = tree(vec![Inline::cite(["a", "b"]), Inline::cite(["a"])], vec![]);
        let db = db();
        let builder = CitationBuilder::new(&db, &Fixed);
        let mut warnings = Warnings::new();

        let out = builder
            .build(&tree, &ExportOptions::default(), &mut warnings)
            .unwrap();

        assert_eq!(
            out.get(NodeId(0)),
            Some(&RenderedCitation::Field {
                instruction: " CITATION a \\m b ".into(),
                result: "cite0".into()
            })
        );
        assert_eq!(out.bibliography.len(), 2);
        assert_eq!(out.placement, BibliographyPlacement::Appended);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unresolved_key_falls_back() {
        let tree = tree(vec![Inline::cite(["missing"])], vec![]);
        let db = db();
        let builder = CitationBuilder::new(&db, &Fixed);
        let mut warnings = Warnings::new();

        let out = builder
            .build(&tree, &ExportOptions::default(), &mut warnings)
            .unwrap();

        assert_eq!(
            out.get(NodeId(0)),
            Some(&RenderedCitation::Fallback("[missing?]".into()))
        );
        assert!(out.bibliography.is_empty());
        assert_eq!(out.placement, BibliographyPlacement::None);
        assert_eq!(warnings.count(WarningKind::UnresolvedCitation), 1);
    }

    #[test]
    fn test_partially_resolved_marker_keeps_known_keys() {
        let tree = tree(vec![Inline::cite(["a", "missing"])], vec![]);
        let db = db();
        let builder = CitationBuilder::new(&db, &Fixed);
        let mut warnings = Warnings::new();

        let out = builder
            .build(&tree, &ExportOptions::default(), &mut warnings)
            .unwrap();

        assert!(matches!(
            out.get(NodeId(0)),
            Some(RenderedCitation::Field { instruction, .. }) if instruction == " CITATION a "
        ));
        assert_eq!(warnings.count(WarningKind::UnresolvedCitation), 1);
    }

    #[test]
    fn test_duplicate_placeholders() {
        let tree = tree(
            vec![Inline::cite(["a"])],
            vec![Block::Bibliography, Block::Bibliography],
        );
        let db = db();
        let builder = CitationBuilder::new(&db, &Fixed);
        let mut warnings = Warnings::new();

        let out = builder
            .build(&tree, &ExportOptions::default(), &mut warnings)
            .unwrap();

        assert_eq!(out.placement, BibliographyPlacement::Placeholder);
        assert_eq!(warnings.count(WarningKind::DuplicateBibliography), 1);
    }
}
