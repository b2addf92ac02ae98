//! Mutable state shared by the export phases

use super::skeleton::SkeletonDocument;
use crate::citation::{CitationOutput, CitationProcessor};
use crate::comments::CommentBuilder;
use crate::error::{Error, Result};
use crate::footnotes::FootnoteBuilder;
use crate::math::MathOutput;
use crate::media::MediaStore;
use crate::metadata::Metadata;
use crate::model::{BibliographyDb, ImageDb, NodeId};
use crate::numbering::NumberingBuilder;
use crate::opc::{rel_types, well_known, Package, PartUri};
use crate::options::ExportOptions;
use crate::registry::RelationshipRegistry;
use crate::table::TableGrid;
use crate::warning::Warnings;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Databases and collaborators consulted by the phases
#[derive(Clone, Copy)]
pub struct ExportInputs<'a> {
    pub bibliography: &'a BibliographyDb,
    pub images: &'a ImageDb,
    pub processor: &'a dyn CitationProcessor,
}

/// An XML part produced by a phase
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedPart {
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

/// State owned by the exporter and lent to one phase at a time
#[derive(Debug)]
pub struct ExportContext {
    pub options: ExportOptions,
    pub timestamp: DateTime<Utc>,
    /// Main document part of the skeleton
    pub document_uri: PartUri,
    pub core_uri: PartUri,
    pub numbering_uri: PartUri,
    pub skeleton: SkeletonDocument,
    /// Every part URI present in the skeleton
    pub skeleton_parts: BTreeSet<PartUri>,

    pub registry: RelationshipRegistry,
    pub media: MediaStore,
    pub numbering: NumberingBuilder,
    pub citations: CitationOutput,
    pub footnotes: FootnoteBuilder,
    pub comments: CommentBuilder,
    pub tables: BTreeMap<NodeId, TableGrid>,
    pub math: BTreeMap<NodeId, MathOutput>,
    /// Hyperlink relationship id by (owning part, href)
    pub hyperlinks: BTreeMap<(PartUri, String), String>,
    pub metadata: Option<Metadata>,

    /// Generated XML parts, written over the skeleton at assembly
    pub parts: BTreeMap<PartUri, GeneratedPart>,
    pub warnings: Warnings,
}

impl ExportContext {
    /// Set up the context for exporting into `skeleton`
    pub fn new(skeleton: &Package, options: ExportOptions) -> Result<Self> {
        let document_uri = skeleton
            .main_document_uri()
            .ok_or_else(|| Error::MissingPart("main document relationship".into()))?;
        let document_part = skeleton
            .part(&document_uri)
            .ok_or_else(|| Error::MissingPart(document_uri.to_string()))?;
        let skeleton_document = SkeletonDocument::parse(document_part.data_as_str()?)?;

        let mut registry = RelationshipRegistry::new();
        for (uri, part) in skeleton.parts() {
            if let Some(rels) = part.relationships() {
                registry.seed(uri, rels);
            }
        }

        let numbering_uri = match document_part
            .relationships()
            .and_then(|rels| rels.by_type(rel_types::NUMBERING))
        {
            Some(rel) => document_uri.resolve(&rel.target)?,
            None => well_known::numbering(),
        };
        let numbering = match skeleton.part(&numbering_uri) {
            Some(part) => {
                log::debug!("keeping numbering definitions of {}", numbering_uri);
                NumberingBuilder::from_xml(part.data_as_str()?)?
            }
            None => NumberingBuilder::new(),
        };

        let core_uri = skeleton
            .uri_by_rel_type(rel_types::CORE_PROPERTIES)
            .unwrap_or_else(well_known::core_props);

        let timestamp = options.resolved_timestamp();

        Ok(Self {
            options,
            timestamp,
            document_uri,
            core_uri,
            numbering_uri,
            skeleton: skeleton_document,
            skeleton_parts: skeleton.part_uris().cloned().collect(),
            registry,
            media: MediaStore::new(skeleton.part_uris()),
            numbering,
            citations: CitationOutput::default(),
            footnotes: FootnoteBuilder::new(),
            comments: CommentBuilder::new(),
            tables: BTreeMap::new(),
            math: BTreeMap::new(),
            hyperlinks: BTreeMap::new(),
            metadata: None,
            parts: BTreeMap::new(),
            warnings: Warnings::new(),
        })
    }

    /// Record a generated part
    pub fn add_part(&mut self, uri: PartUri, content_type: &'static str, xml: String) {
        log::debug!("generated {} ({} bytes)", uri, xml.len());
        self.parts.insert(
            uri,
            GeneratedPart {
                content_type,
                data: xml.into_bytes(),
            },
        );
    }

    /// Text of a generated XML part
    pub fn part_xml(&self, uri: &PartUri) -> Option<&str> {
        self.parts
            .get(uri)
            .and_then(|p| std::str::from_utf8(&p.data).ok())
    }

    /// Relationship id of an external hyperlink in `part`
    pub fn hyperlink(&self, part: &PartUri, href: &str) -> Option<&str> {
        self.hyperlinks
            .get(&(part.clone(), href.to_string()))
            .map(String::as_str)
    }
}
