//! OPC Package implementation
//!
//! Handles reading and writing DOCX files as ZIP packages

use crate::error::{Error, Result};
use crate::opc::relationships::rel_types;
use crate::opc::{ContentTypes, Part, PartUri, Relationships};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

const CONTENT_TYPES_NAME: &str = "[Content_Types].xml";
const PACKAGE_RELS_NAME: &str = "_rels/.rels";

/// An OPC package (ZIP-based container for DOCX, XLSX, PPTX, etc.)
#[derive(Debug, Clone)]
pub struct Package {
    /// All parts in the package, ordered by URI
    parts: BTreeMap<PartUri, Part>,
    /// Package-level relationships (/_rels/.rels)
    relationships: Relationships,
    /// Content types ([Content_Types].xml)
    content_types: ContentTypes,
}

impl Package {
    /// Create a new empty package
    pub fn new() -> Self {
        Self {
            parts: BTreeMap::new(),
            relationships: Relationships::new(),
            content_types: ContentTypes::new(),
        }
    }

    /// Open a package from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Open a package from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Open a package from a reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut package = Self::new();

        package.content_types = Self::read_content_types(&mut archive)?;
        package.relationships = Self::read_package_rels(&mut archive)?;
        package.read_parts(&mut archive)?;
        package.read_part_relationships(&mut archive)?;

        log::debug!(
            "read package with {} parts and {} package relationships",
            package.parts.len(),
            package.relationships.len()
        );

        Ok(package)
    }

    /// Save the package to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(Cursor::new(&mut buf))?;
        Ok(buf)
    }

    /// Write the package to a writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // [Content_Types].xml goes first so streaming readers find it early
        zip.start_file(CONTENT_TYPES_NAME, options)?;
        self.content_types.write_to(&mut zip)?;

        if !self.relationships.is_empty() {
            zip.start_file(PACKAGE_RELS_NAME, options)?;
            self.relationships.write_to(&mut zip)?;
        }

        for (uri, part) in &self.parts {
            zip.start_file(uri.zip_name(), options)?;
            zip.write_all(part.data())?;

            if let Some(rels) = part.relationships() {
                if !rels.is_empty() {
                    let rels_uri = uri.relationships_uri();
                    zip.start_file(rels_uri.zip_name(), options)?;
                    rels.write_to(&mut zip)?;
                }
            }
        }

        zip.finish()?;
        Ok(())
    }

    /// Get a part by URI
    pub fn part(&self, uri: &PartUri) -> Option<&Part> {
        self.parts.get(uri)
    }

    /// Get a mutable part by URI
    pub fn part_mut(&mut self, uri: &PartUri) -> Option<&mut Part> {
        self.parts.get_mut(uri)
    }

    /// Check whether a part exists
    pub fn contains(&self, uri: &PartUri) -> bool {
        self.parts.contains_key(uri)
    }

    /// Add a part to the package, replacing any part with the same URI.
    ///
    /// Relationships of a replaced part are kept unless the new part carries
    /// its own.
    pub fn add_part(&mut self, mut part: Part) {
        let uri = part.uri().clone();
        self.content_types.add_override(&uri, part.content_type());
        if part.relationships().is_none() {
            if let Some(rels) = self.parts.get(&uri).and_then(|p| p.relationships()) {
                part.set_relationships(rels.clone());
            }
        }
        self.parts.insert(uri, part);
    }

    /// Get all part URIs
    pub fn part_uris(&self) -> impl Iterator<Item = &PartUri> {
        self.parts.keys()
    }

    /// Get all parts
    pub fn parts(&self) -> impl Iterator<Item = (&PartUri, &Part)> {
        self.parts.iter()
    }

    /// Get package-level relationships
    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// Get content types
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// URI of the part targeted by a package-level relationship type
    pub fn uri_by_rel_type(&self, rel_type: &str) -> Option<PartUri> {
        let rel = self.relationships.by_type(rel_type)?;
        PartUri::new(&rel.target).ok()
    }

    /// URI of the main document part, if the package declares one
    pub fn main_document_uri(&self) -> Option<PartUri> {
        self.uri_by_rel_type(rel_types::OFFICE_DOCUMENT)
    }

    /// Get the main document part
    pub fn main_document_part(&self) -> Option<&Part> {
        self.parts.get(&self.main_document_uri()?)
    }

    /// Add a package-level relationship
    pub fn add_relationship(&mut self, rel_type: &str, target: &str) -> String {
        self.relationships.add(rel_type, target)
    }

    // === Private methods ===

    fn read_content_types<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<ContentTypes> {
        let mut file = archive
            .by_name(CONTENT_TYPES_NAME)
            .map_err(|_| Error::MissingPart(CONTENT_TYPES_NAME.into()))?;

        let mut content = String::new();
        file.read_to_string(&mut content)?;

        ContentTypes::from_xml(&content)
    }

    fn read_package_rels<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Relationships> {
        match archive.by_name(PACKAGE_RELS_NAME) {
            Ok(mut file) => {
                let mut content = String::new();
                file.read_to_string(&mut content)?;
                Relationships::from_xml(&content)
            }
            Err(_) => Ok(Relationships::new()),
        }
    }

    fn read_parts<R: Read + Seek>(&mut self, archive: &mut ZipArchive<R>) -> Result<()> {
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            if name.ends_with('/') || name == CONTENT_TYPES_NAME {
                continue;
            }

            // Relationship files are read per part afterwards
            if name.contains("_rels/") && name.ends_with(".rels") {
                continue;
            }

            let uri = PartUri::new(&name)?;
            let content_type = self
                .content_types
                .get(&uri)
                .unwrap_or("application/octet-stream")
                .to_string();

            let mut data = Vec::new();
            file.read_to_end(&mut data)?;

            self.parts.insert(uri.clone(), Part::new(uri, content_type, data));
        }

        Ok(())
    }

    fn read_part_relationships<R: Read + Seek>(&mut self, archive: &mut ZipArchive<R>) -> Result<()> {
        for (uri, part) in self.parts.iter_mut() {
            let rels_uri = uri.relationships_uri();

            if let Ok(mut file) = archive.by_name(rels_uri.zip_name()) {
                let mut content = String::new();
                file.read_to_string(&mut content)?;
                part.set_relationships(Relationships::from_xml(&content)?);
            }
        }

        Ok(())
    }
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}
