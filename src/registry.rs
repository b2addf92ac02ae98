//! Relationship registry
//!
//! Tracks the relationships of every part the exporter generates. Each part
//! has its own id namespace; ids are `rIdN` with N strictly increasing and
//! never reused. Parts that already exist in the skeleton are seeded with
//! their current relationships so generated ids never collide with them.

use crate::error::{Error, Result};
use crate::opc::{PartUri, Relationship, Relationships, TargetMode};
use std::collections::BTreeMap;

/// Relationship ids per source part
#[derive(Clone, Debug, Default)]
pub struct RelationshipRegistry {
    parts: BTreeMap<PartUri, Relationships>,
}

impl RelationshipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the namespace of `part` from existing relationships
    pub fn seed(&mut self, part: &PartUri, existing: &Relationships) {
        log::debug!("seeding {} with {} relationships", part, existing.len());
        self.parts.insert(part.clone(), existing.clone());
    }

    /// Register a relationship and return its fresh id
    pub fn register(
        &mut self,
        part: &PartUri,
        rel_type: &str,
        target: &str,
        mode: TargetMode,
    ) -> String {
        let id = self
            .parts
            .entry(part.clone())
            .or_default()
            .add_with_mode(rel_type, target, mode);
        log::debug!("registered {} in {} -> {}", id, part, target);
        id
    }

    /// Register an internal relationship from `part` to another part
    pub fn register_part(&mut self, part: &PartUri, rel_type: &str, target: &PartUri) -> String {
        let relative = part.relative_to_self(target);
        self.register(part, rel_type, &relative, TargetMode::Internal)
    }

    /// Return the id of an existing internal relationship of this type to
    /// `target`, registering one if there is none
    pub fn ensure_part(&mut self, part: &PartUri, rel_type: &str, target: &PartUri) -> String {
        let relative = part.relative_to_self(target);
        if let Some(rel) = self
            .parts
            .get(part)
            .and_then(|rels| rels.by_target(rel_type, &relative))
        {
            return rel.id.clone();
        }
        self.register(part, rel_type, &relative, TargetMode::Internal)
    }

    /// Register a relationship with a caller-chosen id
    pub fn register_with_id(
        &mut self,
        part: &PartUri,
        id: &str,
        rel_type: &str,
        target: &str,
        mode: TargetMode,
    ) -> Result<()> {
        self.parts
            .entry(part.clone())
            .or_default()
            .add_with_id(id, rel_type, target, mode)
            .map_err(|_| Error::DuplicateRelationship {
                part: part.to_string(),
                id: id.to_string(),
            })
    }

    /// Look up a relationship of `part` by id
    pub fn resolve(&self, part: &PartUri, id: &str) -> Option<&Relationship> {
        self.parts.get(part)?.get(id)
    }

    /// All relationships of `part`
    pub fn relationships(&self, part: &PartUri) -> Option<&Relationships> {
        self.parts.get(part)
    }

    /// Serialize the `.rels` XML of `part`
    pub fn serialize(&self, part: &PartUri) -> Result<String> {
        match self.parts.get(part) {
            Some(rels) => rels.to_xml(),
            None => Relationships::new().to_xml(),
        }
    }

    /// Parts with at least one relationship
    pub fn parts(&self) -> impl Iterator<Item = (&PartUri, &Relationships)> {
        self.parts.iter().filter(|(_, rels)| !rels.is_empty())
    }
}
