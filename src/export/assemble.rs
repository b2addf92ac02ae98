//! Package assembly
//!
//! Writes the generated parts and media over the skeleton, then replaces
//! every part's relationships with the registry's view of them.

use super::context::ExportContext;
use crate::error::{Error, Result};
use crate::opc::{rel_types, well_known, Package, Part, PartUri, TargetMode};
use std::collections::BTreeSet;

/// Combine the skeleton and everything the phases produced into `.docx` bytes
pub fn assemble(mut package: Package, ctx: ExportContext) -> Result<Vec<u8>> {
    if !package.contains(&ctx.document_uri) {
        return Err(Error::MissingPart(ctx.document_uri.to_string()));
    }

    // parts the exporter regenerates in place; anything else must be new
    let replaceable: BTreeSet<PartUri> = [
        ctx.document_uri.clone(),
        ctx.numbering_uri.clone(),
        ctx.core_uri.clone(),
        well_known::footnotes(),
        well_known::comments(),
    ]
    .into_iter()
    .collect();

    for (uri, generated) in ctx.parts {
        if package.contains(&uri) && !replaceable.contains(&uri) {
            return Err(Error::DuplicatePart(uri.to_string()));
        }
        package.add_part(Part::new(uri, generated.content_type, generated.data));
    }

    for media in ctx.media.parts() {
        if package.contains(&media.uri) {
            return Err(Error::DuplicatePart(media.uri.to_string()));
        }
        package.add_part(Part::new(
            media.uri.clone(),
            media.content_type.as_str(),
            media.data.clone(),
        ));
    }

    for (uri, rels) in ctx.registry.parts() {
        for rel in rels.iter().filter(|r| r.target_mode == TargetMode::Internal) {
            let target = uri.resolve(&rel.target)?;
            if !package.contains(&target) {
                return Err(Error::MissingPart(format!(
                    "{} (target of {} in {})",
                    target, rel.id, uri
                )));
            }
        }
        let part = package
            .part_mut(uri)
            .ok_or_else(|| Error::MissingPart(format!("{} (source of relationships)", uri)))?;
        part.set_relationships(rels.clone());
    }

    if package
        .relationships()
        .by_type(rel_types::CORE_PROPERTIES)
        .is_none()
    {
        let target = ctx.core_uri.as_str().trim_start_matches('/').to_string();
        package.add_relationship(rel_types::CORE_PROPERTIES, &target);
    }

    let bytes = package.to_bytes()?;
    log::debug!("assembled {} parts into {} bytes", package.part_uris().count(), bytes.len());
    Ok(bytes)
}
