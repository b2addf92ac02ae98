//! Error types for linch-docx-export
//!
//! Recoverable content problems are not errors: they become
//! [`Warning`](crate::Warning)s and the export carries on. Everything here
//! aborts the export because the package would be corrupt, or because an
//! external resource failed.

use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML encoding error: {0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid options: {0}")]
    Options(#[from] toml::de::Error),

    #[error("Missing required part: {0}")]
    MissingPart(String),

    #[error("Part already exists in package: {0}")]
    DuplicatePart(String),

    #[error("Invalid part URI: {0}")]
    InvalidPartUri(String),

    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    #[error("Relationship id '{id}' already used in {part}")]
    DuplicateRelationship { part: String, id: String },

    #[error("{part} references '{reference}' which was never registered")]
    UnresolvedReference { part: String, reference: String },

    #[error("{kind} mismatch: {references} references in body, {entries} entries in part")]
    EntryMismatch {
        kind: &'static str,
        references: usize,
        entries: usize,
    },

    #[error("Missing attribute '{attr}' on element '{element}'")]
    MissingAttribute { element: String, attr: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Failed to load '{locator}': {source}")]
    ExternalResource {
        locator: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// True when a structural invariant of the package was violated.
    pub fn is_packaging(&self) -> bool {
        matches!(
            self,
            Error::MissingPart(_)
                | Error::DuplicatePart(_)
                | Error::InvalidPartUri(_)
                | Error::InvalidRelationship(_)
                | Error::DuplicateRelationship { .. }
                | Error::UnresolvedReference { .. }
                | Error::EntryMismatch { .. }
                | Error::MissingAttribute { .. }
                | Error::InvalidDocument(_)
        )
    }

    /// True when an external resource (skeleton, output encoding) failed.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Error::ExternalResource { .. } | Error::Io(_) | Error::Zip(_)
        )
    }

    pub(crate) fn external(locator: impl Into<String>, source: Error) -> Self {
        Error::ExternalResource {
            locator: locator.into(),
            source: Box::new(source),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::MissingPart("/word/document.xml".into()).is_packaging());
        assert!(!Error::MissingPart("/word/document.xml".into()).is_external());

        let err = Error::external("template.docx", Error::MissingPart("[Content_Types].xml".into()));
        assert!(err.is_external());
        assert!(!err.is_packaging());
        assert!(err.to_string().contains("template.docx"));
    }

    #[test]
    fn test_mismatch_message() {
        let err = Error::EntryMismatch {
            kind: "footnote",
            references: 2,
            entries: 3,
        };
        assert_eq!(
            err.to_string(),
            "footnote mismatch: 2 references in body, 3 entries in part"
        );
    }
}
