//! Recoverable export problems
//!
//! A warning means the exporter found something it could not render as
//! asked but had a safe fallback for. Warnings are logged as they are
//! recorded and handed back with the finished package.

use std::fmt;

/// Category of a recoverable problem
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// A node marked hidden was removed
    HiddenNodeDropped,
    /// A node that could not be repaired was removed
    MalformedNodeDropped,
    /// A comment range was moved out of a footnote
    CommentRelocated,
    /// A comment range referenced a comment that does not exist
    UnknownComment,
    /// Image data was missing and a placeholder was used
    MissingImage,
    /// A citation key had no bibliography entry
    UnresolvedCitation,
    /// A second bibliography placeholder was ignored
    DuplicateBibliography,
    /// A math construct could not be converted to OMML
    UnsupportedMath,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::HiddenNodeDropped => "hidden-node-dropped",
            WarningKind::MalformedNodeDropped => "malformed-node-dropped",
            WarningKind::CommentRelocated => "comment-relocated",
            WarningKind::UnknownComment => "unknown-comment",
            WarningKind::MissingImage => "missing-image",
            WarningKind::UnresolvedCitation => "unresolved-citation",
            WarningKind::DuplicateBibliography => "duplicate-bibliography",
            WarningKind::UnsupportedMath => "unsupported-math",
        }
    }
}

/// A single recoverable problem
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}

/// Ordered collection of warnings
#[derive(Clone, Debug, Default)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it
    pub fn push(&mut self, kind: WarningKind, message: impl Into<String>) {
        let warning = Warning {
            kind,
            message: message.into(),
        };
        log::warn!("{}", warning);
        self.items.push(warning);
    }

    /// Move all warnings from `other` into this collection
    pub fn extend(&mut self, other: Warnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of warnings of one kind
    pub fn count(&self, kind: WarningKind) -> usize {
        self.items.iter().filter(|w| w.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_count() {
        let mut warnings = Warnings::new();
        warnings.push(WarningKind::MissingImage, "image 'fig1' not found");
        warnings.push(WarningKind::UnresolvedCitation, "no entry for 'doe2020'");
        warnings.push(WarningKind::MissingImage, "image 'fig2' not found");

        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings.count(WarningKind::MissingImage), 2);
        assert_eq!(warnings.count(WarningKind::UnsupportedMath), 0);
    }

    #[test]
    fn test_display() {
        let warning = Warning {
            kind: WarningKind::UnsupportedMath,
            message: "unknown command \\foo".into(),
        };
        assert_eq!(warning.to_string(), "[unsupported-math] unknown command \\foo");
    }
}
