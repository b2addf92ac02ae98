//! # linch-docx-export
//!
//! Export rich documents to Word `.docx` packages.
//!
//! ## Features
//!
//! - Citations as native Word fields, with a bibliography and an embedded
//!   sources part
//! - Footnotes, threaded comments, nested lists and merged table cells
//! - LaTeX math converted to Office Math, with a text fallback
//! - Images embedded once per package and sized to the text width
//! - Bring your own skeleton (`.docx`/`.dotx`) for styles and page layout
//!
//! Content problems (unknown citation keys, missing images, unsupported
//! math) never abort an export; they are reported as [`Warning`]s.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linch_docx_export::{Block, Document, Exporter, Inline, Paragraph};
//!
//! let doc = Document::new()
//!     .with_title("Field notes")
//!     .with_block(Block::Paragraph(Paragraph::from_inlines(vec![
//!         Inline::text("Observed on site"),
//!         Inline::footnote(vec![Paragraph::new("Weather was clear.")]),
//!     ])));
//!
//! let docx = Exporter::default().export(&doc)?;
//! assert_eq!(docx.filename, "field-notes.docx");
//! for warning in &docx.warnings {
//!     eprintln!("{}", warning);
//! }
//! ```

pub mod citation;
pub mod comments;
pub mod error;
pub mod export;
pub mod footnotes;
pub mod math;
pub mod media;
pub mod metadata;
pub mod model;
pub mod numbering;
pub mod opc;
pub mod options;
pub mod preprocess;
pub mod registry;
pub mod render;
pub mod table;
pub mod warning;
pub mod xml;

pub use citation::{AuthorDateProcessor, CitationProcessor};
pub use error::{Error, Result};
pub use export::{
    BytesSkeleton, DefaultSkeleton, DownloadSink, ExportedDocx, Exporter, FileSink, FileSkeleton,
    MemorySink, SkeletonLoader, DOCX_MIME,
};
pub use model::{
    BibEntry, BibliographyDb, Block, Comment, Document, Heading, ImageData, ImageDb, Inline,
    Paragraph,
};
pub use opc::{Package, Part, PartUri};
pub use options::ExportOptions;
pub use warning::{Warning, WarningKind};
