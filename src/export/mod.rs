//! The exporter
//!
//! [`Exporter::export`] loads the skeleton, preprocesses the document, runs
//! the [`Phase`]s in order and assembles the package. Content problems end
//! up in [`ExportedDocx::warnings`]; anything that would corrupt the
//! package is an [`Error`](crate::Error) and nothing is produced.
//!
//! ```rust,ignore
//! use linch_docx_export::{Document, Exporter, Paragraph, Block};
//!
//! let doc = Document::new()
//!     .with_title("Notes")
//!     .with_block(Block::Paragraph(Paragraph::new("Hello")));
//! let docx = Exporter::default().export(&doc)?;
//! std::fs::write(&docx.filename, &docx.bytes)?;
//! ```

mod assemble;
mod context;
mod phase;
mod sink;
mod skeleton;
mod validate;

pub use assemble::assemble;
pub use context::{ExportContext, ExportInputs, GeneratedPart};
pub use phase::{run_phases, Phase};
pub use sink::{DownloadSink, FileSink, MemorySink};
pub use skeleton::{
    default_package, BytesSkeleton, DefaultSkeleton, FileSkeleton, SkeletonDocument, SkeletonLoader,
};
pub use validate::validate;

use crate::citation::{AuthorDateProcessor, CitationProcessor};
use crate::error::Result;
use crate::metadata::{suggested_filename, UNTITLED};
use crate::model::{BibliographyDb, Document, ImageDb};
use crate::options::ExportOptions;
use crate::preprocess::preprocess;
use crate::warning::Warning;

/// MIME type of the produced packages
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A finished export
#[derive(Clone, Debug)]
pub struct ExportedDocx {
    pub bytes: Vec<u8>,
    /// Suggested download name, `<slug>.docx`
    pub filename: String,
    pub warnings: Vec<Warning>,
}

impl ExportedDocx {
    pub fn mime(&self) -> &'static str {
        DOCX_MIME
    }
}

/// Document to `.docx` exporter
pub struct Exporter {
    skeleton: Box<dyn SkeletonLoader>,
    processor: Box<dyn CitationProcessor>,
    bibliography: BibliographyDb,
    images: ImageDb,
    options: ExportOptions,
}

impl Default for Exporter {
    fn default() -> Self {
        Self {
            skeleton: Box::new(DefaultSkeleton),
            processor: Box::new(AuthorDateProcessor),
            bibliography: BibliographyDb::default(),
            images: ImageDb::default(),
            options: ExportOptions::default(),
        }
    }
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skeleton(mut self, skeleton: Box<dyn SkeletonLoader>) -> Self {
        self.skeleton = skeleton;
        self
    }

    pub fn with_processor(mut self, processor: Box<dyn CitationProcessor>) -> Self {
        self.processor = processor;
        self
    }

    pub fn with_bibliography(mut self, bibliography: BibliographyDb) -> Self {
        self.bibliography = bibliography;
        self
    }

    pub fn with_images(mut self, images: ImageDb) -> Self {
        self.images = images;
        self
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export `doc` to `.docx` bytes
    pub fn export(&self, doc: &Document) -> Result<ExportedDocx> {
        let package = self.skeleton.load()?;
        log::debug!("loaded skeleton {}", self.skeleton.locator());

        let mut ctx = ExportContext::new(&package, self.options.clone())?;
        let (tree, warnings) = preprocess(doc);
        ctx.warnings.extend(warnings);

        let inputs = ExportInputs {
            bibliography: &self.bibliography,
            images: &self.images,
            processor: self.processor.as_ref(),
        };
        run_phases(&tree, &inputs, &mut ctx)?;

        let filename = match &ctx.metadata {
            Some(metadata) => metadata.filename.clone(),
            None => suggested_filename(UNTITLED),
        };
        let warnings = std::mem::take(&mut ctx.warnings);
        let bytes = assemble(package, ctx)?;

        log::info!(
            "exported {} ({} bytes, {} warnings)",
            filename,
            bytes.len(),
            warnings.len()
        );
        Ok(ExportedDocx {
            bytes,
            filename,
            warnings: warnings.into_vec(),
        })
    }

    /// Export `doc` and hand the result to `sink`
    pub fn export_to(&self, doc: &Document, sink: &mut dyn DownloadSink) -> Result<ExportedDocx> {
        let exported = self.export(doc)?;
        sink.deliver(&exported.filename, DOCX_MIME, &exported.bytes)?;
        Ok(exported)
    }
}
