//! Delivery of finished packages

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Receives the finished `.docx` bytes under a suggested filename
pub trait DownloadSink {
    fn deliver(&mut self, filename: &str, mime: &str, bytes: &[u8]) -> Result<()>;
}

/// Writes each delivered package into a directory
#[derive(Clone, Debug)]
pub struct FileSink {
    dir: PathBuf,
    delivered: Vec<PathBuf>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            delivered: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far
    pub fn delivered(&self) -> &[PathBuf] {
        &self.delivered
    }
}

impl DownloadSink for FileSink {
    fn deliver(&mut self, filename: &str, mime: &str, bytes: &[u8]) -> Result<()> {
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)?;
        log::info!("wrote {} ({}, {} bytes)", path.display(), mime, bytes.len());
        self.delivered.push(path);
        Ok(())
    }
}

/// Keeps delivered packages in memory
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl DownloadSink for MemorySink {
    fn deliver(&mut self, filename: &str, _mime: &str, bytes: &[u8]) -> Result<()> {
        self.files.push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}
