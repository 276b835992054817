use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::FileOptions;
use zip::ZipWriter;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive writer unavailable: {0}")]
    Unavailable(String),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// In-memory packaging seam: named text entries materialized to bytes at
/// the end. The orchestrator only ever talks to this trait.
pub trait ArchiveWriter: Send {
    fn add_entry(&mut self, name: &str, content: &str) -> Result<(), ArchiveError>;
    fn finish(self: Box<Self>) -> Result<Vec<u8>, ArchiveError>;
}

/// Creates one writer per archived job. Creation failure is the job-level
/// setup error; it must surface before any network activity.
pub trait ArchiveFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn ArchiveWriter>, ArchiveError>;
}

#[derive(Debug, Default)]
pub struct ZipArchiveFactory;

impl ArchiveFactory for ZipArchiveFactory {
    fn create(&self) -> Result<Box<dyn ArchiveWriter>, ArchiveError> {
        Ok(Box::new(ZipArchiveWriter::new()))
    }
}

/// ZIP writer over an in-memory buffer.
pub struct ZipArchiveWriter {
    inner: ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipArchiveWriter {
    pub fn new() -> Self {
        Self {
            inner: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn add_entry(&mut self, name: &str, content: &str) -> Result<(), ArchiveError> {
        self.inner.start_file(name, FileOptions::default())?;
        self.inner.write_all(content.as_bytes())?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<u8>, ArchiveError> {
        let cursor = self.inner.finish()?;
        Ok(cursor.into_inner())
    }
}
