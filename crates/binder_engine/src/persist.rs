use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use binder_core::{Artifact, JobResult};
use serde_json::json;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        self.write_bytes(filename, content.as_bytes())
    }

    pub fn write_bytes(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Replace existing file if present to keep determinism.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Paths of everything a saved job left on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifacts {
    pub artifact_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub manifest_path: PathBuf,
}

/// Write a finished job's artifacts into `dir`. Merged jobs get the text
/// document plus a standalone report file; archived jobs get the ZIP (the
/// report travels inside it); cancelled jobs get only their partial
/// report. A small `manifest.json` records what was written.
pub fn save_result(result: &JobResult, dir: &Path) -> Result<SavedArtifacts, PersistError> {
    let writer = AtomicFileWriter::new(dir.to_path_buf());

    match result {
        JobResult::Completed {
            artifact,
            artifact_filename,
            report,
            report_filename,
            completed_count,
        } => {
            let artifact_path = match artifact {
                Artifact::Merged(text) => writer.write(artifact_filename, text)?,
                Artifact::Archive(bytes) => writer.write_bytes(artifact_filename, bytes)?,
            };
            let report_path = match artifact {
                Artifact::Merged(_) => {
                    Some(writer.write(report_filename, &report.serialize())?)
                }
                Artifact::Archive(_) => None,
            };
            let manifest = json!({
                "status": "completed",
                "artifact": artifact_filename,
                "report": report_filename,
                "completed": completed_count,
                "skipped": report.skipped.len(),
                "incomplete": report.incomplete.len(),
            });
            let manifest_path = writer.write("manifest.json", &manifest.to_string())?;
            Ok(SavedArtifacts {
                artifact_path: Some(artifact_path),
                report_path,
                manifest_path,
            })
        }
        JobResult::Cancelled {
            partial_report,
            report_filename,
        } => {
            let report_path = writer.write(report_filename, &partial_report.serialize())?;
            let manifest = json!({
                "status": "cancelled",
                "report": report_filename,
                "skipped": partial_report.skipped.len(),
                "incomplete": partial_report.incomplete.len(),
            });
            let manifest_path = writer.write("manifest.json", &manifest.to_string())?;
            Ok(SavedArtifacts {
                artifact_path: None,
                report_path: Some(report_path),
                manifest_path,
            })
        }
    }
}
