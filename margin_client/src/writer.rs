//! Atomic report output.
//!
//! The report is written to a temporary file next to the destination and then
//! renamed over it, so a crash mid-write leaves either the previous report or
//! the new one, never a truncated file.
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;
use margin_common::{MarginError, Result};
use tempfile::NamedTempFile;

/// Writes the report to one fixed path, replacing any previous run's file.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    path: PathBuf,
    dir: PathBuf,
}

impl ReportWriter {
    /// Checks up front that `path` can be written.
    ///
    /// The destination directory must exist and accept a new file; the path
    /// itself must not be a directory.
    pub fn new(path: PathBuf) -> Result<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if path.is_dir() {
            return Err(output_error(&path, "path is a directory"));
        }
        if !dir.is_dir() {
            return Err(output_error(&path, "directory does not exist"));
        }
        NamedTempFile::new_in(&dir).map_err(|e| output_error(&path, e))?;
        Ok(ReportWriter { path, dir })
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the destination with `text`.
    pub fn write(&self, text: &str) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| output_error(&self.path, e))?;
        tmp.write_all(text.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| output_error(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| output_error(&self.path, e.error))?;
        info!("Results saved to: {}", self.path.display());
        Ok(())
    }
}

fn output_error(path: &Path, reason: impl ToString) -> MarginError {
    MarginError::OutputWrite {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
