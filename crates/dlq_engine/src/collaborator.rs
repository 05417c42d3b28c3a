use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dlq_logging::dlq_debug;
use thiserror::Error;

use crate::config::PARTIAL_DOWNLOAD_MARKER;

/// Why a session could not be made ready.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("login rejected: {0}")]
    Rejected(String),
    #[error("session unavailable")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Starts transfers. Typically backed by a browser session.
pub trait FetchCapability {
    /// Runs once before the first dispatch, e.g. to log in.
    fn prepare(&mut self) -> Result<(), PrepareError> {
        Ok(())
    }

    /// Starts fetching `url`. Fire-and-forget: the result shows up later as a
    /// file in the completion source.
    fn begin(&mut self, url: &str);
}

/// Reports transfers that have fully arrived.
pub trait CompletionSource {
    /// Paths of fully materialized transfers, re-derived on every call.
    /// Partial files must not be listed.
    fn list_completed(&self) -> io::Result<Vec<PathBuf>>;
}

/// Moves a completed file out of the transient area.
pub trait Relocator {
    /// Returns the final location of the file.
    fn relocate(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Lists files in the directory transfers are written to, skipping those
/// still carrying a partial-transfer marker.
#[derive(Debug, Clone)]
pub struct DirectoryCompletionSource {
    dir: PathBuf,
    partial_markers: Vec<String>,
}

impl DirectoryCompletionSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_markers(dir, vec![PARTIAL_DOWNLOAD_MARKER.to_string()])
    }

    pub fn with_markers(dir: impl Into<PathBuf>, partial_markers: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            partial_markers,
        }
    }

    fn is_partial(&self, name: &str) -> bool {
        self.partial_markers
            .iter()
            .any(|marker| name.contains(marker.as_str()))
    }
}

impl CompletionSource for DirectoryCompletionSource {
    fn list_completed(&self) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if self.is_partial(&entry.file_name().to_string_lossy()) {
                continue;
            }
            entries.push(entry);
        }
        entries.sort_by_key(|e| e.file_name());
        Ok(entries.into_iter().map(|e| e.path()).collect())
    }
}

/// Moves completed files into a target directory, keeping their names.
#[derive(Debug, Clone)]
pub struct MoveToDirectory {
    target_dir: PathBuf,
}

impl MoveToDirectory {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
        }
    }
}

impl Relocator for MoveToDirectory {
    fn relocate(&self, path: &Path) -> io::Result<PathBuf> {
        let name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", path.display()),
            )
        })?;
        let target = self.target_dir.join(name);

        if let Err(rename_err) = fs::rename(path, &target) {
            // Rename cannot cross filesystems; copy then remove instead.
            dlq_debug!(
                "Rename {:?} -> {:?} failed ({}), copying instead",
                path,
                target,
                rename_err
            );
            fs::copy(path, &target).map_err(|_| rename_err)?;
            fs::remove_file(path)?;
        }
        Ok(target)
    }
}
