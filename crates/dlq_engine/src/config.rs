use std::path::PathBuf;
use std::time::Duration;

use crate::collaborator::{DirectoryCompletionSource, MoveToDirectory};
use crate::persist::{ensure_dir, PersistError};

/// Name fragment browsers and [`crate::HttpFetcher`] give files still being written.
pub const PARTIAL_DOWNLOAD_MARKER: &str = ".crdownload";

#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Where transfers land while they are being written.
    pub incomplete_dir: PathBuf,
    /// Where completed files are moved to.
    pub download_dir: PathBuf,
    pub poll_interval: Duration,
    /// Concurrency ceiling for in-flight jobs.
    pub max_in_flight: usize,
    /// File names containing any of these are still transferring.
    pub partial_markers: Vec<String>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            incomplete_dir: PathBuf::from("./incomplete"),
            download_dir: PathBuf::from("./download"),
            poll_interval: Duration::from_secs(1),
            max_in_flight: 1,
            partial_markers: vec![PARTIAL_DOWNLOAD_MARKER.to_string()],
        }
    }
}

impl LoopSettings {
    /// Settings rooted at `base`, with `incomplete/` and `download/` below it.
    pub fn rooted_at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            incomplete_dir: base.join("incomplete"),
            download_dir: base.join("download"),
            ..Self::default()
        }
    }

    /// Creates the transient and final directories if they are missing.
    pub fn ensure_directories(&self) -> Result<(), PersistError> {
        ensure_dir(&self.incomplete_dir)?;
        ensure_dir(&self.download_dir)?;
        Ok(())
    }

    /// Completion source watching `incomplete_dir`.
    pub fn completion_source(&self) -> DirectoryCompletionSource {
        DirectoryCompletionSource::with_markers(&self.incomplete_dir, self.partial_markers.clone())
    }

    /// Relocator moving files into `download_dir`.
    pub fn relocator(&self) -> MoveToDirectory {
        MoveToDirectory::new(&self.download_dir)
    }
}
