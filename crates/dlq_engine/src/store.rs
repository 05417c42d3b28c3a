use std::fs;
use std::path::{Path, PathBuf};

use dlq_core::{Job, QueueDocument, TransitionError};
use dlq_logging::{dlq_debug, dlq_info, dlq_warn};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The queue document could not be read or parsed. The operator has to
    /// fix or reinitialize it.
    #[error("queue document {path:?} is unreadable or malformed: {reason}")]
    CorruptState { path: PathBuf, reason: String },
    /// Writing the document failed; memory and disk may now disagree.
    #[error("failed to persist queue document {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: PersistError,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Owns the queue document and its file.
///
/// Every mutating operation saves before returning, so a process killed at any
/// point leaves a document that [`QueueStore::load`] can resume from.
#[derive(Debug)]
pub struct QueueStore {
    path: PathBuf,
    document: QueueDocument,
}

impl QueueStore {
    /// Writes an empty document to `path`, replacing any existing one.
    pub fn initialize(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            document: QueueDocument::empty(),
        };
        store.save()?;
        dlq_info!("Initialized empty queue document at {:?}", store.path);
        Ok(store)
    }

    /// Reads the document at `path` and puts any in-flight jobs back at the
    /// front of the pending queue.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|err| StoreError::CorruptState {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        let mut document: QueueDocument =
            serde_json::from_str(&content).map_err(|err| StoreError::CorruptState {
                path: path.clone(),
                reason: err.to_string(),
            })?;

        let recovered = document.recover_in_flight();
        let store = Self { path, document };
        if recovered > 0 {
            dlq_warn!(
                "Recovered {} interrupted job(s) from {:?}; they will be fetched again",
                recovered,
                store.path
            );
            store.save()?;
        }
        dlq_info!(
            "Loaded queue {:?}: {} pending, {} finished",
            store.path,
            store.document.pending().len(),
            store.document.finished().len()
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &QueueDocument {
        &self.document
    }

    /// Atomically replaces the file with the in-memory document.
    pub fn save(&self) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&self.document).map_err(|err| {
            StoreError::Persistence {
                path: self.path.clone(),
                source: PersistError::Io(err.into()),
            }
        })?;
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StoreError::Persistence {
                path: self.path.clone(),
                source: PersistError::Dir("queue path has no usable file name".into()),
            })?;

        AtomicFileWriter::for_file(&self.path)
            .write(filename, &content)
            .map_err(|source| StoreError::Persistence {
                path: self.path.clone(),
                source,
            })?;
        dlq_debug!("Saved queue document {:?}", self.path);
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        self.document.has_pending()
    }

    pub fn is_drained(&self) -> bool {
        self.document.is_drained()
    }

    pub fn in_flight_len(&self) -> usize {
        self.document.in_flight_len()
    }

    /// Moves the head of the pending queue in flight and persists the change.
    pub fn dispatch(&mut self) -> Result<Job, StoreError> {
        let job = self.document.dispatch()?;
        self.save()?;
        Ok(job)
    }

    pub fn match_in_flight(&self, token: &str) -> Option<Job> {
        self.document.match_in_flight(token).cloned()
    }

    /// Moves `job` to finished and persists the change.
    pub fn complete(&mut self, job: &Job) -> Result<(), StoreError> {
        self.document.complete(job)?;
        self.save()
    }
}
