//! Download queue engine: persistence, collaborators and the fetch loop.
mod collaborator;
mod config;
mod fetch_loop;
mod filename;
mod http;
mod persist;
mod store;

pub use collaborator::{
    CompletionSource, DirectoryCompletionSource, FetchCapability, MoveToDirectory, PrepareError,
    Relocator,
};
pub use config::{LoopSettings, PARTIAL_DOWNLOAD_MARKER};
pub use fetch_loop::{idle, FetchLoop, LoopError, RunSummary, TickReport};
pub use filename::download_filename;
pub use http::{FailureKind, FetchError, HttpFetchSettings, HttpFetcher};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use store::{QueueStore, StoreError};
