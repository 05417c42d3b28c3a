//! Download queue core: the three-bucket job ledger and its transitions.
mod document;
mod error;
mod job;

pub use document::QueueDocument;
pub use error::TransitionError;
pub use job::Job;
