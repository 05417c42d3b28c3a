use thiserror::Error;

use crate::Job;

/// Precondition violations on queue transitions.
///
/// The fetch loop never issues these transitions out of order, so reaching
/// one of these is a bug in the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no pending job to dispatch")]
    EmptyQueue,
    #[error("job is not in flight: {0}")]
    NotInFlight(Job),
}
