use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{Job, TransitionError};

/// The persisted job ledger.
///
/// A job lives in exactly one bucket at a time. `finished` only ever grows.
/// Field names are the on-disk keys and all three are required.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueDocument {
    queue: VecDeque<Job>,
    downloading: Vec<Job>,
    finished: Vec<Job>,
}

impl QueueDocument {
    /// The document written by the setup step: all buckets empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A document with the given jobs pending, in FIFO order.
    pub fn with_pending<I, J>(jobs: I) -> Self
    where
        I: IntoIterator<Item = J>,
        J: Into<Job>,
    {
        Self {
            queue: jobs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn pending(&self) -> impl ExactSizeIterator<Item = &Job> {
        self.queue.iter()
    }

    pub fn in_flight(&self) -> &[Job] {
        &self.downloading
    }

    pub fn finished(&self) -> &[Job] {
        &self.finished
    }

    pub fn in_flight_len(&self) -> usize {
        self.downloading.len()
    }

    /// Number of jobs across all three buckets.
    pub fn total_jobs(&self) -> usize {
        self.queue.len() + self.downloading.len() + self.finished.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// True once nothing is pending or in flight.
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.downloading.is_empty()
    }

    /// Moves every in-flight job back to the front of the pending queue,
    /// keeping their relative order. Returns how many jobs were moved.
    ///
    /// An in-flight job found at load time has no live transfer behind it,
    /// so it has to be fetched again.
    pub fn recover_in_flight(&mut self) -> usize {
        let moved = self.downloading.len();
        for job in self.downloading.drain(..).rev() {
            self.queue.push_front(job);
        }
        moved
    }

    /// Pops the head of the pending queue and marks it in flight.
    pub fn dispatch(&mut self) -> Result<Job, TransitionError> {
        let job = self.queue.pop_front().ok_or(TransitionError::EmptyQueue)?;
        self.downloading.push(job.clone());
        Ok(job)
    }

    /// First in-flight job whose URL contains `token`.
    ///
    /// An empty token never matches.
    pub fn match_in_flight(&self, token: &str) -> Option<&Job> {
        if token.is_empty() {
            return None;
        }
        self.downloading.iter().find(|job| job.matches_token(token))
    }

    /// Moves `job` from in flight to finished.
    pub fn complete(&mut self, job: &Job) -> Result<(), TransitionError> {
        let index = self
            .downloading
            .iter()
            .position(|candidate| candidate == job)
            .ok_or_else(|| TransitionError::NotInFlight(job.clone()))?;
        let job = self.downloading.remove(index);
        self.finished.push(job);
        Ok(())
    }
}
