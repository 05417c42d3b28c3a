use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use dlq_core::Job;
use dlq_logging::{dlq_debug, dlq_info, dlq_warn, set_poll_cycle};
use thiserror::Error;

use crate::collaborator::{CompletionSource, FetchCapability, PrepareError, Relocator};
use crate::config::LoopSettings;
use crate::store::{QueueStore, StoreError};

/// Errors that stop the loop. Continuing after any of them risks an untracked
/// file or a duplicated job.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to list completed transfers: {0}")]
    Poll(#[source] io::Error),
    #[error("failed to relocate {path:?}: {source}")]
    Relocate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("session preparation failed")]
    Prepare(#[source] PrepareError),
}

/// What a single loop iteration did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub dispatched: Vec<Job>,
    pub completed: Vec<Job>,
    /// Completed files no in-flight job claimed. They stay where they are.
    pub unmatched: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub dispatched: usize,
    pub completed: usize,
}

/// Drives a [`QueueStore`] to the drained state.
///
/// All queue mutations happen on the calling thread; a job is persisted as in
/// flight before its transfer starts and persisted as finished right after its
/// file is relocated.
pub struct FetchLoop {
    store: QueueStore,
    fetcher: Box<dyn FetchCapability>,
    completions: Box<dyn CompletionSource>,
    relocator: Box<dyn Relocator>,
    settings: LoopSettings,
    in_flight_count: usize,
    cycle: u64,
    reported_unmatched: HashSet<PathBuf>,
}

impl FetchLoop {
    pub fn new(
        store: QueueStore,
        fetcher: Box<dyn FetchCapability>,
        completions: Box<dyn CompletionSource>,
        relocator: Box<dyn Relocator>,
        settings: LoopSettings,
    ) -> Self {
        let in_flight_count = store.in_flight_len();
        Self {
            store,
            fetcher,
            completions,
            relocator,
            settings,
            in_flight_count,
            cycle: 0,
            reported_unmatched: HashSet::new(),
        }
    }

    /// Loop wired to the filesystem collaborators described by `settings`.
    pub fn with_directories(
        store: QueueStore,
        fetcher: Box<dyn FetchCapability>,
        settings: LoopSettings,
    ) -> Self {
        let completions = Box::new(settings.completion_source());
        let relocator = Box::new(settings.relocator());
        Self::new(store, fetcher, completions, relocator, settings)
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn into_store(self) -> QueueStore {
        self.store
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight_count
    }

    /// Unmatched files already warned about and still present.
    pub fn reported_unmatched(&self) -> impl Iterator<Item = &Path> {
        self.reported_unmatched.iter().map(PathBuf::as_path)
    }

    /// Prepares the session, then ticks and sleeps until the queue is drained.
    ///
    /// There is no per-transfer timeout: a transfer that never completes keeps
    /// the loop polling.
    pub fn run(&mut self) -> Result<RunSummary, LoopError> {
        self.fetcher.prepare().map_err(LoopError::Prepare)?;
        dlq_info!("Starting fetch loop on {:?}", self.store.path());

        let mut summary = RunSummary::default();
        while !self.store.is_drained() {
            let report = self.tick()?;
            summary.dispatched += report.dispatched.len();
            summary.completed += report.completed.len();
            if self.store.is_drained() {
                break;
            }
            thread::sleep(self.settings.poll_interval);
        }
        summary.cycles = self.cycle;

        dlq_info!(
            "Queue {:?} drained: {} dispatched, {} completed",
            self.store.path(),
            summary.dispatched,
            summary.completed
        );
        Ok(summary)
    }

    /// One iteration: dispatch up to the concurrency ceiling, then reconcile
    /// every completed file currently visible.
    pub fn tick(&mut self) -> Result<TickReport, LoopError> {
        self.cycle += 1;
        set_poll_cycle(self.cycle);
        let mut report = TickReport::default();

        let ceiling = self.settings.max_in_flight.max(1);
        while self.in_flight_count < ceiling && self.store.has_pending() {
            let job = self.store.dispatch()?;
            self.in_flight_count += 1;
            dlq_info!("Dispatching {}", job);
            self.fetcher.begin(job.as_str());
            report.dispatched.push(job);
        }

        let completed = self.completions.list_completed().map_err(LoopError::Poll)?;
        // Forget strays that were removed by hand.
        self.reported_unmatched
            .retain(|reported| completed.contains(reported));
        for path in completed {
            let token = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let Some(job) = self.store.match_in_flight(&token) else {
                if self.reported_unmatched.insert(path.clone()) {
                    dlq_warn!(
                        "Completed file {:?} matches no in-flight job; leaving it in place",
                        path
                    );
                } else {
                    dlq_debug!("Still unmatched: {:?}", path);
                }
                report.unmatched.push(path);
                continue;
            };

            let target = self
                .relocator
                .relocate(&path)
                .map_err(|source| LoopError::Relocate {
                    path: path.clone(),
                    source,
                })?;
            self.store.complete(&job)?;
            self.in_flight_count = self.in_flight_count.saturating_sub(1);
            self.reported_unmatched.remove(&path);
            dlq_info!("Completed {} -> {:?}", job, target);
            report.completed.push(job);
        }

        debug_assert_eq!(self.in_flight_count, self.store.in_flight_len());
        Ok(report)
    }
}

/// Keeps the session open without a queue, e.g. for logging in by hand.
///
/// Prepares the session once, then sleeps one interval at a time until
/// `should_stop` returns true. Returns the number of intervals waited.
pub fn idle(
    fetcher: &mut dyn FetchCapability,
    poll_interval: Duration,
    mut should_stop: impl FnMut() -> bool,
) -> Result<u64, LoopError> {
    fetcher.prepare().map_err(LoopError::Prepare)?;
    dlq_info!("Session ready; idling");

    let mut waited = 0;
    while !should_stop() {
        waited += 1;
        set_poll_cycle(waited);
        thread::sleep(poll_interval);
    }
    Ok(waited)
}
