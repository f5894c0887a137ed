//! Fetch worker pool
//!
//! A fixed number of long-lived tasks, each looping: take a URL from the
//! frontier, read it under the per-document timeout, record the result and
//! admit every eligible hyperlink it found.

use crate::crawler::fetcher::DocumentReader;
use crate::crawler::frontier::Frontier;
use crate::crawler::site_map::{Link, ResultSink};
use crate::state::{WorkerSlot, WorkerStates};
use crate::url::Eligibility;
use crate::FetchError;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Everything a worker needs besides its own slot
pub(crate) struct WorkerContext<R> {
    pub frontier: Arc<Frontier>,
    pub reader: R,
    pub eligibility: Arc<dyn Eligibility>,
    pub sink: Arc<ResultSink>,
    pub read_timeout: Duration,
}

/// Running worker tasks and their busy/idle records
///
/// Dropping the pool aborts any workers still running.
pub(crate) struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    states: Arc<WorkerStates>,
}

impl WorkerPool {
    /// Spawns `count` workers sharing one context
    pub(crate) fn spawn<R: DocumentReader>(count: usize, context: WorkerContext<R>) -> Self {
        let states = Arc::new(WorkerStates::new(count));
        let handles = (0..count)
            .filter_map(|n| states.slot(n))
            .map(|slot| {
                let worker = Worker {
                    slot,
                    frontier: Arc::clone(&context.frontier),
                    reader: context.reader.clone(),
                    eligibility: Arc::clone(&context.eligibility),
                    sink: Arc::clone(&context.sink),
                    read_timeout: context.read_timeout,
                };
                let span = tracing::info_span!("worker", worker = worker.slot.worker());
                tokio::spawn(worker.run().instrument(span))
            })
            .collect();

        tracing::debug!(workers = count, "Worker pool started");
        Self { handles, states }
    }

    /// Shared busy/idle records, for the quiescence detector
    pub(crate) fn states(&self) -> Arc<WorkerStates> {
        Arc::clone(&self.states)
    }

    /// Waits for every worker to exit
    ///
    /// Workers only exit once the frontier is closed.
    pub(crate) async fn join(mut self) {
        for handle in std::mem::take(&mut self.handles) {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!("Worker panicked: {}", e);
                }
            }
        }
    }

    /// Abandons every worker, including any fetch in progress
    pub(crate) fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.abort();
    }
}

struct Worker<R> {
    slot: WorkerSlot,
    frontier: Arc<Frontier>,
    reader: R,
    eligibility: Arc<dyn Eligibility>,
    sink: Arc<ResultSink>,
    read_timeout: Duration,
}

impl<R: DocumentReader> Worker<R> {
    async fn run(self) {
        while let Some(url) = self.frontier.next().await {
            let _in_flight = InFlight::start(&self.slot, &self.frontier);
            if let Err(payload) = AssertUnwindSafe(self.process(&url)).catch_unwind().await {
                let message = panic_message(payload.as_ref());
                tracing::error!(%url, "Reader panicked: {}", message);
                self.sink.record_failure(&url, format!("reader panicked: {}", message));
            }
        }
        tracing::trace!("Frontier closed, worker exiting");
    }

    async fn process(&self, url: &str) {
        let result = match tokio::time::timeout(
            self.read_timeout,
            self.reader.read(url, self.read_timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        };

        match result {
            Ok(links) => {
                let admitted = self.admit_links(&links);
                tracing::debug!(
                    %url,
                    links = links.len(),
                    admitted,
                    "Read document"
                );
                self.sink.insert(url, links);
            }
            Err(e) => {
                tracing::warn!(%url, "Failed to read document: {}", e);
                self.sink.record_failure(url, e.to_string());
            }
        }
    }

    /// Offers every eligible hyperlink to the frontier; returns how many were new
    fn admit_links(&self, links: &[Link]) -> usize {
        links
            .iter()
            .filter(|link| link.kind.is_traversable())
            .filter(|link| self.eligibility.is_eligible(&link.target))
            .filter(|link| self.frontier.admit(&link.target))
            .count()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Busy marker for one URL
///
/// Settles the URL and marks the worker idle when dropped, including when
/// the worker is aborted mid-fetch.
struct InFlight<'a> {
    slot: &'a WorkerSlot,
    frontier: &'a Frontier,
}

impl<'a> InFlight<'a> {
    fn start(slot: &'a WorkerSlot, frontier: &'a Frontier) -> Self {
        slot.mark_busy();
        Self { slot, frontier }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.frontier.settle();
        self.slot.mark_idle();
    }
}
