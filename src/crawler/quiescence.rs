//! Quiescence detection
//!
//! The crawl is over when no URL is queued or in flight and no worker can
//! produce another one. An empty queue alone proves nothing: a busy worker
//! may be about to admit more links. The detector therefore polls and only
//! reports completion once every worker has been idle for a continuous
//! threshold and every admitted URL has been settled.

use crate::crawler::frontier::Frontier;
use crate::state::WorkerStates;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// How a detector run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorOutcome {
    /// No work remained for a full idle threshold
    Quiescent,
    /// The detector was told to stop before quiescence
    Cancelled,
}

/// Polls worker states until the crawl has quiesced
#[derive(Debug)]
pub struct QuiescenceDetector {
    states: Arc<WorkerStates>,
    frontier: Arc<Frontier>,
    idle_threshold: Duration,
    poll_interval: Duration,
}

impl QuiescenceDetector {
    pub fn new(
        states: Arc<WorkerStates>,
        frontier: Arc<Frontier>,
        idle_threshold: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            states,
            frontier,
            idle_threshold,
            poll_interval,
        }
    }

    /// Returns true if, as of `now`, every worker has been idle for at least
    /// the threshold and nothing is queued or in flight
    pub fn is_quiescent(&self, now: Instant) -> bool {
        self.frontier.outstanding() == 0 && self.states.all_idle_for(self.idle_threshold, now)
    }

    /// Polls until quiescence or until `cancel` fires
    pub async fn run(self, cancel: CancellationToken) -> DetectorOutcome {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Quiescence detector cancelled");
                    return DetectorOutcome::Cancelled;
                }
                now = ticker.tick() => {
                    if self.is_quiescent(now) {
                        tracing::debug!(
                            visited = self.frontier.visited_count(),
                            "All workers idle, crawl quiescent"
                        );
                        return DetectorOutcome::Quiescent;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(
        workers: usize,
        threshold_ms: u64,
    ) -> (QuiescenceDetector, Arc<WorkerStates>, Arc<Frontier>) {
        let states = Arc::new(WorkerStates::new(workers));
        let frontier = Arc::new(Frontier::new(workers));
        let detector = QuiescenceDetector::new(
            Arc::clone(&states),
            Arc::clone(&frontier),
            Duration::from_millis(threshold_ms),
            Duration::from_millis(5),
        );
        (detector, states, frontier)
    }

    #[tokio::test]
    async fn test_idle_pool_becomes_quiescent() {
        let started = Instant::now();
        let (detector, _states, _frontier) = detector(3, 30);

        let outcome = detector.run(CancellationToken::new()).await;

        assert_eq!(outcome, DetectorOutcome::Quiescent);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_busy_worker_blocks_quiescence() {
        let (detector, states, _frontier) = detector(3, 20);
        let slot = states.slot(1).unwrap();
        slot.mark_busy();

        let result = tokio::time::timeout(
            Duration::from_millis(100),
            detector.run(CancellationToken::new()),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_recent_activity_resets_debounce() {
        let (detector, states, _frontier) = detector(2, 40);
        let slot = states.slot(0).unwrap();

        let start = Instant::now();
        assert!(!detector.is_quiescent(start));
        assert!(detector.is_quiescent(start + Duration::from_millis(40)));

        slot.mark_busy();
        slot.mark_idle();
        assert!(!detector.is_quiescent(Instant::now()));
        assert!(detector.is_quiescent(Instant::now() + Duration::from_millis(40)));
    }

    #[tokio::test]
    async fn test_outstanding_work_blocks_quiescence() {
        let (detector, _states, frontier) = detector(2, 10);
        frontier.admit("queued");

        let later = Instant::now() + Duration::from_secs(1);
        assert!(!detector.is_quiescent(later));

        let _ = frontier.next().await;
        frontier.settle();
        assert!(detector.is_quiescent(later));
    }

    #[tokio::test]
    async fn test_cancel_stops_detector() {
        let (detector, states, _frontier) = detector(1, 20);
        states.slot(0).unwrap().mark_busy();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(detector.run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let outcome = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, DetectorOutcome::Cancelled);
    }
}
