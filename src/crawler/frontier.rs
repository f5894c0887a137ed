//! Frontier queue and visited set
//!
//! Workers are both the producers and the consumers of the frontier, so a
//! worker must never wait on its own enqueue: with every other worker busy
//! and the buffer full, nobody would be left to drain it. Admission tries a
//! non-blocking send first and hands anything that would block to a detached
//! helper task. Callers only ever see `admit`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

/// Every URL ever admitted to a crawl's frontier
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic test-and-set
    ///
    /// Returns true if the URL was already marked. Of any number of
    /// concurrent callers with the same URL, exactly one sees false.
    pub fn try_mark(&self, url: &str) -> bool {
        let mut seen = self.seen.lock().unwrap();
        if seen.contains(url) {
            return true;
        }
        seen.insert(url.to_string());
        false
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.lock().unwrap().contains(url)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bounded queue of URLs waiting to be fetched
#[derive(Debug)]
pub struct Frontier {
    visited: VisitedSet,
    sender: mpsc::Sender<String>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<String>>,
    closed: CancellationToken,
    outstanding: AtomicUsize,
    deferred: AtomicUsize,
}

impl Frontier {
    /// Creates a frontier whose buffer holds `capacity` URLs
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            visited: VisitedSet::new(),
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
            closed: CancellationToken::new(),
            outstanding: AtomicUsize::new(0),
            deferred: AtomicUsize::new(0),
        }
    }

    /// Admits a URL if it has never been seen
    ///
    /// Returns true if the URL was accepted. Rejection is the normal outcome
    /// for a page linked from several places and is not an error. Never
    /// waits: if the buffer is full the enqueue finishes on a helper task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn admit(&self, url: &str) -> bool {
        if self.is_closed() || self.visited.try_mark(url) {
            return false;
        }

        // Counted before it becomes visible so the count never reads zero
        // while the URL sits in the buffer.
        self.outstanding.fetch_add(1, Ordering::AcqRel);

        match self.sender.try_send(url.to_string()) {
            Ok(()) => true,
            Err(TrySendError::Full(url)) => {
                self.deferred.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(%url, "Frontier full, deferring enqueue");

                let sender = self.sender.clone();
                let closed = self.closed.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = closed.cancelled() => {}
                        result = sender.send(url) => {
                            if let Err(e) = result {
                                tracing::debug!(url = %e.0, "Frontier receiver gone, dropping URL");
                            }
                        }
                    }
                });
                true
            }
            Err(TrySendError::Closed(url)) => {
                tracing::debug!(%url, "Frontier receiver gone, rejecting URL");
                self.outstanding.fetch_sub(1, Ordering::AcqRel);
                false
            }
        }
    }

    /// Waits for the next URL to fetch
    ///
    /// Returns None once the frontier has been closed.
    pub async fn next(&self) -> Option<String> {
        let mut receiver = tokio::select! {
            _ = self.closed.cancelled() => return None,
            receiver = self.receiver.lock() => receiver,
        };

        tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            url = receiver.recv() => url,
        }
    }

    /// Marks one previously admitted URL as fully processed
    pub fn settle(&self) {
        let _ = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    /// Number of admitted URLs not yet settled (queued, deferred or in flight)
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Number of admissions that had to go through a helper task
    pub fn deferred_count(&self) -> usize {
        self.deferred.load(Ordering::Relaxed)
    }

    /// Number of distinct URLs ever admitted
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn was_admitted(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Closes the frontier; returns true for the call that closed it
    ///
    /// Waiting and future `next` calls return None, later admissions are
    /// rejected and pending helper tasks give up.
    pub fn close(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.closed.cancel();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_try_mark_once() {
        let visited = VisitedSet::new();
        assert!(!visited.try_mark("a"));
        assert!(visited.try_mark("a"));
        assert!(!visited.try_mark("A"));
        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn test_try_mark_single_winner_across_threads() {
        let visited = Arc::new(VisitedSet::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let visited = Arc::clone(&visited);
                std::thread::spawn(move || !visited.try_mark("contested"))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_admit_and_next() {
        let frontier = Frontier::new(2);
        assert!(frontier.admit("start"));
        assert!(!frontier.admit("start"));
        assert_eq!(frontier.outstanding(), 1);

        assert_eq!(frontier.next().await, Some("start".to_string()));
        frontier.settle();
        assert_eq!(frontier.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_admit_beyond_capacity_does_not_block() {
        let frontier = Frontier::new(1);
        for url in ["a", "b", "c", "d"] {
            assert!(frontier.admit(url));
        }
        assert_eq!(frontier.outstanding(), 4);
        assert!(frontier.deferred_count() >= 3);

        let mut drained = Vec::new();
        for _ in 0..4 {
            let url = tokio::time::timeout(Duration::from_secs(1), frontier.next())
                .await
                .unwrap()
                .unwrap();
            drained.push(url);
        }
        drained.sort();
        assert_eq!(drained, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_consumer() {
        let frontier = Arc::new(Frontier::new(1));
        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!frontier.is_closed());
        assert!(frontier.close());
        assert!(!frontier.close());
        assert!(frontier.is_closed());

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_admit_after_close_rejected() {
        let frontier = Frontier::new(1);
        frontier.close();
        assert!(!frontier.admit("late"));
        assert!(!frontier.was_admitted("late"));
        assert_eq!(frontier.next().await, None);
    }

    #[tokio::test]
    async fn test_settle_never_underflows() {
        let frontier = Frontier::new(1);
        frontier.settle();
        assert_eq!(frontier.outstanding(), 0);
    }
}
