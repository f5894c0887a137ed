//! Process-wide cancellation signal for a crawl
//!
//! The status only ever moves forward: `Running` to exactly one of the
//! terminal states. The first transition wins and later calls are no-ops.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const RUNNING: u8 = 0;
const STOP_REQUESTED: u8 = 1;
const TIMED_OUT: u8 = 2;
const COMPLETED: u8 = 3;

/// Lifecycle status of a crawl as seen through its stop handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// Crawl has not been stopped
    Running,
    /// An external stop was requested
    StopRequested,
    /// The execution deadline fired
    TimedOut,
    /// The crawl finished on its own; stop requests are ignored from here on
    Completed,
}

impl RunStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            STOP_REQUESTED => Self::StopRequested,
            TIMED_OUT => Self::TimedOut,
            COMPLETED => Self::Completed,
            _ => Self::Running,
        }
    }
}

/// Why a crawl was terminated early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// `request_stop` was called
    Requested,
    /// The execution timeout elapsed
    TimedOut,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => write!(f, "stop requested"),
            Self::TimedOut => write!(f, "execution timeout"),
        }
    }
}

/// Cloneable handle used to stop a crawl from anywhere
#[derive(Debug, Clone)]
pub struct StopHandle {
    token: CancellationToken,
    status: Arc<AtomicU8>,
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StopHandle {
    /// Creates a handle in the `Running` state
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            status: Arc::new(AtomicU8::new(RUNNING)),
        }
    }

    /// Requests that the crawl stop
    ///
    /// Safe to call any number of times, before, during or after the crawl.
    /// Returns true only for the call that actually stopped a running crawl.
    pub fn request_stop(&self) -> bool {
        let stopped = self.transition(STOP_REQUESTED);
        if stopped {
            tracing::info!("Stop requested");
        }
        stopped
    }

    /// Marks the crawl as timed out
    pub(crate) fn time_out(&self) -> bool {
        let stopped = self.transition(TIMED_OUT);
        if stopped {
            tracing::warn!("Execution timeout reached");
        }
        stopped
    }

    /// Marks the crawl as finished so later stop requests do nothing
    pub(crate) fn complete(&self) -> bool {
        self.status
            .compare_exchange(RUNNING, COMPLETED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Current status
    pub fn status(&self) -> RunStatus {
        RunStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// The reason the crawl was stopped, if it was
    pub fn reason(&self) -> Option<StopReason> {
        match self.status() {
            RunStatus::StopRequested => Some(StopReason::Requested),
            RunStatus::TimedOut => Some(StopReason::TimedOut),
            RunStatus::Running | RunStatus::Completed => None,
        }
    }

    /// Returns true once a stop or timeout has fired
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once a stop or timeout has fired
    pub async fn stopped(&self) {
        self.token.cancelled().await
    }

    fn transition(&self, to: u8) -> bool {
        let won = self
            .status
            .compare_exchange(RUNNING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.token.cancel();
        }
        won
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handle_is_running() {
        let handle = StopHandle::new();
        assert_eq!(handle.status(), RunStatus::Running);
        assert_eq!(handle.reason(), None);
        assert!(!handle.is_stopped());
    }

    #[test]
    fn test_request_stop_is_idempotent() {
        let handle = StopHandle::new();
        assert!(handle.request_stop());
        assert!(!handle.request_stop());
        assert_eq!(handle.reason(), Some(StopReason::Requested));
        assert!(handle.is_stopped());
    }

    #[test]
    fn test_first_terminal_state_wins() {
        let handle = StopHandle::new();
        assert!(handle.time_out());
        assert!(!handle.request_stop());
        assert_eq!(handle.status(), RunStatus::TimedOut);
        assert_eq!(handle.reason(), Some(StopReason::TimedOut));
    }

    #[test]
    fn test_stop_after_completion_is_noop() {
        let handle = StopHandle::new();
        assert!(handle.complete());
        assert!(!handle.request_stop());
        assert_eq!(handle.status(), RunStatus::Completed);
        assert!(!handle.is_stopped());
    }

    #[test]
    fn test_clones_share_state() {
        let handle = StopHandle::new();
        let other = handle.clone();
        other.request_stop();
        assert!(handle.is_stopped());
    }

    #[tokio::test]
    async fn test_stopped_resolves_after_request() {
        let handle = StopHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.stopped().await });
        handle.request_stop();
        task.await.unwrap();
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(StopReason::Requested.to_string(), "stop requested");
        assert_eq!(StopReason::TimedOut.to_string(), "execution timeout");
    }
}
