//! State module for tracking crawl progress
//!
//! This module provides the small pieces of shared state that the crawl
//! engine coordinates through.
//!
//! # Components
//!
//! - `WorkerStates`: per-worker busy/idle records read by the quiescence detector
//! - `WorkerSlot`: the single-writer handle a worker uses to update its own record
//! - `StopHandle`: the process-wide cancellation signal and its terminal reason

mod stop;
mod worker_state;

// Re-export main types
pub use stop::{RunStatus, StopHandle, StopReason};
pub use worker_state::{WorkerSlot, WorkerState, WorkerStates};
