//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Upload to storage node:
//!     → 5xx or transport error
//!     → backoff.rs (RetryPolicy decides, jittered exponential delay)
//! ```
//!
//! # Design Decisions
//! - Chain transactions are never resent blindly; only uploads retry
//! - Jittered backoff prevents hammering a struggling node

pub mod backoff;

pub use backoff::{calculate_backoff, RetryPolicy};
