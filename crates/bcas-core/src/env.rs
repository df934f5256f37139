//! Environment abstraction.
//!
//! The card only needs a clock: records are stamped when their response
//! arrives and latency is measured when a lookup consumes them. Production
//! code uses [`SystemEnv`]; tests drive a manual clock so latency figures
//! are exact.

use std::time::Instant;

/// Source of time for the card.
pub trait Environment: Clone {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
