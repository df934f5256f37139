//! Manually driven clock.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use bcas_core::Environment;

/// Clock that only moves when told to.
///
/// Clones share the same clock, so a test can hold one handle and advance
/// time under a card that owns another.
#[derive(Debug, Clone)]
pub struct SimEnv {
    start: Instant,
    elapsed_nanos: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock starting at the current instant.
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed_nanos: Arc::new(AtomicU64::new(0)) }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Time advanced since creation.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }
}
