//! # Watchdog Port
//!
//! The supervisory timer that restarts the process if the loop stalls
//! is an external collaborator (hardware WDT or an init-system timer).
//! The loop's only obligation is to feed it once per tick as proof of
//! liveness, and to keep every tick bounded so a restart is always safe.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Liveness seam fed once per loop tick.
pub trait Watchdog: Send {
    fn feed(&mut self);
}

/// Software watchdog: records the last feed time so a monitor (another
/// thread, a health endpoint, tests) can detect a stalled loop.
#[derive(Debug, Clone)]
pub struct SoftWatchdog {
    last_feed: Arc<RwLock<Instant>>,
    timeout: Duration,
}

impl SoftWatchdog {
    pub fn new(timeout: Duration) -> Self {
        Self {
            last_feed: Arc::new(RwLock::new(Instant::now())),
            timeout,
        }
    }

    /// True when the loop has not fed within the timeout.
    pub fn is_starved(&self, now: Instant) -> bool {
        let last = *self.last_feed.read().expect("watchdog lock poisoned");
        now.saturating_duration_since(last) > self.timeout
    }
}

impl Watchdog for SoftWatchdog {
    fn feed(&mut self) {
        *self.last_feed.write().expect("watchdog lock poisoned") = Instant::now();
    }
}
