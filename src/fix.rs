//! # GPS Fix Tracker
//!
//! State machine tracking fix validity, last-fix timestamp, and
//! staleness across time.
//!
//! ```text
//! NoFix --valid observe--> Fresh --stale_after--> Stale --fix_timeout--> NoFix
//!   ^                        ^                      |
//!   |                        +----valid observe-----+
//!   +--("drop" policy, non-fix observe)
//! ```
//!
//! The time-based transitions are driven by [`FixTracker::refresh`],
//! which the engine calls every tick whether or not a frame arrived — a
//! remote that goes quiet must still expire.

use std::time::{Duration, Instant};

use crate::record::TelemetryRecord;

/// Fix validity state, re-evaluated every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixState {
    /// No usable fix has been observed (or the last one timed out)
    NoFix,
    /// A valid fix was observed within `stale_after`
    Fresh,
    /// A valid fix exists but has not been refreshed within `stale_after`
    Stale,
}

/// What to do when a frame with `fix_valid == false` arrives while a
/// fix is held.
///
/// The two deployed firmware generations disagreed here: one cleared
/// the fix flag on every non-fix frame, the other let the timeout
/// expire it. Both behaviors remain available as a policy choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidFramePolicy {
    /// Leave the held fix alone; only the timeout can expire it
    #[default]
    Ignore,
    /// Force `NoFix` immediately on any non-fix frame
    Drop,
}

/// Tracks GPS fix validity for the remote unit.
///
/// Single writer: only the decode/dispatch loop calls `observe` and
/// `refresh`. Readers take [`FixState`] by value.
#[derive(Debug)]
pub struct FixTracker {
    state: FixState,
    last_fix: Option<Instant>,
    stale_after: Duration,
    fix_timeout: Duration,
    policy: InvalidFramePolicy,
}

impl FixTracker {
    /// Create a tracker in the `NoFix` state.
    ///
    /// # Arguments
    ///
    /// * `stale_after` - age after which a held fix is reported stale
    /// * `fix_timeout` - age after which a held fix is discarded entirely
    /// * `policy` - handling of non-fix frames while a fix is held
    pub fn new(stale_after: Duration, fix_timeout: Duration, policy: InvalidFramePolicy) -> Self {
        Self {
            state: FixState::NoFix,
            last_fix: None,
            stale_after,
            fix_timeout,
            policy,
        }
    }

    /// Feed one decoded record into the state machine.
    pub fn observe(&mut self, record: &TelemetryRecord, now: Instant) {
        if record.fix_valid {
            self.state = FixState::Fresh;
            self.last_fix = Some(now);
        } else if self.policy == InvalidFramePolicy::Drop {
            self.state = FixState::NoFix;
            self.last_fix = None;
        }
    }

    /// Re-evaluate the time-based transitions.
    ///
    /// Runs every scheduler tick, independent of frame arrival.
    pub fn refresh(&mut self, now: Instant) {
        let Some(last_fix) = self.last_fix else {
            return;
        };

        let age = now.saturating_duration_since(last_fix);
        if age > self.fix_timeout {
            self.state = FixState::NoFix;
            self.last_fix = None;
        } else if age > self.stale_after && self.state == FixState::Fresh {
            self.state = FixState::Stale;
        }
    }

    /// Current state without re-evaluating timers.
    pub fn state(&self) -> FixState {
        self.state
    }

    /// True while a fix (fresh or stale) is held.
    pub fn is_valid(&self) -> bool {
        self.state != FixState::NoFix
    }

    /// Whether the held fix would be stale at `now`.
    pub fn is_stale(&self, now: Instant) -> bool {
        match self.last_fix {
            Some(last_fix) => now.saturating_duration_since(last_fix) > self.stale_after,
            None => false,
        }
    }

    /// Monotonic time of the most recent valid fix, if one is held.
    pub fn last_fix(&self) -> Option<Instant> {
        self.last_fix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::payload::TrackerPayload;
    use crate::record::TelemetryRecord;

    fn record(fix: bool) -> TelemetryRecord {
        let payload = TrackerPayload {
            uid: "RMT1".to_string(),
            fix,
            lat: -33.5,
            lon: if fix { 151.2 } else { 0.0 },
            alt: 120.0,
            spd: 5.0,
            cog: 90.0,
            bat: 3.7,
            gdt: String::new(),
        };
        TelemetryRecord::from_payload(payload, -90, Instant::now())
    }

    fn tracker(policy: InvalidFramePolicy) -> FixTracker {
        FixTracker::new(Duration::from_secs(10), Duration::from_secs(30), policy)
    }

    #[test]
    fn test_initial_state_is_no_fix() {
        let t = tracker(InvalidFramePolicy::Ignore);
        assert_eq!(t.state(), FixState::NoFix);
        assert!(!t.is_valid());
        assert!(t.last_fix().is_none());
    }

    #[test]
    fn test_staleness_threshold() {
        let t0 = Instant::now();
        let mut t = tracker(InvalidFramePolicy::Ignore);

        t.observe(&record(true), t0);
        assert!(!t.is_stale(t0 + Duration::from_secs(9)));
        assert!(t.is_stale(t0 + Duration::from_secs(11)));
    }

    #[test]
    fn test_fresh_to_stale_transition() {
        let t0 = Instant::now();
        let mut t = tracker(InvalidFramePolicy::Ignore);

        t.observe(&record(true), t0);
        assert_eq!(t.state(), FixState::Fresh);

        t.refresh(t0 + Duration::from_secs(11));
        assert_eq!(t.state(), FixState::Stale);
        assert!(t.is_valid(), "stale fix still counts as held");
    }

    #[test]
    fn test_stale_to_no_fix_on_timeout() {
        let t0 = Instant::now();
        let mut t = tracker(InvalidFramePolicy::Ignore);

        t.observe(&record(true), t0);
        t.refresh(t0 + Duration::from_secs(31));
        assert_eq!(t.state(), FixState::NoFix);
        assert!(t.last_fix().is_none());
    }

    #[test]
    fn test_new_observation_resets_staleness() {
        let t0 = Instant::now();
        let mut t = tracker(InvalidFramePolicy::Ignore);

        t.observe(&record(true), t0);
        t.refresh(t0 + Duration::from_secs(11));
        assert_eq!(t.state(), FixState::Stale);

        let t1 = t0 + Duration::from_secs(12);
        t.observe(&record(true), t1);
        assert_eq!(t.state(), FixState::Fresh);
        assert!(!t.is_stale(t1 + Duration::from_secs(9)));
    }

    #[test]
    fn test_ignore_policy_keeps_fix_on_bad_frame() {
        let t0 = Instant::now();
        let mut t = tracker(InvalidFramePolicy::Ignore);

        t.observe(&record(true), t0);
        t.observe(&record(false), t0 + Duration::from_secs(1));
        assert_eq!(t.state(), FixState::Fresh);
    }

    #[test]
    fn test_drop_policy_clears_fix_on_bad_frame() {
        let t0 = Instant::now();
        let mut t = tracker(InvalidFramePolicy::Drop);

        t.observe(&record(true), t0);
        t.observe(&record(false), t0 + Duration::from_secs(1));
        assert_eq!(t.state(), FixState::NoFix);
        assert!(t.last_fix().is_none());
    }

    #[test]
    fn test_refresh_without_fix_is_noop() {
        let mut t = tracker(InvalidFramePolicy::Ignore);
        t.refresh(Instant::now());
        assert_eq!(t.state(), FixState::NoFix);
    }
}
