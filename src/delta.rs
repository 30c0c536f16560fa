//! # Position Delta
//!
//! Offset between the local reference GPS and the remote reported
//! position, in signed integer micro-degree units (degrees × 1e5).
//!
//! The delta is only recomputed when a valid remote fix arrives while
//! the reference GPS has a valid reading. When the reference is
//! unavailable the previous value is retained unchanged (stale-delta
//! policy, not an error); `computed_at` lets callers tell a freshly
//! computed delta from a retained one.

use std::time::Instant;

use crate::record::TelemetryRecord;
use crate::reference::ReferenceFix;

/// Degrees-to-integer scale factor (1e-5 degree resolution)
const DELTA_SCALE: f64 = 100_000.0;

/// Last computed reference-to-remote offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionDelta {
    /// (reference latitude - remote latitude) × 1e5, truncated
    pub delta_lat: i64,

    /// (reference longitude - remote longitude) × 1e5, truncated
    pub delta_lon: i64,

    /// When the delta was last actually computed; `None` until the first
    /// computation, retained across reference outages
    pub computed_at: Option<Instant>,
}

impl PositionDelta {
    /// Recompute the delta from a valid remote record and a reference
    /// reading. Returns false (value retained) when either side is
    /// unusable.
    pub fn update(
        &mut self,
        reference: Option<ReferenceFix>,
        record: &TelemetryRecord,
        now: Instant,
    ) -> bool {
        if !record.fix_valid {
            return false;
        }

        let Some(reference) = reference else {
            return false;
        };

        self.delta_lat = ((reference.latitude - record.latitude) * DELTA_SCALE) as i64;
        self.delta_lon = ((reference.longitude - record.longitude) * DELTA_SCALE) as i64;
        self.computed_at = Some(now);
        true
    }

    /// True if the delta has ever been computed.
    pub fn is_computed(&self) -> bool {
        self.computed_at.is_some()
    }
}
