//! # Telemetry Record
//!
//! The decoded, enriched data model produced once per valid received
//! frame. Immutable by convention: the engine replaces the latest record
//! wholesale instead of mutating it, so snapshot readers never see a
//! half-updated position.

use std::time::Instant;

use crate::frame::payload::TrackerPayload;

/// One decoded telemetry frame from the remote unit.
///
/// Only constructed from a frame that passed integrity verification.
/// When `fix_valid` is false the position fields still hold whatever the
/// remote sent, but they must not be forwarded as geospatial data — the
/// status publisher and broker/relay tasks all gate on `fix_valid`.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// Source unit identifier
    pub remote_id: String,

    /// True only if the remote reported a fix AND longitude is non-zero
    pub fix_valid: bool,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Altitude in meters
    pub altitude: f64,

    /// Ground speed
    pub speed: f64,

    /// Course over ground in degrees
    pub course: f64,

    /// Battery voltage in volts
    pub battery: f64,

    /// Remote unit's reported GPS datetime, verbatim
    pub timestamp: String,

    /// Received signal strength from the radio transport, attached at
    /// decode time (not part of the wire payload)
    pub link_rssi: i16,

    /// Local monotonic arrival time, used for staleness and logging
    pub received_at: Instant,
}

impl TelemetryRecord {
    /// Build a record from a verified payload plus link metadata.
    ///
    /// A zero longitude is treated as an uninitialized/garbage reading,
    /// so `fix_valid` is false even when the payload claims a fix.
    pub fn from_payload(payload: TrackerPayload, link_rssi: i16, received_at: Instant) -> Self {
        let fix_valid = payload.fix && payload.lon != 0.0;

        Self {
            remote_id: payload.uid,
            fix_valid,
            latitude: payload.lat,
            longitude: payload.lon,
            altitude: payload.alt,
            speed: payload.spd,
            course: payload.cog,
            battery: payload.bat,
            timestamp: payload.gdt,
            link_rssi,
            received_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(fix: bool, lon: f64) -> TrackerPayload {
        TrackerPayload {
            uid: "RMT1".to_string(),
            fix,
            lat: -33.5,
            lon,
            alt: 120.0,
            spd: 5.0,
            cog: 90.0,
            bat: 3.7,
            gdt: "2024-01-01T00:00:00".to_string(),
        }
    }

    #[test]
    fn test_fix_valid_requires_nonzero_longitude() {
        let record = TelemetryRecord::from_payload(payload(true, 0.0), -90, Instant::now());
        assert!(!record.fix_valid, "zero longitude must never count as a fix");
    }

    #[test]
    fn test_fix_valid_requires_fix_flag() {
        let record = TelemetryRecord::from_payload(payload(false, 151.2), -90, Instant::now());
        assert!(!record.fix_valid);
    }

    #[test]
    fn test_fix_valid_when_both_hold() {
        let record = TelemetryRecord::from_payload(payload(true, 151.2), -90, Instant::now());
        assert!(record.fix_valid);
        assert_eq!(record.remote_id, "RMT1");
        assert_eq!(record.link_rssi, -90);
    }
}
