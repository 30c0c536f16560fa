//! # Status Publisher
//!
//! Renders the latest telemetry record as a GeoJSON-like Feature for the
//! read-only web endpoint, and caches it behind a shared handle.
//!
//! Correctness requirement: a consumer must never receive `(0,0)` or a
//! last-known-bad position silently labeled as current. Until a valid
//! fix has been observed the snapshot is an explicit empty object.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::record::TelemetryRecord;

/// GeoJSON point geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `[longitude, latitude]` per GeoJSON ordering
    pub coordinates: [f64; 2],
}

/// Properties attached to the feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Properties {
    pub remote_id: String,
    pub altitude: f64,
    pub speed: f64,
    pub course: f64,
    pub battery: f64,
    pub rssi: i16,
    pub datetime: String,
}

/// GeoJSON Feature built from one valid telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFeature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: Geometry,
    pub properties: Properties,
}

impl GeoFeature {
    /// Build a feature from a record.
    ///
    /// Returns `None` for records without a valid fix — their
    /// coordinates are not meaningful and must not be published.
    pub fn from_record(record: &TelemetryRecord) -> Option<Self> {
        if !record.fix_valid {
            return None;
        }

        Some(Self {
            kind: "Feature",
            geometry: Geometry {
                kind: "Point",
                coordinates: [record.longitude, record.latitude],
            },
            properties: Properties {
                remote_id: record.remote_id.clone(),
                altitude: record.altitude,
                speed: record.speed,
                course: record.course,
                battery: record.battery,
                rssi: record.link_rssi,
                datetime: record.timestamp.clone(),
            },
        })
    }
}

/// Shared cache of the latest GeoJSON snapshot.
///
/// The dispatch loop is the only writer; the web endpoint task reads
/// clones (copy-on-read, never references into live state).
#[derive(Debug, Clone, Default)]
pub struct StatusPublisher {
    inner: Arc<RwLock<Option<GeoFeature>>>,
}

impl StatusPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached snapshot if the record carries a valid fix;
    /// a non-fix record leaves the previous snapshot in place.
    pub fn publish(&self, record: &TelemetryRecord) {
        if let Some(feature) = GeoFeature::from_record(record) {
            *self.inner.write().expect("status lock poisoned") = Some(feature);
        }
    }

    /// Latest snapshot, or `None` while no fix has ever been observed.
    pub fn snapshot(&self) -> Option<GeoFeature> {
        self.inner.read().expect("status lock poisoned").clone()
    }

    /// Snapshot as the JSON value served by the web endpoint: the
    /// feature, or the `{}` sentinel before the first fix.
    pub fn snapshot_json(&self) -> serde_json::Value {
        match self.snapshot() {
            // GeoFeature serialization cannot fail (no map keys, no non-string keys)
            Some(feature) => serde_json::to_value(&feature)
                .unwrap_or_else(|_| serde_json::json!({})),
            None => serde_json::json!({}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::payload::TrackerPayload;
    use std::time::Instant;

    fn record(fix: bool, lat: f64, lon: f64) -> TelemetryRecord {
        let payload = TrackerPayload {
            uid: "RMT1".to_string(),
            fix,
            lat,
            lon,
            alt: 120.0,
            spd: 5.0,
            cog: 90.0,
            bat: 3.7,
            gdt: "2024-01-01T00:00:00".to_string(),
        };
        TelemetryRecord::from_payload(payload, -87, Instant::now())
    }

    #[test]
    fn test_snapshot_empty_before_first_fix() {
        let publisher = StatusPublisher::new();
        assert!(publisher.snapshot().is_none());
        assert_eq!(publisher.snapshot_json(), serde_json::json!({}));
    }

    #[test]
    fn test_no_fix_record_never_publishes_coordinates() {
        let publisher = StatusPublisher::new();
        publisher.publish(&record(false, 0.0, 0.0));

        // Still the explicit empty sentinel, never (0,0)
        assert_eq!(publisher.snapshot_json(), serde_json::json!({}));
    }

    #[test]
    fn test_valid_record_publishes_geojson_feature() {
        let publisher = StatusPublisher::new();
        publisher.publish(&record(true, -33.5, 151.2));

        let json = publisher.snapshot_json();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["geometry"]["type"], "Point");
        // GeoJSON order is [lon, lat]
        assert_eq!(json["geometry"]["coordinates"][0], 151.2);
        assert_eq!(json["geometry"]["coordinates"][1], -33.5);
        assert_eq!(json["properties"]["remote_id"], "RMT1");
        assert_eq!(json["properties"]["battery"], 3.7);
        assert_eq!(json["properties"]["rssi"], -87);
        assert_eq!(json["properties"]["datetime"], "2024-01-01T00:00:00");
    }

    #[test]
    fn test_bad_record_retains_previous_snapshot() {
        let publisher = StatusPublisher::new();
        publisher.publish(&record(true, -33.5, 151.2));
        publisher.publish(&record(false, 0.0, 0.0));

        let snapshot = publisher.snapshot().unwrap();
        assert_eq!(snapshot.geometry.coordinates, [151.2, -33.5]);
    }

    #[test]
    fn test_readers_share_one_cache() {
        let publisher = StatusPublisher::new();
        let reader = publisher.clone();

        publisher.publish(&record(true, -33.5, 151.2));
        assert!(reader.snapshot().is_some());
    }
}
