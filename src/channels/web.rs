//! # Status Web Endpoint
//!
//! Single read-only route: `GET /gps.json` returns the latest GeoJSON
//! snapshot, or `{}` while no fix has ever been observed. No errors are
//! surfaced through this interface — a broken pipeline simply shows
//! stale or absent data.

use std::net::SocketAddr;

use tracing::info;
use warp::Filter;

use crate::status::StatusPublisher;

/// Build the route serving the status snapshot.
pub fn gps_route(
    status: StatusPublisher,
) -> impl Filter<Extract = (warp::reply::Json,), Error = warp::Rejection> + Clone {
    warp::path!("gps.json")
        .and(warp::get())
        .map(move || warp::reply::json(&status.snapshot_json()))
}

/// Serve the status endpoint until the process exits.
pub async fn serve(status: StatusPublisher, addr: SocketAddr) {
    info!("status endpoint listening on http://{}/gps.json", addr);
    warp::serve(gps_route(status)).run(addr).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::payload::TrackerPayload;
    use crate::record::TelemetryRecord;
    use std::time::Instant;

    fn valid_record() -> TelemetryRecord {
        let payload = TrackerPayload {
            uid: "RMT1".to_string(),
            fix: true,
            lat: -33.5,
            lon: 151.2,
            alt: 120.0,
            spd: 5.0,
            cog: 90.0,
            bat: 3.7,
            gdt: "2024-01-01T00:00:00".to_string(),
        };
        TelemetryRecord::from_payload(payload, -87, Instant::now())
    }

    #[tokio::test]
    async fn test_empty_sentinel_before_first_fix() {
        let status = StatusPublisher::new();
        let route = gps_route(status);

        let response = warp::test::request()
            .method("GET")
            .path("/gps.json")
            .reply(&route)
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), b"{}");
    }

    #[tokio::test]
    async fn test_feature_served_after_fix() {
        let status = StatusPublisher::new();
        status.publish(&valid_record());
        let route = gps_route(status);

        let response = warp::test::request()
            .method("GET")
            .path("/gps.json")
            .reply(&route)
            .await;

        assert_eq!(response.status(), 200);
        let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["geometry"]["coordinates"][0], 151.2);
        assert_eq!(json["geometry"]["coordinates"][1], -33.5);
    }

    #[tokio::test]
    async fn test_other_paths_rejected() {
        let status = StatusPublisher::new();
        let route = gps_route(status);

        let response = warp::test::request()
            .method("GET")
            .path("/other.json")
            .reply(&route)
            .await;

        assert_eq!(response.status(), 404);
    }
}
