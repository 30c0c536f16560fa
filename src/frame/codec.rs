//! # Frame Codec
//!
//! Encodes/decodes the wire frame exchanged with the remote unit.
//!
//! Frame layout:
//!
//! ```text
//! +----------------------+---------------------------+
//! | "0x" + 4 hex digits  | UTF-8 JSON body           |
//! | (6-byte CRC header)  | {"uid":...,"fix":...,...} |
//! +----------------------+---------------------------+
//! ```
//!
//! The header carries the CRC-16/XMODEM of the body as a 4-hex-digit
//! ASCII string. The transport is an unreliable datagram channel, so a
//! frame that fails any check is dropped, never retried — each call to
//! [`decode`] is pure and stateless.

use std::time::Instant;

use tracing::debug;

use super::crc::crc16_xmodem;
use super::payload::TrackerPayload;
use crate::error::FrameError;
use crate::record::TelemetryRecord;

/// Length of the ASCII integrity header ("0x" + 4 hex digits)
pub const HEADER_LEN: usize = 6;

/// Minimum decodable frame: header plus the smallest JSON body (`{}`)
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 2;

/// Decode one inbound frame into a [`TelemetryRecord`].
///
/// # Arguments
///
/// * `bytes` - Raw frame bytes as received from the radio transport
/// * `link_rssi` - Signal strength reported by the transport for this frame
/// * `received_at` - Local monotonic arrival time
///
/// # Errors
///
/// * [`FrameError::Truncated`] - frame shorter than [`MIN_FRAME_LEN`]
/// * [`FrameError::ChecksumMismatch`] - header CRC does not match the body
/// * [`FrameError::MalformedPayload`] - body is not JSON with all required keys
pub fn decode(
    bytes: &[u8],
    link_rssi: i16,
    received_at: Instant,
) -> Result<TelemetryRecord, FrameError> {
    if bytes.len() < MIN_FRAME_LEN {
        return Err(FrameError::Truncated {
            len: bytes.len(),
            min: MIN_FRAME_LEN,
        });
    }

    let (header, body) = bytes.split_at(HEADER_LEN);
    let calculated = crc16_xmodem(body);

    match parse_header(header) {
        Some(received) if received == calculated => {}
        _ => {
            return Err(FrameError::ChecksumMismatch {
                calculated,
                header: String::from_utf8_lossy(header).into_owned(),
            });
        }
    }

    let payload: TrackerPayload = serde_json::from_slice(body).map_err(|e| {
        // Keep the raw bytes around for diagnosis; the frame itself is dropped
        debug!("malformed payload: {:?}", String::from_utf8_lossy(body));
        FrameError::MalformedPayload(e.to_string())
    })?;

    Ok(TelemetryRecord::from_payload(payload, link_rssi, received_at))
}

/// Encode a payload into a complete frame (header + JSON body).
///
/// The inverse of [`decode`]; the base station itself never transmits
/// telemetry frames, but the encoder keeps the wire format in one place
/// for tests and bench tooling.
pub fn encode(payload: &TrackerPayload) -> Vec<u8> {
    // TrackerPayload contains no map types, so serialization cannot fail
    let body = serde_json::to_vec(payload).expect("payload serialization is infallible");
    let crc = crc16_xmodem(&body);

    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(format!("0x{:04x}", crc).as_bytes());
    frame.extend_from_slice(&body);
    frame
}

/// Parse the 6-byte ASCII header into its carried CRC value.
fn parse_header(header: &[u8]) -> Option<u16> {
    let text = std::str::from_utf8(header).ok()?;
    let hex = text.strip_prefix("0x")?;
    u16::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> TrackerPayload {
        TrackerPayload {
            uid: "RMT1".to_string(),
            fix: true,
            lat: -33.5,
            lon: 151.2,
            alt: 120.0,
            spd: 5.0,
            cog: 90.0,
            bat: 3.7,
            gdt: "2024-01-01T00:00:00".to_string(),
        }
    }

    #[test]
    fn test_decode_truncated_inputs_never_panic() {
        // Every input shorter than the minimum is Truncated, not a panic
        let frame = encode(&sample_payload());
        for len in 0..MIN_FRAME_LEN {
            let result = decode(&frame[..len], 0, Instant::now());
            assert_eq!(
                result.unwrap_err(),
                FrameError::Truncated {
                    len,
                    min: MIN_FRAME_LEN
                }
            );
        }
    }

    #[test]
    fn test_decode_roundtrip() {
        let payload = sample_payload();
        let frame = encode(&payload);
        let record = decode(&frame, -87, Instant::now()).unwrap();

        assert_eq!(record.remote_id, "RMT1");
        assert!(record.fix_valid);
        assert_eq!(record.latitude, -33.5);
        assert_eq!(record.longitude, 151.2);
        assert_eq!(record.altitude, 120.0);
        assert_eq!(record.speed, 5.0);
        assert_eq!(record.course, 90.0);
        assert_eq!(record.battery, 3.7);
        assert_eq!(record.timestamp, "2024-01-01T00:00:00");
        assert_eq!(record.link_rssi, -87);
    }

    #[test]
    fn test_decode_corrupted_body_is_checksum_mismatch() {
        let frame = encode(&sample_payload());

        // Corrupt each body byte in turn; every variant must fail the CRC
        for i in HEADER_LEN..frame.len() {
            let mut corrupted = frame.clone();
            corrupted[i] ^= 0xFF;
            let result = decode(&corrupted, 0, Instant::now());
            assert!(
                matches!(result, Err(FrameError::ChecksumMismatch { .. })),
                "byte {} corruption not caught: {:?}",
                i,
                result
            );
        }
    }

    #[test]
    fn test_decode_garbage_header_is_checksum_mismatch() {
        let mut frame = encode(&sample_payload());
        frame[0] = 0xFE; // non-ASCII header byte

        let result = decode(&frame, 0, Instant::now());
        assert!(matches!(result, Err(FrameError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_decode_missing_key_is_malformed_payload() {
        // Valid CRC over a body that lacks the required "bat" key
        let body = br#"{"uid":"RMT1","fix":true,"lat":-33.5,"lon":151.2,"alt":120,"spd":5,"cog":90,"gdt":"x"}"#;
        let mut frame = format!("0x{:04x}", crc16_xmodem(body)).into_bytes();
        frame.extend_from_slice(body);

        let result = decode(&frame, 0, Instant::now());
        assert!(matches!(result, Err(FrameError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_zero_longitude_clears_fix() {
        let mut payload = sample_payload();
        payload.lon = 0.0;
        let frame = encode(&payload);

        let record = decode(&frame, 0, Instant::now()).unwrap();
        assert!(!record.fix_valid, "fix must be invalid when lon == 0");
    }

    #[test]
    fn test_header_format() {
        let frame = encode(&sample_payload());
        assert_eq!(&frame[..2], b"0x");
        assert!(frame[2..HEADER_LEN]
            .iter()
            .all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_parse_header_rejects_bad_hex() {
        assert_eq!(parse_header(b"0xZZZZ"), None);
        assert_eq!(parse_header(b"123456"), None);
        assert_eq!(parse_header(b"0x1a2b"), Some(0x1a2b));
    }
}
