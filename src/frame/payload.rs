//! # Wire Payload Schema
//!
//! The JSON body carried inside every frame, as sent by the remote
//! tracker unit. All keys are required; a body missing any of them is
//! rejected at decode time instead of propagating a half-filled record.

use serde::{Deserialize, Serialize};

/// Flat key/value payload sent by the remote unit.
///
/// Field names match the wire keys exactly, so this struct doubles as
/// the serde schema: deserialization fails on any missing key, which
/// the codec maps to [`FrameError::MalformedPayload`].
///
/// [`FrameError::MalformedPayload`]: crate::error::FrameError::MalformedPayload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerPayload {
    /// Remote unit identifier (4-char string by convention)
    pub uid: String,

    /// GPS fix flag as reported by the remote receiver
    pub fix: bool,

    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees. Exactly 0 is treated as an uninitialized
    /// reading, not a real fix.
    pub lon: f64,

    /// Altitude in meters
    pub alt: f64,

    /// Ground speed
    pub spd: f64,

    /// Course over ground in degrees
    pub cog: f64,

    /// Battery voltage in volts
    pub bat: f64,

    /// GPS datetime string, accepted verbatim
    pub gdt: String,
}
