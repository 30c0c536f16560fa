//! # Error Types
//!
//! Error taxonomy for the base station using `thiserror`.
//!
//! Three classes with different propagation rules:
//!
//! - [`FrameError`] — a bad inbound frame. Non-fatal: drop the frame,
//!   bump a counter, keep receiving.
//! - [`DispatchError`] — a downstream channel (broker, relay) refused a
//!   message. Non-fatal: logged, and the owning task backs off to its
//!   normal interval.
//! - [`BaseError`] — startup-only failures (config, storage, serial).
//!   These abort startup, never the steady-state loop.

use thiserror::Error;

/// Errors produced while decoding an inbound radio frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Frame shorter than the minimum header + body length
    #[error("frame truncated: {len} bytes, minimum is {min}")]
    Truncated { len: usize, min: usize },

    /// Integrity header did not match the CRC computed over the body
    #[error("checksum mismatch: calculated 0x{calculated:04x}, header {header:?}")]
    ChecksumMismatch { calculated: u16, header: String },

    /// Body was not valid UTF-8 JSON or was missing a required key
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Errors produced by a scheduled dispatch action.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Downstream channel is down or its queue is full
    #[error("channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// Downstream channel did not accept the message in time
    #[error("channel timeout: {0}")]
    Timeout(String),
}

/// Fatal startup errors. No safe continuation, so these abort the process
/// before the receive loop starts.
#[derive(Debug, Error)]
pub enum BaseError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Log storage could not be prepared
    #[error("storage error: {0}")]
    Storage(String),

    /// Relay serial port errors
    #[error("serial error: {0}")]
    Serial(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for startup and setup paths
pub type Result<T> = std::result::Result<T, BaseError>;
