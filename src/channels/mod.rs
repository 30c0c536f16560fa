//! # Distribution Channels
//!
//! The three independent redistribution channels plus the satellite
//! relay, each behind its own adapter:
//!
//! - `web` — local read-only JSON status endpoint
//! - `broker` — cloud MQTT publish
//! - `logfile` — durable append-only CSV storage
//! - `relay` — satellite uplink + local reference GPS
//!
//! Channel failures are isolated: every adapter converts its downstream
//! errors into [`DispatchError`](crate::error::DispatchError) or a log
//! line, never a loop panic.

pub mod broker;
pub mod logfile;
pub mod relay;
pub mod web;
