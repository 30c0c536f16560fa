//! # LoRa Base Library
//!
//! Ground-station side of a LoRa-linked GPS tracker: receive telemetry
//! frames from a remote unit, track fix validity over time, and fan the
//! position out to an MQTT broker, a satellite relay, a status web
//! endpoint, and a durable CSV log.

pub mod channels;
pub mod config;
pub mod delta;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod fix;
pub mod frame;
pub mod led;
pub mod radio;
pub mod record;
pub mod reference;
pub mod status;
pub mod watchdog;
