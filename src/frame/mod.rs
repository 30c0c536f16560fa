//! # Wire Frame Module
//!
//! Implementation of the CRC-framed JSON payload exchanged with the
//! remote tracker unit over LoRa.
//!
//! This module handles:
//! - CRC-16/XMODEM checksum calculation
//! - The 6-byte ASCII integrity header
//! - Payload schema validation (required keys, typed fields)
//! - Frame encode/decode

pub mod codec;
pub mod crc;
pub mod payload;
