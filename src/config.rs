//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::fix::InvalidFramePolicy;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub base: BaseConfig,
    pub timing: TimingConfig,
    pub radio: RadioConfig,
    pub relay: RelayConfig,
    pub broker: BrokerConfig,
    pub web: WebConfig,
    pub storage: StorageConfig,
}

/// Unit identity
#[derive(Debug, Deserialize, Clone)]
pub struct BaseConfig {
    #[serde(default = "default_unit_id")]
    pub id: String,

    #[serde(default = "default_sw_version")]
    pub sw_version: String,

    #[serde(default = "default_hw_version")]
    pub hw_version: String,
}

/// Loop and task cadences
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    /// Sleep between loop ticks
    #[serde(default = "default_nap_ms")]
    pub nap_ms: u64,

    /// Broker publish interval
    #[serde(default = "default_broker_interval_ms")]
    pub broker_interval_ms: u64,

    /// Relay send interval
    #[serde(default = "default_relay_interval_ms")]
    pub relay_interval_ms: u64,

    /// Status indicator refresh interval
    #[serde(default = "default_indicator_interval_ms")]
    pub indicator_interval_ms: u64,

    /// Age after which a held fix is reported stale
    #[serde(default = "default_stale_after_s")]
    pub stale_after_s: u64,

    /// Age after which a held fix is discarded entirely
    #[serde(default = "default_fix_timeout_s")]
    pub fix_timeout_s: u64,

    /// Handling of non-fix frames while a fix is held
    #[serde(default)]
    pub invalid_frame_policy: PolicyName,
}

/// Serde-facing name for [`InvalidFramePolicy`]
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyName {
    #[default]
    Ignore,
    Drop,
}

impl From<PolicyName> for InvalidFramePolicy {
    fn from(name: PolicyName) -> Self {
        match name {
            PolicyName::Ignore => InvalidFramePolicy::Ignore,
            PolicyName::Drop => InvalidFramePolicy::Drop,
        }
    }
}

/// Radio bridge socket
#[derive(Debug, Deserialize, Clone)]
pub struct RadioConfig {
    #[serde(default = "default_radio_bind")]
    pub bind_addr: String,
}

/// Satellite tracker serial port
#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    #[serde(default = "default_relay_enabled")]
    pub enabled: bool,

    #[serde(default = "default_relay_port")]
    pub port: String,

    #[serde(default = "default_relay_baud")]
    pub baud_rate: u32,

    #[serde(default = "default_relay_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// MQTT broker
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerConfig {
    #[serde(default = "default_broker_enabled")]
    pub enabled: bool,

    #[serde(default = "default_broker_host")]
    pub host: String,

    #[serde(default = "default_broker_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_broker_topic")]
    pub topic: String,
}

/// Status web endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_enabled")]
    pub enabled: bool,

    #[serde(default = "default_web_bind")]
    pub bind_addr: String,
}

/// Durable CSV log
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Default value functions
fn default_unit_id() -> String { "BSE1".to_string() }
fn default_sw_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
fn default_hw_version() -> String { "0.1".to_string() }

fn default_nap_ms() -> u64 { 5 }
fn default_broker_interval_ms() -> u64 { 30_000 }
fn default_relay_interval_ms() -> u64 { 60_000 }
fn default_indicator_interval_ms() -> u64 { 10 }
fn default_stale_after_s() -> u64 { 10 }
fn default_fix_timeout_s() -> u64 { 30 }

fn default_radio_bind() -> String { "0.0.0.0:1700".to_string() }

fn default_relay_enabled() -> bool { true }
fn default_relay_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_relay_baud() -> u32 { 19_200 }
fn default_relay_read_timeout_ms() -> u64 { 100 }

fn default_broker_enabled() -> bool { true }
fn default_broker_host() -> String { "127.0.0.1".to_string() }
fn default_broker_port() -> u16 { 1883 }
fn default_broker_topic() -> String { "loratracker/feed".to_string() }

fn default_web_enabled() -> bool { true }
fn default_web_bind() -> String { "0.0.0.0:8080".to_string() }

fn default_storage_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, TOML parsing fails, or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.base.id.is_empty() {
            return Err(crate::error::BaseError::Config(
                toml::de::Error::custom("base id cannot be empty")
            ));
        }

        if self.timing.nap_ms == 0 || self.timing.nap_ms > 1000 {
            return Err(crate::error::BaseError::Config(
                toml::de::Error::custom("nap_ms must be between 1 and 1000")
            ));
        }

        for (name, value) in [
            ("broker_interval_ms", self.timing.broker_interval_ms),
            ("relay_interval_ms", self.timing.relay_interval_ms),
            ("indicator_interval_ms", self.timing.indicator_interval_ms),
        ] {
            if value == 0 {
                return Err(crate::error::BaseError::Config(
                    toml::de::Error::custom(format!("{} must be greater than 0", name))
                ));
            }
        }

        if self.timing.stale_after_s == 0 {
            return Err(crate::error::BaseError::Config(
                toml::de::Error::custom("stale_after_s must be greater than 0")
            ));
        }

        if self.timing.fix_timeout_s < self.timing.stale_after_s {
            return Err(crate::error::BaseError::Config(
                toml::de::Error::custom("fix_timeout_s must be at least stale_after_s")
            ));
        }

        if self.radio.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(crate::error::BaseError::Config(
                toml::de::Error::custom("radio bind_addr must be a socket address")
            ));
        }

        if self.relay.enabled && self.relay.port.is_empty() {
            return Err(crate::error::BaseError::Config(
                toml::de::Error::custom("relay port cannot be empty when enabled")
            ));
        }

        if self.broker.enabled && self.broker.host.is_empty() {
            return Err(crate::error::BaseError::Config(
                toml::de::Error::custom("broker host cannot be empty when enabled")
            ));
        }

        if self.broker.enabled && self.broker.topic.is_empty() {
            return Err(crate::error::BaseError::Config(
                toml::de::Error::custom("broker topic cannot be empty when enabled")
            ));
        }

        if self.web.enabled && self.web.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(crate::error::BaseError::Config(
                toml::de::Error::custom("web bind_addr must be a socket address")
            ));
        }

        if self.storage.enabled && self.storage.log_dir.is_empty() {
            return Err(crate::error::BaseError::Config(
                toml::de::Error::custom("storage log_dir cannot be empty when enabled")
            ));
        }

        Ok(())
    }

    /// Loop tick sleep duration
    pub fn nap(&self) -> Duration {
        Duration::from_millis(self.timing.nap_ms)
    }

    /// Broker publish interval
    pub fn broker_interval(&self) -> Duration {
        Duration::from_millis(self.timing.broker_interval_ms)
    }

    /// Relay send interval
    pub fn relay_interval(&self) -> Duration {
        Duration::from_millis(self.timing.relay_interval_ms)
    }

    /// Indicator refresh interval
    pub fn indicator_interval(&self) -> Duration {
        Duration::from_millis(self.timing.indicator_interval_ms)
    }

    /// Fix staleness threshold
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.timing.stale_after_s)
    }

    /// Fix discard timeout
    pub fn fix_timeout(&self) -> Duration {
        Duration::from_secs(self.timing.fix_timeout_s)
    }
}
