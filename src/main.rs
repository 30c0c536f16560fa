//! # LoRa Base
//!
//! Ground station for a LoRa-linked GPS tracker.
//!
//! Receives telemetry frames forwarded by the radio bridge, tracks fix
//! validity, and dispatches the position to the MQTT broker, the
//! satellite relay, the status web endpoint, and the CSV session log.

use std::net::SocketAddr;
use std::path::Path;
use std::process;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::time::interval;
use tracing::{error, info, warn};

use lora_base::channels::broker::MqttChannel;
use lora_base::channels::logfile::CsvLog;
use lora_base::channels::relay::{RelayMessage, RelayWorker, SerialTrackerPort};
use lora_base::channels::web;
use lora_base::config::Config;
use lora_base::dispatch::DispatchScheduler;
use lora_base::engine::{self, Engine};
use lora_base::fix::FixTracker;
use lora_base::led::{Indicator, TraceLed};
use lora_base::radio::{FrameSource, UdpFrameSource};
use lora_base::reference::SharedReferenceFix;
use lora_base::status::StatusPublisher;
use lora_base::watchdog::{SoftWatchdog, Watchdog};

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Loop starvation threshold for the software watchdog
const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(25);

/// Cadence of the watchdog monitor task
const WATCHDOG_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Main entry point for the base station.
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load and validate the TOML configuration
///    - Open the session CSV log, the tracker serial port, the MQTT
///      client, the status endpoint, and the radio bridge socket
///    - Announce startup over the satellite relay
///
/// 2. **Dispatch Loop**
///    - Feed the watchdog once per tick
///    - Run every due scheduler task (relay, broker, fix timeout,
///      indicator)
///    - Consume at most one inbound radio frame per tick
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration is invalid or any channel fails
/// to initialize. Steady-state channel failures are logged, never
/// fatal.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("LoRa base v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;

    let status = StatusPublisher::new();
    let reference = SharedReferenceFix::new();

    // Durable CSV session log
    let log = if config.storage.enabled {
        std::fs::create_dir_all(&config.storage.log_dir)
            .with_context(|| format!("creating log directory {}", config.storage.log_dir))?;
        Some(CsvLog::create(Path::new(&config.storage.log_dir))?)
    } else {
        info!("storage disabled, no session log");
        None
    };

    // Satellite relay worker plus the one-shot startup announcement
    let relay_handle = if config.relay.enabled {
        let port = SerialTrackerPort::open(
            &config.relay.port,
            config.relay.baud_rate,
            Duration::from_millis(config.relay.read_timeout_ms),
        )?;
        let (worker, handle) = RelayWorker::new(port, reference.clone());
        tokio::spawn(worker.run());

        let startup = RelayMessage::Startup {
            id: config.base.id.clone(),
            sw_version: config.base.sw_version.clone(),
            hw_version: config.base.hw_version.clone(),
        };
        if let Err(e) = handle.try_send(startup) {
            warn!("startup announcement not queued: {}", e);
        }
        Some(handle)
    } else {
        info!("relay disabled");
        None
    };

    // MQTT broker channel; its event loop runs on its own task
    let broker = if config.broker.enabled {
        let (channel, _driver) = MqttChannel::start(&config.broker, &config.base.id);
        info!("publishing to MQTT topic {}", channel.topic());
        Some(channel)
    } else {
        info!("broker disabled");
        None
    };

    // Status web endpoint
    if config.web.enabled {
        let addr: SocketAddr = config
            .web
            .bind_addr
            .parse()
            .with_context(|| format!("web bind address {}", config.web.bind_addr))?;
        tokio::spawn(web::serve(status.clone(), addr));
    }

    // Radio bridge socket
    let mut radio = UdpFrameSource::bind(&config.radio.bind_addr).await?;
    info!("radio bridge socket bound at {}", config.radio.bind_addr);

    let fix = FixTracker::new(
        config.stale_after(),
        config.fix_timeout(),
        config.timing.invalid_frame_policy.into(),
    );
    let mut engine = Engine::new(fix, status, log, reference);

    let started_at = Instant::now();
    let mut scheduler = DispatchScheduler::new(started_at);
    if let Some(handle) = relay_handle {
        scheduler.register(
            "relay",
            config.relay_interval(),
            engine::relay_task(move |message| handle.try_send(message)),
        );
    }
    if let Some(channel) = broker {
        scheduler.register(
            "broker",
            config.broker_interval(),
            engine::broker_task(move |message: &str| channel.try_publish(message)),
        );
    }
    scheduler.register("fix-timeout", Duration::ZERO, engine::fix_timeout_task());
    scheduler.register(
        "indicator",
        config.indicator_interval(),
        engine::indicator_task(Indicator::new(), TraceLed),
    );
    info!(tasks = ?scheduler.task_names(), "dispatch tasks registered");

    // Software watchdog: the loop feeds it, a monitor task exits the
    // process for the supervisor to restart if the loop stalls
    let mut watchdog = SoftWatchdog::new(WATCHDOG_TIMEOUT);
    let monitor = watchdog.clone();
    tokio::spawn(async move {
        let mut check = interval(WATCHDOG_CHECK_INTERVAL);
        loop {
            check.tick().await;
            if monitor.is_starved(Instant::now()) {
                error!("dispatch loop stalled, exiting for supervisor restart");
                process::exit(1);
            }
        }
    });

    let mut nap = interval(config.nap());
    info!("entering dispatch loop");

    // Dispatch loop
    loop {
        tokio::select! {
            _ = nap.tick() => {
                watchdog.feed();
                let now = Instant::now();
                scheduler.tick(now, &mut engine);

                // At most one frame per tick, matching the radio
                // bridge's datagram pacing
                if let Some(frame) = radio.poll_frame() {
                    if let Err(e) = engine.on_frame(&frame.bytes, frame.rssi, now) {
                        warn!("frame rejected: {}", e);
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, shutting down...");
                info!(
                    received = engine.state.msg_count,
                    crc_errors = engine.state.crc_error_count,
                    "session totals"
                );
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watchdog_outlives_every_task_interval() {
        // Defaults: broker 30s is the longest *tick-driven* wait, but
        // the loop itself ticks every few ms, so 25s of silence means
        // a genuine stall
        assert!(WATCHDOG_TIMEOUT > WATCHDOG_CHECK_INTERVAL);
        assert_eq!(WATCHDOG_TIMEOUT, Duration::from_secs(25));
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }
}
