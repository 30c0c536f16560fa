//! # Satellite Relay Channel
//!
//! The long-range uplink distinct from the local LoRa link: a
//! GPS-equipped satellite messenger connected over a serial port. It
//! serves two roles:
//!
//! - outbound: compact JSON event messages (`STARTUP` once at boot,
//!   `REMOTE` periodically with the position delta)
//! - inbound: the tracker streams its own position as
//!   `$GPS,<lat>,<lon>,<A|V>` lines, which become the local reference
//!   fix for delta computation
//!
//! The serial port sits behind [`TrackerPort`] so the worker is
//! testable without hardware.
//! Dispatch tasks talk to the worker through a bounded queue: a full
//! queue is a [`DispatchError::ChannelUnavailable`], never a blocked
//! tick.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{BaseError, DispatchError, Result};
use crate::reference::{ReferenceFix, SharedReferenceFix};

/// Depth of the outbound message queue between dispatch tasks and the
/// serial worker
pub const RELAY_QUEUE_DEPTH: usize = 8;

/// Messages sent up the satellite link.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    /// One-shot boot announcement
    Startup {
        id: String,
        sw_version: String,
        hw_version: String,
    },
    /// Periodic remote-unit report with the position delta
    Remote {
        id: String,
        delta_lat: i64,
        delta_lon: i64,
        speed: f64,
        course: f64,
        altitude: f64,
        battery: f64,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "UPPERCASE")]
struct StartupWire<'a> {
    evt: &'static str,
    id: &'a str,
    sw: &'a str,
    hw: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "UPPERCASE")]
struct RemoteWire<'a> {
    evt: &'static str,
    id: &'a str,
    latd: i64,
    lond: i64,
    spd: String,
    cog: String,
    alt: String,
    bat: String,
}

impl RelayMessage {
    /// Encode as compact JSON (no whitespace), numeric fields as
    /// fixed-point strings: SPD/COG/ALT integer-rounded, BAT to two
    /// decimal places.
    pub fn encode(&self) -> String {
        let wire = match self {
            RelayMessage::Startup {
                id,
                sw_version,
                hw_version,
            } => serde_json::to_string(&StartupWire {
                evt: "STARTUP",
                id,
                sw: sw_version,
                hw: hw_version,
            }),
            RelayMessage::Remote {
                id,
                delta_lat,
                delta_lon,
                speed,
                course,
                altitude,
                battery,
            } => serde_json::to_string(&RemoteWire {
                evt: "REMOTE",
                id,
                latd: *delta_lat,
                lond: *delta_lon,
                spd: format!("{:.0}", speed),
                cog: format!("{:.0}", course),
                alt: format!("{:.0}", altitude),
                bat: format!("{:.2}", battery),
            }),
        };
        // Wire structs contain only strings and integers
        wire.expect("relay message serialization is infallible")
    }
}

/// Line-oriented seam over the tracker serial port.
#[async_trait]
pub trait TrackerPort: Send {
    /// Send one message line (terminator added by the implementation).
    async fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Receive one line, or `None` when nothing arrived in time.
    async fn recv_line(&mut self) -> io::Result<Option<String>>;
}

/// Production tracker port over `tokio_serial`.
pub struct SerialTrackerPort {
    reader: BufReader<tokio_serial::SerialStream>,
    read_timeout: Duration,
}

impl SerialTrackerPort {
    /// Open the tracker serial port (8N1).
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| BaseError::Serial(format!("failed to open {}: {}", path, e)))?;

        info!("tracker serial port opened at {}", path);
        Ok(Self {
            reader: BufReader::new(port),
            read_timeout,
        })
    }
}

#[async_trait]
impl TrackerPort for SerialTrackerPort {
    async fn send_line(&mut self, line: &str) -> io::Result<()> {
        let port = self.reader.get_mut();
        port.write_all(line.as_bytes()).await?;
        port.write_all(b"\r\n").await?;
        port.flush().await
    }

    async fn recv_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        match tokio::time::timeout(self.read_timeout, self.reader.read_line(&mut line)).await {
            Ok(Ok(0)) => Ok(None),
            Ok(Ok(_)) => Ok(Some(line.trim_end().to_string())),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(None),
        }
    }
}

/// Parse one tracker position sentence: `$GPS,<lat>,<lon>,<A|V>`.
///
/// `A` marks a valid reading (NMEA convention); anything else means the
/// tracker currently has no fix.
pub fn parse_position_line(line: &str) -> Option<Option<ReferenceFix>> {
    let rest = line.strip_prefix("$GPS,")?;
    let mut parts = rest.split(',');
    let lat: f64 = parts.next()?.parse().ok()?;
    let lon: f64 = parts.next()?.parse().ok()?;
    let valid = parts.next()? == "A";

    if valid {
        Some(Some(ReferenceFix {
            latitude: lat,
            longitude: lon,
        }))
    } else {
        Some(None)
    }
}

/// Cheap cloneable handle used by dispatch tasks to queue messages.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayMessage>,
}

impl RelayHandle {
    /// Queue a message without blocking.
    pub fn try_send(&self, message: RelayMessage) -> std::result::Result<(), DispatchError> {
        self.tx
            .try_send(message)
            .map_err(|e| DispatchError::ChannelUnavailable(format!("relay queue: {}", e)))
    }
}

/// Serial worker owning the tracker port.
///
/// Runs as its own tokio task: drains the outbound queue and folds
/// inbound position sentences into the shared reference fix. All engine
/// state stays on the dispatch loop; this task only reads snapshots and
/// writes the reference cell.
pub struct RelayWorker<P: TrackerPort> {
    port: P,
    rx: mpsc::Receiver<RelayMessage>,
    reference: SharedReferenceFix,
}

impl<P: TrackerPort> RelayWorker<P> {
    /// Create the worker plus the handle dispatch tasks use.
    pub fn new(port: P, reference: SharedReferenceFix) -> (Self, RelayHandle) {
        let (tx, rx) = mpsc::channel(RELAY_QUEUE_DEPTH);
        (
            Self {
                port,
                rx,
                reference,
            },
            RelayHandle { tx },
        )
    }

    /// Drive the port until every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                message = self.rx.recv() => {
                    let Some(message) = message else { break };
                    let line = message.encode();
                    match self.port.send_line(&line).await {
                        Ok(()) => debug!(%line, "relay message sent"),
                        Err(e) => warn!("relay write failed: {}", e),
                    }
                }
                result = self.port.recv_line() => {
                    match result {
                        Ok(Some(line)) => {
                            if let Some(fix) = parse_position_line(&line) {
                                self.reference.set(fix);
                            } else {
                                debug!(%line, "unrecognized tracker sentence");
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!("relay read failed: {}", e);
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }
    }
}
