//! # Receive Engine
//!
//! Owns all mutable telemetry state and runs the per-frame pipeline:
//! decode → fix tracking → position delta → latest-record replacement →
//! status snapshot → durable log append.
//!
//! Single-writer model: `EngineState` is mutated only through
//! `&mut Engine` on the dispatch loop. Everything other tasks see
//! (status snapshot, reference fix) is a copy, so the hot path needs no
//! locks.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::channels::logfile::CsvLog;
use crate::channels::relay::RelayMessage;
use crate::delta::PositionDelta;
use crate::dispatch::{TaskAction, TaskOutcome};
use crate::error::{DispatchError, FrameError};
use crate::fix::FixTracker;
use crate::frame::codec;
use crate::led::{Indicator, LedColor, LedCommand, StatusLed};
use crate::record::TelemetryRecord;
use crate::reference::ReferenceGps;
use crate::status::StatusPublisher;

/// All mutable telemetry state, owned by the dispatch loop.
///
/// Kept separate from the channel handles so dispatch actions can take
/// `&mut Engine` without borrowing their own channel twice.
#[derive(Debug)]
pub struct EngineState {
    /// GPS fix state machine
    pub fix: FixTracker,
    /// Last computed reference-to-remote offset
    pub delta: PositionDelta,
    /// Most recent decoded record, replaced wholesale
    pub latest: Option<TelemetryRecord>,
    /// Most recent record with a valid fix. The broker and relay tasks
    /// read this one, so a later non-fix record never leaks its
    /// position fields into a publish
    pub last_valid: Option<TelemetryRecord>,
    /// Frames received (including rejected ones)
    pub msg_count: u64,
    /// Frames dropped for checksum failure
    pub crc_error_count: u64,
    /// One-shot flag for the indicator's magenta pulse
    pub msg_received: bool,
}

/// The decode + dispatch core.
pub struct Engine<R: ReferenceGps> {
    pub state: EngineState,
    pub status: StatusPublisher,
    pub log: Option<CsvLog>,
    pub reference: R,
}

impl<R: ReferenceGps> Engine<R> {
    pub fn new(
        fix: FixTracker,
        status: StatusPublisher,
        log: Option<CsvLog>,
        reference: R,
    ) -> Self {
        Self {
            state: EngineState {
                fix,
                delta: PositionDelta::default(),
                latest: None,
                last_valid: None,
                msg_count: 0,
                crc_error_count: 0,
                msg_received: false,
            },
            status,
            log,
            reference,
        }
    }

    /// Run one inbound frame through the full pipeline.
    ///
    /// Frame errors are returned for the caller to log; they never
    /// disturb held fix state (a corrupt frame is as if it were never
    /// received, except for the counters).
    pub fn on_frame(&mut self, bytes: &[u8], rssi: i16, now: Instant) -> Result<(), FrameError> {
        self.state.msg_count += 1;

        let record = match codec::decode(bytes, rssi, now) {
            Ok(record) => record,
            Err(e) => {
                if matches!(e, FrameError::ChecksumMismatch { .. }) {
                    self.state.crc_error_count += 1;
                    info!(
                        received = self.state.msg_count,
                        bad = self.state.crc_error_count,
                        "checksum error"
                    );
                }
                return Err(e);
            }
        };

        self.state.msg_received = true;
        self.state.fix.observe(&record, now);

        if record.fix_valid {
            let reference = self.reference.current_fix();
            if !self.state.delta.update(reference, &record, now) {
                debug!("reference unavailable, position delta retained");
            }

            self.status.publish(&record);
            self.state.last_valid = Some(record.clone());
        } else {
            debug!(remote_id = %record.remote_id, "frame without usable fix");
        }

        // Every decoded record is logged, flagged by its fix column
        if let Some(log) = &mut self.log {
            if let Err(e) = log.append(&record) {
                warn!("log append failed: {}", e);
            }
        }

        self.state.latest = Some(record);
        Ok(())
    }
}

/// Broker publish action: skip without a currently valid fix, otherwise
/// publish the comma-joined feed message through `publish`.
pub fn broker_task<R, P>(publish: P) -> TaskAction<Engine<R>>
where
    R: ReferenceGps + 'static,
    P: Fn(&str) -> Result<(), DispatchError> + Send + 'static,
{
    Box::new(move |_, engine| {
        if !engine.state.fix.is_valid() {
            info!("no fix - skipping broker publish");
            return Ok(TaskOutcome::Skipped);
        }
        let Some(record) = engine.state.last_valid.as_ref() else {
            return Ok(TaskOutcome::Skipped);
        };

        let message = broker_message(record, &engine.reference);
        publish(&message)?;
        debug!(%message, "broker publish");
        Ok(TaskOutcome::Sent)
    })
}

/// Feed message: `uid,fix,lat,lon,gdt,rssi,refLat,refLon` with the
/// reference fields left empty when the reference GPS has no reading.
pub fn broker_message<R: ReferenceGps>(record: &TelemetryRecord, reference: &R) -> String {
    let (ref_lat, ref_lon) = match reference.current_fix() {
        Some(fix) => (fix.latitude.to_string(), fix.longitude.to_string()),
        None => (String::new(), String::new()),
    };

    format!(
        "{},{},{},{},{},{},{},{}",
        record.remote_id,
        record.fix_valid,
        record.latitude,
        record.longitude,
        record.timestamp,
        record.link_rssi,
        ref_lat,
        ref_lon,
    )
}

/// Relay send action: skip unless both a valid fix and a valid
/// reference reading exist, otherwise queue a `REMOTE` report carrying
/// the position delta.
pub fn relay_task<R, S>(send: S) -> TaskAction<Engine<R>>
where
    R: ReferenceGps + 'static,
    S: Fn(RelayMessage) -> Result<(), DispatchError> + Send + 'static,
{
    Box::new(move |_, engine| {
        if !engine.state.fix.is_valid() {
            info!("no fix - skipping relay send");
            return Ok(TaskOutcome::Skipped);
        }
        if engine.reference.current_fix().is_none() {
            info!("no reference reading - skipping relay send");
            return Ok(TaskOutcome::Skipped);
        }
        let Some(record) = engine.state.last_valid.as_ref() else {
            return Ok(TaskOutcome::Skipped);
        };

        send(RelayMessage::Remote {
            id: record.remote_id.clone(),
            delta_lat: engine.state.delta.delta_lat,
            delta_lon: engine.state.delta.delta_lon,
            speed: record.speed,
            course: record.course,
            altitude: record.altitude,
            battery: record.battery,
        })?;
        Ok(TaskOutcome::Sent)
    })
}

/// Indicator refresh action: advances the duty-cycle machine and drives
/// the LED, consuming the just-received pulse.
pub fn indicator_task<R, L>(mut indicator: Indicator, mut led: L) -> TaskAction<Engine<R>>
where
    R: ReferenceGps + 'static,
    L: StatusLed + 'static,
{
    // Solid blue from wiring until the first refresh fires
    led.apply(LedCommand::Set {
        color: LedColor::Blue,
        lightness: 50,
    });

    Box::new(move |_, engine| {
        let command = indicator.refresh(engine.state.fix.state(), &mut engine.state.msg_received);
        led.apply(command);
        Ok(TaskOutcome::Sent)
    })
}

/// Fix-timeout action: re-evaluates staleness every tick, so a remote
/// that goes quiet expires even with no frames arriving.
pub fn fix_timeout_task<R: ReferenceGps + 'static>() -> TaskAction<Engine<R>> {
    Box::new(move |now, engine| {
        engine.state.fix.refresh(now);
        Ok(TaskOutcome::Sent)
    })
}
