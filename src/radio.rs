//! # Radio Frame Source
//!
//! Inbound side of the LoRa transport. The radio itself (modulation,
//! association, link statistics) is an external collaborator — a radio
//! bridge daemon forwards each received LoRa datagram to this process
//! over UDP, prepending the RSSI it measured:
//!
//! ```text
//! +--------------+------------------------+
//! | RSSI (i16 BE)| frame bytes (CRC+JSON) |
//! +--------------+------------------------+
//! ```
//!
//! Datagram semantics are preserved end to end: at most one frame is
//! consumed per loop tick, polls never block, and short datagrams are
//! dropped silently (the frame codec rejects them anyway).

use bytes::Bytes;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::error::{BaseError, Result};

/// Size of the RSSI prefix added by the radio bridge
const RSSI_PREFIX_LEN: usize = 2;

/// Largest datagram the bridge will forward
const MAX_DATAGRAM: usize = 512;

/// One inbound frame plus its link metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Raw frame bytes (integrity header + JSON body)
    pub bytes: Bytes,
    /// Received signal strength in dBm as measured by the radio
    pub rssi: i16,
}

/// Non-blocking source of inbound frames.
pub trait FrameSource: Send {
    /// Take at most one pending frame. Must never block.
    fn poll_frame(&mut self) -> Option<InboundFrame>;
}

/// Production frame source: a UDP socket fed by the radio bridge.
pub struct UdpFrameSource {
    socket: UdpSocket,
    buf: [u8; MAX_DATAGRAM],
}

impl UdpFrameSource {
    /// Bind the receive socket.
    pub async fn bind(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(BaseError::Io)?;
        Ok(Self {
            socket,
            buf: [0u8; MAX_DATAGRAM],
        })
    }
}

impl FrameSource for UdpFrameSource {
    fn poll_frame(&mut self) -> Option<InboundFrame> {
        match self.socket.try_recv_from(&mut self.buf) {
            Ok((len, _peer)) if len >= RSSI_PREFIX_LEN => {
                let rssi = i16::from_be_bytes([self.buf[0], self.buf[1]]);
                let bytes = Bytes::copy_from_slice(&self.buf[RSSI_PREFIX_LEN..len]);
                debug!(len, rssi, "frame received");
                Some(InboundFrame { bytes, rssi })
            }
            Ok((len, peer)) => {
                warn!(len, %peer, "runt datagram dropped");
                None
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("radio socket error: {}", e);
                None
            }
        }
    }
}
