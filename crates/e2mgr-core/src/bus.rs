// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Message sender: tagged, addressed payloads onto the message bus.
//!
//! The TCP sender frames each message as:
//! - 4 bytes: frame length after this field (big-endian)
//! - 4 bytes: message type (big-endian)
//! - 2 bytes: RAN name length (big-endian)
//! - N bytes: RAN name (UTF-8)
//! - M bytes: payload

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{E2MgrError, Result};
use crate::model::ProtocolKind;

/// Maximum frame size (1 MB)
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Bytes between the length prefix and the RAN name (type + name length).
const FIXED_HEADER: usize = 6;

/// Write attempts per message: the first, then one on a fresh connection.
const SEND_ATTEMPTS: u32 = 2;

/// Message types carried on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    /// X2 setup request towards an eNB
    X2SetupRequest = 10060,
    /// EN-DC X2 setup request towards a gNB
    EndcX2SetupRequest = 10360,
    /// Bus-wide "drop every SCTP association"
    SctpClearAll = 1090,
}

impl MessageType {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::X2SetupRequest => "RIC_X2_SETUP_REQ",
            Self::EndcX2SetupRequest => "RIC_ENDC_X2_SETUP_REQ",
            Self::SctpClearAll => "RIC_SCTP_CLEAR_ALL",
        }
    }

    /// Setup request type for a RAN's protocol kind.
    pub fn setup_request(protocol: ProtocolKind) -> Self {
        match protocol {
            ProtocolKind::X2Setup => Self::X2SetupRequest,
            ProtocolKind::EndcX2Setup => Self::EndcX2SetupRequest,
        }
    }
}

impl TryFrom<u32> for MessageType {
    type Error = FrameError;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            10060 => Ok(Self::X2SetupRequest),
            10360 => Ok(Self::EndcX2SetupRequest),
            1090 => Ok(Self::SctpClearAll),
            _ => Err(FrameError::InvalidMessageType(value)),
        }
    }
}

/// Errors that can occur while decoding a bus frame
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame too large: {0} bytes (max: {MAX_FRAME_SIZE})")]
    FrameTooLarge(usize),

    #[error("invalid message type: {0}")]
    InvalidMessageType(u32),

    #[error("truncated frame: {0}")]
    Truncated(&'static str),

    #[error("RAN name is not valid UTF-8")]
    InvalidRanName,
}

/// A message addressed to one RAN, or to nobody for broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub msg_type: MessageType,
    pub ran_name: String,
    pub payload: Bytes,
}

impl BusMessage {
    pub fn new(msg_type: MessageType, ran_name: impl Into<String>, payload: Bytes) -> Self {
        Self {
            msg_type,
            ran_name: ran_name.into(),
            payload,
        }
    }

    /// The broadcast sent by the big red button.
    pub fn clear_all() -> Self {
        Self::new(MessageType::SctpClearAll, "", Bytes::new())
    }

    /// Encode for wire transmission.
    pub fn encode(&self) -> Result<Bytes> {
        let name = self.ran_name.as_bytes();
        let body_len = FIXED_HEADER + name.len() + self.payload.len();
        if body_len > MAX_FRAME_SIZE || name.len() > u16::MAX as usize {
            return Err(self.transport_error(FrameError::FrameTooLarge(body_len).to_string()));
        }

        let mut buf = BytesMut::with_capacity(4 + body_len);
        buf.put_u32(body_len as u32);
        buf.put_u32(self.msg_type.code());
        buf.put_u16(name.len() as u16);
        buf.put_slice(name);
        buf.put(self.payload.clone());
        Ok(buf.freeze())
    }

    /// Decode one complete frame, length prefix included.
    ///
    /// The sender never reads from the bus. This is the receiving side of the
    /// framing, for bus-side tooling and for checking what was put on the wire.
    pub fn decode(mut bytes: Bytes) -> std::result::Result<Self, FrameError> {
        if bytes.len() < 4 + FIXED_HEADER {
            return Err(FrameError::Truncated("header"));
        }
        let body_len = bytes.get_u32() as usize;
        if body_len > MAX_FRAME_SIZE {
            return Err(FrameError::FrameTooLarge(body_len));
        }
        if bytes.len() < body_len {
            return Err(FrameError::Truncated("body"));
        }

        let msg_type = MessageType::try_from(bytes.get_u32())?;
        let name_len = bytes.get_u16() as usize;
        if body_len < FIXED_HEADER + name_len {
            return Err(FrameError::Truncated("ran name"));
        }
        let name = bytes.split_to(name_len);
        let ran_name =
            String::from_utf8(name.to_vec()).map_err(|_| FrameError::InvalidRanName)?;
        let payload = bytes.split_to(body_len - FIXED_HEADER - name_len);

        Ok(Self {
            msg_type,
            ran_name,
            payload,
        })
    }

    fn transport_error(&self, reason: String) -> E2MgrError {
        E2MgrError::Transport {
            msg_type: self.msg_type.name().to_string(),
            ran_name: self.ran_name.clone(),
            reason,
        }
    }
}

/// Fire-and-forget dispatch onto the message bus. Any failure is a
/// [`E2MgrError::Transport`].
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, message: BusMessage) -> Result<()>;
}

/// Timeouts for the TCP bus connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusSenderConfig {
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Budget for writing one frame, in milliseconds
    pub write_timeout_ms: u64,
}

impl Default for BusSenderConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            write_timeout_ms: 5_000,
        }
    }
}

/// Sends framed messages over one lazily opened TCP connection to the bus
/// router. Sends are serialized on that connection; connect and write are
/// bounded by [`BusSenderConfig`], so a stalled router delays the queue by at
/// most one budget per attempt.
pub struct TcpBusSender {
    addr: String,
    config: BusSenderConfig,
    stream: Mutex<Option<TcpStream>>,
}

impl TcpBusSender {
    pub fn new(addr: impl Into<String>) -> Self {
        Self::with_config(addr, BusSenderConfig::default())
    }

    pub fn with_config(addr: impl Into<String>, config: BusSenderConfig) -> Self {
        Self {
            addr: addr.into(),
            config,
            stream: Mutex::new(None),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connect(&self) -> std::result::Result<TcpStream, String> {
        let budget = Duration::from_millis(self.config.connect_timeout_ms);
        match tokio::time::timeout(budget, TcpStream::connect(&self.addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "connect timed out after {}ms",
                self.config.connect_timeout_ms
            )),
        }
    }

    async fn write_frame(
        &self,
        connection: &mut TcpStream,
        frame: &[u8],
    ) -> std::result::Result<(), String> {
        let budget = Duration::from_millis(self.config.write_timeout_ms);
        let write = async {
            connection.write_all(frame).await?;
            connection.flush().await
        };
        match tokio::time::timeout(budget, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "write timed out after {}ms",
                self.config.write_timeout_ms
            )),
        }
    }
}

#[async_trait]
impl MessageSender for TcpBusSender {
    async fn send(&self, message: BusMessage) -> Result<()> {
        let frame = message.encode()?;
        let mut stream = self.stream.lock().await;
        let mut last_error = String::new();

        for attempt in 1..=SEND_ATTEMPTS {
            if stream.is_none() {
                match self.connect().await {
                    Ok(connected) => *stream = Some(connected),
                    Err(reason) => {
                        warn!(addr = %self.addr, attempt, error = %reason, "Bus connect failed");
                        last_error = reason;
                        continue;
                    }
                }
            }

            let Some(connection) = stream.as_mut() else {
                continue;
            };

            match self.write_frame(connection, &frame).await {
                Ok(()) => {
                    debug!(
                        msg_type = message.msg_type.name(),
                        ran_name = %message.ran_name,
                        bytes = frame.len(),
                        "Message sent"
                    );
                    return Ok(());
                }
                Err(reason) => {
                    // A partial frame may be on the wire, so the connection is unusable.
                    warn!(addr = %self.addr, attempt, error = %reason, "Bus write failed, dropping connection");
                    *stream = None;
                    last_error = reason;
                }
            }
        }

        Err(message.transport_error(last_error))
    }
}
