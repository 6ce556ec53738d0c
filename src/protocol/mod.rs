//! Sensor broadcast protocol: packet types and codec
//!
//! # UDP Protocol Specification
//!
//! Single-datagram request/response pairs plus an unsolicited event
//! stream, all on one UDP port:
//!
//! ```text
//! ┌────────┬──────────────────────┬───────────────────────────────────────┐
//! │ Opcode │ Packet               │ Payload after opcode                  │
//! ├────────┼──────────────────────┼───────────────────────────────────────┤
//! │ 0xA0   │ DetectDevice         │ (empty)                               │
//! │ 0xA1   │ Hello                │ (empty)                               │
//! │ 0xA2   │ PingDevice           │ (empty)                               │
//! │ 0xA3   │ Pong                 │ (empty)                               │
//! │ 0xB0   │ EnumerateSensors     │ (empty)                               │
//! │ 0xB1   │ SensorList           │ count, then per sensor:               │
//! │        │                      │   uid u8, kind u8, name str           │
//! │ 0xB2   │ EnableSensor         │ password str, uid u8,                 │
//! │        │                      │   enabled bool, rate u8               │
//! │ 0xB3   │ EnableAck            │ success bool, uid u8                  │
//! │ 0xB4   │ DisableAllSensors    │ password str                          │
//! │ 0xB5   │ DisableAllAck        │ success bool                          │
//! │ 0xC0   │ SensorEvent          │ uid u8, timestamp i64,                │
//! │        │                      │   count u8, count × f32               │
//! └────────┴──────────────────────┴───────────────────────────────────────┘
//! ```
//!
//! Hello doubles as the reply to DetectDevice and as the periodic
//! discovery broadcast, so a listening client cannot tell (and does
//! not need to tell) which one it received.
//!
//! ## Decoding rules
//!
//! - **Unknown opcode**: ignored, no response (`Ok(None)` from decode)
//! - **Truncated or non-UTF-8 payload**: [`wire::FormatError`], the
//!   dispatcher drops the datagram without a response
//! - **Trailing bytes** after a complete payload are ignored
//!
//! Field primitives and the 255-entry truncation rule live in
//! [`wire`].

pub mod wire;

use wire::{PacketBuffer, PacketReader};

pub use wire::{FormatError, MAX_PACKET_LEN};

/// Packet opcodes (one numbering space for both directions)
pub mod opcode {
    pub const DETECT_DEVICE: u8 = 0xA0;
    pub const HELLO: u8 = 0xA1;
    pub const PING_DEVICE: u8 = 0xA2;
    pub const PONG: u8 = 0xA3;
    pub const ENUMERATE_SENSORS: u8 = 0xB0;
    pub const SENSOR_LIST: u8 = 0xB1;
    pub const ENABLE_SENSOR: u8 = 0xB2;
    pub const ENABLE_ACK: u8 = 0xB3;
    pub const DISABLE_ALL_SENSORS: u8 = 0xB4;
    pub const DISABLE_ALL_ACK: u8 = 0xB5;
    pub const SENSOR_EVENT: u8 = 0xC0;
}

/// Inbound request decoded from one datagram
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Discovery probe; answered with hello
    DetectDevice,
    /// Liveness probe; answered with pong
    PingDevice,
    /// Ask for the full sensor descriptor list
    EnumerateSensors,
    /// Turn one sensor on or off (password-gated)
    EnableSensor {
        password: String,
        uid: u8,
        enabled: bool,
        rate: u8,
    },
    /// Turn every sensor off and detach the client (password-gated)
    DisableAllSensors { password: String },
}

impl Request {
    /// Decode one datagram
    ///
    /// `Ok(None)` for opcodes this side does not handle, including
    /// response opcodes echoed back by a confused peer.
    pub fn decode(datagram: &[u8]) -> Result<Option<Request>, FormatError> {
        let mut r = PacketReader::new(datagram);
        let op = r.read_u8()?;
        match op {
            opcode::DETECT_DEVICE => Ok(Some(Request::DetectDevice)),
            opcode::PING_DEVICE => Ok(Some(Request::PingDevice)),
            opcode::ENUMERATE_SENSORS => Ok(Some(Request::EnumerateSensors)),
            opcode::ENABLE_SENSOR => {
                let password = r.read_string()?;
                let uid = r.read_u8()?;
                let enabled = r.read_bool()?;
                let rate = r.read_u8()?;
                Ok(Some(Request::EnableSensor {
                    password,
                    uid,
                    enabled,
                    rate,
                }))
            }
            opcode::DISABLE_ALL_SENSORS => {
                let password = r.read_string()?;
                Ok(Some(Request::DisableAllSensors { password }))
            }
            _ => Ok(None),
        }
    }

    /// Encode into the buffer (client side of the exchange)
    pub fn encode_into(&self, buf: &mut PacketBuffer) {
        match self {
            Request::DetectDevice => buf.start(opcode::DETECT_DEVICE),
            Request::PingDevice => buf.start(opcode::PING_DEVICE),
            Request::EnumerateSensors => buf.start(opcode::ENUMERATE_SENSORS),
            Request::EnableSensor {
                password,
                uid,
                enabled,
                rate,
            } => {
                buf.start(opcode::ENABLE_SENSOR);
                buf.write_str(password);
                buf.write_u8(*uid);
                buf.write_bool(*enabled);
                buf.write_u8(*rate);
            }
            Request::DisableAllSensors { password } => {
                buf.start(opcode::DISABLE_ALL_SENSORS);
                buf.write_str(password);
            }
        }
    }
}

/// One row of the sensor list response
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEntry {
    pub uid: u8,
    pub kind: u8,
    pub name: String,
}

/// Outbound packet built by the service
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Discovery beacon and DetectDevice reply
    Hello,
    /// PingDevice reply
    Pong,
    /// EnumerateSensors reply
    SensorList(Vec<SensorEntry>),
    /// EnableSensor reply; success carries the resulting enabled state
    EnableAck { success: bool, uid: u8 },
    /// DisableAllSensors reply
    DisableAllAck { success: bool },
    /// One streamed reading
    SensorEvent {
        uid: u8,
        timestamp: i64,
        values: Vec<f32>,
    },
}

impl Response {
    /// Encode into the buffer
    pub fn encode_into(&self, buf: &mut PacketBuffer) {
        match self {
            Response::Hello => buf.start(opcode::HELLO),
            Response::Pong => buf.start(opcode::PONG),
            Response::SensorList(entries) => {
                buf.start(opcode::SENSOR_LIST);
                let n = buf.write_len(entries.len());
                for entry in entries.iter().take(n) {
                    buf.write_u8(entry.uid);
                    buf.write_u8(entry.kind);
                    buf.write_str(&entry.name);
                }
            }
            Response::EnableAck { success, uid } => {
                buf.start(opcode::ENABLE_ACK);
                buf.write_bool(*success);
                buf.write_u8(*uid);
            }
            Response::DisableAllAck { success } => {
                buf.start(opcode::DISABLE_ALL_ACK);
                buf.write_bool(*success);
            }
            Response::SensorEvent {
                uid,
                timestamp,
                values,
            } => encode_sensor_event(buf, *uid, *timestamp, values),
        }
    }

    /// Decode one datagram (client side of the exchange)
    ///
    /// `Ok(None)` for opcodes that are not responses.
    pub fn decode(datagram: &[u8]) -> Result<Option<Response>, FormatError> {
        let mut r = PacketReader::new(datagram);
        let op = r.read_u8()?;
        match op {
            opcode::HELLO => Ok(Some(Response::Hello)),
            opcode::PONG => Ok(Some(Response::Pong)),
            opcode::SENSOR_LIST => {
                let count = r.read_u8()? as usize;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let uid = r.read_u8()?;
                    let kind = r.read_u8()?;
                    let name = r.read_string()?;
                    entries.push(SensorEntry { uid, kind, name });
                }
                Ok(Some(Response::SensorList(entries)))
            }
            opcode::ENABLE_ACK => {
                let success = r.read_bool()?;
                let uid = r.read_u8()?;
                Ok(Some(Response::EnableAck { success, uid }))
            }
            opcode::DISABLE_ALL_ACK => {
                let success = r.read_bool()?;
                Ok(Some(Response::DisableAllAck { success }))
            }
            opcode::SENSOR_EVENT => {
                let uid = r.read_u8()?;
                let timestamp = r.read_i64()?;
                let count = r.read_u8()? as usize;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(r.read_f32()?);
                }
                Ok(Some(Response::SensorEvent {
                    uid,
                    timestamp,
                    values,
                }))
            }
            _ => Ok(None),
        }
    }
}

/// Encode a sensor event without building a [`Response`]
///
/// Hot path for the flush loop: events are the only packet sent at
/// tick rate and their payload is already borrowed from the drained
/// batch, so nothing is cloned here.
pub fn encode_sensor_event(buf: &mut PacketBuffer, uid: u8, timestamp: i64, values: &[f32]) {
    buf.start(opcode::SENSOR_EVENT);
    buf.write_u8(uid);
    buf.write_i64(timestamp);
    let n = buf.write_len(values.len());
    for v in &values[..n] {
        buf.write_f32(*v);
    }
}
