//! Wire-level field primitives for the sensor broadcast protocol
//!
//! Every datagram is a flat little-endian byte layout with no padding:
//!
//! ```text
//! ┌──────────────┬───────────────────────────────┐
//! │ Opcode (1B)  │ Fields (fixed order, packed)  │
//! └──────────────┴───────────────────────────────┘
//! ```
//!
//! ## Field encodings
//!
//! - **u8 / bool**: one byte; bool decodes as `!= 0`, encodes as 0x01/0x00
//! - **i64 / f32**: little-endian fixed width (8 and 4 bytes)
//! - **string / bytes**: u8 length prefix followed by that many raw bytes
//! - **counts**: plain u8
//!
//! The one-byte length prefix caps every string, array and list count
//! at 255 entries. Encoders truncate silently at that cap rather than
//! fail; the stock clients were built against that behavior, so it is
//! part of the wire contract. String truncation operates on raw bytes
//! and can split a multi-byte UTF-8 sequence; the strict decoder
//! rejects such a packet, which is why descriptor names should stay
//! ASCII.

use std::fmt;

/// Largest datagram either side sends; sized after the stock client's
/// receive buffer
pub const MAX_PACKET_LEN: usize = 2048;

/// Largest value a u8 length prefix can carry
pub const MAX_FIELD_LEN: usize = 255;

/// Errors raised while decoding an inbound datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Buffer ended before the field was complete
    #[error("truncated field at offset {offset}, needed {needed} more byte(s)")]
    Truncated {
        /// Byte offset where the incomplete field starts
        offset: usize,
        /// Bytes missing to finish the field
        needed: usize,
    },

    /// String field contained invalid UTF-8
    #[error("invalid UTF-8 in string field at offset {0}")]
    InvalidUtf8(usize),
}

/// Read cursor over one received datagram
pub struct PacketReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < n {
            return Err(FormatError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, FormatError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i64(&mut self) -> Result<i64, FormatError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(raw))
    }

    pub fn read_f32(&mut self) -> Result<f32, FormatError> {
        let bytes = self.take(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Ok(f32::from_le_bytes(raw))
    }

    /// Read a u8-length-prefixed byte array
    pub fn read_bytes(&mut self) -> Result<&'a [u8], FormatError> {
        let len = self.read_u8()? as usize;
        self.take(len)
    }

    /// Read a u8-length-prefixed UTF-8 string
    ///
    /// Strict: invalid UTF-8 fails the whole datagram instead of being
    /// replaced, so a corrupted password can never authenticate.
    pub fn read_string(&mut self) -> Result<String, FormatError> {
        let start = self.pos;
        let bytes = self.read_bytes()?;
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_string()),
            Err(_) => Err(FormatError::InvalidUtf8(start)),
        }
    }
}

impl fmt::Debug for PacketReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketReader")
            .field("len", &self.buf.len())
            .field("pos", &self.pos)
            .finish()
    }
}

/// Reusable build buffer for one outbound packet at a time
///
/// The service owns a single instance for its whole run; `start`
/// clears it and writes the opcode, the field writers append, and the
/// finished packet is read back with `as_bytes`. Capacity is retained
/// across packets so the steady state allocates nothing.
#[derive(Debug)]
pub struct PacketBuffer {
    buf: Vec<u8>,
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(MAX_PACKET_LEN),
        }
    }

    /// Reset the buffer and begin a packet with the given opcode
    pub fn start(&mut self, opcode: u8) {
        self.buf.clear();
        self.buf.push(opcode);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a count or length prefix, capped at 255
    ///
    /// Returns the value actually written so callers emit exactly that
    /// many elements after it.
    pub fn write_len(&mut self, n: usize) -> usize {
        let capped = n.min(MAX_FIELD_LEN);
        self.buf.push(capped as u8);
        capped
    }

    /// Write a u8-length-prefixed byte array, truncating at 255 bytes
    pub fn write_bytes(&mut self, data: &[u8]) {
        let n = self.write_len(data.len());
        self.buf.extend_from_slice(&data[..n]);
    }

    /// Write a u8-length-prefixed string, truncating at 255 bytes
    ///
    /// Truncation is byte-wise, matching the stock encoder.
    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new()
    }
}
