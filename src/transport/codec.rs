//! C2: typed read/append over raw message bytes.
//!
//! Wraps message framing: typed append of bytes, little-endian `u32`s, and
//! zero-terminated strings into a capacity-bounded response; typed reads
//! of the same primitives out of an incoming request. The codec never
//! owns a transport connection, it only serializes -- sending is the
//! `TransportBus`'s job (`transport::bus`).

use crate::error::BufferTooSmall;

/// A response buffer pre-sized to a chosen capacity. Appends fail with
/// [`BufferTooSmall`] rather than writing partial content, so a caller can
/// always recover by sending what was written before the failed append.
pub struct ResponseBuffer {
    capacity: usize,
    bytes: Vec<u8>,
}

impl ResponseBuffer {
    /// Allocate a response with room for at most `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            bytes: Vec::with_capacity(capacity.min(256)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes of room left before the next append would overflow.
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.bytes.len())
    }

    /// How large an append of `extra` more bytes would leave the total, for
    /// a budget check before doing the append (callers that need to decide
    /// "would this item fit" without mutating first).
    pub fn would_fit(&self, extra: usize) -> bool {
        self.bytes.len() + extra <= self.capacity
    }

    pub fn append_u8(&mut self, value: u8) -> Result<(), BufferTooSmall> {
        if !self.would_fit(1) {
            return Err(BufferTooSmall);
        }
        self.bytes.push(value);
        Ok(())
    }

    /// Append a little-endian `u32`.
    pub fn append_u32(&mut self, value: u32) -> Result<(), BufferTooSmall> {
        if !self.would_fit(4) {
            return Err(BufferTooSmall);
        }
        self.bytes.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Append a NUL-terminated byte string.
    pub fn append_cstr(&mut self, s: &str) -> Result<(), BufferTooSmall> {
        if !self.would_fit(s.len() + 1) {
            return Err(BufferTooSmall);
        }
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
        Ok(())
    }

    /// Append a raw, already-NUL-terminated literal such as the end
    /// sentinel `"<end>\0"`.
    pub fn append_literal(&mut self, bytes: &[u8]) -> Result<(), BufferTooSmall> {
        if !self.would_fit(bytes.len()) {
            return Err(BufferTooSmall);
        }
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    /// Seek-write a single byte at a known offset, used to backfill the
    /// variables response's flags byte at offset 0 once enumeration has
    /// finished and the flags are known.
    pub fn set_byte_at(&mut self, offset: usize, value: u8) {
        self.bytes[offset] = value;
    }

    /// Consume the buffer, returning exactly the bytes written (the
    /// "set the final payload size" step -- this codec never pads).
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Read-only cursor over an incoming message's payload, offset-addressed
/// the way the original's `jcomp_msg_get_*` family is.
pub struct MessageReader<'a> {
    bytes: &'a [u8],
}

impl<'a> MessageReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get_u8(&self, offset: usize) -> u8 {
        self.bytes.get(offset).copied().unwrap_or(0)
    }

    pub fn get_u32(&self, offset: usize) -> u32 {
        let mut buf = [0u8; 4];
        let end = (offset + 4).min(self.bytes.len());
        if offset < end {
            buf[..end - offset].copy_from_slice(&self.bytes[offset..end]);
        }
        u32::from_le_bytes(buf)
    }

    /// `true` if the bytes starting at `offset` equal `s`.
    pub fn has_str(&self, offset: usize, s: &str) -> bool {
        let bytes = s.as_bytes();
        offset + bytes.len() <= self.bytes.len() && &self.bytes[offset..offset + bytes.len()] == bytes
    }

    /// Index of the first occurrence of `byte` at or after `start`, if any.
    pub fn find_byte(&self, start: usize, byte: u8) -> Option<usize> {
        self.bytes[start.min(self.bytes.len())..]
            .iter()
            .position(|&b| b == byte)
            .map(|i| i + start)
    }

    /// Read a UTF-8 string from `[start, end)`, lossily if needed. Used to
    /// pull the file name out of a `set_breakpoints` message.
    pub fn get_str(&self, start: usize, end: usize) -> String {
        let end = end.min(self.bytes.len());
        if start >= end {
            return String::new();
        }
        String::from_utf8_lossy(&self.bytes[start..end]).into_owned()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes
    }
}
