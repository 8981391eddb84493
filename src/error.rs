//! Shared result/error types for the debugging core.
//!
//! Transport and buffer outcomes are modeled as a small result-kind rather
//! than a single catch-all error: an append that would overflow a response
//! is not a fatal condition, it just means "send what we have so far and
//! let the host re-request" (see `spec.md` §7).

use std::fmt;

/// An append into a bounded response buffer ran out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferTooSmall;

impl fmt::Display for BufferTooSmall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer too small for append")
    }
}

impl std::error::Error for BufferTooSmall {}

/// Outcome of a send/receive call on the transport bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The underlying bus rejected or failed to deliver a send.
    Send(String),
    /// The underlying bus failed to deliver a receive (not a timeout).
    Receive(String),
    /// No message arrived within the poll's receive timeout.
    Timeout,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Send(msg) => write!(f, "transport send failed: {msg}"),
            TransportError::Receive(msg) => write!(f, "transport receive failed: {msg}"),
            TransportError::Timeout => write!(f, "transport receive timed out"),
        }
    }
}

impl std::error::Error for TransportError {}
