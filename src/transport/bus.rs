//! The transport-layer contract and an in-memory test double.
//!
//! The real transport (a bidirectional message bus between the two cores)
//! is out of scope (`spec.md` §1): this crate only depends on
//! [`TransportBus`], mirroring how the original calls the external
//! `jcomp_*`/`JCOMP_MSG` API without implementing it.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::TransportError;

/// What the debugging core needs from the transport: emit an event, emit a
/// response to a specific request, and poll for the next host command with
/// a bounded wait (the stop-loop's "short receive timeout", `spec.md`
/// §4.5).
pub trait TransportBus {
    fn send_event(&self, tag: &[u8; 8], payload: &[u8]) -> Result<(), TransportError>;
    fn send_response(&self, correlation_id: u8, payload: &[u8]) -> Result<(), TransportError>;
    /// `Ok(None)` on a timed-out, empty poll; `Ok(Some(..))` on a received
    /// message; `Err` on a transport failure (`spec.md` §7).
    fn receive_command(&self, timeout: Duration) -> Result<Option<(u8, Vec<u8>)>, TransportError>;
}

/// An in-process stand-in transport used by the test suite: commands are
/// queued by the test, responses/events are recorded for assertions. No
/// real scheduling or timing -- `receive_command`'s timeout is accepted
/// but unused, since there is nothing to wait for beyond what is queued.
#[derive(Default)]
pub struct InMemoryBus {
    inbound: Mutex<VecDeque<(u8, Vec<u8>)>>,
    events: Mutex<Vec<(Vec<u8>, Vec<u8>)>>,
    responses: Mutex<Vec<(u8, Vec<u8>)>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command as if it had just arrived from the host.
    pub fn push_command(&self, correlation_id: u8, bytes: Vec<u8>) {
        self.inbound.lock().push_back((correlation_id, bytes));
    }

    pub fn events(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.events.lock().clone()
    }

    pub fn responses(&self) -> Vec<(u8, Vec<u8>)> {
        self.responses.lock().clone()
    }
}

impl TransportBus for InMemoryBus {
    fn send_event(&self, tag: &[u8; 8], payload: &[u8]) -> Result<(), TransportError> {
        self.events.lock().push((tag.to_vec(), payload.to_vec()));
        Ok(())
    }

    fn send_response(&self, correlation_id: u8, payload: &[u8]) -> Result<(), TransportError> {
        self.responses.lock().push((correlation_id, payload.to_vec()));
        Ok(())
    }

    fn receive_command(&self, _timeout: Duration) -> Result<Option<(u8, Vec<u8>)>, TransportError> {
        Ok(self.inbound.lock().pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_command_is_received_once() {
        let bus = InMemoryBus::new();
        bus.push_command(3, vec![1, 2, 3]);
        assert_eq!(
            bus.receive_command(Duration::from_millis(10)).unwrap(),
            Some((3, vec![1, 2, 3]))
        );
        assert_eq!(bus.receive_command(Duration::from_millis(10)).unwrap(), None);
    }

    #[test]
    fn events_and_responses_are_recorded() {
        let bus = InMemoryBus::new();
        bus.send_event(b"DBG_STOP", b":PAUSED_").unwrap();
        bus.send_response(9, b"payload").unwrap();
        assert_eq!(bus.events(), vec![(b"DBG_STOP".to_vec(), b":PAUSED_".to_vec())]);
        assert_eq!(bus.responses(), vec![(9, b"payload".to_vec())]);
    }
}
