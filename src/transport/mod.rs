//! C2: message framing, the command/event protocol table, and the
//! transport-bus contract.

pub mod bus;
pub mod codec;
pub mod protocol;
