//! An on-target debugging core for a dynamic-language interpreter.
//!
//! This crate is the debugging runtime that sits between a host IDE and an
//! embedded interpreter: a breakpoint table, a chunked stack-response
//! protocol, a chunked variables-response protocol, and the
//! execution-control state machine that drives stop/step/continue from a
//! pre-opcode hook. The interpreter, the transport link, and the host are
//! all external collaborators, modeled here as traits
//! ([`interp::Interpreter`], [`interp::BytecodePosition`],
//! [`transport::bus::TransportBus`]) the embedding program implements.
//!
//! [`core::DebuggerCore`] is the facade: construct one with a concrete
//! interpreter and transport, share it between the interpreter core and
//! the transport-servicing core (typically behind an `Arc`), and call
//! [`core::DebuggerCore::on_opcode`] before every opcode and
//! [`core::DebuggerCore::dispatch_command`] from the transport's receive
//! callback.

pub mod breakpoints;
pub mod config;
pub mod core;
pub mod error;
pub mod frames;
pub mod intern;
pub mod interp;
pub mod position;
pub mod state;
pub mod transport;
pub mod variables;

pub use config::DebuggerConfig;
pub use core::DebuggerCore;
pub use error::{BufferTooSmall, TransportError};
pub use intern::InternedId;
pub use interp::{BytecodePosition, Interpreter, ObjectView};
pub use position::SourcePosition;
pub use state::DebuggerStatus;
pub use transport::bus::TransportBus;
pub use variables::{VarKind, VarScope, VariablesRequest};
