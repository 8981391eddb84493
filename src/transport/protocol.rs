//! The wire protocol table: command/event tags and the `Command` parser.
//!
//! Tag bytes and reason strings are defined once here, each traceable back
//! to the original's `jpo_debugger.h` macro of the same purpose, so the
//! wire format stays a single source of truth for both the secondary-core
//! dispatcher (`core::DebuggerCore::dispatch_command`) and the stop-loop.

use super::codec::MessageReader;
use crate::frames::StackRequest;
use crate::variables::VariablesRequest;

// --- Commands (host -> target) ---

pub const CMD_TERMINATE: &[u8; 8] = b"DBG_TRMT";
pub const CMD_START: &[u8; 8] = b"DBG_STRT";
pub const CMD_PAUSE: &[u8; 8] = b"DBG_PAUS";
pub const CMD_CONTINUE: &[u8; 8] = b"DBG_CONT";
pub const CMD_STEP_INTO: &[u8; 8] = b"DBG_SINT";
pub const CMD_STEP_OVER: &[u8; 8] = b"DBG_SOVR";
pub const CMD_STEP_OUT: &[u8; 8] = b"DBG_SOUT";
pub const CMD_STACK_REQUEST: &[u8; 8] = b"DBG_STAC";
pub const CMD_VARIABLES_REQUEST: &[u8; 8] = b"DBG_VARS";
pub const CMD_SET_BREAKPOINTS: &[u8; 8] = b"DBG_BKPT";

// --- Events (target -> host) ---

pub const EVT_STOP: &[u8; 8] = b"DBG_STOP";
pub const EVT_DONE: &[u8; 8] = b"DBG_DONE";

// --- Stop reasons: the 8-character payload of a DBG_STOP event ---

pub const REASON_PAUSED: &[u8; 8] = b":PAUSED_";
pub const REASON_BREAKPOINT: &[u8; 8] = b":BREAKPT";
pub const REASON_STEP_INTO: &[u8; 8] = b":SINT___";
pub const REASON_STEP_OVER: &[u8; 8] = b":SOVR___";
pub const REASON_STEP_OUT: &[u8; 8] = b":SOUT___";
pub const REASON_STARTING: &[u8; 8] = b":START__";

/// A parsed host-to-target command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Terminate,
    Start,
    Pause,
    Continue,
    StepInto,
    StepOver,
    StepOut,
    StackRequest(StackRequest),
    VariablesRequest(VariablesRequest),
    SetBreakpoints { file: String, lines: Vec<u32> },
}

/// Parse a raw message into a [`Command`]. Returns `None` for an
/// unrecognized tag or a malformed payload for a recognized one (e.g. an
/// unknown `DBG_VARS` scope byte) -- both are "unknown requests", ignored
/// with a log message by the caller (`spec.md` §4.5, §4.6).
pub fn parse_command(reader: &MessageReader<'_>) -> Option<Command> {
    if reader.has_str(0, unsafe_ascii(CMD_TERMINATE)) {
        Some(Command::Terminate)
    } else if reader.has_str(0, unsafe_ascii(CMD_START)) {
        Some(Command::Start)
    } else if reader.has_str(0, unsafe_ascii(CMD_PAUSE)) {
        Some(Command::Pause)
    } else if reader.has_str(0, unsafe_ascii(CMD_CONTINUE)) {
        Some(Command::Continue)
    } else if reader.has_str(0, unsafe_ascii(CMD_STEP_INTO)) {
        Some(Command::StepInto)
    } else if reader.has_str(0, unsafe_ascii(CMD_STEP_OVER)) {
        Some(Command::StepOver)
    } else if reader.has_str(0, unsafe_ascii(CMD_STEP_OUT)) {
        Some(Command::StepOut)
    } else if reader.has_str(0, unsafe_ascii(CMD_STACK_REQUEST)) {
        Some(Command::StackRequest(StackRequest::from_reader(reader)))
    } else if reader.has_str(0, unsafe_ascii(CMD_VARIABLES_REQUEST)) {
        VariablesRequest::from_reader(reader).map(Command::VariablesRequest)
    } else if reader.has_str(0, unsafe_ascii(CMD_SET_BREAKPOINTS)) {
        parse_set_breakpoints(reader)
    } else {
        None
    }
}

fn parse_set_breakpoints(reader: &MessageReader<'_>) -> Option<Command> {
    let nul = reader.find_byte(8, 0)?;
    let file = reader.get_str(8, nul);
    let mut pos = nul + 1;
    let mut lines = Vec::new();
    while pos + 4 <= reader.len() {
        lines.push(reader.get_u32(pos));
        pos += 4;
    }
    Some(Command::SetBreakpoints { file, lines })
}

/// Tag bytes are ASCII by construction (the constants above); this is just
/// a typed view for `MessageReader::has_str`.
fn unsafe_ascii(tag: &'static [u8; 8]) -> &'static str {
    std::str::from_utf8(tag).expect("protocol tags are ASCII")
}
