//! C5: the execution-control state machine.
//!
//! `DebuggerStatus` is the single word read on the hot pre-opcode path
//! without the core mutex (`spec.md` §5); [`process`] implements the
//! transition table of `spec.md` §4.5 exactly, including the rule that a
//! breakpoint hit is checked first and wins over any step/pause condition
//! already in flight.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::intern::InternedId;
use crate::interp::BytecodePosition;
use crate::position::SourcePosition;
use crate::transport::protocol::{
    REASON_BREAKPOINT, REASON_PAUSED, REASON_STARTING, REASON_STEP_INTO, REASON_STEP_OUT,
    REASON_STEP_OVER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DebuggerStatus {
    NotEnabled = 0,
    Running = 1,
    PauseRequested = 2,
    StepInto = 3,
    StepOver = 4,
    StepOut = 5,
    Stopped = 6,
    Starting = 7,
}

impl DebuggerStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => DebuggerStatus::Running,
            2 => DebuggerStatus::PauseRequested,
            3 => DebuggerStatus::StepInto,
            4 => DebuggerStatus::StepOver,
            5 => DebuggerStatus::StepOut,
            6 => DebuggerStatus::Stopped,
            7 => DebuggerStatus::Starting,
            _ => DebuggerStatus::NotEnabled,
        }
    }
}

/// Lock-free holder for [`DebuggerStatus`]. C1 (the secondary core) only
/// ever writes `Starting` or `PauseRequested` into it; transitions into and
/// out of `Stopped` are always made by C0 itself (`spec.md` §5), so a
/// single atomic word with acquire/release ordering is sufficient -- no
/// compare-and-swap is needed because there is exactly one writer for any
/// given transition.
#[derive(Debug, Default)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    pub fn new(initial: DebuggerStatus) -> Self {
        Self(AtomicU8::new(initial as u8))
    }

    pub fn get(&self) -> DebuggerStatus {
        DebuggerStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, status: DebuggerStatus) {
        self.0.store(status as u8, Ordering::Release)
    }
}

/// The 8-character payload of a `DBG_STOP` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Paused,
    Breakpoint,
    StepInto,
    StepOver,
    StepOut,
    Starting,
}

impl StopReason {
    pub fn tag(self) -> &'static [u8; 8] {
        match self {
            StopReason::Paused => REASON_PAUSED,
            StopReason::Breakpoint => REASON_BREAKPOINT,
            StopReason::StepInto => REASON_STEP_INTO,
            StopReason::StepOver => REASON_STEP_OVER,
            StopReason::StepOut => REASON_STEP_OUT,
            StopReason::Starting => REASON_STARTING,
        }
    }
}

/// Per-process state the pre-opcode hook owns exclusively: the last
/// position seen (to fast-exit on "position unchanged") and the position
/// snapshotted when a step command was accepted. Both are singletons per
/// `spec.md` §9's "Global mutable state", guarded by the same mutex as the
/// breakpoint table even though only C0 ever touches them, since the spec
/// calls for a single core-mutex.
#[derive(Debug, Default)]
pub struct PositionState {
    pub last_pos: Option<SourcePosition>,
    pub step_pos: Option<SourcePosition>,
}

/// Advance the state machine for a position change observed at `cur_bc`.
///
/// Returns `Some(reason)` the moment the machine decides to stop (the
/// caller is responsible for setting `status` to `Stopped`, which this
/// function does before returning, and for entering the stop-loop);
/// `None` means "no externally visible change, keep running".
///
/// `is_breakpoint` is checked first, ahead of any step/pause condition, so
/// a breakpoint at `cur` always wins (`spec.md` §4.5).
pub fn process<P: BytecodePosition>(
    status: &StatusCell,
    positions: &mut PositionState,
    cur_bc: &P,
    is_breakpoint: impl FnOnce(InternedId, u32) -> bool,
) -> Option<StopReason> {
    let cur_status = status.get();
    if cur_status == DebuggerStatus::NotEnabled {
        return None;
    }

    let cur = cur_bc.source_pos();
    if positions.last_pos == Some(cur) {
        return None;
    }
    positions.last_pos = Some(cur);

    if cur_status != DebuggerStatus::Stopped && is_breakpoint(cur.file, cur.line) {
        status.set(DebuggerStatus::Stopped);
        return Some(StopReason::Breakpoint);
    }

    let reason = match cur_status {
        DebuggerStatus::NotEnabled => return None,
        DebuggerStatus::Running => return None,
        DebuggerStatus::Starting => StopReason::Starting,
        DebuggerStatus::PauseRequested => StopReason::Paused,
        DebuggerStatus::StepInto => StopReason::StepInto,
        DebuggerStatus::StepOut => {
            let step_pos = positions.step_pos?;
            if cur.depth < step_pos.depth {
                StopReason::StepOut
            } else {
                return None;
            }
        }
        DebuggerStatus::StepOver => {
            let step_pos = positions.step_pos?;
            if cur.depth <= step_pos.depth && !cur.eq_ignoring_depth(&step_pos) {
                StopReason::StepOver
            } else {
                return None;
            }
        }
        // Shouldn't happen mid-hook: the hook doesn't run while stopped.
        DebuggerStatus::Stopped => return None,
    };

    status.set(DebuggerStatus::Stopped);
    Some(reason)
}
