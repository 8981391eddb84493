//! The facade: wires the breakpoint table, the state machine, and the
//! transport contract into the two entry points an embedding interpreter
//! calls -- the secondary-core command dispatcher and the primary-core
//! pre-opcode hook -- plus the stop-loop that bridges them.

use parking_lot::Mutex;

use crate::breakpoints::BreakpointTable;
use crate::config::DebuggerConfig;
use crate::error::TransportError;
use crate::frames::build_stack_response;
use crate::interp::{BytecodePosition, Interpreter};
use crate::state::{process, DebuggerStatus, PositionState, StatusCell};
use crate::transport::bus::TransportBus;
use crate::transport::protocol::{self, Command};
use crate::variables::build_variables_response;

/// Everything guarded by the single core-mutex (`spec.md` §5): the
/// breakpoint table and the position singletons. `DebuggerStatus` is
/// deliberately outside this mutex -- see [`StatusCell`].
struct SharedState {
    breakpoints: BreakpointTable,
    positions: PositionState,
}

/// The debugging core. Constructed once by the host and shared between
/// both cores, normally behind an `Arc` (`spec.md` §5, §9 "encapsulate
/// them in a single state value held behind a module-level handle
/// initialized once" -- here that handle is the `Arc`, and "initialized
/// once" falls out of ordinary Rust construction rather than a runtime
/// one-shot flag).
///
/// `P` is the interpreter's bytecode-position handle type (`spec.md` §3).
/// It is threaded through as a type parameter, rather than fetched via the
/// `Interpreter` trait, because the pre-opcode hook receives it as an
/// argument at the call site, exactly like the original's `process(bc_pos)`.
pub struct DebuggerCore<I: Interpreter, B: TransportBus, P: BytecodePosition + Clone + Send> {
    config: DebuggerConfig,
    status: StatusCell,
    shared: Mutex<SharedState>,
    /// The bytecode position most recently passed to [`on_opcode`], kept
    /// around so a stack request served from the stop-loop can walk the
    /// same caller chain the hook observed when it decided to stop.
    current_bc: Mutex<Option<P>>,
    interp: I,
    bus: B,
}

impl<I: Interpreter, B: TransportBus, P: BytecodePosition + Clone + Send> DebuggerCore<I, B, P> {
    pub fn new(interp: I, bus: B, config: DebuggerConfig) -> Self {
        Self {
            shared: Mutex::new(SharedState {
                breakpoints: BreakpointTable::new(config.max_breakpoints),
                positions: PositionState::default(),
            }),
            status: StatusCell::new(DebuggerStatus::NotEnabled),
            current_bc: Mutex::new(None),
            config,
            interp,
            bus,
        }
    }

    pub fn status(&self) -> DebuggerStatus {
        self.status.get()
    }

    pub fn config(&self) -> DebuggerConfig {
        self.config
    }

    fn lock_shared(&self) -> Option<parking_lot::MutexGuard<'_, SharedState>> {
        match self.shared.try_lock_for(self.config.mutex_timeout) {
            Some(guard) => Some(guard),
            None => {
                log::warn!("core mutex acquisition timed out");
                None
            }
        }
    }

    /// The secondary-core command handler: receives on the transport and
    /// acquires the mutex to mutate shared state (`spec.md` §4.6). Returns
    /// `true` if the command was recognized and handled here.
    pub fn dispatch_command(&self, raw: &[u8]) -> bool {
        let reader = crate::transport::codec::MessageReader::new(raw);
        let Some(command) = protocol::parse_command(&reader) else {
            log::debug!("ignoring unrecognized command");
            return false;
        };

        match command {
            Command::Terminate => {
                self.interp.interrupt();
                true
            }
            Command::Start => {
                if let Some(mut guard) = self.lock_shared() {
                    guard.breakpoints.clear_all();
                }
                self.status.set(DebuggerStatus::Starting);
                true
            }
            Command::Pause if self.status.get() != DebuggerStatus::NotEnabled => {
                self.status.set(DebuggerStatus::PauseRequested);
                true
            }
            Command::SetBreakpoints { file, lines } if self.status.get() != DebuggerStatus::NotEnabled => {
                self.apply_set_breakpoints(&file, &lines);
                true
            }
            _ => {
                // Everything else (continue/step/stack/variables requests)
                // belongs to the interpreter-core stop-loop, not here.
                false
            }
        }
    }

    fn apply_set_breakpoints(&self, file: &str, lines: &[u32]) {
        let Some(file_id) = self.interp.find_intern(file) else {
            log::warn!("set_breakpoints for unknown file {file:?}");
            return;
        };
        if let Some(mut guard) = self.lock_shared() {
            guard.breakpoints.clear_for_file(file_id);
            for &line in lines {
                guard.breakpoints.set(file_id, line);
            }
        }
    }

    /// The primary-core pre-opcode hook. Not re-entrant: the stop-loop
    /// this can enter never executes opcodes itself (`spec.md` §5).
    pub fn on_opcode(&self, bc_pos: &P) {
        // Hot-path fast exit: debugging off, skip the clone and both locks
        // entirely (`spec.md` §5; the original's `jpo_dbgr_debug_hook`
        // returns immediately on `DS_NOT_ENABLED`).
        if self.status.get() == DebuggerStatus::NotEnabled {
            return;
        }

        *self.current_bc.lock() = Some(bc_pos.clone());

        let reason = {
            let Some(mut guard) = self.lock_shared() else {
                return;
            };
            let SharedState { breakpoints, positions } = &mut *guard;
            process(&self.status, positions, bc_pos, |file, line| {
                breakpoints.contains(file, line)
            })
        };
        if let Some(reason) = reason {
            self.enter_stop_loop(reason);
        }
    }

    fn enter_stop_loop(&self, reason: crate::state::StopReason) {
        if let Err(err) = self.bus.send_event(protocol::EVT_STOP, reason.tag()) {
            log::warn!("failed to send stop event: {err}");
        }

        loop {
            match self.bus.receive_command(self.config.stop_loop_poll_interval) {
                Ok(None) => continue,
                Err(err) => {
                    log::warn!("transport receive failed in stop-loop: {err}");
                    continue;
                }
                Ok(Some((correlation_id, raw))) => {
                    let reader = crate::transport::codec::MessageReader::new(&raw);
                    match protocol::parse_command(&reader) {
                        Some(Command::Continue) => {
                            self.status.set(DebuggerStatus::Running);
                            return;
                        }
                        Some(Command::StepInto) => {
                            self.snapshot_step_pos();
                            self.status.set(DebuggerStatus::StepInto);
                            return;
                        }
                        Some(Command::StepOver) => {
                            self.snapshot_step_pos();
                            self.status.set(DebuggerStatus::StepOver);
                            return;
                        }
                        Some(Command::StepOut) => {
                            self.snapshot_step_pos();
                            self.status.set(DebuggerStatus::StepOut);
                            return;
                        }
                        Some(Command::StackRequest(req)) => {
                            self.serve_stack_request(correlation_id, &req);
                        }
                        Some(Command::VariablesRequest(req)) => {
                            self.serve_variables_request(correlation_id, &req);
                        }
                        Some(Command::Terminate) => {
                            self.interp.interrupt();
                        }
                        _ => log::debug!("ignoring unhandled command in stop-loop"),
                    }
                }
            }
        }
    }

    fn snapshot_step_pos(&self) {
        if let Some(mut guard) = self.lock_shared() {
            guard.positions.step_pos = guard.positions.last_pos;
        }
    }

    fn serve_stack_request(&self, correlation_id: u8, request: &crate::frames::StackRequest) {
        let top_bc = self.current_bc.lock().clone();
        let bytes = match top_bc {
            Some(top_bc) => build_stack_response(request, top_bc, self.config.stack_payload_budget, |id| {
                self.interp.resolve_intern(id)
            }),
            // Never observed a position (hook never ran): the chain is
            // empty, so the response is just the sentinel.
            None => crate::frames::END_TOKEN.to_vec(),
        };
        let _ = self.send_response(correlation_id, bytes);
    }

    fn serve_variables_request(&self, correlation_id: u8, request: &crate::variables::VariablesRequest) {
        let bytes = build_variables_response(
            &self.interp,
            request,
            self.config.vars_payload_budget,
            self.config.obj_repr_max,
        );
        let _ = self.send_response(correlation_id, bytes);
    }

    fn send_response(&self, correlation_id: u8, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.bus.send_response(correlation_id, &bytes)
    }

    /// The host calls this once the interpreter run loop finishes, mirroring
    /// `parse_compile_execute_done`'s `DBG_DONE` emission (`spec.md` §6).
    /// Resets to `NotEnabled` first, the Rust analogue of the original's
    /// `reset_vars()`, so a subsequent `DBG_STRT` starts clean and the
    /// hot-path fast exit in [`Self::on_opcode`] takes over immediately.
    pub fn notify_done(&self, return_code: u32) -> Result<(), TransportError> {
        self.status.set(DebuggerStatus::NotEnabled);
        self.bus.send_event(protocol::EVT_DONE, &return_code.to_le_bytes())
    }
}
