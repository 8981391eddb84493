//! Tunable budgets and timeouts for the debugging core.
//!
//! The original hard-codes these per translation unit (`MAX_BREAKPOINTS`,
//! `MUTEX_TIMEOUT_MS`, a 200-byte stack budget in one file and
//! `JCOMP_MAX_PAYLOAD_SIZE` in another). Exposing them as a single
//! constructible value is the fix called for in `spec.md` §9's open
//! questions.

use std::time::Duration;

/// Debugging-core tunables, constructed once by the host and shared by
/// both cores.
#[derive(Debug, Clone, Copy)]
pub struct DebuggerConfig {
    /// Maximum number of simultaneously set breakpoints. The original's
    /// `MAX_BREAKPOINTS` (100).
    pub max_breakpoints: usize,
    /// Maximum bytes a single stack response may occupy. Must be at least
    /// 64 bytes and no more than the transport's maximum payload size.
    pub stack_payload_budget: usize,
    /// Maximum bytes a single variables response may occupy.
    pub vars_payload_budget: usize,
    /// Maximum characters of a printed value/key before the interpreter's
    /// print helper truncates it. The original's `OBJ_RER_MAX_SIZE` (50).
    pub obj_repr_max: usize,
    /// Bound on how long a mutex acquisition attempt may block before it
    /// is treated as a transient miss. The original's `MUTEX_TIMEOUT_MS`
    /// (100ms).
    pub mutex_timeout: Duration,
    /// How long the stop-loop's receive call waits per iteration before
    /// yielding back to the interpreter's cooperative scheduler
    /// (`spec.md` §4.5 "a short receive timeout").
    pub stop_loop_poll_interval: Duration,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            max_breakpoints: 100,
            stack_payload_budget: 200,
            vars_payload_budget: 200,
            obj_repr_max: 50,
            mutex_timeout: Duration::from_millis(100),
            stop_loop_poll_interval: Duration::from_millis(20),
        }
    }
}

impl DebuggerConfig {
    pub fn with_max_breakpoints(mut self, n: usize) -> Self {
        self.max_breakpoints = n;
        self
    }

    pub fn with_stack_payload_budget(mut self, n: usize) -> Self {
        self.stack_payload_budget = n;
        self
    }

    pub fn with_vars_payload_budget(mut self, n: usize) -> Self {
        self.vars_payload_budget = n;
        self
    }

    pub fn with_obj_repr_max(mut self, n: usize) -> Self {
        self.obj_repr_max = n;
        self
    }

    pub fn with_mutex_timeout(mut self, d: Duration) -> Self {
        self.mutex_timeout = d;
        self
    }

    pub fn with_stop_loop_poll_interval(mut self, d: Duration) -> Self {
        self.stop_loop_poll_interval = d;
        self
    }
}
