//! C1: the breakpoint table.
//!
//! A fixed-capacity set of `(file, line)` pairs. Host core writes, the
//! interpreter core reads on the hot path (`contains`). The invariant the
//! whole module exists to preserve: non-empty slots are always contiguous
//! starting at index 0 ("compact"), so `contains` can stop scanning at the
//! first empty slot instead of walking the whole table.
//!
//! The original (`jpo_debugger.c`) stores `file` truncated to `uint16_t`
//! and warns when that loses bits. This rewrite stores the interned id at
//! its native width, per the REDESIGN FLAG in `spec.md` §9.

use crate::intern::InternedId;

/// A single breakpoint: stop when execution reaches `line` in `file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Breakpoint {
    pub file: InternedId,
    pub line: u32,
}

impl Breakpoint {
    fn empty() -> Self {
        Self {
            file: InternedId::NONE,
            line: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.file.is_none()
    }
}

/// Fixed-capacity, always-compact breakpoint table.
pub struct BreakpointTable {
    slots: Vec<Breakpoint>,
}

impl BreakpointTable {
    /// Create a table with room for `capacity` simultaneous breakpoints
    /// (the original's `MAX_BREAKPOINTS`, default 100).
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Breakpoint::empty(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Zero every slot.
    pub fn clear_all(&mut self) {
        for slot in &mut self.slots {
            *slot = Breakpoint::empty();
        }
    }

    /// Zero every slot for `file`, then compact.
    pub fn clear_for_file(&mut self, file: InternedId) {
        for slot in &mut self.slots {
            if slot.file == file {
                *slot = Breakpoint::empty();
            }
        }
        self.compact();
    }

    /// Insert `(file, line)` into the first empty slot. If the table is
    /// full, the request is dropped (never overwrites an existing entry,
    /// never grows past capacity) and a warning is logged. A duplicate
    /// `(file, line)` pair is inserted again: the host is expected to
    /// issue a whole-file replace via `clear_for_file` + repeated `set`,
    /// not incremental additions.
    pub fn set(&mut self, file: InternedId, line: u32) {
        for slot in &mut self.slots {
            if slot.is_empty() {
                *slot = Breakpoint { file, line };
                return;
            }
        }
        log::warn!(
            "breakpoint table full (capacity {}), dropping set({file}, {line})",
            self.slots.len()
        );
    }

    /// Linear scan, stopping at the first empty slot (which, by the
    /// compaction invariant, terminates the search early if `(file,
    /// line)` is not present).
    pub fn contains(&self, file: InternedId, line: u32) -> bool {
        for slot in &self.slots {
            if slot.is_empty() {
                return false;
            }
            if slot.file == file && slot.line == line {
                return true;
            }
        }
        false
    }

    /// Restore the compaction invariant: push all empty slots to the
    /// bottom, preserving the relative order of non-empty ones.
    fn compact(&mut self) {
        let mut write = 0;
        for read in 0..self.slots.len() {
            if !self.slots[read].is_empty() {
                self.slots.swap(write, read);
                write += 1;
            }
        }
        for slot in &mut self.slots[write..] {
            *slot = Breakpoint::empty();
        }
    }

    /// `true` if the table is compact: an index `k` exists such that every
    /// slot before it is non-empty and every slot from it on is empty.
    /// Exposed for property tests; the table never leaves this state
    /// observable to callers of `set`/`clear_*`.
    #[cfg(test)]
    fn is_compact(&self) -> bool {
        let mut seen_empty = false;
        for slot in &self.slots {
            if slot.is_empty() {
                seen_empty = true;
            } else if seen_empty {
                return false;
            }
        }
        true
    }
}
