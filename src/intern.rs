//! Interned string ids (`qstr` in the original).
//!
//! The interpreter maintains a table mapping short strings (file names,
//! block/function names, type names) to small integer ids; equality of
//! strings becomes equality of ids. This crate never resolves an id to a
//! string itself — it only compares, stores, and forwards ids, asking the
//! `Interpreter` collaborator to resolve them to text when a response needs
//! one.

/// An id into the interpreter's interned-string table. `0` means
/// "unknown/absent", matching the original's `qstr` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct InternedId(pub u32);

impl InternedId {
    /// The sentinel meaning "unknown/absent".
    pub const NONE: InternedId = InternedId(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for InternedId {
    fn from(v: u32) -> Self {
        InternedId(v)
    }
}

impl std::fmt::Display for InternedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
