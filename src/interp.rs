//! The interpreter contract.
//!
//! `spec.md` §1 lists the interpreter as an external collaborator: it
//! "supplies bytecode positions, frames, object inspection ..., and the
//! interned-string table." This module is the seam — a small set of
//! traits the embedding interpreter implements once, so the debugging core
//! never references a concrete VM type.
//!
//! Design Notes §9 calls for capability traits (`IsDict`, `IsSequence`,
//! `IsAttrBearing`) instead of a hand-coded if/else ladder over type tags
//! (the original's `iter_init_from_obj`, which chains
//! `mp_obj_is_type(obj, &mp_type_tuple) || mp_obj_is_type(obj,
//! &mp_type_list)`, and so on). Here that capability check is a single
//! dispatch method, [`Interpreter::object_view`], returning which
//! capability an object handle has; the variable enumerator branches on
//! the result rather than re-deriving it.

use crate::intern::InternedId;

/// An opaque handle naming an in-progress bytecode instruction plus its
/// frame context. The chain `h, caller(h), caller(caller(h)), ...` must be
/// finite and acyclic; the interpreter owns the underlying frame, this
/// crate only ever borrows a handle for the duration of one call.
pub trait BytecodePosition: Sized {
    /// Project this handle to its human-meaningful source position.
    fn source_pos(&self) -> crate::position::SourcePosition;

    /// The caller's bytecode position, or `None` at the outermost frame.
    fn caller(&self) -> Option<Self>;
}

/// How an object handle should be enumerated by the variable enumerator
/// (C4), decided once by the interpreter integration layer instead of a
/// repeated type-tag ladder.
pub enum ObjectView<Obj> {
    /// tuple/list: iterate items in order, name each by its index.
    Sequence(Vec<Obj>),
    /// dict: iterate key/value pairs. Keys may be non-string objects, so
    /// they are printed with `print_repr`, not `print_str`.
    Dict(Vec<(Obj, Obj)>),
    /// object/instance/type/module/function/closure/cell: iterate the
    /// attribute list (`dir(obj)`); each entry's value comes from
    /// `getattr(obj, attr)`.
    AttrBearing(Vec<Obj>),
    /// A type with no defined enumeration. Emits no entries — "best-effort
    /// type dispatch, emits no entries on unknown types" (spec.md §4.4).
    Opaque,
}

/// The interpreter collaborator: frame/global access, object inspection,
/// and the interned-string table.
pub trait Interpreter {
    /// A handle to any runtime value (MicroPython's `mp_obj_t`). Must be
    /// cheap to copy: the core holds these only transiently and never
    /// dereferences one itself.
    type Object: Copy + Eq;
    /// A handle to a call frame, as returned by [`Interpreter::frame_at_depth`].
    type Frame;

    /// Find the frame `depth` levels up from the top (innermost) frame.
    /// `depth == 0` is the top. Returns `None` for an unresolvable depth
    /// (`spec.md` §7: invalid request -> empty result, no error event).
    fn frame_at_depth(&self, depth: u32) -> Option<Self::Frame>;

    /// The frame's local variable slots. Entries may be `None` ("null
    /// locals" -- spec.md §7 says these enumerate to an empty
    /// name/value record with address 0). Names are never available for
    /// locals; the enumerator uses the slot index instead.
    fn frame_locals(&self, frame: &Self::Frame) -> Vec<Option<Self::Object>>;

    /// The global variable mapping, as `(name, value)` pairs. Names here
    /// are themselves object handles (interned strings in the VM) so they
    /// go through the same print path as any other object.
    fn globals(&self) -> Vec<(Self::Object, Self::Object)>;

    /// Reinterpret a previously-surfaced `varinfo.address` as an object
    /// handle. Returns `None` for address `0` or an address the
    /// interpreter does not recognize; the core never assumes the address
    /// is valid.
    fn object_from_address(&self, addr: u32) -> Option<Self::Object>;

    /// The drill-down address for an object, or `0` if this type does not
    /// support drill-down (`spec.md` §4.4 "Address-worthiness").
    fn address_of(&self, obj: Self::Object) -> u32;

    /// How this object should be enumerated.
    fn object_view(&self, obj: Self::Object) -> ObjectView<Self::Object>;

    /// `len(obj)`, used to prepend the synthetic `len()` entry when
    /// drilling down into a dict.
    fn len(&self, obj: Self::Object) -> i64;

    /// Look up an attribute's value via `getattr`. `None` models a faulted
    /// lookup (`spec.md` §7 interpreter-side fault).
    fn getattr(&self, obj: Self::Object, attr_name: Self::Object) -> Option<Self::Object>;

    /// The object's type name as an interned id.
    fn type_name(&self, obj: Self::Object) -> InternedId;
    /// True if `obj`'s type is the bytecode-function or closure type.
    fn is_function_type(&self, obj: Self::Object) -> bool;
    /// True if `obj`'s type is the metatype ("type" / class object).
    fn is_class_type(&self, obj: Self::Object) -> bool;
    /// True if `obj`'s type is a module.
    fn is_module_type(&self, obj: Self::Object) -> bool;

    /// `repr(obj)`, truncated to at most `max_len` characters by the
    /// interpreter's own print helper.
    fn print_repr(&self, obj: Self::Object, max_len: usize) -> String;
    /// `str(obj)`, truncated to at most `max_len` characters.
    fn print_str(&self, obj: Self::Object, max_len: usize) -> String;

    /// Resolve an interned id to its text, e.g. for wire serialization of
    /// file/block/type names. Empty string if the id is unknown.
    fn resolve_intern(&self, id: InternedId) -> String;

    /// Find the interned id for a string, if the interpreter has interned
    /// it. Used when a `set_breakpoints` message names a file by string
    /// (`spec.md` §7: "file string not present as an intern id" -> the
    /// operation returns an empty result).
    fn find_intern(&self, s: &str) -> Option<InternedId>;

    /// Raise the keyboard-interrupt-equivalent `DBG_TRMT` asks for. Must be
    /// safe to call from the secondary core regardless of whether
    /// debugging is enabled (`spec.md` §4.6); the interpreter unwinds on
    /// its own schedule, this call only requests it.
    fn interrupt(&self);
}
