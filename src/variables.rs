//! C4: the variable enumerator and variables-response protocol.

use crate::frames::END_TOKEN;
use crate::intern::InternedId;
use crate::interp::{Interpreter, ObjectView};
use crate::transport::codec::{MessageReader, ResponseBuffer};

bitflags::bitflags! {
    /// Category a variable is classified into. Single-bit so values
    /// combine into a request's include mask and a response's
    /// `contains_flags` byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VarKind: u8 {
        const NORMAL   = 0b0000_0001;
        const SPECIAL  = 0b0000_0010;
        const FUNCTION = 0b0000_0100;
        const CLASS    = 0b0000_1000;
        const MODULE   = 0b0001_0000;
    }
}

/// Which scope a `DBG_VARS` request is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarScope {
    /// Frame-local variables at the given depth from the top (0 = top).
    Frame(u32),
    /// The interpreter's global mapping.
    Global,
    /// A previously-surfaced `varinfo.address`, drilled into.
    Object(u32),
}

const SCOPE_FRAME: u8 = 0;
const SCOPE_GLOBAL: u8 = 1;
const SCOPE_OBJECT: u8 = 2;

impl VarScope {
    fn decode(scope_byte: u8, depth_or_addr: u32) -> Option<VarScope> {
        match scope_byte {
            SCOPE_FRAME => Some(VarScope::Frame(depth_or_addr)),
            SCOPE_GLOBAL => Some(VarScope::Global),
            SCOPE_OBJECT => Some(VarScope::Object(depth_or_addr)),
            _ => None,
        }
    }
}

/// `DBG_VARS` request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariablesRequest {
    pub scope: VarScope,
    pub include_kind_mask: VarKind,
    pub var_start_index: u32,
}

impl VariablesRequest {
    /// Parse the wire payload: tag (8) + scope (1) + include mask (1) +
    /// depth_or_addr (4) + var_start_idx (4). Returns `None` for an
    /// unrecognized scope byte -- an invalid request, per `spec.md` §7,
    /// resolves to an empty result rather than an error.
    pub fn from_reader(reader: &MessageReader<'_>) -> Option<Self> {
        let scope_byte = reader.get_u8(8);
        let include_byte = reader.get_u8(9);
        let depth_or_addr = reader.get_u32(10);
        let var_start_index = reader.get_u32(14);
        let scope = VarScope::decode(scope_byte, depth_or_addr)?;
        Some(VariablesRequest {
            scope,
            include_kind_mask: VarKind::from_bits_truncate(include_byte),
            var_start_index,
        })
    }
}

/// One enumerated variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarInfo {
    pub name: String,
    pub value: String,
    pub type_name: InternedId,
    pub address: u32,
    pub kind: VarKind,
}

/// Classify a variable by name and type, matching the original exactly:
/// special detection looks only at whether the name's first two bytes are
/// `__`, not whether it also ends with `__` (`spec.md` §9 open question --
/// preserved for host-protocol compatibility, not "fixed").
fn classify(name: &str, is_function: bool, is_class: bool, is_module: bool) -> VarKind {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'_' && bytes[1] == b'_' {
        VarKind::SPECIAL
    } else if is_function {
        VarKind::FUNCTION
    } else if is_class {
        VarKind::CLASS
    } else if is_module {
        VarKind::MODULE
    } else {
        VarKind::NORMAL
    }
}

enum Source<Obj> {
    /// Frame locals: unnamed slots, some possibly null.
    Locals(Vec<Option<Obj>>),
    /// The globals mapping: `(name_obj, value_obj)` pairs, names printed
    /// with `print_str` (they are interned strings, never need `repr`).
    Globals(Vec<(Obj, Obj)>),
    /// tuple/list items, named by index.
    Sequence(Vec<Obj>),
    /// Dict pairs with an optional synthetic `len()` entry prepended.
    /// Keys are printed with `print_repr` since they may be non-strings.
    Dict {
        pairs: Vec<(Obj, Obj)>,
        len: Option<i64>,
    },
    /// Attribute list from `dir(src)`; each value comes from
    /// `getattr(src, attr)`.
    AttrBearing { src: Obj, attrs: Vec<Obj> },
    Empty,
}

fn resolve_source<I: Interpreter>(interp: &I, scope: &VarScope) -> Source<I::Object> {
    match *scope {
        VarScope::Frame(depth) => match interp.frame_at_depth(depth) {
            Some(frame) => Source::Locals(interp.frame_locals(&frame)),
            None => Source::Empty,
        },
        VarScope::Global => Source::Globals(interp.globals()),
        VarScope::Object(addr) => {
            if addr == 0 {
                return Source::Empty;
            }
            match interp.object_from_address(addr) {
                None => Source::Empty,
                Some(obj) => match interp.object_view(obj) {
                    ObjectView::Sequence(items) => Source::Sequence(items),
                    ObjectView::Dict(pairs) => Source::Dict {
                        pairs,
                        len: Some(interp.len(obj)),
                    },
                    ObjectView::AttrBearing(attrs) => Source::AttrBearing { src: obj, attrs },
                    ObjectView::Opaque => Source::Empty,
                },
            }
        }
    }
}

/// Drives a [`Source`] into a stream of [`VarInfo`], one item per call to
/// `next`, matching the spec's "enumeration yields one varinfo at a time".
struct VarEnumerator<'i, I: Interpreter> {
    interp: &'i I,
    source: Source<I::Object>,
    idx: usize,
    obj_repr_max: usize,
    len_pending: Option<i64>,
}

impl<'i, I: Interpreter> VarEnumerator<'i, I> {
    fn new(interp: &'i I, source: Source<I::Object>, obj_repr_max: usize) -> Self {
        let len_pending = if let Source::Dict { len, .. } = &source {
            *len
        } else {
            None
        };
        Self {
            interp,
            source,
            idx: 0,
            obj_repr_max,
            len_pending,
        }
    }

    fn info_for(&self, name: String, obj: I::Object) -> VarInfo {
        let type_name = self.interp.type_name(obj);
        let kind = classify(
            &name,
            self.interp.is_function_type(obj),
            self.interp.is_class_type(obj),
            self.interp.is_module_type(obj),
        );
        VarInfo {
            name,
            value: self.interp.print_repr(obj, self.obj_repr_max),
            type_name,
            address: self.interp.address_of(obj),
            kind,
        }
    }

    fn empty_info() -> VarInfo {
        VarInfo {
            name: String::new(),
            value: String::new(),
            type_name: InternedId::NONE,
            address: 0,
            kind: VarKind::NORMAL,
        }
    }
}

impl<'i, I: Interpreter> Iterator for VarEnumerator<'i, I> {
    type Item = VarInfo;

    fn next(&mut self) -> Option<VarInfo> {
        if let Some(len) = self.len_pending.take() {
            return Some(VarInfo {
                name: "len()".to_string(),
                value: len.to_string(),
                type_name: InternedId::NONE,
                address: 0,
                kind: VarKind::NORMAL,
            });
        }

        match &self.source {
            Source::Locals(slots) => {
                if self.idx >= slots.len() {
                    return None;
                }
                let slot = slots[self.idx];
                self.idx += 1;
                Some(match slot {
                    // Names are unavailable for locals; show the slot index.
                    Some(obj) => self.info_for((self.idx - 1).to_string(), obj),
                    // Null local: interpreter-side fault, empty record.
                    None => Self::empty_info(),
                })
            }
            Source::Globals(pairs) => {
                if self.idx >= pairs.len() {
                    return None;
                }
                let (key, value) = pairs[self.idx];
                self.idx += 1;
                let name = self.interp.print_str(key, self.obj_repr_max);
                Some(self.info_for(name, value))
            }
            Source::Sequence(items) => {
                if self.idx >= items.len() {
                    return None;
                }
                let obj = items[self.idx];
                let name = self.idx.to_string();
                self.idx += 1;
                Some(self.info_for(name, obj))
            }
            Source::Dict { pairs, .. } => {
                if self.idx >= pairs.len() {
                    return None;
                }
                let (key, value) = pairs[self.idx];
                self.idx += 1;
                // Drilled-down dict keys may be non-strings: repr, not str.
                let name = self.interp.print_repr(key, self.obj_repr_max);
                Some(self.info_for(name, value))
            }
            Source::AttrBearing { src, attrs } => {
                if self.idx >= attrs.len() {
                    return None;
                }
                let attr = attrs[self.idx];
                self.idx += 1;
                match self.interp.getattr(*src, attr) {
                    Some(value) => {
                        let name = self.interp.print_str(attr, self.obj_repr_max);
                        Some(self.info_for(name, value))
                    }
                    // getattr faulted: interpreter-side fault, fully empty
                    // record (`spec.md` §7), not just a blanked value.
                    None => Some(Self::empty_info()),
                }
            }
            Source::Empty => None,
        }
    }
}

fn varinfo_wire_size(vi: &VarInfo, type_str: &str) -> usize {
    vi.name.len() + 1 + vi.value.len() + 1 + type_str.len() + 1 + 4
}

fn append_varinfo(resp: &mut ResponseBuffer, vi: &VarInfo, type_str: &str) {
    resp.append_cstr(&vi.name).expect("size was pre-checked");
    resp.append_cstr(&vi.value).expect("size was pre-checked");
    resp.append_cstr(type_str).expect("size was pre-checked");
    resp.append_u32(vi.address).expect("size was pre-checked");
}

/// Build a variables response for `request` against `interp`.
///
/// Every observed kind is folded into the leading flags byte regardless
/// of whether it passed the include mask (the host uses this to show/hide
/// category toggles); only items that pass the mask advance the
/// `var_start_index` counter; once a packet is full, iteration continues
/// (to finish the flags) but no further items are serialized.
pub fn build_variables_response<I: Interpreter>(
    interp: &I,
    request: &VariablesRequest,
    budget: usize,
    obj_repr_max: usize,
) -> Vec<u8> {
    let mut resp = ResponseBuffer::with_capacity(budget);
    // Placeholder; backfilled once contains_flags is known.
    let _ = resp.append_u8(0);

    let mut contains_flags = VarKind::empty();
    let mut filtered_index: u32 = 0;
    let mut packet_full = false;

    let source = resolve_source(interp, &request.scope);
    for vi in VarEnumerator::new(interp, source, obj_repr_max) {
        contains_flags |= vi.kind;

        if (vi.kind & request.include_kind_mask).is_empty() {
            continue;
        }

        if filtered_index >= request.var_start_index && !packet_full {
            let type_str = interp.resolve_intern(vi.type_name);
            let size = varinfo_wire_size(&vi, &type_str);
            if resp.len() + size > budget {
                packet_full = true;
            } else {
                append_varinfo(&mut resp, &vi, &type_str);
            }
        }
        filtered_index += 1;
    }

    if !packet_full {
        let _ = resp.append_literal(END_TOKEN);
    }

    resp.set_byte_at(0, contains_flags.bits());
    resp.finish()
}
