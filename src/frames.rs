//! C3: the frame walker and stack-response protocol.

use crate::intern::InternedId;
use crate::interp::BytecodePosition;
use crate::transport::codec::{MessageReader, ResponseBuffer};

/// The byte sequence that marks the final chunk of a chunked response.
pub const END_TOKEN: &[u8] = b"<end>\0";

/// `DBG_STAC` request payload: an 8-byte tag followed by a `u32` start
/// index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackRequest {
    pub start_frame_index: u32,
}

impl StackRequest {
    /// Offset 8: the tag occupies the first 8 bytes.
    pub fn from_reader(reader: &MessageReader<'_>) -> Self {
        Self {
            start_frame_index: reader.get_u32(8),
        }
    }
}

/// Lazily walk a bytecode position's caller chain, yielding
/// `(frame_index, source_position)` pairs from the top (innermost, index
/// 0) outward. Finite and acyclic because [`BytecodePosition::caller`] is.
pub struct FrameWalk<P: BytecodePosition> {
    next: Option<P>,
    index: u32,
}

impl<P: BytecodePosition> FrameWalk<P> {
    pub fn new(top: P) -> Self {
        Self {
            next: Some(top),
            index: 0,
        }
    }
}

impl<P: BytecodePosition> Iterator for FrameWalk<P> {
    type Item = (u32, crate::position::SourcePosition);

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next.take()?;
        let pos = cur.source_pos();
        let idx = self.index;
        self.next = cur.caller();
        self.index += 1;
        Some((idx, pos))
    }
}

/// Wire-encode a single frame: `file\0block\0<u32 line><u32 frame_idx>`.
fn frame_wire_size(file: &str, block: &str) -> usize {
    file.len() + 1 + block.len() + 1 + 4 + 4
}

/// Build a stack response for `request`, walking `top_bc`'s caller chain.
///
/// Frames before `request.start_frame_index` are skipped without being
/// serialized. The walk stops, without emitting a partial frame, the
/// moment a frame would not fit in `budget` bytes; the end sentinel is
/// appended only if the walk reached the end of the chain *and* the
/// sentinel itself fits. `resolve_intern` turns a file/block id into
/// display text (this module never touches the interpreter directly).
pub fn build_stack_response<P: BytecodePosition>(
    request: &StackRequest,
    top_bc: P,
    budget: usize,
    resolve_intern: impl Fn(InternedId) -> String,
) -> Vec<u8> {
    let mut resp = ResponseBuffer::with_capacity(budget);
    let mut reached_end = true;

    for (frame_idx, pos) in FrameWalk::new(top_bc) {
        if frame_idx < request.start_frame_index {
            continue;
        }

        let file = resolve_intern(pos.file);
        let block = resolve_intern(pos.block);
        let size = frame_wire_size(&file, &block);
        if resp.len() + size > budget {
            reached_end = false;
            break;
        }

        resp.append_cstr(&file).expect("size was pre-checked");
        resp.append_cstr(&block).expect("size was pre-checked");
        resp.append_u32(pos.line).expect("size was pre-checked");
        resp.append_u32(frame_idx).expect("size was pre-checked");
    }

    if reached_end {
        // Ok if it doesn't fit: the host will see a non-terminated chunk,
        // re-request with an advanced start index, and eventually land on
        // an empty response that is exactly the sentinel.
        let _ = resp.append_literal(END_TOKEN);
    }

    resp.finish()
}
