//! End-to-end scenarios against the public API, driven over an in-memory
//! transport and a minimal fake interpreter built only for this suite.
//!
//! Both the interpreter and the bus are wrapped in `Rc` so the test can
//! keep an observing handle after handing ownership to `DebuggerCore`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use target_dbgr::transport::bus::{InMemoryBus, TransportBus};
use target_dbgr::transport::protocol;
use target_dbgr::{
    BytecodePosition, DebuggerConfig, DebuggerCore, DebuggerStatus, InternedId, Interpreter,
    ObjectView, SourcePosition, TransportError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Obj(u32);

struct FakeInterp {
    interns: RefCell<HashMap<String, u32>>,
    next_intern: RefCell<u32>,
    types: RefCell<HashMap<u32, InternedId>>,
    reprs: RefCell<HashMap<u32, String>>,
    strs: RefCell<HashMap<u32, String>>,
    functions: RefCell<Vec<u32>>,
    addresses: RefCell<HashMap<u32, u32>>,
    views: RefCell<HashMap<u32, &'static str>>,
    seqs: RefCell<HashMap<u32, Vec<u32>>>,
    globals: RefCell<Vec<(u32, u32)>>,
    interrupted: AtomicBool,
}

impl FakeInterp {
    fn new() -> Self {
        Self {
            interns: RefCell::new(HashMap::new()),
            next_intern: RefCell::new(1),
            types: RefCell::new(HashMap::new()),
            reprs: RefCell::new(HashMap::new()),
            strs: RefCell::new(HashMap::new()),
            functions: RefCell::new(Vec::new()),
            addresses: RefCell::new(HashMap::new()),
            views: RefCell::new(HashMap::new()),
            seqs: RefCell::new(HashMap::new()),
            globals: RefCell::new(Vec::new()),
            interrupted: AtomicBool::new(false),
        }
    }

    fn intern(&self, s: &str) -> InternedId {
        if let Some(&id) = self.interns.borrow().get(s) {
            return InternedId(id);
        }
        let mut next = self.next_intern.borrow_mut();
        let id = *next;
        *next += 1;
        self.interns.borrow_mut().insert(s.to_string(), id);
        InternedId(id)
    }

    fn define_global(&self, name: &str, id: u32, type_name: &str, repr: &str) {
        let type_id = self.intern(type_name);
        self.types.borrow_mut().insert(id, type_id);
        self.reprs.borrow_mut().insert(id, repr.to_string());
        let name_id = self.intern(name).0;
        self.strs.borrow_mut().insert(name_id, name.to_string());
        self.globals.borrow_mut().push((name_id, id));
    }

    fn was_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

impl Interpreter for FakeInterp {
    type Object = Obj;
    type Frame = u32;

    fn frame_at_depth(&self, _depth: u32) -> Option<u32> {
        None
    }
    fn frame_locals(&self, _frame: &u32) -> Vec<Option<Obj>> {
        Vec::new()
    }
    fn globals(&self) -> Vec<(Obj, Obj)> {
        self.globals.borrow().iter().map(|&(k, v)| (Obj(k), Obj(v))).collect()
    }
    fn object_from_address(&self, addr: u32) -> Option<Obj> {
        if addr == 0 {
            return None;
        }
        self.addresses
            .borrow()
            .iter()
            .find(|(_, a)| **a == addr)
            .map(|(id, _)| Obj(*id))
    }
    fn address_of(&self, obj: Obj) -> u32 {
        *self.addresses.borrow().get(&obj.0).unwrap_or(&0)
    }
    fn object_view(&self, obj: Obj) -> ObjectView<Obj> {
        match self.views.borrow().get(&obj.0) {
            Some(&"seq") => {
                ObjectView::Sequence(self.seqs.borrow()[&obj.0].iter().map(|&i| Obj(i)).collect())
            }
            _ => ObjectView::Opaque,
        }
    }
    fn len(&self, _obj: Obj) -> i64 {
        0
    }
    fn getattr(&self, _obj: Obj, _attr_name: Obj) -> Option<Obj> {
        None
    }
    fn type_name(&self, obj: Obj) -> InternedId {
        *self.types.borrow().get(&obj.0).unwrap_or(&InternedId::NONE)
    }
    fn is_function_type(&self, obj: Obj) -> bool {
        self.functions.borrow().contains(&obj.0)
    }
    fn is_class_type(&self, _obj: Obj) -> bool {
        false
    }
    fn is_module_type(&self, _obj: Obj) -> bool {
        false
    }
    fn print_repr(&self, obj: Obj, max_len: usize) -> String {
        self.reprs
            .borrow()
            .get(&obj.0)
            .map(|s| s.chars().take(max_len).collect())
            .unwrap_or_default()
    }
    fn print_str(&self, obj: Obj, max_len: usize) -> String {
        self.strs
            .borrow()
            .get(&obj.0)
            .map(|s| s.chars().take(max_len).collect())
            .unwrap_or_default()
    }
    fn resolve_intern(&self, id: InternedId) -> String {
        self.interns
            .borrow()
            .iter()
            .find(|(_, &v)| v == id.0)
            .map(|(k, _)| k.clone())
            .unwrap_or_default()
    }
    fn find_intern(&self, s: &str) -> Option<InternedId> {
        self.interns.borrow().get(s).map(|&v| InternedId(v))
    }
    fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }
}

/// Newtype around `Rc<FakeInterp>` so the trait impl below doesn't run afoul
/// of the orphan rule (neither `Rc` nor `Interpreter` is local to this crate).
/// The test keeps an observing handle after handing a clone to `DebuggerCore`.
#[derive(Clone)]
struct InterpHandle(Rc<FakeInterp>);

impl std::ops::Deref for InterpHandle {
    type Target = FakeInterp;
    fn deref(&self) -> &FakeInterp {
        &self.0
    }
}

impl Interpreter for InterpHandle {
    type Object = Obj;
    type Frame = u32;

    fn frame_at_depth(&self, depth: u32) -> Option<u32> {
        self.0.frame_at_depth(depth)
    }
    fn frame_locals(&self, frame: &u32) -> Vec<Option<Obj>> {
        self.0.frame_locals(frame)
    }
    fn globals(&self) -> Vec<(Obj, Obj)> {
        self.0.globals()
    }
    fn object_from_address(&self, addr: u32) -> Option<Obj> {
        self.0.object_from_address(addr)
    }
    fn address_of(&self, obj: Obj) -> u32 {
        self.0.address_of(obj)
    }
    fn object_view(&self, obj: Obj) -> ObjectView<Obj> {
        self.0.object_view(obj)
    }
    fn len(&self, obj: Obj) -> i64 {
        self.0.len(obj)
    }
    fn getattr(&self, obj: Obj, attr_name: Obj) -> Option<Obj> {
        self.0.getattr(obj, attr_name)
    }
    fn type_name(&self, obj: Obj) -> InternedId {
        self.0.type_name(obj)
    }
    fn is_function_type(&self, obj: Obj) -> bool {
        self.0.is_function_type(obj)
    }
    fn is_class_type(&self, obj: Obj) -> bool {
        self.0.is_class_type(obj)
    }
    fn is_module_type(&self, obj: Obj) -> bool {
        self.0.is_module_type(obj)
    }
    fn print_repr(&self, obj: Obj, max_len: usize) -> String {
        self.0.print_repr(obj, max_len)
    }
    fn print_str(&self, obj: Obj, max_len: usize) -> String {
        self.0.print_str(obj, max_len)
    }
    fn resolve_intern(&self, id: InternedId) -> String {
        self.0.resolve_intern(id)
    }
    fn find_intern(&self, s: &str) -> Option<InternedId> {
        self.0.find_intern(s)
    }
    fn interrupt(&self) {
        self.0.interrupt()
    }
}

/// Newtype around `Rc<InMemoryBus>`; see `InterpHandle` for why this can't
/// be `impl TransportBus for Rc<InMemoryBus>` directly.
#[derive(Clone)]
struct BusHandle(Rc<InMemoryBus>);

impl std::ops::Deref for BusHandle {
    type Target = InMemoryBus;
    fn deref(&self) -> &InMemoryBus {
        &self.0
    }
}

impl TransportBus for BusHandle {
    fn send_event(&self, tag: &[u8; 8], payload: &[u8]) -> Result<(), TransportError> {
        self.0.send_event(tag, payload)
    }
    fn send_response(&self, correlation_id: u8, payload: &[u8]) -> Result<(), TransportError> {
        self.0.send_response(correlation_id, payload)
    }
    fn receive_command(&self, timeout: Duration) -> Result<Option<(u8, Vec<u8>)>, TransportError> {
        self.0.receive_command(timeout)
    }
}

#[derive(Clone)]
struct FakeBc {
    pos: SourcePosition,
    caller: Option<Box<FakeBc>>,
}

impl FakeBc {
    fn leaf(pos: SourcePosition) -> Self {
        Self { pos, caller: None }
    }
}

impl BytecodePosition for FakeBc {
    fn source_pos(&self) -> SourcePosition {
        self.pos
    }
    fn caller(&self) -> Option<Self> {
        self.caller.as_deref().cloned()
    }
}

fn msg(tag: &[u8; 8], payload: &[u8]) -> Vec<u8> {
    let mut bytes = tag.to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

type TestCore = DebuggerCore<InterpHandle, BusHandle, FakeBc>;

fn build() -> (TestCore, InterpHandle, BusHandle) {
    let interp = InterpHandle(Rc::new(FakeInterp::new()));
    let bus = BusHandle(Rc::new(InMemoryBus::new()));
    let core = DebuggerCore::new(interp.clone(), bus.clone(), DebuggerConfig::default());
    (core, interp, bus)
}

#[test]
fn scenario_a_breakpoint_round_trip() {
    let (core, interp, bus) = build();

    assert!(core.dispatch_command(&msg(protocol::CMD_START, &[])));
    assert_eq!(core.status(), DebuggerStatus::Starting);

    let mut payload = b"main.py\0".to_vec();
    payload.extend_from_slice(&10u32.to_le_bytes());
    assert!(core.dispatch_command(&msg(protocol::CMD_SET_BREAKPOINTS, &payload)));

    // pre-seed the resume command; the in-memory bus never blocks
    bus.push_command(1, msg(protocol::CMD_CONTINUE, &[]));

    let file = interp.find_intern("main.py").expect("interned by set_breakpoints");
    let hit = SourcePosition::new(file, 10, InternedId(7), 1);
    core.on_opcode(&FakeBc::leaf(hit));

    assert_eq!(core.status(), DebuggerStatus::Running);
    let events = bus.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, protocol::EVT_STOP.to_vec());
    assert_eq!(events[0].1, protocol::REASON_BREAKPOINT.to_vec());
}

#[test]
fn scenario_e_step_over_across_a_call() {
    let (core, _interp, bus) = build();
    assert!(core.dispatch_command(&msg(protocol::CMD_START, &[])));

    // Entering Starting immediately stops; resume into Running first.
    bus.push_command(1, msg(protocol::CMD_CONTINUE, &[]));
    core.on_opcode(&FakeBc::leaf(SourcePosition::new(InternedId(1), 1, InternedId(1), 1)));
    assert_eq!(core.status(), DebuggerStatus::Running);

    // No breakpoints set: keeps running until a step-over is requested.
    core.on_opcode(&FakeBc::leaf(SourcePosition::new(InternedId(1), 4, InternedId(1), 1)));
    assert_eq!(core.status(), DebuggerStatus::Running);

    bus.push_command(2, msg(protocol::CMD_PAUSE, &[]));
    core.on_opcode(&FakeBc::leaf(SourcePosition::new(InternedId(1), 4, InternedId(1), 1)));
    // position unchanged from the call above: fast-exit, no stop yet
    assert_eq!(core.status(), DebuggerStatus::Running);

    core.dispatch_command(&msg(protocol::CMD_PAUSE, &[]));
    bus.push_command(3, msg(protocol::CMD_STEP_OVER, &[]));
    core.on_opcode(&FakeBc::leaf(SourcePosition::new(InternedId(1), 5, InternedId(1), 1)));
    assert_eq!(core.status(), DebuggerStatus::StepOver);

    // descend into a call: deeper, must not stop
    core.on_opcode(&FakeBc::leaf(SourcePosition::new(InternedId(2), 1, InternedId(2), 2)));
    assert_eq!(core.status(), DebuggerStatus::StepOver);

    // return to the step-over line: depth <= recorded, position differs
    bus.push_command(4, msg(protocol::CMD_CONTINUE, &[]));
    core.on_opcode(&FakeBc::leaf(SourcePosition::new(InternedId(1), 6, InternedId(1), 1)));
    assert_eq!(core.status(), DebuggerStatus::Running);
    let events = bus.events();
    assert!(events.iter().any(|(tag, payload)| {
        tag == &protocol::EVT_STOP.to_vec() && payload == &protocol::REASON_STEP_OVER.to_vec()
    }));
}

#[test]
fn scenario_f_terminate_wins() {
    let (core, interp, bus) = build();

    assert!(core.dispatch_command(&msg(protocol::CMD_TERMINATE, &[])));
    assert!(interp.was_interrupted());

    core.notify_done(0).unwrap();
    let events = bus.events();
    assert_eq!(events.last().unwrap().0, protocol::EVT_DONE.to_vec());
    assert_eq!(events.last().unwrap().1, 0u32.to_le_bytes().to_vec());
}

#[test]
fn pause_is_ignored_while_not_enabled() {
    let (core, _interp, _bus) = build();

    assert_eq!(core.status(), DebuggerStatus::NotEnabled);
    assert!(!core.dispatch_command(&msg(protocol::CMD_PAUSE, &[])));
    assert_eq!(core.status(), DebuggerStatus::NotEnabled);
}

#[test]
fn scenario_c_variables_filtering() {
    let (_core, interp, _bus) = build();
    interp.define_global("x", 1, "int", "1");
    interp.define_global("__name__", 2, "str", "'__main__'");
    interp.define_global("f", 10, "fun_bc", "<function f>");
    interp.functions.borrow_mut().push(10);

    let req = target_dbgr::VariablesRequest {
        scope: target_dbgr::VarScope::Global,
        include_kind_mask: target_dbgr::VarKind::NORMAL | target_dbgr::VarKind::FUNCTION,
        var_start_index: 0,
    };
    let bytes = target_dbgr::variables::build_variables_response(&*interp, &req, 512, 50);
    assert!(bytes.ends_with(b"<end>\0"));
    for name in [b"x\0".as_slice(), b"f\0".as_slice()] {
        assert!(
            bytes.windows(name.len()).any(|w| w == name),
            "expected {:?} in response",
            name
        );
    }
    assert!(!bytes.windows(9).any(|w| w == b"__name__\0"));
}

#[test]
fn scenario_d_object_drilldown() {
    let (_core, interp, _bus) = build();
    interp.addresses.borrow_mut().insert(100, 0xA1B2C3D4);
    interp.views.borrow_mut().insert(100, "seq");
    interp.seqs.borrow_mut().insert(100, vec![11, 12, 13]);
    interp.reprs.borrow_mut().insert(11, "10".into());
    interp.reprs.borrow_mut().insert(12, "20".into());
    interp.reprs.borrow_mut().insert(13, "30".into());

    let req = target_dbgr::VariablesRequest {
        scope: target_dbgr::VarScope::Object(0xA1B2C3D4),
        include_kind_mask: target_dbgr::VarKind::NORMAL,
        var_start_index: 0,
    };
    let bytes = target_dbgr::variables::build_variables_response(&*interp, &req, 512, 50);
    for expected in [b"0\x0010\0".as_slice(), b"1\x0020\0".as_slice(), b"2\x0030\0".as_slice()] {
        assert!(bytes.windows(expected.len()).any(|w| w == expected));
    }
}
