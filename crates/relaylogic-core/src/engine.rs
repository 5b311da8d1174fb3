//! The engine: element ownership, net binding, ordering, and execution.
//!
//! The engine owns every element and the bank of output-port values; all
//! cross-element references are `(element index, port index)` handles.
//! Declarative nets are bound on the first update (or an explicit
//! [`compile`](Engine::compile)): each edge is resolved by name and
//! type-checked, and a failed edge is logged and dropped while the engine
//! keeps running with that input unconnected.
//!
//! External writes (overrides, pulses) go through a command queue drained
//! at the start of each tick, so they apply atomically between ticks.

use std::collections::HashMap;
use std::fmt;

use log::{info, warn};
use num_complex::Complex32;

use crate::element::{Element, ElementKind, Exec};
use crate::elements::{
    And, Complex2Rect, Counter, FTrig, Math, Mux, Node, Not, Or, Overcurrent, PhasorShift, Pid,
    Polar2Complex, Polar2Rect, RTrig, Rect2Complex, Rect2Polar, Scalar, Ser, Winding1P, Winding3P,
};
use crate::port::{clamp_str, OutputBank, OutputRef, Value, ELEMENT_NAME_LENGTH};
use crate::time::Timestamp;

/// Name of the recorder element synthesized from a configuration's `ser`
/// section.
pub const DEFAULT_SER_NAME: &str = "__SER__";

/// One element argument slot from a definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    U(u16),
    F(f32),
    B(bool),
    S(String),
}

impl Arg {
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Self::U(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::F(v) => Some(*v),
            Self::U(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::B(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(v) => Some(v),
            _ => None,
        }
    }
}

/// Maximum argument slots an element definition carries.
pub const MAX_ELEMENT_ARGS: usize = 5;

/// Declarative element definition.
#[derive(Debug, Clone)]
pub struct ElementDef {
    pub name: String,
    pub kind: ElementKind,
    pub args: Vec<Arg>,
}

impl ElementDef {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<Arg>) -> Self {
        self.args = args;
        self.args.truncate(MAX_ELEMENT_ARGS);
        self
    }

    fn arg_u16(&self, i: usize, default: u16) -> u16 {
        self.args.get(i).and_then(Arg::as_u16).unwrap_or(default)
    }

    fn arg_f32(&self, i: usize, default: f32) -> f32 {
        self.args.get(i).and_then(Arg::as_f32).unwrap_or(default)
    }

    fn arg_bool(&self, i: usize, default: bool) -> bool {
        self.args.get(i).and_then(Arg::as_bool).unwrap_or(default)
    }

    fn arg_str(&self, i: usize) -> Option<&str> {
        self.args.get(i).and_then(Arg::as_str)
    }
}

/// One endpoint of a net: `{element name, port name}`.
#[derive(Debug, Clone)]
pub struct PortRefDef {
    pub element: String,
    pub port: String,
}

impl PortRefDef {
    pub fn new(element: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            port: port.into(),
        }
    }
}

/// Declarative wiring record: one source output, many sink inputs.
#[derive(Debug, Clone)]
pub struct NetDef {
    pub source: PortRefDef,
    pub sinks: Vec<PortRefDef>,
}

impl NetDef {
    pub fn new(element: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            source: PortRefDef::new(element, port),
            sinks: Vec::new(),
        }
    }

    pub fn add_sink(&mut self, element: impl Into<String>, port: impl Into<String>) {
        self.sinks.push(PortRefDef::new(element, port));
    }
}

/// Errors from element construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    DuplicateElementName(String),
    InvalidElementKind(String),
    InvalidArgument { element: String, detail: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateElementName(name) => {
                write!(f, "element name '{name}' already in use")
            }
            Self::InvalidElementKind(name) => {
                write!(f, "element '{name}' has an invalid type")
            }
            Self::InvalidArgument { element, detail } => {
                write!(f, "element '{element}': {detail}")
            }
        }
    }
}

enum NodeCommand {
    Override {
        element: usize,
        value: Value,
        duration: f32,
    },
}

/// The running dataflow graph.
pub struct Engine {
    name: String,
    names: Vec<String>,
    elements: Vec<Box<dyn Element>>,
    index: HashMap<String, usize>,
    bank: OutputBank,
    pending_nets: Vec<NetDef>,
    order: Vec<usize>,
    compiled: bool,
    commands: Vec<NodeCommand>,
}

impl Engine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            names: Vec::new(),
            elements: Vec::new(),
            index: HashMap::new(),
            bank: OutputBank::default(),
            pending_nets: Vec::new(),
            order: Vec::new(),
            compiled: false,
            commands: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Construct and register the element described by `def`.
    pub fn add_element(&mut self, def: &ElementDef) -> Result<usize, EngineError> {
        let name = clamp_str(&def.name, ELEMENT_NAME_LENGTH);
        if self.index.contains_key(&name) {
            return Err(EngineError::DuplicateElementName(name));
        }

        let element = Self::build_element(&name, def)?;
        let idx = self.elements.len();
        self.bank.push_element(element.ports().outputs());
        self.elements.push(element);
        self.names.push(name.clone());
        self.index.insert(name, idx);
        self.compiled = false;
        Ok(idx)
    }

    /// Queue a net record for binding.
    pub fn add_net(&mut self, net: NetDef) {
        self.pending_nets.push(net);
        self.compiled = false;
    }

    fn build_element(name: &str, def: &ElementDef) -> Result<Box<dyn Element>, EngineError> {
        let invalid_arg = |detail: &str| EngineError::InvalidArgument {
            element: name.to_string(),
            detail: detail.to_string(),
        };

        Ok(match def.kind {
            ElementKind::NodeDigital => Box::new(Node::<bool>::new(def.arg_u16(0, 1))),
            ElementKind::NodeAnalog => Box::new(Node::<f32>::new(def.arg_u16(0, 1))),
            ElementKind::NodeAnalogComplex => Box::new(Node::<Complex32>::new(def.arg_u16(0, 1))),
            ElementKind::And => Box::new(And::new(def.arg_u16(0, 2) as u8)),
            ElementKind::Or => Box::new(Or::new(def.arg_u16(0, 2) as u8)),
            ElementKind::Not => Box::new(Not::new()),
            ElementKind::RTrig => Box::new(RTrig::new()),
            ElementKind::FTrig => Box::new(FTrig::new()),
            ElementKind::Counter => {
                let count_final = def
                    .args
                    .first()
                    .and_then(Arg::as_u16)
                    .ok_or_else(|| invalid_arg("counter requires a final count"))?;
                Box::new(Counter::new(count_final))
            }
            ElementKind::MuxDigital => Box::new(Mux::<bool>::new(
                def.arg_u16(0, 1) as u8,
                def.arg_u16(1, 2) as u8,
            )),
            ElementKind::MuxAnalog => Box::new(Mux::<f32>::new(
                def.arg_u16(0, 1) as u8,
                def.arg_u16(1, 2) as u8,
            )),
            ElementKind::MuxAnalogComplex => Box::new(Mux::<Complex32>::new(
                def.arg_u16(0, 1) as u8,
                def.arg_u16(1, 2) as u8,
            )),
            ElementKind::Pid => Box::new(Pid::new(
                def.arg_f32(0, 0.0),
                def.arg_f32(1, 0.0),
                def.arg_f32(2, 0.0),
                def.arg_f32(3, f32::MIN),
                def.arg_f32(4, f32::MAX),
                crate::elements::pid::DEFAULT_DERIVATIVE_TERMS,
            )),
            ElementKind::Overcurrent => {
                let curve = def
                    .arg_str(0)
                    .ok_or_else(|| invalid_arg("overcurrent requires a curve name"))?;
                Box::new(Overcurrent::new(
                    curve,
                    def.arg_f32(1, 1.0),
                    def.arg_f32(2, 1.0),
                    def.arg_f32(3, 0.0),
                    def.arg_bool(4, false),
                ))
            }
            ElementKind::Winding1P => {
                Box::new(Winding1P::new(Self::samples_per_cycle(def, &invalid_arg)?))
            }
            ElementKind::Winding3P => {
                Box::new(Winding3P::new(Self::samples_per_cycle(def, &invalid_arg)?))
            }
            ElementKind::PhasorShift => Box::new(PhasorShift::new(
                def.arg_f32(0, 1.0),
                def.arg_f32(1, 0.0),
            )),
            ElementKind::Rect2Polar => Box::new(Rect2Polar::new()),
            ElementKind::Polar2Rect => Box::new(Polar2Rect::new()),
            ElementKind::Complex2Rect => Box::new(Complex2Rect::new()),
            ElementKind::Rect2Complex => Box::new(Rect2Complex::new()),
            ElementKind::Polar2Complex => Box::new(Polar2Complex::new()),
            ElementKind::Math => {
                let n_inputs = def.arg_u16(0, 1) as u8;
                let expr = def
                    .arg_str(1)
                    .ok_or_else(|| invalid_arg("math requires an expression"))?;
                Box::new(Math::new(n_inputs, expr))
            }
            ElementKind::Ser => Box::new(Ser::new(def.arg_u16(0, 1) as u8)),
            ElementKind::Invalid => {
                return Err(EngineError::InvalidElementKind(name.to_string()));
            }
        })
    }

    fn samples_per_cycle(
        def: &ElementDef,
        invalid_arg: &dyn Fn(&str) -> EngineError,
    ) -> Result<u16, EngineError> {
        let samples = def
            .args
            .first()
            .and_then(Arg::as_u16)
            .ok_or_else(|| invalid_arg("winding requires samples per cycle"))?;
        if samples < crate::elements::winding::MIN_SAMPLES_PER_CYCLE {
            return Err(invalid_arg("samples per cycle must be at least 4"));
        }
        Ok(samples)
    }

    /// Bind all pending nets and compute the evaluation order. Called
    /// automatically on the first update after a graph change.
    pub fn compile(&mut self) {
        let nets = std::mem::take(&mut self.pending_nets);
        for net in &nets {
            self.bind_net(net);
        }
        // Keep the records so a later recompile (more elements added
        // before the first update) sees every net.
        self.pending_nets = nets;
        self.order = self.evaluation_order();
        self.compiled = true;
    }

    fn bind_net(&mut self, net: &NetDef) {
        let Some(&src_elem) = self.index.get(net.source.element.as_str()) else {
            warn!(
                "net source '{}' does not exist; net dropped",
                net.source.element
            );
            return;
        };
        let Some(src_port) = self.elements[src_elem]
            .ports()
            .output_index(&net.source.port)
        else {
            warn!(
                "net source '{}' has no output port '{}'; net dropped",
                net.source.element, net.source.port
            );
            return;
        };
        let src_kind = self.elements[src_elem].ports().output(src_port).kind();
        let source = OutputRef {
            element: src_elem,
            port: src_port,
        };

        for sink in &net.sinks {
            let Some(&dst_elem) = self.index.get(sink.element.as_str()) else {
                warn!("net sink '{}' does not exist; edge dropped", sink.element);
                continue;
            };
            let Some(dst_port) = self.elements[dst_elem].ports().input_index(&sink.port) else {
                warn!(
                    "net sink '{}' has no input port '{}'; edge dropped",
                    sink.element, sink.port
                );
                continue;
            };
            if let Err(err) =
                self.elements[dst_elem]
                    .ports_mut()
                    .connect_input(dst_port, src_kind, source)
            {
                warn!(
                    "cannot connect {}.{} -> {}.{}: {err}; edge dropped",
                    net.source.element, net.source.port, sink.element, sink.port
                );
            }
        }
    }

    /// Dependency-first ordering via Tarjan's SCC algorithm. Cycles are
    /// legal: members of a strongly connected component are evaluated in an
    /// arbitrary internal order, and the broken back-edges read the
    /// previous tick's value from the output bank.
    fn evaluation_order(&self) -> Vec<usize> {
        let n = self.elements.len();
        let mut deps: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, element) in self.elements.iter().enumerate() {
            for input in element.ports().inputs() {
                if let Some(source) = input.source() {
                    deps[i].push(source.element);
                }
            }
        }

        let mut indices = vec![usize::MAX; n];
        let mut lowlink = vec![0usize; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut order: Vec<usize> = Vec::with_capacity(n);
        let mut counter = 0usize;

        struct Frame {
            v: usize,
            child: usize,
        }

        for start in 0..n {
            if indices[start] != usize::MAX {
                continue;
            }
            let mut call = vec![Frame { v: start, child: 0 }];
            while let Some(frame) = call.last_mut() {
                let v = frame.v;
                if frame.child == 0 {
                    indices[v] = counter;
                    lowlink[v] = counter;
                    counter += 1;
                    stack.push(v);
                    on_stack[v] = true;
                }

                if frame.child < deps[v].len() {
                    let w = deps[v][frame.child];
                    frame.child += 1;
                    if indices[w] == usize::MAX {
                        call.push(Frame { v: w, child: 0 });
                    } else if on_stack[w] {
                        lowlink[v] = lowlink[v].min(indices[w]);
                    }
                } else {
                    call.pop();
                    if let Some(parent) = call.last() {
                        lowlink[parent.v] = lowlink[parent.v].min(lowlink[v]);
                    }
                    if lowlink[v] == indices[v] {
                        let mut members = Vec::new();
                        loop {
                            let w = stack.pop().expect("tarjan stack underflow");
                            on_stack[w] = false;
                            members.push(w);
                            if w == v {
                                break;
                            }
                        }
                        if members.len() > 1 {
                            let names: Vec<&str> =
                                members.iter().map(|&m| self.names[m].as_str()).collect();
                            info!(
                                "cyclic net among [{}]; back-edges read previous tick",
                                names.join(", ")
                            );
                        }
                        order.extend(members);
                    }
                }
            }
        }

        order
    }

    /// Evaluate every element exactly once in dependency order.
    pub fn update(&mut self, ts: Timestamp) {
        if !self.compiled {
            self.compile();
        }

        self.drain_commands();

        for i in 0..self.order.len() {
            let idx = self.order[i];
            let mut exec = Exec::new(ts, idx, &mut self.bank);
            self.elements[idx].update(&mut exec);
        }
    }

    fn drain_commands(&mut self) {
        for command in std::mem::take(&mut self.commands) {
            match command {
                NodeCommand::Override {
                    element,
                    value,
                    duration,
                } => self.apply_override(element, value, duration),
            }
        }
    }

    fn apply_override(&mut self, element: usize, value: Value, duration: f32) {
        let applied = match value {
            Value::Digital(v) => self
                .node_mut::<bool>(element)
                .map(|n| n.override_value(v, duration))
                .is_some(),
            Value::Analog(v) => self
                .node_mut::<f32>(element)
                .map(|n| n.override_value(v, duration))
                .is_some(),
            Value::Complex(v) => self
                .node_mut::<Complex32>(element)
                .map(|n| n.override_value(v, duration))
                .is_some(),
        };
        if !applied {
            warn!(
                "override dropped: '{}' is not a {} node",
                self.names[element],
                value.kind()
            );
        }
    }

    /// Queue a bounded override on a named node. Applied at the next tick
    /// boundary. Returns false when the element does not exist.
    pub fn override_value(&mut self, name: &str, value: Value, duration: f32) -> bool {
        let Some(&element) = self.index.get(name) else {
            return false;
        };
        self.commands.push(NodeCommand::Override {
            element,
            value,
            duration,
        });
        true
    }

    /// Downcast an element to a typed node.
    pub fn node_mut<T: Scalar>(&mut self, idx: usize) -> Option<&mut Node<T>> {
        self.elements[idx].as_any_mut().downcast_mut::<Node<T>>()
    }

    /// Downcast an element to a typed node, immutably.
    pub fn node<T: Scalar>(&self, idx: usize) -> Option<&Node<T>> {
        self.elements[idx].as_any().downcast_ref::<Node<T>>()
    }

    /// Set a node's value directly (board input path).
    pub fn set_node_value(&mut self, idx: usize, value: Value) -> bool {
        match value {
            Value::Digital(v) => self
                .node_mut::<bool>(idx)
                .map(|n| n.set_value(v))
                .is_some(),
            Value::Analog(v) => self.node_mut::<f32>(idx).map(|n| n.set_value(v)).is_some(),
            Value::Complex(v) => self
                .node_mut::<Complex32>(idx)
                .map(|n| n.set_value(v))
                .is_some(),
        }
    }

    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn element_name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn element(&self, idx: usize) -> &dyn Element {
        self.elements[idx].as_ref()
    }

    pub fn element_kind(&self, idx: usize) -> ElementKind {
        self.elements[idx].kind()
    }

    /// Current value of a named element's output port by index.
    pub fn output_value(&self, name: &str, port: usize) -> Option<Value> {
        let idx = self.element_index(name)?;
        self.bank.element_outputs(idx).get(port).copied()
    }

    /// All current output values of an element.
    pub fn output_values(&self, idx: usize) -> &[Value] {
        self.bank.element_outputs(idx)
    }

    /// Render the status page: one `\r\n`-terminated line per element with
    /// name, type tag, and formatted output values, truncated to `cap`
    /// bytes.
    pub fn get_info(&self, cap: usize) -> String {
        let mut out = format!("Engine: {}\r\n", self.name);
        for (idx, element) in self.elements.iter().enumerate() {
            let mut line = format!("{}\t{}\t", self.names[idx], element.kind());
            let values = self.bank.element_outputs(idx);
            for (p, value) in values.iter().enumerate() {
                if p > 0 {
                    line.push_str(", ");
                }
                line.push_str(&format!(
                    "{} = {}",
                    element.ports().output(p).name(),
                    value
                ));
            }
            line.push_str("\r\n");
            out.push_str(&line);
        }

        if out.len() > cap {
            let mut end = cap;
            while end > 0 && !out.is_char_boundary(end) {
                end -= 1;
            }
            out.truncate(end);
        }
        out
    }
}
