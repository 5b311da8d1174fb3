//! Typed ports and the values that flow through them.
//!
//! Ports are runtime-typed: a tagged [`Value`] over the three scalar kinds
//! replaces compile-time polymorphism so a graph can be assembled from JSON.
//! One element may carry ports of different kinds (an overcurrent element
//! has a float input and a boolean output; a mux has a boolean selector next
//! to its typed signal ports). Output values live in the engine's
//! [`OutputBank`]; an input port holds at most one [`OutputRef`] into it.

use std::fmt;

use num_complex::Complex32;

/// Maximum stored length of an element or port name.
pub const ELEMENT_NAME_LENGTH: usize = 32;
/// Maximum stored length of a string element argument.
pub const ELEMENT_ARG_LENGTH: usize = 64;

/// Scalar kind carried by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Boolean signal.
    Digital,
    /// Real-valued signal.
    Analog,
    /// Complex-valued signal (phasors).
    Complex,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digital => write!(f, "digital"),
            Self::Analog => write!(f, "analog"),
            Self::Complex => write!(f, "complex"),
        }
    }
}

/// A value on an output port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Digital(bool),
    Analog(f32),
    Complex(Complex32),
}

impl Value {
    /// The kind this value belongs to.
    pub fn kind(&self) -> PortKind {
        match self {
            Self::Digital(_) => PortKind::Digital,
            Self::Analog(_) => PortKind::Analog,
            Self::Complex(_) => PortKind::Complex,
        }
    }

    /// The identity value for a kind (false, 0.0, 0+0j).
    pub fn zero(kind: PortKind) -> Self {
        match kind {
            PortKind::Digital => Self::Digital(false),
            PortKind::Analog => Self::Analog(0.0),
            PortKind::Complex => Self::Complex(Complex32::new(0.0, 0.0)),
        }
    }

    pub fn as_digital(&self) -> Option<bool> {
        match self {
            Self::Digital(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_analog(&self) -> Option<f32> {
        match self {
            Self::Analog(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<Complex32> {
        match self {
            Self::Complex(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Status-page formatting: `0`/`1` for digital, `%.4f` for analog,
    /// `%.4f + j%.4f` for complex.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digital(v) => write!(f, "{}", *v as u8),
            Self::Analog(v) => write!(f, "{v:.4}"),
            Self::Complex(v) => write!(f, "{:.4} + j{:.4}", v.re, v.im),
        }
    }
}

/// Handle to an output port: `(element index, output port index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub element: usize,
    pub port: usize,
}

/// An input endpoint on an element. Holds zero or one source reference.
#[derive(Debug, Clone)]
pub struct InputPort {
    name: String,
    kind: PortKind,
    source: Option<OutputRef>,
}

impl InputPort {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PortKind {
        self.kind
    }

    pub fn source(&self) -> Option<OutputRef> {
        self.source
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }
}

/// An output endpoint on an element. The current value is stored in the
/// engine's [`OutputBank`], not here.
#[derive(Debug, Clone)]
pub struct OutputPort {
    name: String,
    kind: PortKind,
}

impl OutputPort {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PortKind {
        self.kind
    }
}

/// Why a port-level connection was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    NoSuchElement(String),
    NoSuchOutput { element: String, port: String },
    NoSuchInput { element: String, port: String },
    KindMismatch { source: PortKind, sink: PortKind },
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchElement(name) => write!(f, "no element named '{name}'"),
            Self::NoSuchOutput { element, port } => {
                write!(f, "element '{element}' has no output port '{port}'")
            }
            Self::NoSuchInput { element, port } => {
                write!(f, "element '{element}' has no input port '{port}'")
            }
            Self::KindMismatch { source, sink } => {
                write!(f, "cannot connect {source} output to {sink} input")
            }
        }
    }
}

/// The input and output port tables of one element.
#[derive(Debug, Clone, Default)]
pub struct Ports {
    inputs: Vec<InputPort>,
    outputs: Vec<OutputPort>,
}

impl Ports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an input port. Returns its index.
    pub fn add_input(&mut self, name: impl Into<String>, kind: PortKind) -> usize {
        self.inputs.push(InputPort {
            name: name.into(),
            kind,
            source: None,
        });
        self.inputs.len() - 1
    }

    /// Declare an output port. Returns its index.
    pub fn add_output(&mut self, name: impl Into<String>, kind: PortKind) -> usize {
        self.outputs.push(OutputPort {
            name: name.into(),
            kind,
        });
        self.outputs.len() - 1
    }

    pub fn inputs(&self) -> &[InputPort] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputPort] {
        &self.outputs
    }

    pub fn input(&self, index: usize) -> &InputPort {
        &self.inputs[index]
    }

    pub fn output(&self, index: usize) -> &OutputPort {
        &self.outputs[index]
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|p| p.name == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|p| p.name == name)
    }

    /// Bind an input port to a source output of matching kind.
    pub(crate) fn connect_input(
        &mut self,
        index: usize,
        source_kind: PortKind,
        source: OutputRef,
    ) -> Result<(), ConnectError> {
        let input = &mut self.inputs[index];
        if input.kind != source_kind {
            return Err(ConnectError::KindMismatch {
                source: source_kind,
                sink: input.kind,
            });
        }
        input.source = Some(source);
        Ok(())
    }
}

/// Per-element output value storage, parallel to the engine's element table.
///
/// Values persist across ticks, which is what lets a back-edge in a cyclic
/// net read the source's previous-tick output.
#[derive(Debug, Default)]
pub struct OutputBank {
    values: Vec<Vec<Value>>,
}

impl OutputBank {
    /// Append a row of zero-initialized values for a newly added element.
    pub(crate) fn push_element(&mut self, outputs: &[OutputPort]) {
        self.values
            .push(outputs.iter().map(|p| Value::zero(p.kind())).collect());
    }

    pub fn get(&self, r: OutputRef) -> Value {
        self.values[r.element][r.port]
    }

    pub(crate) fn set(&mut self, r: OutputRef, v: Value) {
        debug_assert_eq!(self.values[r.element][r.port].kind(), v.kind());
        self.values[r.element][r.port] = v;
    }

    pub fn element_outputs(&self, element: usize) -> &[Value] {
        &self.values[element]
    }
}

/// Truncate a string to `max` bytes on a character boundary, the way the
/// engine clamps element and argument names.
pub fn clamp_str(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
