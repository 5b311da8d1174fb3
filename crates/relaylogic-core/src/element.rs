//! The element trait and the closed set of element types.

use std::any::Any;
use std::fmt;

use num_complex::Complex32;

use crate::port::{InputPort, OutputBank, OutputRef, Ports, Value};
use crate::time::Timestamp;

/// Closed enumeration of element types the engine can instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    NodeDigital,
    NodeAnalog,
    NodeAnalogComplex,
    And,
    Or,
    Not,
    RTrig,
    FTrig,
    Counter,
    MuxDigital,
    MuxAnalog,
    MuxAnalogComplex,
    Pid,
    Overcurrent,
    Winding1P,
    Winding3P,
    PhasorShift,
    Rect2Polar,
    Polar2Rect,
    Complex2Rect,
    Rect2Complex,
    Polar2Complex,
    Math,
    Ser,
    Invalid,
}

impl ElementKind {
    /// Parse the `type` string from an element definition.
    pub fn from_type_str(s: &str) -> Self {
        match s {
            "NODE_DIGITAL" => Self::NodeDigital,
            "NODE_ANALOG" => Self::NodeAnalog,
            "NODE_ANALOG_COMPLEX" => Self::NodeAnalogComplex,
            "AND" => Self::And,
            "OR" => Self::Or,
            "NOT" => Self::Not,
            "RTRIG" => Self::RTrig,
            "FTRIG" => Self::FTrig,
            "COUNTER" => Self::Counter,
            "MUX_DIGITAL" => Self::MuxDigital,
            "MUX_ANALOG" => Self::MuxAnalog,
            "MUX_ANALOG_COMPLEX" => Self::MuxAnalogComplex,
            "PID" => Self::Pid,
            "OVERCURRENT" => Self::Overcurrent,
            "WINDING_1P" => Self::Winding1P,
            "WINDING_3P" => Self::Winding3P,
            "PHASOR_SHIFT" => Self::PhasorShift,
            "RECT2POLAR" => Self::Rect2Polar,
            "POLAR2RECT" => Self::Polar2Rect,
            "COMPLEX2RECT" => Self::Complex2Rect,
            "RECT2COMPLEX" => Self::Rect2Complex,
            "POLAR2COMPLEX" => Self::Polar2Complex,
            "MATH" => Self::Math,
            "SER" => Self::Ser,
            _ => Self::Invalid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeDigital => "NODE_DIGITAL",
            Self::NodeAnalog => "NODE_ANALOG",
            Self::NodeAnalogComplex => "NODE_ANALOG_COMPLEX",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::RTrig => "RTRIG",
            Self::FTrig => "FTRIG",
            Self::Counter => "COUNTER",
            Self::MuxDigital => "MUX_DIGITAL",
            Self::MuxAnalog => "MUX_ANALOG",
            Self::MuxAnalogComplex => "MUX_ANALOG_COMPLEX",
            Self::Pid => "PID",
            Self::Overcurrent => "OVERCURRENT",
            Self::Winding1P => "WINDING_1P",
            Self::Winding3P => "WINDING_3P",
            Self::PhasorShift => "PHASOR_SHIFT",
            Self::Rect2Polar => "RECT2POLAR",
            Self::Polar2Rect => "POLAR2RECT",
            Self::Complex2Rect => "COMPLEX2RECT",
            Self::Rect2Complex => "RECT2COMPLEX",
            Self::Polar2Complex => "POLAR2COMPLEX",
            Self::Math => "MATH",
            Self::Ser => "SER",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-tick execution context handed to every element.
///
/// Reads go through the element's own [`InputPort`] bindings and resolve
/// against the shared [`OutputBank`]; writes land on the element's own
/// output row. An unconnected input reads as `None` and must be tolerated.
pub struct Exec<'a> {
    ts: Timestamp,
    me: usize,
    bank: &'a mut OutputBank,
}

impl<'a> Exec<'a> {
    pub(crate) fn new(ts: Timestamp, me: usize, bank: &'a mut OutputBank) -> Self {
        Self { ts, me, bank }
    }

    /// The tick timestamp.
    pub fn ts(&self) -> Timestamp {
        self.ts
    }

    /// Read a connected input's current value.
    pub fn read(&self, input: &InputPort) -> Option<Value> {
        input.source().map(|r| self.bank.get(r))
    }

    pub fn read_digital(&self, input: &InputPort) -> Option<bool> {
        self.read(input).and_then(|v| v.as_digital())
    }

    pub fn read_analog(&self, input: &InputPort) -> Option<f32> {
        self.read(input).and_then(|v| v.as_analog())
    }

    pub fn read_complex(&self, input: &InputPort) -> Option<Complex32> {
        self.read(input).and_then(|v| v.as_complex())
    }

    /// Read back one of this element's own outputs.
    pub fn output(&self, port: usize) -> Value {
        self.bank.get(OutputRef {
            element: self.me,
            port,
        })
    }

    /// Write one of this element's own outputs.
    pub fn write(&mut self, port: usize, v: Value) {
        self.bank.set(
            OutputRef {
                element: self.me,
                port,
            },
            v,
        );
    }

    pub fn write_digital(&mut self, port: usize, v: bool) {
        self.write(port, Value::Digital(v));
    }

    pub fn write_analog(&mut self, port: usize, v: f32) {
        self.write(port, Value::Analog(v));
    }

    pub fn write_complex(&mut self, port: usize, v: Complex32) {
        self.write(port, Value::Complex(v));
    }
}

/// A computational node in the graph.
///
/// Implementations own their port tables and element-specific state; the
/// engine owns the elements, their output values, and the update order.
pub trait Element: Any + Send {
    /// Type tag.
    fn kind(&self) -> ElementKind;

    /// Port tables.
    fn ports(&self) -> &Ports;

    /// Mutable port tables (used by the engine's net binder).
    fn ports_mut(&mut self) -> &mut Ports;

    /// Evaluate one tick.
    fn update(&mut self, exec: &mut Exec<'_>);

    /// Downcast support for elements with out-of-band surfaces
    /// (node overrides, SER log reads).
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
