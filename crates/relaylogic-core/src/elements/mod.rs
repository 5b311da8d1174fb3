//! Concrete element implementations.
//!
//! Every element follows the same shape: a struct owning its [`Ports`]
//! table plus element-specific state, and an [`Element`] impl whose
//! `update` reads connected inputs through the execution context and
//! writes its outputs. Unconnected inputs never panic; each element
//! substitutes the identity of its operation or produces no new output.

pub mod convert;
pub mod digital;
pub mod math;
pub mod mux;
pub mod node;
pub mod overcurrent;
pub mod phasor;
pub mod pid;
pub mod ser;
pub mod winding;

pub use convert::{Complex2Rect, Polar2Complex, Polar2Rect, Rect2Complex, Rect2Polar};
pub use digital::{And, Counter, FTrig, Not, Or, RTrig};
pub use math::Math;
pub use mux::Mux;
pub use node::Node;
pub use overcurrent::{Overcurrent, OvercurrentCurve};
pub use phasor::PhasorShift;
pub use pid::Pid;
pub use ser::{Ser, SerEdge, SerEvent, MAX_SER_HISTORY};
pub use winding::{Winding1P, Winding3P};

use num_complex::Complex32;

use crate::element::ElementKind;
use crate::port::{PortKind, Value};

/// A scalar type a port can carry. Implemented for `bool`, `f32`, and
/// [`Complex32`]; maps the compile-time type onto the runtime port kind.
pub trait Scalar: Copy + PartialEq + Default + Send + 'static {
    /// The port kind values of this type travel on.
    const KIND: PortKind;
    /// Element tag for a node of this scalar.
    const NODE_KIND: ElementKind;
    /// Element tag for a mux of this scalar.
    const MUX_KIND: ElementKind;

    fn into_value(self) -> Value;
    fn from_value(v: Value) -> Option<Self>;
}

impl Scalar for bool {
    const KIND: PortKind = PortKind::Digital;
    const NODE_KIND: ElementKind = ElementKind::NodeDigital;
    const MUX_KIND: ElementKind = ElementKind::MuxDigital;

    fn into_value(self) -> Value {
        Value::Digital(self)
    }

    fn from_value(v: Value) -> Option<Self> {
        v.as_digital()
    }
}

impl Scalar for f32 {
    const KIND: PortKind = PortKind::Analog;
    const NODE_KIND: ElementKind = ElementKind::NodeAnalog;
    const MUX_KIND: ElementKind = ElementKind::MuxAnalog;

    fn into_value(self) -> Value {
        Value::Analog(self)
    }

    fn from_value(v: Value) -> Option<Self> {
        v.as_analog()
    }
}

impl Scalar for Complex32 {
    const KIND: PortKind = PortKind::Complex;
    const NODE_KIND: ElementKind = ElementKind::NodeAnalogComplex;
    const MUX_KIND: ElementKind = ElementKind::MuxAnalogComplex;

    fn into_value(self) -> Value {
        Value::Complex(self)
    }

    fn from_value(v: Value) -> Option<Self> {
        v.as_complex()
    }
}
