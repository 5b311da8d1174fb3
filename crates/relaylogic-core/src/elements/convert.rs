//! Coordinate conversions between rectangular, polar, and complex forms.
//!
//! Angles are degrees at the port boundary and radians internally. Each
//! element only produces output once all of its inputs are connected.

use std::any::Any;

use num_complex::Complex32;

use crate::element::{Element, ElementKind, Exec};
use crate::port::{PortKind, Ports};

/// (real, imaginary) → (magnitude, angle°).
pub struct Rect2Polar {
    ports: Ports,
}

impl Rect2Polar {
    pub fn new() -> Self {
        let mut ports = Ports::new();
        ports.add_input("real", PortKind::Analog);
        ports.add_input("imaginary", PortKind::Analog);
        ports.add_output("magnitude", PortKind::Analog);
        ports.add_output("angle", PortKind::Analog);
        Self { ports }
    }
}

impl Default for Rect2Polar {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for Rect2Polar {
    fn kind(&self) -> ElementKind {
        ElementKind::Rect2Polar
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let (Some(real), Some(imag)) = (
            exec.read_analog(self.ports.input(0)),
            exec.read_analog(self.ports.input(1)),
        ) else {
            return;
        };
        exec.write_analog(0, (real * real + imag * imag).sqrt());
        exec.write_analog(1, imag.atan2(real).to_degrees());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// (magnitude, angle°) → (real, imaginary).
pub struct Polar2Rect {
    ports: Ports,
}

impl Polar2Rect {
    pub fn new() -> Self {
        let mut ports = Ports::new();
        ports.add_input("magnitude", PortKind::Analog);
        ports.add_input("angle", PortKind::Analog);
        ports.add_output("real", PortKind::Analog);
        ports.add_output("imaginary", PortKind::Analog);
        Self { ports }
    }
}

impl Default for Polar2Rect {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for Polar2Rect {
    fn kind(&self) -> ElementKind {
        ElementKind::Polar2Rect
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let (Some(mag), Some(angle)) = (
            exec.read_analog(self.ports.input(0)),
            exec.read_analog(self.ports.input(1)),
        ) else {
            return;
        };
        let angle = angle.to_radians();
        exec.write_analog(0, mag * angle.cos());
        exec.write_analog(1, mag * angle.sin());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// complex → (real, imaginary). A heterogeneous element: complex input,
/// float outputs.
pub struct Complex2Rect {
    ports: Ports,
}

impl Complex2Rect {
    pub fn new() -> Self {
        let mut ports = Ports::new();
        ports.add_input("complex", PortKind::Complex);
        ports.add_output("real", PortKind::Analog);
        ports.add_output("imaginary", PortKind::Analog);
        Self { ports }
    }
}

impl Default for Complex2Rect {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for Complex2Rect {
    fn kind(&self) -> ElementKind {
        ElementKind::Complex2Rect
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let Some(c) = exec.read_complex(self.ports.input(0)) else {
            return;
        };
        exec.write_analog(0, c.re);
        exec.write_analog(1, c.im);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// (real, imaginary) → complex.
pub struct Rect2Complex {
    ports: Ports,
}

impl Rect2Complex {
    pub fn new() -> Self {
        let mut ports = Ports::new();
        ports.add_input("real", PortKind::Analog);
        ports.add_input("imaginary", PortKind::Analog);
        ports.add_output("complex", PortKind::Complex);
        Self { ports }
    }
}

impl Default for Rect2Complex {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for Rect2Complex {
    fn kind(&self) -> ElementKind {
        ElementKind::Rect2Complex
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let (Some(real), Some(imag)) = (
            exec.read_analog(self.ports.input(0)),
            exec.read_analog(self.ports.input(1)),
        ) else {
            return;
        };
        exec.write_complex(0, Complex32::new(real, imag));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// (magnitude, angle°) → complex.
pub struct Polar2Complex {
    ports: Ports,
}

impl Polar2Complex {
    pub fn new() -> Self {
        let mut ports = Ports::new();
        ports.add_input("magnitude", PortKind::Analog);
        ports.add_input("angle", PortKind::Analog);
        ports.add_output("complex", PortKind::Complex);
        Self { ports }
    }
}

impl Default for Polar2Complex {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for Polar2Complex {
    fn kind(&self) -> ElementKind {
        ElementKind::Polar2Complex
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let (Some(mag), Some(angle)) = (
            exec.read_analog(self.ports.input(0)),
            exec.read_analog(self.ports.input(1)),
        ) else {
            return;
        };
        exec.write_complex(0, Complex32::from_polar(mag, angle.to_radians()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{OutputBank, OutputRef, Value};
    use crate::time::Timestamp;

    fn run(elem: &mut dyn Element, feeds: &[Value]) -> Vec<Value> {
        let mut bank = OutputBank::default();
        let mut feed = Ports::new();
        for (i, v) in feeds.iter().enumerate() {
            feed.add_output(format!("output_{i}"), v.kind());
        }
        bank.push_element(feed.outputs());
        bank.push_element(elem.ports().outputs());
        for (i, v) in feeds.iter().enumerate() {
            elem.ports_mut()
                .connect_input(i, v.kind(), OutputRef { element: 0, port: i })
                .unwrap();
            bank.set(OutputRef { element: 0, port: i }, *v);
        }

        let ts = Timestamp::new(0, 0, 0, 0, 0, 50);
        let mut exec = Exec::new(ts, 1, &mut bank);
        elem.update(&mut exec);
        bank.element_outputs(1).to_vec()
    }

    #[test]
    fn rect_to_polar_uses_degrees() {
        let out = run(
            &mut Rect2Polar::new(),
            &[Value::Analog(0.0), Value::Analog(2.0)],
        );
        let mag = out[0].as_analog().unwrap();
        let angle = out[1].as_analog().unwrap();
        assert!((mag - 2.0).abs() < 1e-6);
        assert!((angle - 90.0).abs() < 1e-4);
    }

    #[test]
    fn polar_to_rect_round_trip() {
        let out = run(
            &mut Polar2Rect::new(),
            &[Value::Analog(2.0), Value::Analog(60.0)],
        );
        let real = out[0].as_analog().unwrap();
        let imag = out[1].as_analog().unwrap();
        assert!((real - 1.0).abs() < 1e-5);
        assert!((imag - 3f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn complex_splits_and_rebuilds() {
        let c = Complex32::new(1.5, -2.5);
        let out = run(&mut Complex2Rect::new(), &[Value::Complex(c)]);
        assert_eq!(out[0], Value::Analog(1.5));
        assert_eq!(out[1], Value::Analog(-2.5));

        let out = run(
            &mut Rect2Complex::new(),
            &[Value::Analog(1.5), Value::Analog(-2.5)],
        );
        assert_eq!(out[0].as_complex(), Some(c));
    }

    #[test]
    fn polar_to_complex() {
        let out = run(
            &mut Polar2Complex::new(),
            &[Value::Analog(1.0), Value::Analog(180.0)],
        );
        let c = out[0].as_complex().unwrap();
        assert!((c - Complex32::new(-1.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn missing_input_produces_no_output() {
        let mut elem = Rect2Polar::new();
        let mut bank = OutputBank::default();
        bank.push_element(Ports::new().outputs());
        bank.push_element(elem.ports().outputs());
        let ts = Timestamp::new(0, 0, 0, 0, 0, 50);
        let mut exec = Exec::new(ts, 1, &mut bank);
        elem.update(&mut exec);
        assert_eq!(bank.element_outputs(1)[0], Value::Analog(0.0));
    }
}
