//! Fixed phasor rotation/scaling.

use std::any::Any;

use num_complex::Complex32;

use crate::element::{Element, ElementKind, Exec};
use crate::port::{PortKind, Ports};

/// Multiplies the input phasor by a precomputed unit rotation.
///
/// The shift angle is given clockwise in degrees, so the stored unit vector
/// is `M * exp(-j * theta)`.
pub struct PhasorShift {
    ports: Ports,
    input: usize,
    output: usize,
    unit: Complex32,
}

impl PhasorShift {
    pub fn new(magnitude: f32, angle_clockwise_deg: f32) -> Self {
        let mut ports = Ports::new();
        let input = ports.add_input("input", PortKind::Complex);
        let output = ports.add_output("output", PortKind::Complex);

        let angle = -angle_clockwise_deg.to_radians();
        Self {
            ports,
            input,
            output,
            unit: Complex32::new(magnitude * angle.cos(), magnitude * angle.sin()),
        }
    }
}

impl Element for PhasorShift {
    fn kind(&self) -> ElementKind {
        ElementKind::PhasorShift
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        if let Some(input) = exec.read_complex(self.ports.input(self.input)) {
            exec.write_complex(self.output, input * self.unit);
        }
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

    fn shift_once(shift: &mut PhasorShift, input: Complex32) -> Complex32 {
        let mut bank = OutputBank::default();
        let mut feed = Ports::new();
        feed.add_output("output", PortKind::Complex);
        bank.push_element(feed.outputs());
        bank.push_element(shift.ports().outputs());
        shift
            .ports_mut()
            .connect_input(0, PortKind::Complex, OutputRef { element: 0, port: 0 })
            .unwrap();
        bank.set(OutputRef { element: 0, port: 0 }, Value::Complex(input));

        let ts = Timestamp::new(0, 0, 0, 0, 0, 50);
        let mut exec = Exec::new(ts, 1, &mut bank);
        shift.update(&mut exec);
        bank.element_outputs(1)[0].as_complex().unwrap()
    }

    #[test]
    fn clockwise_shift_subtracts_angle() {
        let mut shift = PhasorShift::new(1.0, 30.0);
        let out = shift_once(&mut shift, Complex32::from_polar(2.0, 90f32.to_radians()));
        assert!((out.norm() - 2.0).abs() < 1e-5);
        assert!((out.arg().to_degrees() - 60.0).abs() < 1e-3);
    }

    #[test]
    fn magnitude_scales() {
        let mut shift = PhasorShift::new(2.5, 0.0);
        let out = shift_once(&mut shift, Complex32::new(1.0, 0.0));
        assert!((out - Complex32::new(2.5, 0.0)).norm() < 1e-6);
    }
}
