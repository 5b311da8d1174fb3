//! PID controller with a windowed-average derivative filter.

use std::any::Any;

use crate::element::{Element, ElementKind, Exec};
use crate::port::{PortKind, Ports};
use crate::time::Timestamp;

/// Derivative window length used when an element definition does not carry
/// its own.
pub const DEFAULT_DERIVATIVE_TERMS: usize = 5;

/// PID controller. With `kd == 0` the derivative path is skipped entirely
/// and the element behaves as a PI controller.
///
/// The derivative is computed from a moving-average filter over the last
/// `derivative_terms` error samples: the derivative term is the delta of
/// the filter output between this tick and the previous tick, divided by
/// `dt`, scaled by `kd`. Integral windup is bounded by the output clamp
/// alone.
pub struct Pid {
    ports: Ports,
    setpoint: usize,
    feedback: usize,
    output: usize,

    kp: f32,
    ki: f32,
    kd: f32,
    output_min: f32,
    output_max: f32,

    integral: f32,
    window: Vec<f32>,
    window_len: usize,
    write: usize,
    filled: usize,
    prev_filter: Option<f32>,
    last_ts: Option<Timestamp>,
}

impl Pid {
    pub fn new(
        kp: f32,
        ki: f32,
        kd: f32,
        output_min: f32,
        output_max: f32,
        derivative_terms: usize,
    ) -> Self {
        let mut ports = Ports::new();
        let setpoint = ports.add_input("setpoint", PortKind::Analog);
        let feedback = ports.add_input("feedback", PortKind::Analog);
        let output = ports.add_output("output", PortKind::Analog);

        let window_len = derivative_terms.max(1);
        Self {
            ports,
            setpoint,
            feedback,
            output,
            kp,
            ki,
            kd,
            output_min,
            output_max,
            integral: 0.0,
            window: vec![0.0; window_len],
            window_len,
            write: 0,
            filled: 0,
            prev_filter: None,
            last_ts: None,
        }
    }

    /// PI controller: a PID with the derivative disabled.
    pub fn pi(kp: f32, ki: f32, output_min: f32, output_max: f32) -> Self {
        Self::new(kp, ki, 0.0, output_min, output_max, 1)
    }

    fn derivative(&mut self, error: f32, dt: f32) -> f32 {
        self.window[self.write] = error;
        self.write = (self.write + 1) % self.window_len;
        self.filled = (self.filled + 1).min(self.window_len);

        let filter: f32 = self.window[..self.filled.max(1)].iter().sum::<f32>()
            / self.filled.max(1) as f32;

        let term = match self.prev_filter {
            Some(prev) if dt > 0.0 => self.kd * (filter - prev) / dt,
            _ => 0.0,
        };
        self.prev_filter = Some(filter);
        term
    }
}

impl Element for Pid {
    fn kind(&self) -> ElementKind {
        ElementKind::Pid
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        // The first tick has no defined dt and is a no-op.
        let Some(last) = self.last_ts else {
            self.last_ts = Some(exec.ts());
            return;
        };
        let dt = (exec.ts() - last) as f32 / 1_000_000.0;
        self.last_ts = Some(exec.ts());

        let (Some(setpoint), Some(feedback)) = (
            exec.read_analog(self.ports.input(self.setpoint)),
            exec.read_analog(self.ports.input(self.feedback)),
        ) else {
            return;
        };

        let error = setpoint - feedback;

        self.integral += error * dt;
        let mut output = self.kp * error + self.ki * self.integral;
        if self.kd != 0.0 {
            output += self.derivative(error, dt);
        }

        exec.write_analog(self.output, output.clamp(self.output_min, self.output_max));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
