//! Phasor extraction from raw winding samples.
//!
//! A winding channel runs a full-cycle cosine filter over a ring of N raw
//! samples and forms a phasor from the filter output and its quarter-cycle
//! history. Sign convention: the imaginary part is the *negated*
//! quarter-cycle sample, so an unreferenced phasor rotates clockwise at the
//! power frequency; aligning against a reference phasor extracted the same
//! way cancels the rotation and leaves the phase difference.

use std::any::Any;
use std::f32::consts::PI;

use num_complex::Complex32;

use crate::element::{Element, ElementKind, Exec};
use crate::port::{PortKind, Ports};

/// Minimum samples-per-cycle a winding accepts (the quarter-cycle tap must
/// exist).
pub const MIN_SAMPLES_PER_CYCLE: u16 = 4;

/// One cosine-filter phasor channel.
struct Channel {
    n: usize,
    raw: Vec<f32>,
    filtered: Vec<f32>,
    coefficients: Vec<f32>,
    write: usize,
    quarter: usize,
}

impl Channel {
    fn new(samples_per_cycle: u16) -> Self {
        let n = samples_per_cycle.max(MIN_SAMPLES_PER_CYCLE) as usize;
        let coefficients = (0..n)
            .map(|i| (2.0 / n as f64 * (2.0 * PI as f64 / n as f64 * i as f64).cos()) as f32)
            .collect();
        Self {
            n,
            raw: vec![0.0; n],
            filtered: vec![0.0; n],
            coefficients,
            write: n - 1,
            quarter: n / 4 - 1,
        }
    }

    fn set_raw(&mut self, sample: f32) {
        self.raw[self.write] = sample;
    }

    /// Run one tick: filter, form the phasor, advance the ring indices.
    fn tick(&mut self) -> Complex32 {
        let mut sum = 0.0f32;
        for (i, c) in self.coefficients.iter().enumerate() {
            sum += self.raw[(self.write + i) % self.n] * c;
        }
        self.filtered[self.write] = sum;

        let phasor = Complex32::new(self.filtered[self.write], -self.filtered[self.quarter]);

        self.write = (self.write + self.n - 1) % self.n;
        self.quarter = (self.quarter + self.n - 1) % self.n;
        phasor
    }
}

/// Rotate `phasor` so the reference lies along the positive real axis. A
/// zero-magnitude reference leaves the phasor unrotated.
fn align_to_reference(phasor: Complex32, reference: Complex32) -> Complex32 {
    if reference.norm_sqr() == 0.0 {
        return phasor;
    }
    Complex32::from_polar(phasor.norm(), phasor.arg() - reference.arg())
}

/// Single-phase winding: one raw float input, one complex reference input,
/// one complex phasor output.
pub struct Winding1P {
    ports: Ports,
    raw: usize,
    reference: usize,
    output: usize,
    channel: Channel,
}

impl Winding1P {
    pub fn new(samples_per_cycle: u16) -> Self {
        let mut ports = Ports::new();
        let raw = ports.add_input("raw", PortKind::Analog);
        let reference = ports.add_input("reference", PortKind::Complex);
        let output = ports.add_output("output", PortKind::Complex);
        Self {
            ports,
            raw,
            reference,
            output,
            channel: Channel::new(samples_per_cycle),
        }
    }
}

impl Element for Winding1P {
    fn kind(&self) -> ElementKind {
        ElementKind::Winding1P
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        if let Some(sample) = exec.read_analog(self.ports.input(self.raw)) {
            self.channel.set_raw(sample);
        }
        let mut phasor = self.channel.tick();
        if let Some(reference) = exec.read_complex(self.ports.input(self.reference)) {
            phasor = align_to_reference(phasor, reference);
        }
        exec.write_complex(self.output, phasor);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Three-phase winding: three raw inputs and a shared complex reference;
/// outputs the three phase phasors and the zero/positive/negative sequence
/// components.
pub struct Winding3P {
    ports: Ports,
    raw: [usize; 3],
    reference: usize,
    phase_out: [usize; 3],
    seq_out: [usize; 3],
    channels: [Channel; 3],
}

impl Winding3P {
    pub fn new(samples_per_cycle: u16) -> Self {
        let mut ports = Ports::new();
        let raw = [
            ports.add_input("raw_a", PortKind::Analog),
            ports.add_input("raw_b", PortKind::Analog),
            ports.add_input("raw_c", PortKind::Analog),
        ];
        let reference = ports.add_input("reference", PortKind::Complex);
        let phase_out = [
            ports.add_output("phase_a", PortKind::Complex),
            ports.add_output("phase_b", PortKind::Complex),
            ports.add_output("phase_c", PortKind::Complex),
        ];
        let seq_out = [
            ports.add_output("seq_0", PortKind::Complex),
            ports.add_output("seq_1", PortKind::Complex),
            ports.add_output("seq_2", PortKind::Complex),
        ];
        Self {
            ports,
            raw,
            reference,
            phase_out,
            seq_out,
            channels: [
                Channel::new(samples_per_cycle),
                Channel::new(samples_per_cycle),
                Channel::new(samples_per_cycle),
            ],
        }
    }
}

impl Element for Winding3P {
    fn kind(&self) -> ElementKind {
        ElementKind::Winding3P
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let reference = exec.read_complex(self.ports.input(self.reference));

        let mut phasors = [Complex32::default(); 3];
        for i in 0..3 {
            if let Some(sample) = exec.read_analog(self.ports.input(self.raw[i])) {
                self.channels[i].set_raw(sample);
            }
            let mut phasor = self.channels[i].tick();
            if let Some(r) = reference {
                phasor = align_to_reference(phasor, r);
            }
            phasors[i] = phasor;
        }

        for i in 0..3 {
            exec.write_complex(self.phase_out[i], phasors[i]);
        }

        let alpha = Complex32::from_polar(1.0, 2.0 * PI / 3.0);
        let alpha2 = alpha * alpha;
        let [a, b, c] = phasors;
        exec.write_complex(self.seq_out[0], (a + b + c) / 3.0);
        exec.write_complex(self.seq_out[1], (a + alpha * b + alpha2 * c) / 3.0);
        exec.write_complex(self.seq_out[2], (a + alpha2 * b + alpha * c) / 3.0);
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

    const N: u16 = 64;

    fn drive_channel(channel: &mut Channel, phase_deg: f32, ticks: usize) -> Complex32 {
        let omega = 2.0 * PI / N as f32;
        let phase = phase_deg.to_radians();
        let mut out = Complex32::default();
        for k in 0..ticks {
            channel.set_raw((omega * k as f32 + phase).cos());
            out = channel.tick();
        }
        out
    }

    #[test]
    fn cosine_filter_settles_to_unit_magnitude() {
        // Sample at a whole number of cycles so the rotating term vanishes.
        let mut channel = Channel::new(N);
        let out = drive_channel(&mut channel, 0.0, 2 * N as usize + 1);
        assert!((out.norm() - 1.0).abs() < 1e-3, "magnitude {}", out.norm());
        assert!(out.arg().abs() < 1e-3, "argument {}", out.arg());
    }

    #[test]
    fn phase_appears_negated_without_reference() {
        // Retained convention: the unreferenced phasor at a whole number of
        // cycles carries the negative of the signal phase.
        let mut channel = Channel::new(N);
        let out = drive_channel(&mut channel, 30.0, 2 * N as usize + 1);
        assert!((out.norm() - 1.0).abs() < 1e-3);
        assert!(
            (out.arg() + 30f32.to_radians()).abs() < 1e-3,
            "argument {}",
            out.arg()
        );
    }

    #[test]
    fn zero_reference_leaves_phasor_unrotated() {
        let phasor = Complex32::new(0.5, 0.5);
        assert_eq!(align_to_reference(phasor, Complex32::default()), phasor);
    }

    #[test]
    fn reference_alignment_extracts_lag() {
        // Signal lags the reference by 30 degrees; after alignment the
        // output phasor argument is +30 degrees.
        let mut signal = Channel::new(N);
        let mut reference = Channel::new(N);
        let (mut s, mut r) = (Complex32::default(), Complex32::default());
        let omega = 2.0 * PI / N as f32;
        for k in 0..2 * N as usize {
            signal.set_raw((omega * k as f32 - 30f32.to_radians()).cos());
            reference.set_raw((omega * k as f32).cos());
            s = signal.tick();
            r = reference.tick();
        }
        let aligned = align_to_reference(s, r);
        assert!(
            (aligned.arg().to_degrees() - 30.0).abs() < 0.5,
            "argument {} deg",
            aligned.arg().to_degrees()
        );
    }

    fn rig_3p(w: &mut Winding3P) -> OutputBank {
        let mut bank = OutputBank::default();
        let mut feed = Ports::new();
        for name in ["a", "b", "c"] {
            feed.add_output(name, PortKind::Analog);
        }
        bank.push_element(feed.outputs());
        bank.push_element(w.ports().outputs());
        for i in 0..3 {
            w.ports_mut()
                .connect_input(i, PortKind::Analog, OutputRef { element: 0, port: i })
                .unwrap();
        }
        bank
    }

    fn drive_3p(w: &mut Winding3P, bank: &mut OutputBank, phases_deg: [f32; 3]) {
        let omega = 2.0 * PI / N as f32;
        let ts = Timestamp::new(0, 0, 0, 0, 0, 50);
        for k in 0..2 * N as usize {
            for (i, phase) in phases_deg.iter().enumerate() {
                let v = (omega * k as f32 + phase.to_radians()).cos();
                bank.set(OutputRef { element: 0, port: i }, Value::Analog(v));
            }
            let mut exec = Exec::new(ts, 1, bank);
            w.update(&mut exec);
        }
    }

    #[test]
    fn balanced_set_is_pure_positive_sequence() {
        let mut w = Winding3P::new(N);
        let mut bank = rig_3p(&mut w);
        // With the negated-imaginary convention, a set whose time-domain
        // phases step +120 degrees produces phasors stepping -120 degrees:
        // textbook a-b-c rotation.
        drive_3p(&mut w, &mut bank, [0.0, 120.0, -120.0]);

        let outs = bank.element_outputs(1);
        let v0 = outs[3].as_complex().unwrap();
        let v1 = outs[4].as_complex().unwrap();
        let v2 = outs[5].as_complex().unwrap();
        let va = outs[0].as_complex().unwrap();

        assert!(v0.norm() < 1e-3, "V0 {}", v0.norm());
        assert!(v2.norm() < 1e-3, "V2 {}", v2.norm());
        assert!((v1.norm() - va.norm()).abs() < 1e-3);
    }

    #[test]
    fn equal_set_is_pure_zero_sequence() {
        let mut w = Winding3P::new(N);
        let mut bank = rig_3p(&mut w);
        drive_3p(&mut w, &mut bank, [15.0, 15.0, 15.0]);

        let outs = bank.element_outputs(1);
        let v0 = outs[3].as_complex().unwrap();
        let v1 = outs[4].as_complex().unwrap();
        let v2 = outs[5].as_complex().unwrap();
        let va = outs[0].as_complex().unwrap();

        assert!(v1.norm() < 1e-3, "V1 {}", v1.norm());
        assert!(v2.norm() < 1e-3, "V2 {}", v2.norm());
        assert!((v0 - va).norm() < 1e-4);
    }
}
