//! Digital logic elements: gates, edge triggers, and the counter.

use std::any::Any;

use crate::element::{Element, ElementKind, Exec};
use crate::port::{PortKind, Ports};

fn input_name(i: usize) -> String {
    format!("input_{i}")
}

/// Logical AND over all connected boolean inputs. Unconnected inputs read
/// as the identity (true).
pub struct And {
    ports: Ports,
    output: usize,
}

impl And {
    pub fn new(n_inputs: u8) -> Self {
        let mut ports = Ports::new();
        for i in 0..n_inputs {
            ports.add_input(input_name(i as usize), PortKind::Digital);
        }
        let output = ports.add_output("output", PortKind::Digital);
        Self { ports, output }
    }
}

impl Element for And {
    fn kind(&self) -> ElementKind {
        ElementKind::And
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let mut next = true;
        for input in self.ports.inputs() {
            if let Some(v) = exec.read_digital(input) {
                next &= v;
            }
        }
        exec.write_digital(self.output, next);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Logical OR over all connected boolean inputs. Unconnected inputs read
/// as the identity (false).
pub struct Or {
    ports: Ports,
    output: usize,
}

impl Or {
    pub fn new(n_inputs: u8) -> Self {
        let mut ports = Ports::new();
        for i in 0..n_inputs {
            ports.add_input(input_name(i as usize), PortKind::Digital);
        }
        let output = ports.add_output("output", PortKind::Digital);
        Self { ports, output }
    }
}

impl Element for Or {
    fn kind(&self) -> ElementKind {
        ElementKind::Or
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let mut next = false;
        for input in self.ports.inputs() {
            if let Some(v) = exec.read_digital(input) {
                next |= v;
            }
        }
        exec.write_digital(self.output, next);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Boolean inverter.
pub struct Not {
    ports: Ports,
    input: usize,
    output: usize,
}

impl Not {
    pub fn new() -> Self {
        let mut ports = Ports::new();
        let input = ports.add_input("input", PortKind::Digital);
        let output = ports.add_output("output", PortKind::Digital);
        Self {
            ports,
            input,
            output,
        }
    }
}

impl Default for Not {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for Not {
    fn kind(&self) -> ElementKind {
        ElementKind::Not
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let v = exec.read_digital(self.ports.input(self.input)).unwrap_or(false);
        exec.write_digital(self.output, !v);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Rising-edge trigger: output is true for exactly one tick after a
/// low-to-high transition on the input.
pub struct RTrig {
    ports: Ports,
    input: usize,
    output: usize,
    states: [bool; 2],
}

impl RTrig {
    pub fn new() -> Self {
        let mut ports = Ports::new();
        let input = ports.add_input("input", PortKind::Digital);
        let output = ports.add_output("output", PortKind::Digital);
        Self {
            ports,
            input,
            output,
            states: [false; 2],
        }
    }
}

impl Default for RTrig {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for RTrig {
    fn kind(&self) -> ElementKind {
        ElementKind::RTrig
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        if let Some(v) = exec.read_digital(self.ports.input(self.input)) {
            self.states[1] = self.states[0];
            self.states[0] = v;
            exec.write_digital(self.output, self.states[0] && !self.states[1]);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Falling-edge trigger: output is true for exactly one tick after a
/// high-to-low transition on the input.
pub struct FTrig {
    ports: Ports,
    input: usize,
    output: usize,
    states: [bool; 2],
}

impl FTrig {
    pub fn new() -> Self {
        let mut ports = Ports::new();
        let input = ports.add_input("input", PortKind::Digital);
        let output = ports.add_output("output", PortKind::Digital);
        Self {
            ports,
            input,
            output,
            states: [false; 2],
        }
    }
}

impl Default for FTrig {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for FTrig {
    fn kind(&self) -> ElementKind {
        ElementKind::FTrig
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        if let Some(v) = exec.read_digital(self.ports.input(self.input)) {
            self.states[1] = self.states[0];
            self.states[0] = v;
            exec.write_digital(self.output, !self.states[0] && self.states[1]);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Saturating edge counter. Counts rising edges on `count_up`; `reset`
/// dominates and zeroes the count. Output asserts at `count >= final`.
pub struct Counter {
    ports: Ports,
    count_up: usize,
    reset: usize,
    output: usize,
    count: u16,
    count_final: u16,
    states: [bool; 2],
}

impl Counter {
    pub fn new(count_final: u16) -> Self {
        let mut ports = Ports::new();
        let count_up = ports.add_input("count_up", PortKind::Digital);
        let reset = ports.add_input("reset", PortKind::Digital);
        let output = ports.add_output("output", PortKind::Digital);
        Self {
            ports,
            count_up,
            reset,
            output,
            count: 0,
            count_final,
            states: [false; 2],
        }
    }

    pub fn count(&self) -> u16 {
        self.count
    }
}

impl Element for Counter {
    fn kind(&self) -> ElementKind {
        ElementKind::Counter
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let Some(up) = exec.read_digital(self.ports.input(self.count_up)) else {
            return;
        };
        // An unconnected reset reads as not asserted.
        let reset = exec
            .read_digital(self.ports.input(self.reset))
            .unwrap_or(false);

        self.states[1] = self.states[0];
        self.states[0] = up;
        let rising = self.states[0] && !self.states[1];

        if reset {
            self.count = 0;
        } else if rising {
            self.count = self.count.saturating_add(1);
        }

        exec.write_digital(self.output, self.count >= self.count_final);
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
    use crate::port::{OutputBank, OutputRef, PortKind, Value};
    use crate::time::Timestamp;

    /// Drive a single element whose input 0 is fed from a fake source
    /// element at bank row 0; the element under test lives at row 1.
    struct Rig {
        bank: OutputBank,
        ts: Timestamp,
    }

    impl Rig {
        fn new(elem: &mut dyn Element, n_inputs: usize) -> Self {
            let mut bank = OutputBank::default();
            let mut feed = Ports::new();
            for i in 0..n_inputs {
                feed.add_output(format!("output_{i}"), PortKind::Digital);
            }
            bank.push_element(feed.outputs());
            bank.push_element(elem.ports().outputs());
            for i in 0..n_inputs {
                elem.ports_mut()
                    .connect_input(i, PortKind::Digital, OutputRef { element: 0, port: i })
                    .unwrap();
            }
            Self {
                bank,
                ts: Timestamp::new(0, 0, 0, 0, 0, 50),
            }
        }

        fn tick(&mut self, elem: &mut dyn Element, feeds: &[bool]) -> bool {
            for (i, v) in feeds.iter().enumerate() {
                self.bank
                    .set(OutputRef { element: 0, port: i }, Value::Digital(*v));
            }
            self.ts = self.ts.get_future(0.01);
            let mut exec = Exec::new(self.ts, 1, &mut self.bank);
            elem.update(&mut exec);
            self.bank.element_outputs(1)[0].as_digital().unwrap()
        }
    }

    #[test]
    fn and_reduction_with_identity() {
        let mut gate = And::new(3);
        // Only two of three inputs connected: the third reads as true.
        let mut rig = Rig::new(&mut gate, 2);
        assert!(rig.tick(&mut gate, &[true, true]));
        assert!(!rig.tick(&mut gate, &[true, false]));
    }

    #[test]
    fn or_reduction_with_identity() {
        let mut gate = Or::new(3);
        let mut rig = Rig::new(&mut gate, 2);
        assert!(!rig.tick(&mut gate, &[false, false]));
        assert!(rig.tick(&mut gate, &[false, true]));
    }

    #[test]
    fn not_inverts() {
        let mut gate = Not::new();
        let mut rig = Rig::new(&mut gate, 1);
        assert!(rig.tick(&mut gate, &[false]));
        assert!(!rig.tick(&mut gate, &[true]));
    }

    #[test]
    fn rtrig_pulse_sequence() {
        let mut trig = RTrig::new();
        let mut rig = Rig::new(&mut trig, 1);
        let input = [false, false, true, true, false, true];
        let expected = [false, false, true, false, false, true];
        for (i, (inp, exp)) in input.iter().zip(expected.iter()).enumerate() {
            assert_eq!(rig.tick(&mut trig, &[*inp]), *exp, "tick {i}");
        }
    }

    #[test]
    fn ftrig_pulse_sequence() {
        let mut trig = FTrig::new();
        let mut rig = Rig::new(&mut trig, 1);
        let input = [false, false, true, true, false, true];
        let expected = [false, false, false, false, true, false];
        for (i, (inp, exp)) in input.iter().zip(expected.iter()).enumerate() {
            assert_eq!(rig.tick(&mut trig, &[*inp]), *exp, "tick {i}");
        }
    }

    #[test]
    fn counter_counts_rising_edges() {
        let mut counter = Counter::new(3);
        let mut rig = Rig::new(&mut counter, 2);

        for pulse in 0..5 {
            let out_high = rig.tick(&mut counter, &[true, false]);
            rig.tick(&mut counter, &[false, false]);
            assert_eq!(out_high, pulse >= 2, "pulse {}", pulse + 1);
        }
        assert_eq!(counter.count(), 5);
    }

    #[test]
    fn counter_reset_dominates() {
        let mut counter = Counter::new(2);
        let mut rig = Rig::new(&mut counter, 2);

        rig.tick(&mut counter, &[true, false]);
        rig.tick(&mut counter, &[false, false]);
        rig.tick(&mut counter, &[true, false]);
        assert_eq!(counter.count(), 2);

        // Reset wins even against a simultaneous rising edge.
        rig.tick(&mut counter, &[false, false]);
        assert!(!rig.tick(&mut counter, &[true, true]));
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn counter_with_unconnected_reset_counts() {
        let mut counter = Counter::new(1);
        // Only count_up connected.
        let mut rig = Rig::new(&mut counter, 1);
        assert!(rig.tick(&mut counter, &[true]));
        assert_eq!(counter.count(), 1);
    }
}
