//! Nodes: pass-through storage elements with history and bounded override.
//!
//! A node forwards its input to its output each tick. Nodes are the only
//! elements that accept external writes: board inputs set the node value
//! between ticks, and command/DNP3 overrides force it for a bounded
//! duration, after which the captured original is restored.

use std::any::Any;

use crate::element::{Element, ElementKind, Exec};
use crate::elements::Scalar;
use crate::port::Ports;
use crate::time::Timestamp;

struct OverrideState<T> {
    value: T,
    original: T,
    elapsed: f32,
    duration: f32,
}

/// A typed node with a history ring buffer.
pub struct Node<T: Scalar> {
    ports: Ports,
    input: usize,
    output: usize,

    value: T,
    history: Vec<T>,
    write: usize,

    override_state: Option<OverrideState<T>>,
    last_ts: Option<Timestamp>,
}

impl<T: Scalar> Node<T> {
    /// Create a node with the given history length (minimum 1).
    pub fn new(history_length: u16) -> Self {
        let mut ports = Ports::new();
        let input = ports.add_input("input", T::KIND);
        let output = ports.add_output("output", T::KIND);

        Self {
            ports,
            input,
            output,
            value: T::default(),
            history: vec![T::default(); history_length.max(1) as usize],
            write: 0,
            override_state: None,
            last_ts: None,
        }
    }

    /// Current node value (the value the next tick will publish).
    pub fn value(&self) -> T {
        self.value
    }

    /// Set the node value directly. Board inputs and test harnesses use
    /// this between ticks.
    pub fn set_value(&mut self, value: T) {
        self.value = value;
    }

    /// Force `value` onto this node for `duration` seconds, then restore
    /// the value captured at the moment the override began.
    pub fn override_value(&mut self, value: T, duration: f32) {
        let original = match &self.override_state {
            // Re-override keeps the original captured first.
            Some(state) => state.original,
            None => self.value,
        };
        self.override_state = Some(OverrideState {
            value,
            original,
            elapsed: 0.0,
            duration,
        });
    }

    /// Whether an override is currently active.
    pub fn is_overridden(&self) -> bool {
        self.override_state.is_some()
    }

    /// History snapshot, oldest sample first.
    pub fn history(&self) -> Vec<T> {
        let len = self.history.len();
        (0..len)
            .map(|i| self.history[(self.write + i) % len])
            .collect()
    }
}

impl<T: Scalar> Element for Node<T> {
    fn kind(&self) -> ElementKind {
        T::NODE_KIND
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        let dt = match self.last_ts {
            Some(last) => (exec.ts() - last) as f32 / 1_000_000.0,
            None => 0.0,
        };
        self.last_ts = Some(exec.ts());

        if let Some(v) = exec.read(self.ports.input(self.input)) {
            if let Some(v) = T::from_value(v) {
                self.value = v;
            }
        }

        if let Some(state) = &mut self.override_state {
            state.elapsed += dt;
            if state.elapsed >= state.duration {
                self.value = state.original;
                self.override_state = None;
            } else {
                self.value = state.value;
            }
        }

        exec.write(self.output, self.value.into_value());

        self.history[self.write] = self.value;
        self.write = (self.write + 1) % self.history.len();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
