//! Sequential event recorder: boolean edge events in a ring buffer.

use std::any::Any;

use crate::element::{Element, ElementKind, Exec};
use crate::port::{PortKind, Ports};
use crate::time::Timestamp;

/// Capacity of the event ring. When full, the oldest entry is overwritten.
pub const MAX_SER_HISTORY: usize = 512;

/// Edge direction recorded for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerEdge {
    Rising,
    Falling,
    None,
}

impl std::fmt::Display for SerEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rising => write!(f, "RISING"),
            Self::Falling => write!(f, "FALLING"),
            Self::None => write!(f, "NONE"),
        }
    }
}

/// One recorded transition.
#[derive(Debug, Clone, Copy)]
pub struct SerEvent {
    /// Engine index of the element whose output transitioned.
    pub source: Option<usize>,
    pub edge: SerEdge,
    pub time: Timestamp,
}

/// Recorder element with `n` boolean inputs and no outputs. Each tick,
/// any input whose value differs from its stored previous state appends an
/// event to the ring.
pub struct Ser {
    ports: Ports,
    prev: Vec<bool>,
    log: Vec<SerEvent>,
    head: usize,
    count: usize,
}

impl Ser {
    pub fn new(n_inputs: u8) -> Self {
        let mut ports = Ports::new();
        for i in 0..n_inputs {
            ports.add_input(format!("input_{i}"), PortKind::Digital);
        }
        Self {
            ports,
            prev: vec![false; n_inputs as usize],
            log: Vec::with_capacity(MAX_SER_HISTORY),
            head: 0,
            count: 0,
        }
    }

    /// Oldest `min(n, count)` events in chronological order.
    pub fn event_log(&self, n: usize) -> Vec<SerEvent> {
        let take = n.min(self.count);
        let start = (self.head + MAX_SER_HISTORY - self.count) % MAX_SER_HISTORY;
        (0..take)
            .map(|i| self.log[(start + i) % MAX_SER_HISTORY])
            .collect()
    }

    /// Number of retained events.
    pub fn event_count(&self) -> usize {
        self.count
    }

    /// Drop the `n` oldest events (all of them if `n >= count`).
    pub fn remove_oldest(&mut self, n: usize) {
        if n >= self.count {
            self.head = 0;
            self.count = 0;
        } else {
            self.count -= n;
        }
    }

    pub fn is_full(&self) -> bool {
        self.count == MAX_SER_HISTORY
    }

    fn push(&mut self, event: SerEvent) {
        if self.head < self.log.len() {
            self.log[self.head] = event;
        } else {
            self.log.push(event);
        }
        self.head = (self.head + 1) % MAX_SER_HISTORY;
        if self.count < MAX_SER_HISTORY {
            self.count += 1;
        }
    }
}

impl Element for Ser {
    fn kind(&self) -> ElementKind {
        ElementKind::Ser
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    fn update(&mut self, exec: &mut Exec<'_>) {
        for i in 0..self.ports.inputs().len() {
            let input = self.ports.input(i);
            let Some(current) = exec.read_digital(input) else {
                continue;
            };
            if current != self.prev[i] {
                let source = input.source().map(|r| r.element);
                self.push(SerEvent {
                    source,
                    edge: if current {
                        SerEdge::Rising
                    } else {
                        SerEdge::Falling
                    },
                    time: exec.ts(),
                });
                self.prev[i] = current;
            }
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

    fn rig(ser: &mut Ser, n: usize) -> OutputBank {
        let mut bank = OutputBank::default();
        let mut feed = Ports::new();
        for i in 0..n {
            feed.add_output(format!("output_{i}"), PortKind::Digital);
        }
        bank.push_element(feed.outputs());
        bank.push_element(ser.ports().outputs());
        for i in 0..n {
            ser.ports_mut()
                .connect_input(i, PortKind::Digital, OutputRef { element: 0, port: i })
                .unwrap();
        }
        bank
    }

    #[test]
    fn records_edges_with_timestamps() {
        let mut ser = Ser::new(2);
        let mut bank = rig(&mut ser, 2);
        let base = Timestamp::new(0, 0, 0, 0, 0, 50);

        bank.set(OutputRef { element: 0, port: 0 }, Value::Digital(true));
        let mut exec = Exec::new(base, 1, &mut bank);
        ser.update(&mut exec);

        bank.set(OutputRef { element: 0, port: 0 }, Value::Digital(false));
        bank.set(OutputRef { element: 0, port: 1 }, Value::Digital(true));
        let later = base.get_future(1.0);
        let mut exec = Exec::new(later, 1, &mut bank);
        ser.update(&mut exec);

        let events = ser.event_log(10);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].edge, SerEdge::Rising);
        assert_eq!(events[0].time, base);
        assert_eq!(events[1].edge, SerEdge::Falling);
        assert_eq!(events[2].edge, SerEdge::Rising);
        assert_eq!(events[2].time, later);
        assert_eq!(events[0].source, Some(0));
    }

    #[test]
    fn ring_overwrites_oldest() {
        let mut ser = Ser::new(1);
        let mut bank = rig(&mut ser, 1);
        let base = Timestamp::new(0, 0, 0, 0, 0, 50);

        let extra = 7;
        let mut state = false;
        for i in 0..MAX_SER_HISTORY + extra {
            state = !state;
            bank.set(OutputRef { element: 0, port: 0 }, Value::Digital(state));
            let mut exec = Exec::new(base.get_future(i as f32), 1, &mut bank);
            ser.update(&mut exec);
        }

        assert!(ser.is_full());
        let events = ser.event_log(MAX_SER_HISTORY + extra);
        assert_eq!(events.len(), MAX_SER_HISTORY);
        // The oldest `extra` events were dropped: the first retained event
        // is transition number `extra` (zero-based), and order holds.
        assert_eq!(events[0].time, base.get_future(extra as f32));
        for pair in events.windows(2) {
            assert!(pair[1].time - pair[0].time > 0);
        }
    }

    #[test]
    fn remove_oldest_trims_log() {
        let mut ser = Ser::new(1);
        let mut bank = rig(&mut ser, 1);
        let base = Timestamp::new(0, 0, 0, 0, 0, 50);

        let mut state = false;
        for i in 0..6 {
            state = !state;
            bank.set(OutputRef { element: 0, port: 0 }, Value::Digital(state));
            let mut exec = Exec::new(base.get_future(i as f32), 1, &mut bank);
            ser.update(&mut exec);
        }
        assert_eq!(ser.event_count(), 6);

        ser.remove_oldest(2);
        let events = ser.event_log(10);
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].time, base.get_future(2.0));

        ser.remove_oldest(100);
        assert_eq!(ser.event_count(), 0);
    }
}
