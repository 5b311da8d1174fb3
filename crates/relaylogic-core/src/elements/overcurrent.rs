//! Time-overcurrent element emulating an electromechanical induction disk.

use std::any::Any;
use std::fmt;

use crate::element::{Element, ElementKind, Exec};
use crate::port::{PortKind, Ports};
use crate::time::Timestamp;

/// IEEE/IEC inverse-time curve selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OvercurrentCurve {
    C1,
    C2,
    C3,
    C4,
    C5,
    U1,
    U2,
    U3,
    U4,
    U5,
    Dt,
    Invalid,
}

impl OvercurrentCurve {
    pub fn from_str(curve: &str) -> Self {
        match curve {
            "C1" => Self::C1,
            "C2" => Self::C2,
            "C3" => Self::C3,
            "C4" => Self::C4,
            "C5" => Self::C5,
            "U1" => Self::U1,
            "U2" => Self::U2,
            "U3" => Self::U3,
            "U4" => Self::U4,
            "U5" => Self::U5,
            "DT" => Self::Dt,
            _ => Self::Invalid,
        }
    }

    /// Curve constants `(A, B, P, Q, R)` for the trip and reset models.
    pub fn parameters(&self) -> [f32; 5] {
        match self {
            Self::C1 => [0.0, 0.14, 0.02, 13.5, 2.0],
            Self::C2 => [0.0, 13.5, 2.0, 47.3, 2.0],
            Self::C3 => [0.0, 80.0, 2.0, 80.0, 2.0],
            Self::C4 => [0.0, 120.0, 2.0, 120.0, 2.0],
            Self::C5 => [0.0, 0.0515, 0.02, 4.85, 2.0],
            Self::U1 => [0.0, 0.0104, 0.02, 2.261, 2.0],
            Self::U2 => [0.0, 5.95, 2.0, 18.0, 2.0],
            Self::U3 => [0.0, 3.88, 2.0, 21.6, 2.0],
            Self::U4 => [0.0, 5.67, 2.0, 29.1, 2.0],
            Self::U5 => [0.0, 0.00342, 0.02, 0.323, 2.0],
            Self::Dt | Self::Invalid => [0.0, 0.0, 1.0, 0.0, 1.0],
        }
    }
}

impl fmt::Display for OvercurrentCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::C1 => "C1",
            Self::C2 => "C2",
            Self::C3 => "C3",
            Self::C4 => "C4",
            Self::C5 => "C5",
            Self::U1 => "U1",
            Self::U2 => "U2",
            Self::U3 => "U3",
            Self::U4 => "U4",
            Self::U5 => "U5",
            Self::Dt => "DT",
            Self::Invalid => "INVALID",
        };
        write!(f, "{s}")
    }
}

/// Inverse-time overcurrent element. Float `current` input, boolean `trip`
/// output.
///
/// The disk position is tracked as `percent` in `[0, 100]`. With multiple
/// `m = current / pickup`:
///
/// - `m > 1`: `percent += dt / tTrip(m) * 100` where
///   `tTrip = timeAdder + timeDial * (A + B / (m^P - 1))`
/// - `m < 1` with electromechanical reset: `percent -= dt / tReset(m) * 100`
///   where `tReset = timeDial * Q / (1 - m^R)`
/// - `m == 1`, or below pickup without EM reset: `percent = 0`
///
/// `trip` asserts when the disk reaches exactly 100.
pub struct Overcurrent {
    ports: Ports,
    current: usize,
    trip: usize,

    parameters: [f32; 5],
    pickup: f32,
    time_dial: f32,
    time_adder: f32,
    em_reset: bool,

    percent: f32,
    last_ts: Option<Timestamp>,
}

impl Overcurrent {
    pub fn new(curve: &str, pickup: f32, time_dial: f32, time_adder: f32, em_reset: bool) -> Self {
        let mut ports = Ports::new();
        let current = ports.add_input("current", PortKind::Analog);
        let trip = ports.add_output("trip", PortKind::Digital);

        Self {
            ports,
            current,
            trip,
            parameters: OvercurrentCurve::from_str(curve).parameters(),
            pickup,
            time_dial,
            time_adder,
            em_reset,
            percent: 0.0,
            last_ts: None,
        }
    }

    /// Current disk position in percent.
    pub fn percent(&self) -> f32 {
        self.percent
    }
}

impl Element for Overcurrent {
    fn kind(&self) -> ElementKind {
        ElementKind::Overcurrent
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

        let Some(current) = exec.read_analog(self.ports.input(self.current)) else {
            return;
        };

        let [a, b, p, q, r] = self.parameters;
        let m = current / self.pickup;

        if m > 1.0 {
            let trip_time = self.time_adder + self.time_dial * (a + b / (m.powf(p) - 1.0));
            self.percent += dt / trip_time * 100.0;
        } else if m < 1.0 && self.em_reset {
            let reset_time = self.time_dial * q / (1.0 - m.powf(r));
            self.percent -= dt / reset_time * 100.0;
        } else {
            // At pickup exactly, or below pickup without EM reset, the
            // disk snaps home.
            self.percent = 0.0;
        }

        self.percent = self.percent.clamp(0.0, 100.0);
        exec.write_digital(self.trip, self.percent == 100.0);
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

    struct Rig {
        bank: OutputBank,
        ts: Timestamp,
    }

    impl Rig {
        fn new(oc: &mut Overcurrent) -> Self {
            let mut bank = OutputBank::default();
            let mut feed = Ports::new();
            feed.add_output("output", PortKind::Analog);
            bank.push_element(feed.outputs());
            bank.push_element(oc.ports().outputs());
            oc.ports_mut()
                .connect_input(0, PortKind::Analog, OutputRef { element: 0, port: 0 })
                .unwrap();
            Self {
                bank,
                ts: Timestamp::new(0, 0, 0, 0, 0, 50),
            }
        }

        fn tick(&mut self, oc: &mut Overcurrent, current: f32, dt: f32) -> bool {
            self.bank
                .set(OutputRef { element: 0, port: 0 }, Value::Analog(current));
            let mut exec = Exec::new(self.ts, 1, &mut self.bank);
            oc.update(&mut exec);
            self.ts = self.ts.get_future(dt);
            self.bank.element_outputs(1)[0].as_digital().unwrap()
        }
    }

    #[test]
    fn curve_parameters_c1() {
        let p = OvercurrentCurve::C1.parameters();
        assert_eq!(&p[..3], &[0.0, 0.14, 0.02]);
    }

    #[test]
    fn unknown_curve_is_invalid() {
        assert_eq!(OvercurrentCurve::from_str("Z9"), OvercurrentCurve::Invalid);
    }

    #[test]
    fn c1_trips_near_ten_seconds_at_double_pickup() {
        let mut oc = Overcurrent::new("C1", 1.0, 1.0, 0.0, false);
        let mut rig = Rig::new(&mut oc);

        let dt = 0.01;
        let mut trip_at = None;
        for i in 0..1100 {
            if rig.tick(&mut oc, 2.0, dt) {
                trip_at = Some(i as f32 * dt);
                break;
            }
        }
        let t = trip_at.expect("element never tripped");
        // 0.14 / (2^0.02 - 1) ≈ 10.03 s.
        assert!((9.9..=10.2).contains(&t), "tripped at {t}");
    }

    #[test]
    fn below_pickup_without_em_reset_snaps_home() {
        let mut oc = Overcurrent::new("C1", 1.0, 1.0, 0.0, false);
        let mut rig = Rig::new(&mut oc);

        for _ in 0..200 {
            rig.tick(&mut oc, 2.0, 0.01);
        }
        assert!(oc.percent() > 0.0);

        rig.tick(&mut oc, 0.5, 0.01);
        assert_eq!(oc.percent(), 0.0);
    }

    #[test]
    fn em_reset_spins_down_gradually() {
        let mut oc = Overcurrent::new("C1", 1.0, 1.0, 0.0, true);
        let mut rig = Rig::new(&mut oc);

        for _ in 0..300 {
            rig.tick(&mut oc, 2.0, 0.01);
        }
        let spun_up = oc.percent();
        assert!(spun_up > 10.0);

        rig.tick(&mut oc, 0.5, 0.01);
        let after = oc.percent();
        assert!(after < spun_up && after > 0.0, "percent {after}");
    }

    #[test]
    fn percent_clamps_at_hundred() {
        let mut oc = Overcurrent::new("DT", 1.0, 1.0, 0.1, false);
        let mut rig = Rig::new(&mut oc);
        // DT with timeAdder 0.1 trips in a tenth of a second.
        rig.tick(&mut oc, 5.0, 0.5);
        assert!(rig.tick(&mut oc, 5.0, 0.5));
        assert_eq!(oc.percent(), 100.0);
    }
}
