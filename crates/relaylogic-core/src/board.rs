//! Board façade: binds named engine elements to physical I/O and
//! orchestrates the inputs → engine → outputs cycle.

use log::warn;

use crate::dnp3::Dnp3OutstationConfig;
use crate::element::ElementKind;
use crate::engine::Engine;
use crate::hal::{BoardHal, GpioPin};
use crate::port::{clamp_str, Value};
use crate::time::Timestamp;

/// Maximum stored length of the device name and part number.
pub const BOARD_ID_LENGTH: usize = 32;

/// Library version reported in the board's identity page.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identity and I/O slot counts.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub device_name: String,
    pub device_pn: String,
    pub digital_inputs: u16,
    pub digital_outputs: u16,
    pub analog_inputs: u16,
}

impl BoardConfig {
    pub fn new(
        device_name: &str,
        device_pn: &str,
        digital_inputs: u16,
        digital_outputs: u16,
        analog_inputs: u16,
    ) -> Self {
        Self {
            device_name: clamp_str(device_name, BOARD_ID_LENGTH),
            device_pn: clamp_str(device_pn, BOARD_ID_LENGTH),
            digital_inputs,
            digital_outputs,
            analog_inputs,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct DigitalIo {
    name: String,
    gpio: GpioPin,
    invert: bool,
    element: Option<usize>,
}

#[derive(Debug, Clone, Default)]
struct AnalogIo {
    name: String,
    gpio: GpioPin,
    element: Option<usize>,
}

/// A device board. Owns the engine (once attached), the HAL, and the I/O
/// binding tables.
pub struct Board {
    engine: Option<Engine>,
    hal: Box<dyn BoardHal>,
    hal_ready: bool,
    config: BoardConfig,

    engine_paused: bool,
    io_invalidated: bool,
    inputs_need_update: bool,

    digital_inputs: Vec<DigitalIo>,
    analog_inputs: Vec<AnalogIo>,
    outputs: Vec<DigitalIo>,

    dnp3: Option<Dnp3OutstationConfig>,
}

impl Board {
    /// Create a blank board with the given slot counts. A HAL whose init
    /// fails leaves the board diagnostic-only (no pin I/O is performed).
    pub fn new(config: BoardConfig, mut hal: Box<dyn BoardHal>) -> Self {
        let hal_ready = hal.init();
        if !hal_ready {
            warn!(
                "HAL initialization failed for platform {}",
                hal.platform_name()
            );
        }

        Self {
            engine: None,
            digital_inputs: vec![DigitalIo::default(); config.digital_inputs as usize],
            analog_inputs: vec![AnalogIo::default(); config.analog_inputs as usize],
            outputs: vec![DigitalIo::default(); config.digital_outputs as usize],
            config,
            hal,
            hal_ready,
            engine_paused: true,
            io_invalidated: true,
            inputs_need_update: false,
            dnp3: None,
        }
    }

    /// Bind a digital input slot to an engine element name.
    pub fn add_input(&mut self, slot: usize, name: &str, port: u32, pin: u32, invert: bool) {
        let gpio = GpioPin::new(port, pin);
        self.digital_inputs[slot] = DigitalIo {
            name: clamp_str(name, crate::port::ELEMENT_NAME_LENGTH),
            gpio,
            invert,
            element: None,
        };
        if self.hal_ready {
            self.hal.configure_digital_input(gpio);
        }
        self.io_invalidated = true;
    }

    /// Bind an analog input slot to an engine element name.
    pub fn add_analog_input(&mut self, slot: usize, name: &str, port: u32, pin: u32) {
        let gpio = GpioPin::new(port, pin);
        self.analog_inputs[slot] = AnalogIo {
            name: clamp_str(name, crate::port::ELEMENT_NAME_LENGTH),
            gpio,
            element: None,
        };
        if self.hal_ready {
            self.hal.configure_analog_input(gpio);
        }
        self.io_invalidated = true;
    }

    /// Bind a digital output slot to an engine element name.
    pub fn add_output(&mut self, slot: usize, name: &str, port: u32, pin: u32, invert: bool) {
        let gpio = GpioPin::new(port, pin);
        self.outputs[slot] = DigitalIo {
            name: clamp_str(name, crate::port::ELEMENT_NAME_LENGTH),
            gpio,
            invert,
            element: None,
        };
        if self.hal_ready {
            self.hal.configure_digital_output(gpio);
        }
        self.io_invalidated = true;
    }

    /// Attach an engine. I/O bindings are re-resolved on the next update.
    pub fn attach_engine(&mut self, engine: Engine) {
        self.engine = Some(engine);
        self.io_invalidated = true;
    }

    /// Attach a parsed DNP3 outstation configuration.
    pub fn attach_dnp3(&mut self, config: Dnp3OutstationConfig) {
        self.dnp3 = Some(config);
        self.io_invalidated = true;
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut Engine> {
        self.engine.as_mut()
    }

    pub fn dnp3(&self) -> Option<&Dnp3OutstationConfig> {
        self.dnp3.as_ref()
    }

    /// Unpause the engine.
    pub fn start(&mut self) {
        self.engine_paused = false;
    }

    /// Pause the engine.
    pub fn pause(&mut self) {
        self.engine_paused = true;
    }

    pub fn is_paused(&self) -> bool {
        self.engine_paused
    }

    /// Request a HAL input refresh on the next cycle.
    pub fn flag_input_for_update(&mut self) {
        self.inputs_need_update = true;
    }

    /// Run one board cycle: validate bindings if needed, refresh flagged
    /// inputs, step the engine, write outputs.
    pub fn update(&mut self, ts: Timestamp) {
        if self.io_invalidated {
            self.validate_io();
        }
        if self.io_invalidated || self.engine_paused {
            return;
        }

        if self.inputs_need_update && self.hal_ready {
            self.update_inputs();
        }

        if let Some(engine) = self.engine.as_mut() {
            engine.update(ts);
        }

        if self.hal_ready {
            self.update_outputs();
        }
    }

    /// Board identity page.
    pub fn get_info(&self) -> String {
        format!(
            "Device Name: {}\r\nDevice PN: {}\r\nFirmware: {}\r\nDigital Inputs: {}\r\nDigital Outputs: {}\r\nAnalog Inputs: {}\r\n",
            self.config.device_name,
            self.config.device_pn,
            VERSION,
            self.config.digital_inputs,
            self.config.digital_outputs,
            self.config.analog_inputs,
        )
    }

    /// Resolve every I/O binding against the attached engine. All slots
    /// must name an element of the matching node kind; any failure leaves
    /// the board invalidated and no HAL I/O is performed.
    fn validate_io(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };

        let resolve = |name: &str, expected: ElementKind| -> Option<usize> {
            let idx = engine.element_index(name)?;
            if engine.element_kind(idx) != expected {
                warn!(
                    "board binding '{name}' is a {} element, expected {expected}",
                    engine.element_kind(idx)
                );
                return None;
            }
            Some(idx)
        };

        let mut resolved_analog = Vec::with_capacity(self.analog_inputs.len());
        for io in &self.analog_inputs {
            match resolve(&io.name, ElementKind::NodeAnalog) {
                Some(idx) => resolved_analog.push(idx),
                None => return,
            }
        }
        let mut resolved_inputs = Vec::with_capacity(self.digital_inputs.len());
        for io in &self.digital_inputs {
            match resolve(&io.name, ElementKind::NodeDigital) {
                Some(idx) => resolved_inputs.push(idx),
                None => return,
            }
        }
        let mut resolved_outputs = Vec::with_capacity(self.outputs.len());
        for io in &self.outputs {
            match resolve(&io.name, ElementKind::NodeDigital) {
                Some(idx) => resolved_outputs.push(idx),
                None => return,
            }
        }

        for (io, idx) in self.analog_inputs.iter_mut().zip(resolved_analog) {
            io.element = Some(idx);
        }
        for (io, idx) in self.digital_inputs.iter_mut().zip(resolved_inputs) {
            io.element = Some(idx);
        }
        for (io, idx) in self.outputs.iter_mut().zip(resolved_outputs) {
            io.element = Some(idx);
        }

        if let Some(dnp3) = &self.dnp3 {
            dnp3.validate_points(engine);
        }

        self.io_invalidated = false;
    }

    fn update_inputs(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        for io in &self.analog_inputs {
            let Some(idx) = io.element else { continue };
            // A failed conversion leaves the node's value unchanged.
            if let Some(value) = self.hal.read_analog(io.gpio) {
                engine.set_node_value(idx, Value::Analog(value));
            }
        }

        for io in &self.digital_inputs {
            let Some(idx) = io.element else { continue };
            let mut value = self.hal.read_digital(io.gpio);
            if io.invert {
                value = !value;
            }
            engine.set_node_value(idx, Value::Digital(value));
        }

        self.inputs_need_update = false;
    }

    fn update_outputs(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };

        for io in &self.outputs {
            let Some(idx) = io.element else { continue };
            let Some(value) = engine.output_values(idx).first().and_then(Value::as_digital)
            else {
                continue;
            };
            self.hal
                .write_digital(io.gpio, if io.invert { !value } else { value });
        }
    }

    /// Direct access to the HAL, primarily for simulation harnesses.
    pub fn hal_mut(&mut self) -> &mut dyn BoardHal {
        self.hal.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use crate::engine::{Arg, ElementDef, NetDef};
    use crate::hal::SimulatedHal;

    fn gate_engine() -> Engine {
        let mut engine = Engine::new("board test");
        engine
            .add_element(&ElementDef::new("IN0", ElementKind::NodeDigital))
            .unwrap();
        engine
            .add_element(&ElementDef::new("IN1", ElementKind::NodeDigital))
            .unwrap();
        engine
            .add_element(&ElementDef::new("AND0", ElementKind::And).with_args(vec![Arg::U(2)]))
            .unwrap();
        engine
            .add_element(&ElementDef::new("OUT0", ElementKind::NodeDigital))
            .unwrap();
        let mut n0 = NetDef::new("IN0", "output");
        n0.add_sink("AND0", "input_0");
        let mut n1 = NetDef::new("IN1", "output");
        n1.add_sink("AND0", "input_1");
        let mut n2 = NetDef::new("AND0", "output");
        n2.add_sink("OUT0", "input");
        engine.add_net(n0);
        engine.add_net(n1);
        engine.add_net(n2);
        engine
    }

    fn board() -> Board {
        let mut board = Board::new(
            BoardConfig::new("Test Board", "TB-100", 2, 1, 0),
            Box::new(SimulatedHal::new()),
        );
        board.add_input(0, "IN0", 0, 0, false);
        board.add_input(1, "IN1", 0, 1, false);
        board.add_output(0, "OUT0", 1, 0, false);
        board
    }

    fn sim(board: &mut Board) -> &mut SimulatedHal {
        board
            .hal_mut()
            .as_any_mut()
            .downcast_mut::<SimulatedHal>()
            .unwrap()
    }

    #[test]
    fn full_cycle_reads_and_writes_hal() {
        let mut board = board();
        board.attach_engine(gate_engine());
        board.start();

        sim(&mut board).set_digital(GpioPin::new(0, 0), true);
        sim(&mut board).set_digital(GpioPin::new(0, 1), true);
        board.flag_input_for_update();
        board.update(Timestamp::new(0, 0, 0, 0, 0, 50));

        assert!(sim(&mut board).digital(GpioPin::new(1, 0)));
    }

    #[test]
    fn inverted_input_flips_level() {
        let mut board = Board::new(
            BoardConfig::new("b", "pn", 1, 0, 0),
            Box::new(SimulatedHal::new()),
        );
        board.add_input(0, "IN0", 0, 0, true);

        let mut engine = Engine::new("e");
        engine
            .add_element(&ElementDef::new("IN0", ElementKind::NodeDigital))
            .unwrap();
        board.attach_engine(engine);
        board.start();

        // Pin low, inverted: the node reads true.
        board.flag_input_for_update();
        board.update(Timestamp::new(0, 0, 0, 0, 0, 50));
        assert_eq!(
            board.engine().unwrap().output_value("IN0", 0),
            Some(Value::Digital(true))
        );
    }

    #[test]
    fn unresolvable_binding_keeps_board_invalidated() {
        let mut board = board();
        let mut engine = Engine::new("e");
        engine
            .add_element(&ElementDef::new("IN0", ElementKind::NodeDigital))
            .unwrap();
        // IN1 and OUT0 missing.
        board.attach_engine(engine);
        board.start();

        board.update(Timestamp::new(0, 0, 0, 0, 0, 50));
        // No engine tick ran: the paused/invalid board performed no I/O.
        assert_eq!(
            board.engine().unwrap().output_value("IN0", 0),
            Some(Value::Digital(false))
        );
    }

    #[test]
    fn mistyped_binding_keeps_board_invalidated() {
        let mut board = Board::new(
            BoardConfig::new("b", "pn", 1, 0, 0),
            Box::new(SimulatedHal::new()),
        );
        board.add_input(0, "IN0", 0, 0, false);

        let mut engine = Engine::new("e");
        engine
            .add_element(&ElementDef::new("IN0", ElementKind::NodeAnalog))
            .unwrap();
        board.attach_engine(engine);
        board.start();
        board.update(Timestamp::new(0, 0, 0, 0, 0, 50));

        // The analog node was never ticked or written.
        assert_eq!(
            board.engine().unwrap().output_value("IN0", 0),
            Some(Value::Analog(0.0))
        );
    }

    #[test]
    fn paused_board_does_not_tick() {
        let mut board = board();
        board.attach_engine(gate_engine());
        // Never started.
        sim(&mut board).set_digital(GpioPin::new(0, 0), true);
        board.flag_input_for_update();
        board.update(Timestamp::new(0, 0, 0, 0, 0, 50));
        assert!(!sim(&mut board).digital(GpioPin::new(1, 0)));
    }

    #[test]
    fn info_page_lists_counts() {
        let board = board();
        let info = board.get_info();
        assert!(info.contains("Device Name: Test Board\r\n"));
        assert!(info.contains("Digital Inputs: 2\r\n"));
        assert!(info.contains("Digital Outputs: 1\r\n"));
    }
}
