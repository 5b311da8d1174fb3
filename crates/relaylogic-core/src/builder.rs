//! Declarative builder: JSON document → engine (+ optional DNP3 config).
//!
//! The schema:
//!
//! ```text
//! { "name": str,
//!   "elements": [ { "name": str, "type": str, "args": [values…] } ],
//!   "nets":     [ { "output": { "name": str, "port": str },
//!                   "inputs": [ { "name": str, "port": str } ] } ],
//!   "ser":      [ { "name": str, "slot": int } ]?,
//!   "dnp3":     { "outstation": { … } }?
//! }
//! ```
//!
//! Failures are reported as a `(major, minor)` error pair with a formatted
//! message and up to 500 bytes of the offending JSON fragment. On any
//! failure the partially built engine is dropped; nothing half-constructed
//! escapes.

use std::fmt;
use std::path::Path;

use serde_json::Value as Json;

use crate::dnp3::{
    AnalogPoint, BinaryPoint, Dnp3Address, Dnp3OutstationConfig, Dnp3SessionConfig,
    EventAnalogOutputStatusVariation, EventAnalogVariation, EventBinaryOutputStatusVariation,
    EventBinaryVariation, PointClass, StaticAnalogOutputStatusVariation, StaticAnalogVariation,
    StaticBinaryOutputStatusVariation, StaticBinaryVariation,
};
use crate::element::ElementKind;
use crate::engine::{Arg, ElementDef, Engine, NetDef, DEFAULT_SER_NAME, MAX_ELEMENT_ARGS};
use crate::port::{clamp_str, ELEMENT_ARG_LENGTH};

/// Maximum bytes of offending JSON retained in an error.
const MAX_FRAGMENT_LENGTH: usize = 500;

/// Coarse failure site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MajorError {
    #[default]
    None,
    InvalidFile,
    InvalidJson,
    InvalidEngineName,
    InvalidComponents,
    InvalidNets,
    InvalidSer,
    InvalidDnp3,
}

impl MajorError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "No error",
            Self::InvalidFile => "Invalid file path or file cannot be opened",
            Self::InvalidJson => "Invalid JSON format",
            Self::InvalidEngineName => "Invalid engine name",
            Self::InvalidComponents => "Invalid or missing engine components",
            Self::InvalidNets => "Invalid or missing engine nets",
            Self::InvalidSer => "Invalid or missing SER configuration",
            Self::InvalidDnp3 => "Invalid or missing DNP3 configuration",
        }
    }
}

impl fmt::Display for MajorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fine-grained failure detail within a major site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinorError {
    #[default]
    None,
    InvalidComponentOutput,
    InvalidNets,
    InvalidSerPoint,
    InvalidDnp3Session,
    InvalidDnp3Point,
}

impl MinorError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "No error",
            Self::InvalidComponentOutput => "Invalid component",
            Self::InvalidNets => "Invalid net connection",
            Self::InvalidSerPoint => "Invalid SER point",
            Self::InvalidDnp3Session => "Invalid DNP3 session",
            Self::InvalidDnp3Point => "Invalid DNP3 point",
        }
    }
}

impl fmt::Display for MinorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A build failure: the error pair, a rendered message, and the offending
/// JSON fragment (truncated to 500 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError {
    major: MajorError,
    minor: MinorError,
    message: String,
    fragment: String,
}

impl BuildError {
    fn new(major: MajorError, minor: MinorError, fragment: &str) -> Self {
        Self {
            major,
            minor,
            message: format!("Major Error: {major}, Minor Error: {minor}"),
            fragment: clamp_str(fragment, MAX_FRAGMENT_LENGTH),
        }
    }

    fn at(major: MajorError, minor: MinorError, json: &Json) -> Self {
        Self::new(major, minor, &json.to_string())
    }

    pub fn major(&self) -> MajorError {
        self.major
    }

    pub fn minor(&self) -> MinorError {
        self.minor
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fragment.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (near: {})", self.message, self.fragment)
        }
    }
}

impl std::error::Error for BuildError {}

/// A successfully built configuration.
pub struct Loaded {
    pub engine: Engine,
    pub dnp3: Option<Dnp3OutstationConfig>,
}

impl fmt::Debug for Loaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loaded")
            .field("dnp3", &self.dnp3)
            .finish_non_exhaustive()
    }
}

/// Stateless configuration loader.
pub struct Builder;

impl Builder {
    /// Load a configuration from a file path.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Loaded, BuildError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|_| BuildError::new(MajorError::InvalidFile, MinorError::None, ""))?;
        Self::load_config(&text)
    }

    /// Load a configuration from a JSON string.
    pub fn load_config(json_text: &str) -> Result<Loaded, BuildError> {
        let json: Json = serde_json::from_str(json_text)
            .map_err(|_| BuildError::new(MajorError::InvalidJson, MinorError::None, json_text))?;

        let Some(name) = json.get("name").and_then(Json::as_str) else {
            return Err(BuildError::new(
                MajorError::InvalidEngineName,
                MinorError::None,
                json_text,
            ));
        };

        let mut engine = Engine::new(name);

        Self::parse_elements(&mut engine, json.get("elements"))?;
        Self::parse_nets(&mut engine, json.get("nets"))?;
        if let Some(ser) = json.get("ser") {
            Self::parse_ser(&mut engine, ser)?;
        }

        let dnp3 = match json.get("dnp3").and_then(|d| d.get("outstation")) {
            Some(outstation) => Some(Self::parse_outstation(outstation)?),
            None => None,
        };

        Ok(Loaded { engine, dnp3 })
    }

    fn parse_elements(engine: &mut Engine, field: Option<&Json>) -> Result<(), BuildError> {
        let Some(elements) = field.and_then(Json::as_array) else {
            return Err(BuildError::new(
                MajorError::InvalidComponents,
                MinorError::None,
                &field.map(Json::to_string).unwrap_or_default(),
            ));
        };

        for element in elements {
            let (Some(name), Some(type_str)) = (
                element.get("name").and_then(Json::as_str),
                element.get("type").and_then(Json::as_str),
            ) else {
                return Err(BuildError::at(
                    MajorError::InvalidComponents,
                    MinorError::InvalidComponentOutput,
                    element,
                ));
            };

            let kind = ElementKind::from_type_str(type_str);
            if kind == ElementKind::Invalid {
                return Err(BuildError::new(
                    MajorError::InvalidComponents,
                    MinorError::InvalidComponentOutput,
                    type_str,
                ));
            }

            let args = element
                .get("args")
                .map(Self::parse_args)
                .unwrap_or_default();

            let def = ElementDef::new(name, kind).with_args(args);
            if engine.add_element(&def).is_err() {
                return Err(BuildError::at(
                    MajorError::InvalidComponents,
                    MinorError::InvalidComponentOutput,
                    element,
                ));
            }
        }
        Ok(())
    }

    /// Map JSON argument values onto the at-most-five typed slots.
    /// Unrepresentable entries are skipped, as are entries past the limit.
    fn parse_args(field: &Json) -> Vec<Arg> {
        let Some(values) = field.as_array() else {
            return Vec::new();
        };
        let mut args = Vec::new();
        for value in values {
            if args.len() >= MAX_ELEMENT_ARGS {
                break;
            }
            let arg = if value.is_i64() || value.is_u64() {
                value.as_u64().map(|v| Arg::U(v as u16))
            } else if value.is_f64() {
                value.as_f64().map(|v| Arg::F(v as f32))
            } else if let Some(b) = value.as_bool() {
                Some(Arg::B(b))
            } else {
                value
                    .as_str()
                    .map(|s| Arg::S(clamp_str(s, ELEMENT_ARG_LENGTH)))
            };
            if let Some(arg) = arg {
                args.push(arg);
            }
        }
        args
    }

    fn parse_nets(engine: &mut Engine, field: Option<&Json>) -> Result<(), BuildError> {
        let Some(nets) = field.and_then(Json::as_array) else {
            return Err(BuildError::new(
                MajorError::InvalidNets,
                MinorError::None,
                &field.map(Json::to_string).unwrap_or_default(),
            ));
        };

        for net in nets {
            let Some(output) = net.get("output").filter(|o| o.is_object()) else {
                return Err(BuildError::at(MajorError::InvalidNets, MinorError::None, net));
            };
            let (source_name, source_port) = Self::parse_net_connection(output)?;

            let Some(inputs) = net.get("inputs").and_then(Json::as_array) else {
                return Err(BuildError::at(MajorError::InvalidNets, MinorError::None, net));
            };

            let mut def = NetDef::new(source_name, source_port);
            for input in inputs {
                let (name, port) = Self::parse_net_connection(input)?;
                def.add_sink(name, port);
            }
            engine.add_net(def);
        }
        Ok(())
    }

    fn parse_net_connection(json: &Json) -> Result<(String, String), BuildError> {
        let (Some(name), Some(port)) = (
            json.get("name").and_then(Json::as_str),
            json.get("port").and_then(Json::as_str),
        ) else {
            return Err(BuildError::at(
                MajorError::InvalidNets,
                MinorError::InvalidNets,
                json,
            ));
        };
        Ok((name.to_string(), port.to_string()))
    }

    /// The `ser` section synthesizes a single recorder element with one
    /// input per listed entry, wired to the named elements' outputs.
    fn parse_ser(engine: &mut Engine, field: &Json) -> Result<(), BuildError> {
        let Some(entries) = field.as_array() else {
            return Err(BuildError::at(MajorError::InvalidSer, MinorError::None, field));
        };

        let mut nets = Vec::new();
        for (slot, entry) in entries.iter().enumerate() {
            let (Some(name), Some(_slot)) = (
                entry.get("name").and_then(Json::as_str),
                entry.get("slot").and_then(Json::as_i64),
            ) else {
                return Err(BuildError::at(
                    MajorError::InvalidSer,
                    MinorError::InvalidSerPoint,
                    entry,
                ));
            };

            let mut net = NetDef::new(name, "output");
            net.add_sink(DEFAULT_SER_NAME, format!("input_{slot}"));
            nets.push(net);
        }

        let def = ElementDef::new(DEFAULT_SER_NAME, ElementKind::Ser)
            .with_args(vec![Arg::U(nets.len() as u16)]);
        if engine.add_element(&def).is_err() {
            return Err(BuildError::at(MajorError::InvalidSer, MinorError::None, field));
        }
        for net in nets {
            engine.add_net(net);
        }
        Ok(())
    }

    fn parse_outstation(field: &Json) -> Result<Dnp3OutstationConfig, BuildError> {
        if !field.is_object() {
            return Err(BuildError::at(MajorError::InvalidDnp3, MinorError::None, field));
        }

        let Some(name) = field.get("name").and_then(Json::as_str) else {
            return Err(BuildError::at(MajorError::InvalidDnp3, MinorError::None, field));
        };

        let mut config = Dnp3OutstationConfig {
            name: name.to_string(),
            ..Default::default()
        };
        config.outstation = Self::parse_address(field.get("address"))?;

        let Some(sessions) = field.get("sessions").and_then(Json::as_array) else {
            return Err(BuildError::at(
                MajorError::InvalidDnp3,
                MinorError::InvalidDnp3Session,
                field,
            ));
        };

        for session_field in sessions {
            let Some(session_name) = session_field.get("name").and_then(Json::as_str) else {
                return Err(BuildError::at(
                    MajorError::InvalidDnp3,
                    MinorError::InvalidDnp3Session,
                    session_field,
                ));
            };

            let mut session = Dnp3SessionConfig {
                name: session_name.to_string(),
                ..Default::default()
            };
            session.client = Self::parse_address(session_field.get("address"))?;
            Self::parse_points(&mut session, session_field.get("points"))?;
            config.add_session(session);
        }

        Ok(config)
    }

    fn parse_address(field: Option<&Json>) -> Result<Dnp3Address, BuildError> {
        let Some(json) = field.filter(|f| f.is_object()) else {
            return Err(BuildError::new(
                MajorError::InvalidDnp3,
                MinorError::None,
                &field.map(Json::to_string).unwrap_or_default(),
            ));
        };

        let (Some(ip), Some(dnp), Some(port)) = (
            json.get("ip").and_then(Json::as_str),
            json.get("dnp").and_then(Json::as_i64),
            json.get("port").and_then(Json::as_i64),
        ) else {
            return Err(BuildError::at(MajorError::InvalidDnp3, MinorError::None, json));
        };

        Ok(Dnp3Address {
            ip: ip.to_string(),
            dnp: dnp as u16,
            port: port as u16,
        })
    }

    fn parse_points(
        session: &mut Dnp3SessionConfig,
        field: Option<&Json>,
    ) -> Result<(), BuildError> {
        let Some(points) = field.filter(|f| f.is_object()) else {
            return Err(BuildError::new(
                MajorError::InvalidDnp3,
                MinorError::InvalidDnp3Point,
                &field.map(Json::to_string).unwrap_or_default(),
            ));
        };

        if let Some(list) = points.get("binary_inputs").and_then(Json::as_array) {
            for point in list {
                let (index, name, class, s_var, e_var) = Self::parse_point_fields(point)?;
                session.binary_inputs.push(BinaryPoint {
                    index,
                    element_name: name,
                    class,
                    static_variation: StaticBinaryVariation::from_str(&s_var),
                    event_variation: EventBinaryVariation::from_str(&e_var),
                });
            }
        }

        if let Some(list) = points.get("binary_outputs").and_then(Json::as_array) {
            for point in list {
                let (index, name, class, s_var, e_var) = Self::parse_point_fields(point)?;
                session.binary_outputs.push(BinaryPoint {
                    index,
                    element_name: name,
                    class,
                    static_variation: StaticBinaryOutputStatusVariation::from_str(&s_var),
                    event_variation: EventBinaryOutputStatusVariation::from_str(&e_var),
                });
            }
        }

        if let Some(list) = points.get("analog_inputs").and_then(Json::as_array) {
            for point in list {
                let (index, name, class, s_var, e_var) = Self::parse_point_fields(point)?;
                session.analog_inputs.push(AnalogPoint {
                    index,
                    element_name: name,
                    class,
                    deadband: 0.0,
                    static_variation: StaticAnalogVariation::from_str(&s_var),
                    event_variation: EventAnalogVariation::from_str(&e_var),
                });
            }
        }

        if let Some(list) = points.get("analog_outputs").and_then(Json::as_array) {
            for point in list {
                let (index, name, class, s_var, e_var) = Self::parse_point_fields(point)?;
                session.analog_outputs.push(AnalogPoint {
                    index,
                    element_name: name,
                    class,
                    deadband: 0.0,
                    static_variation: StaticAnalogOutputStatusVariation::from_str(&s_var),
                    event_variation: EventAnalogOutputStatusVariation::from_str(&e_var),
                });
            }
        }

        Ok(())
    }

    fn parse_point_fields(
        point: &Json,
    ) -> Result<(u16, String, PointClass, String, String), BuildError> {
        let (Some(index), Some(name), Some(class), Some(s_var), Some(e_var)) = (
            point.get("index").and_then(Json::as_i64),
            point.get("name").and_then(Json::as_str),
            point.get("class").and_then(Json::as_str),
            point.get("sVar").and_then(Json::as_str),
            point.get("eVar").and_then(Json::as_str),
        ) else {
            return Err(BuildError::at(
                MajorError::InvalidDnp3,
                MinorError::InvalidDnp3Point,
                point,
            ));
        };

        Ok((
            index as u16,
            name.to_string(),
            PointClass::from_str(class),
            s_var.to_string(),
            e_var.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::Value;
    use crate::time::Timestamp;
    use std::io::Write;

    const GATE_CONFIG: &str = r#"{
        "name": "Test Engine",
        "elements": [
            { "name": "IN0", "type": "NODE_DIGITAL", "args": [] },
            { "name": "IN1", "type": "NODE_DIGITAL", "args": [] },
            { "name": "OR0", "type": "OR", "args": [2] },
            { "name": "AND0", "type": "AND", "args": [2] },
            { "name": "OUT0", "type": "NODE_DIGITAL", "args": [] },
            { "name": "OUT1", "type": "NODE_DIGITAL", "args": [] }
        ],
        "nets": [
            { "output": { "name": "IN0", "port": "output" },
              "inputs": [ { "name": "OR0", "port": "input_0" },
                          { "name": "AND0", "port": "input_0" } ] },
            { "output": { "name": "IN1", "port": "output" },
              "inputs": [ { "name": "OR0", "port": "input_1" },
                          { "name": "AND0", "port": "input_1" } ] },
            { "output": { "name": "OR0", "port": "output" },
              "inputs": [ { "name": "OUT0", "port": "input" } ] },
            { "output": { "name": "AND0", "port": "output" },
              "inputs": [ { "name": "OUT1", "port": "input" } ] }
        ]
    }"#;

    #[test]
    fn round_trip_builds_running_engine() {
        let loaded = Builder::load_config(GATE_CONFIG).unwrap();
        let mut engine = loaded.engine;
        assert_eq!(engine.name(), "Test Engine");
        assert_eq!(engine.element_count(), 6);
        assert!(loaded.dnp3.is_none());

        let in0 = engine.element_index("IN0").unwrap();
        engine.set_node_value(in0, Value::Digital(true));
        engine.update(Timestamp::new(0, 0, 0, 0, 0, 50));
        assert_eq!(
            engine.output_value("OUT0", 0),
            Some(Value::Digital(true))
        );

        // Status text enumerates each element.
        let info = engine.get_info(8192);
        for name in ["IN0", "IN1", "OR0", "AND0", "OUT0", "OUT1"] {
            assert!(info.contains(name), "missing {name} in status");
        }
    }

    #[test]
    fn invalid_json_reports_major_error() {
        let err = Builder::load_config("{ not json").unwrap_err();
        assert_eq!(err.major(), MajorError::InvalidJson);
        assert_eq!(err.minor(), MinorError::None);
    }

    #[test]
    fn missing_name_reports_engine_name_error() {
        let err = Builder::load_config(r#"{ "elements": [], "nets": [] }"#).unwrap_err();
        assert_eq!(err.major(), MajorError::InvalidEngineName);
        assert!(err.message().contains("Invalid engine name"));
    }

    #[test]
    fn missing_type_reports_component_error() {
        let err = Builder::load_config(
            r#"{ "name": "e", "elements": [ { "name": "A" } ], "nets": [] }"#,
        )
        .unwrap_err();
        assert_eq!(err.major(), MajorError::InvalidComponents);
        assert_eq!(err.minor(), MinorError::InvalidComponentOutput);
    }

    #[test]
    fn unknown_type_reports_component_error() {
        let err = Builder::load_config(
            r#"{ "name": "e", "elements": [ { "name": "A", "type": "WIDGET" } ], "nets": [] }"#,
        )
        .unwrap_err();
        assert_eq!(err.major(), MajorError::InvalidComponents);
        assert_eq!(err.minor(), MinorError::InvalidComponentOutput);
        assert_eq!(err.fragment(), "WIDGET");
    }

    #[test]
    fn elements_not_array_reports_component_error() {
        let err = Builder::load_config(r#"{ "name": "e", "elements": 5, "nets": [] }"#)
            .unwrap_err();
        assert_eq!(err.major(), MajorError::InvalidComponents);
    }

    #[test]
    fn net_missing_port_reports_net_error() {
        let err = Builder::load_config(
            r#"{ "name": "e", "elements": [],
                 "nets": [ { "output": { "name": "A" }, "inputs": [] } ] }"#,
        )
        .unwrap_err();
        assert_eq!(err.major(), MajorError::InvalidNets);
        assert_eq!(err.minor(), MinorError::InvalidNets);
    }

    #[test]
    fn nets_not_array_reports_net_error() {
        let err =
            Builder::load_config(r#"{ "name": "e", "elements": [], "nets": {} }"#).unwrap_err();
        assert_eq!(err.major(), MajorError::InvalidNets);
        assert_eq!(err.minor(), MinorError::None);
    }

    #[test]
    fn ser_section_synthesizes_recorder() {
        let loaded = Builder::load_config(
            r#"{ "name": "e",
                 "elements": [ { "name": "TRIP", "type": "NODE_DIGITAL" } ],
                 "nets": [],
                 "ser": [ { "name": "TRIP", "slot": 0 } ] }"#,
        )
        .unwrap();
        let mut engine = loaded.engine;
        let ser = engine.element_index(DEFAULT_SER_NAME).unwrap();
        assert_eq!(engine.element_kind(ser), ElementKind::Ser);

        // The synthesized net wires TRIP.output into the recorder.
        let trip = engine.element_index("TRIP").unwrap();
        engine.set_node_value(trip, Value::Digital(true));
        engine.update(Timestamp::new(0, 0, 0, 0, 0, 50));
        let recorder = engine
            .element(ser)
            .as_any()
            .downcast_ref::<crate::elements::Ser>()
            .unwrap();
        assert_eq!(recorder.event_count(), 1);
    }

    #[test]
    fn bad_ser_entry_reports_ser_error() {
        let err = Builder::load_config(
            r#"{ "name": "e", "elements": [], "nets": [],
                 "ser": [ { "name": "TRIP" } ] }"#,
        )
        .unwrap_err();
        assert_eq!(err.major(), MajorError::InvalidSer);
        assert_eq!(err.minor(), MinorError::InvalidSerPoint);
    }

    #[test]
    fn dnp3_outstation_parses() {
        let loaded = Builder::load_config(
            r#"{ "name": "e", "elements": [], "nets": [],
                 "dnp3": { "outstation": {
                     "name": "OS1",
                     "address": { "ip": "0.0.0.0", "dnp": 10, "port": 20000 },
                     "sessions": [ {
                         "name": "master",
                         "address": { "ip": "192.168.1.10", "dnp": 1, "port": 20000 },
                         "points": {
                             "binary_inputs": [
                                 { "index": 0, "name": "TRIP", "class": "Class1",
                                   "sVar": "Group1Var2", "eVar": "Group2Var2" } ],
                             "analog_inputs": [
                                 { "index": 0, "name": "IA", "class": "Class2",
                                   "sVar": "Group30Var5", "eVar": "Group32Var7" } ]
                         } } ] } } }"#,
        )
        .unwrap();

        let dnp3 = loaded.dnp3.expect("outstation config");
        assert_eq!(dnp3.name, "OS1");
        assert_eq!(dnp3.outstation.port, 20000);
        assert_eq!(dnp3.sessions.len(), 1);
        let session = &dnp3.sessions[0];
        assert_eq!(session.binary_inputs.len(), 1);
        assert_eq!(
            session.binary_inputs[0].static_variation,
            StaticBinaryVariation::Group1Var2
        );
        assert_eq!(
            session.analog_inputs[0].event_variation,
            EventAnalogVariation::Group32Var7
        );
    }

    #[test]
    fn dnp3_missing_point_field_reports_point_error() {
        let err = Builder::load_config(
            r#"{ "name": "e", "elements": [], "nets": [],
                 "dnp3": { "outstation": {
                     "name": "OS1",
                     "address": { "ip": "0.0.0.0", "dnp": 10, "port": 20000 },
                     "sessions": [ {
                         "name": "master",
                         "address": { "ip": "1.1.1.1", "dnp": 1, "port": 20000 },
                         "points": { "binary_inputs": [ { "index": 0 } ] } } ] } } }"#,
        )
        .unwrap_err();
        assert_eq!(err.major(), MajorError::InvalidDnp3);
        assert_eq!(err.minor(), MinorError::InvalidDnp3Point);
    }

    #[test]
    fn fragment_truncated_to_limit() {
        let long_name = "x".repeat(2000);
        let err = Builder::load_config(&format!("{{ \"bogus\": \"{long_name}\""))
            .unwrap_err();
        assert!(err.fragment().len() <= MAX_FRAGMENT_LENGTH);
    }

    #[test]
    fn load_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GATE_CONFIG.as_bytes()).unwrap();
        let loaded = Builder::load_file(file.path()).unwrap();
        assert_eq!(loaded.engine.element_count(), 6);
    }

    #[test]
    fn load_file_missing_reports_file_error() {
        let err = Builder::load_file("/definitely/not/here.json").unwrap_err();
        assert_eq!(err.major(), MajorError::InvalidFile);
    }

    #[test]
    fn string_args_are_clamped() {
        let long = "y".repeat(ELEMENT_ARG_LENGTH + 40);
        let args = Builder::parse_args(&serde_json::json!([long]));
        match &args[0] {
            Arg::S(s) => assert_eq!(s.len(), ELEMENT_ARG_LENGTH),
            other => panic!("expected string arg, got {other:?}"),
        }
    }
}
