//! DNP3 outstation configuration model.
//!
//! Only the configuration side lives in the core: addresses, sessions, and
//! point tables mapping DNP3 indices onto engine element names. The
//! protocol stack consuming this model is an external collaborator.

use std::fmt;

use log::warn;

use crate::element::ElementKind;
use crate::engine::Engine;

/// DNP3 point class assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClass {
    Class0,
    Class1,
    Class2,
    Class3,
}

impl PointClass {
    /// Parse the configuration string, defaulting to `Class1`.
    pub fn from_str(s: &str) -> Self {
        match s {
            "Class0" => Self::Class0,
            "Class1" => Self::Class1,
            "Class2" => Self::Class2,
            "Class3" => Self::Class3,
            _ => Self::Class1,
        }
    }
}

macro_rules! variation_enum {
    ($(#[$doc:meta])* $name:ident { $($variant:ident),* $(,)? } default $default:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub enum $name {
            #[default]
            $default,
            $($variant,)*
        }

        impl $name {
            /// Parse the configuration string, falling back to the default
            /// variation.
            pub fn from_str(s: &str) -> Self {
                match s {
                    $(stringify!($variant) => Self::$variant,)*
                    _ => Self::$default,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    Self::$default => write!(f, stringify!($default)),
                    $(Self::$variant => write!(f, stringify!($variant)),)*
                }
            }
        }
    };
}

variation_enum! {
    /// Static binary input variations (group 1).
    StaticBinaryVariation { Group1Var2 } default Group1Var1
}

variation_enum! {
    /// Binary input event variations (group 2).
    EventBinaryVariation { Group2Var2, Group2Var3 } default Group2Var1
}

variation_enum! {
    /// Static binary output status variations (group 10).
    StaticBinaryOutputStatusVariation { } default Group10Var2
}

variation_enum! {
    /// Binary output status event variations (group 11).
    EventBinaryOutputStatusVariation { Group11Var2 } default Group11Var1
}

variation_enum! {
    /// Static analog input variations (group 30).
    StaticAnalogVariation {
        Group30Var2, Group30Var3, Group30Var4, Group30Var5, Group30Var6,
    } default Group30Var1
}

variation_enum! {
    /// Analog input event variations (group 32).
    EventAnalogVariation {
        Group32Var2, Group32Var3, Group32Var4, Group32Var5, Group32Var6,
        Group32Var7, Group32Var8,
    } default Group32Var1
}

variation_enum! {
    /// Static analog output status variations (group 40).
    StaticAnalogOutputStatusVariation {
        Group40Var2, Group40Var3, Group40Var4,
    } default Group40Var1
}

variation_enum! {
    /// Analog output status event variations (group 42).
    EventAnalogOutputStatusVariation {
        Group42Var2, Group42Var3, Group42Var4, Group42Var5, Group42Var6,
        Group42Var7, Group42Var8,
    } default Group42Var1
}

/// A DNP3 endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dnp3Address {
    pub ip: String,
    pub dnp: u16,
    pub port: u16,
}

/// A binary point bound to a digital node.
#[derive(Debug, Clone)]
pub struct BinaryPoint<S, E> {
    pub index: u16,
    pub element_name: String,
    pub class: PointClass,
    pub static_variation: S,
    pub event_variation: E,
}

/// An analog point bound to an analog node, with a dead-band.
#[derive(Debug, Clone)]
pub struct AnalogPoint<S, E> {
    pub index: u16,
    pub element_name: String,
    pub class: PointClass,
    pub deadband: f32,
    pub static_variation: S,
    pub event_variation: E,
}

/// One master session served by the outstation.
#[derive(Debug, Clone, Default)]
pub struct Dnp3SessionConfig {
    pub name: String,
    pub client: Dnp3Address,
    pub binary_inputs: Vec<BinaryPoint<StaticBinaryVariation, EventBinaryVariation>>,
    pub binary_outputs:
        Vec<BinaryPoint<StaticBinaryOutputStatusVariation, EventBinaryOutputStatusVariation>>,
    pub analog_inputs: Vec<AnalogPoint<StaticAnalogVariation, EventAnalogVariation>>,
    pub analog_outputs:
        Vec<AnalogPoint<StaticAnalogOutputStatusVariation, EventAnalogOutputStatusVariation>>,
}

/// Outstation configuration: its own address plus per-master sessions.
#[derive(Debug, Clone, Default)]
pub struct Dnp3OutstationConfig {
    pub name: String,
    pub outstation: Dnp3Address,
    pub sessions: Vec<Dnp3SessionConfig>,
}

impl Dnp3OutstationConfig {
    pub fn add_session(&mut self, session: Dnp3SessionConfig) {
        self.sessions.push(session);
    }

    /// Check every point against the engine: the referenced element must
    /// exist and carry the matching node kind. Unresolvable points are
    /// logged and counted, not fatal.
    pub fn validate_points(&self, engine: &Engine) -> usize {
        let mut bad = 0;

        let mut check = |name: &str, expected: ElementKind| {
            match engine.element_index(name) {
                Some(idx) if engine.element_kind(idx) == expected => {}
                Some(_) => {
                    warn!("dnp3 point '{name}' is not a {expected} element");
                    bad += 1;
                }
                None => {
                    warn!("dnp3 point '{name}' does not exist in the engine");
                    bad += 1;
                }
            }
        };

        for session in &self.sessions {
            for p in &session.binary_inputs {
                check(&p.element_name, ElementKind::NodeDigital);
            }
            for p in &session.binary_outputs {
                check(&p.element_name, ElementKind::NodeDigital);
            }
            for p in &session.analog_inputs {
                check(&p.element_name, ElementKind::NodeAnalog);
            }
            for p in &session.analog_outputs {
                check(&p.element_name, ElementKind::NodeAnalog);
            }
        }
        bad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ElementDef;

    #[test]
    fn variation_strings_round_trip() {
        assert_eq!(
            StaticBinaryVariation::from_str("Group1Var2"),
            StaticBinaryVariation::Group1Var2
        );
        assert_eq!(
            EventAnalogVariation::from_str("Group32Var7"),
            EventAnalogVariation::Group32Var7
        );
        assert_eq!(EventAnalogVariation::Group32Var7.to_string(), "Group32Var7");
    }

    #[test]
    fn unknown_variation_falls_back_to_default() {
        assert_eq!(
            StaticAnalogVariation::from_str("Group99Var9"),
            StaticAnalogVariation::Group30Var1
        );
        assert_eq!(PointClass::from_str("ClassX"), PointClass::Class1);
    }

    #[test]
    fn validate_points_flags_missing_and_mistyped() {
        let mut engine = Engine::new("e");
        engine
            .add_element(&ElementDef::new("DIG", crate::element::ElementKind::NodeDigital))
            .unwrap();
        engine
            .add_element(&ElementDef::new("ANA", crate::element::ElementKind::NodeAnalog))
            .unwrap();

        let mut config = Dnp3OutstationConfig::default();
        let mut session = Dnp3SessionConfig::default();
        session.binary_inputs.push(BinaryPoint {
            index: 0,
            element_name: "DIG".into(),
            class: PointClass::Class1,
            static_variation: StaticBinaryVariation::default(),
            event_variation: EventBinaryVariation::default(),
        });
        session.binary_inputs.push(BinaryPoint {
            index: 1,
            element_name: "ANA".into(), // wrong kind
            class: PointClass::Class1,
            static_variation: StaticBinaryVariation::default(),
            event_variation: EventBinaryVariation::default(),
        });
        session.analog_inputs.push(AnalogPoint {
            index: 0,
            element_name: "GHOST".into(), // missing
            class: PointClass::Class2,
            deadband: 0.0,
            static_variation: StaticAnalogVariation::default(),
            event_variation: EventAnalogVariation::default(),
        });
        config.add_session(session);

        assert_eq!(config.validate_points(&engine), 2);
    }
}
