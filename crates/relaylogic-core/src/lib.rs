//! # relaylogic-core
//!
//! **A real-time logic element engine for protective relaying and
//! industrial control.**
//!
//! `relaylogic-core` builds a directed dataflow graph of strongly typed
//! computational elements from a JSON description, executes it on a fixed
//! cadence, and exposes the running state to industrial interfaces.
//!
//! ## Quick start
//!
//! ```no_run
//! use relaylogic_core::{Builder, Timestamp, Value};
//!
//! let config = std::fs::read_to_string("scheme.json").unwrap();
//! let mut loaded = Builder::load_config(&config).unwrap();
//!
//! let in0 = loaded.engine.element_index("IN0").unwrap();
//! loaded.engine.set_node_value(in0, Value::Digital(true));
//! loaded.engine.update(Timestamp::now());
//!
//! println!("{}", loaded.engine.get_info(8192));
//! ```
//!
//! ## Architecture
//!
//! JSON → Builder → Engine (elements + nets) → per-tick Update → Board I/O
//!
//! - Every element implements the [`Element`] trait; the [`Engine`] owns
//!   the elements and the bank of output-port values, and evaluates the
//!   graph in dependency order each tick. Cyclic nets are legal; back-edges
//!   read the previous tick's value.
//! - Ports are runtime-typed over three scalar kinds (bool, f32, complex),
//!   so one element may mix kinds and a graph can be wired from names at
//!   load time with type-checked connections.
//! - [`Timestamp`] is a fixed-point epoch clock with nanosecond sub-second
//!   resolution; [`IrigbDecoder`] aligns it from a pulse-width IRIG-B
//!   stream and reports the drift.
//! - The [`Board`] façade binds named node elements to GPIO through the
//!   [`BoardHal`] trait and runs the inputs → engine → outputs cycle.

pub mod board;
pub mod builder;
pub mod command;
pub mod dnp3;
pub mod element;
pub mod elements;
pub mod engine;
pub mod expr;
pub mod hal;
pub mod irigb;
pub mod port;
pub mod time;

pub use board::{Board, BoardConfig};
pub use builder::{BuildError, Builder, Loaded, MajorError, MinorError};
pub use dnp3::Dnp3OutstationConfig;
pub use element::{Element, ElementKind, Exec};
pub use engine::{Arg, ElementDef, Engine, EngineError, NetDef, DEFAULT_SER_NAME};
pub use hal::{BoardHal, GpioPin, SimulatedHal};
pub use irigb::IrigbDecoder;
pub use port::{OutputRef, PortKind, Value};
pub use time::{Timestamp, SUBSECOND_FRACTION};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
