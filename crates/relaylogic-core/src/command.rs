//! Read/override command surface over a board.
//!
//! These are the core-side handlers behind the textual protocol and DNP3
//! control operations: status rendering, targeted output reads, node
//! pulses, and SER log rendering. Transport, framing, and repetition
//! pacing live in the external command handler.

use crate::board::Board;
use crate::element::ElementKind;
use crate::elements::Ser;
use crate::engine::DEFAULT_SER_NAME;
use crate::port::Value;

/// Status-page size used by the `STATUS` command.
pub const STATUS_CAP: usize = 8192;

/// Render the engine status page, or an explanatory line when no engine is
/// attached.
pub fn status(board: &Board) -> String {
    match board.engine() {
        Some(engine) => engine.get_info(STATUS_CAP),
        None => "Could not get engine status, no engine is currently attached.\r\n".to_string(),
    }
}

/// Board identity page.
pub fn id(board: &Board) -> String {
    board.get_info()
}

/// Read one output port of a named element, formatted as a target line.
pub fn target(board: &Board, element: &str, output_slot: usize) -> String {
    let Some(engine) = board.engine() else {
        return "Engine not attached\r\n".to_string();
    };
    let Some(idx) = engine.element_index(element) else {
        return format!("Could not find element: {element}\r\n");
    };

    match engine.output_values(idx).get(output_slot) {
        Some(value) => format!("{element}\t= {value}\r\n"),
        None => format!("Output port {output_slot} is out of range for element {element}\r\n"),
    }
}

/// Queue a bounded override on a digital or analog node. The value is
/// interpreted per node kind: a digital node is pulsed high when
/// `value > 0.5`.
pub fn pulse(board: &mut Board, element: &str, value: f32, duration: f32) -> String {
    let Some(engine) = board.engine_mut() else {
        return "Engine not attached\r\n".to_string();
    };
    let Some(idx) = engine.element_index(element) else {
        return format!("Could not find element: {element}\r\n");
    };

    let queued = match engine.element_kind(idx) {
        ElementKind::NodeDigital => {
            engine.override_value(element, Value::Digital(value > 0.5), duration)
        }
        ElementKind::NodeAnalog => engine.override_value(element, Value::Analog(value), duration),
        _ => {
            return format!(
                "Element {element} is not of type: NODE_DIGITAL or NODE_ANALOG\r\n"
            );
        }
    };

    debug_assert!(queued);
    "Pulse command executed\r\n".to_string()
}

/// Render the SER ring buffer, oldest first.
pub fn ser_log(board: &Board, n_events: usize) -> String {
    let Some(engine) = board.engine() else {
        return "Engine not attached\r\n".to_string();
    };
    let Some(idx) = engine.element_index(DEFAULT_SER_NAME) else {
        return "No SER active\r\n".to_string();
    };
    let Some(recorder) = engine.element(idx).as_any().downcast_ref::<Ser>() else {
        return "No SER active\r\n".to_string();
    };

    let events = recorder.event_log(n_events);
    if events.is_empty() {
        return "No SER records\r\n".to_string();
    }

    let mut out = format!(
        "Sequential Event Recorder Records ({} Records):\r\n",
        events.len()
    );
    for event in events {
        let source = event
            .source
            .map(|e| engine.element_name(e).to_string())
            .unwrap_or_else(|| "?".to_string());
        out.push_str(&format!(
            "{}\t{}\t{}\r\n",
            event.time.print_short(),
            source,
            event.edge
        ));
    }
    out
}
