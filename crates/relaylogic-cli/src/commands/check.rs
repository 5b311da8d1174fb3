//! `relaylogic check` — validate a configuration file.

use relaylogic_core::Builder;

pub fn run(config: &str) -> i32 {
    match Builder::load_file(config) {
        Ok(loaded) => {
            println!(
                "OK: engine '{}' with {} elements",
                loaded.engine.name(),
                loaded.engine.element_count()
            );
            if let Some(dnp3) = &loaded.dnp3 {
                let points: usize = dnp3
                    .sessions
                    .iter()
                    .map(|s| {
                        s.binary_inputs.len()
                            + s.binary_outputs.len()
                            + s.analog_inputs.len()
                            + s.analog_outputs.len()
                    })
                    .sum();
                println!(
                    "DNP3 outstation '{}': {} session(s), {} point(s)",
                    dnp3.name,
                    dnp3.sessions.len(),
                    points
                );
                let unresolved = dnp3.validate_points(&loaded.engine);
                if unresolved > 0 {
                    println!("warning: {unresolved} DNP3 point(s) do not resolve");
                }
            }
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}
