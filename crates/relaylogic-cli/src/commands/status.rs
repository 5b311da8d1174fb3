//! `relaylogic status` — one tick, then the status page.

use relaylogic_core::{Builder, Timestamp};

const STATUS_CAP: usize = 8192;

pub fn run(config: &str) -> i32 {
    let mut loaded = match Builder::load_file(config) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };

    loaded.engine.update(Timestamp::now());
    print!("{}", loaded.engine.get_info(STATUS_CAP));
    0
}
