//! `relaylogic run` — drive a configuration on the simulated board.

use std::time::Duration;

use log::info;
use relaylogic_core::{Board, BoardConfig, Builder, SimulatedHal, Timestamp};

const STATUS_CAP: usize = 8192;

pub fn run(config: &str, rate_hz: f64, duration_s: f64, status_every: u64) -> i32 {
    let loaded = match Builder::load_file(config) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };

    if rate_hz <= 0.0 {
        eprintln!("error: tick rate must be positive");
        return 1;
    }

    let mut board = Board::new(
        BoardConfig::new("relaylogic-sim", "SIM-0", 0, 0, 0),
        Box::new(SimulatedHal::new()),
    );
    let engine_name = loaded.engine.name().to_string();
    board.attach_engine(loaded.engine);
    if let Some(dnp3) = loaded.dnp3 {
        board.attach_dnp3(dnp3);
    }
    board.start();

    let period = Duration::from_secs_f64(1.0 / rate_hz);
    let total_ticks = (duration_s * rate_hz).ceil() as u64;
    info!("running '{engine_name}' for {total_ticks} ticks at {rate_hz} Hz");

    let mut now = Timestamp::now();
    let subseconds_per_tick = (relaylogic_core::SUBSECOND_FRACTION as f64 / rate_hz) as u32;
    for tick in 0..total_ticks {
        board.update(now);
        now.update(subseconds_per_tick);

        if status_every > 0 && tick % status_every == 0 {
            if let Some(engine) = board.engine() {
                print!("{}", engine.get_info(STATUS_CAP));
            }
        }
        std::thread::sleep(period);
    }

    if let Some(engine) = board.engine() {
        print!("{}", engine.get_info(STATUS_CAP));
    }
    0
}
