//! CLI for relaylogic — validate, inspect, and simulate logic element
//! schemes.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "relaylogic")]
#[command(about = "relaylogic — logic element engine for protective relaying")]
#[command(version = relaylogic_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and report builder errors
    Check {
        /// Path to the JSON configuration
        config: String,
    },

    /// Load a configuration, tick it once, and print the status page
    Status {
        /// Path to the JSON configuration
        config: String,
    },

    /// Run a configuration against the simulated board
    Run {
        /// Path to the JSON configuration
        config: String,

        /// Tick rate in Hz
        #[arg(long, default_value = "60")]
        rate_hz: f64,

        /// How long to run, in seconds
        #[arg(long, default_value = "5")]
        duration_s: f64,

        /// Print the status page every N ticks (0 = only at the end)
        #[arg(long, default_value = "0")]
        status_every: u64,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Check { config } => commands::check::run(&config),
        Commands::Status { config } => commands::status::run(&config),
        Commands::Run {
            config,
            rate_hz,
            duration_s,
            status_every,
        } => commands::run::run(&config, rate_hz, duration_s, status_every),
    };
    std::process::exit(code);
}
