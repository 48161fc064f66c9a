// splice-cli/src/main.rs
//
// Entry point for the Splice command-line interface.
//
// Responsibilities:
// - Initializing logging (env_logger via RUST_LOG, default info).
// - Parsing command-line arguments (see cli.rs).
// - Dispatching to the subcommand implementations in commands/.
// - Mapping failures to a non-zero exit code.

use clap::Parser;
use std::process;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Merge(args) => commands::merge::run_merge(args),
        Commands::Probe(args) => commands::probe::run_probe(args),
    };

    if let Err(err) = result {
        log::error!("{err}");
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
