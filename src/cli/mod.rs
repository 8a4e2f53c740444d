// CLI module
// Command-line interface, argument parsing and logging setup

mod args;
mod commands;

pub use args::{
    CliArgs, Command, CustomerCommand, ImportArgs, StrategyType, TxAddArgs, TxCommand,
    TxUpdateArgs,
};
pub use commands::run;

use clap::Parser;
use std::env as std_env;
use tracing_subscriber::EnvFilter;

/// Parse command-line arguments using clap
///
/// If parsing fails (invalid arguments, missing subcommand, or --help), clap
/// displays an error message or help text and exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Install the global tracing subscriber, writing to stderr
///
/// `RUST_LOG` wins when it is set and non-empty; otherwise `default_level` is
/// used as the filter directive. Calling this twice is harmless.
pub fn init_logging(default_level: &str) {
    let filter_directive = std_env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_level.to_string());

    let filter = EnvFilter::try_new(&filter_directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
