//! Command-line entry point for batch tree sampling.
//!
//! Parses arguments with clap and delegates the work to the [`harness`]
//! module.

mod harness;

use clap::Parser;

use harness::Command;

/// Runs the selected subcommand.
///
/// Logging goes through `env_logger` (`RUST_LOG`, default `info`). Errors are
/// logged and turned into a non-zero exit code.
fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let command = Command::parse();
    match harness::run(command) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            std::process::ExitCode::FAILURE
        }
    }
}
