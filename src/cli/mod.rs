//! CLI module for txstate
//!
//! Offline tooling for a durable state store:
//! - inspect: print the latest value of every key
//! - verify: check every record checksum

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, StoreLocation};
pub use commands::{inspect, resolve_data_dir, run_command, verify};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_json, write_response};

/// Parse arguments and run the selected command against stdout
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match run_command(cli.command, &mut out) {
        Ok(()) => Ok(()),
        Err(e) => {
            // Report on stdout too, so piped consumers see the failure.
            let _ = write_error(&mut out, e.code_str(), e.message());
            Err(e)
        }
    }
}
