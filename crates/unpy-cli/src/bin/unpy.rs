#![allow(clippy::print_stderr)]

use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;

use unpy_cli::args::CliArgs;
use unpy_cli::driver;

fn main() -> ExitCode {
    // Initialize tracing if UNPY_LOG or RUST_LOG is set.
    // Supports UNPY_LOG_FORMAT=tree|json|text.
    unpy::tracing_config::init_tracing();

    // Usage errors exit with 1 like every other failure; --help/--version with 0.
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();

    match driver::run(&args, color) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
