//! Shallowize - shrink local git checkouts
//!
//! Walks a source tree, finds every git checkout in it and swaps each
//! checkout's full history for a depth-1 clone of its upstream, printing a
//! report of sizes before and after.

mod cli;
mod commands;

use std::env;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use cli::{Cli, OutputFormat};
use shallowize_core::error::{ExitCode as ShallowizeExitCode, ShallowizeError};
use shallowize_core::logging;

fn main() -> ExitCode {
    let start = Instant::now();

    let argv_format_json = format_is_json(env::args().skip(1));

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap may fail before `Cli.format` exists; json is the default format
            if argv_format_json {
                let error = match err.kind() {
                    clap::error::ErrorKind::DisplayHelp
                    | clap::error::ErrorKind::DisplayVersion
                    | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                        err.exit()
                    }
                    clap::error::ErrorKind::ValueValidation
                    | clap::error::ErrorKind::InvalidValue
                    | clap::error::ErrorKind::InvalidSubcommand
                    | clap::error::ErrorKind::UnknownArgument
                    | clap::error::ErrorKind::ArgumentConflict
                    | clap::error::ErrorKind::MissingRequiredArgument
                    | clap::error::ErrorKind::MissingSubcommand
                    | clap::error::ErrorKind::NoEquals
                    | clap::error::ErrorKind::TooManyValues
                    | clap::error::ErrorKind::TooFewValues
                    | clap::error::ErrorKind::WrongNumberOfValues
                    | clap::error::ErrorKind::InvalidUtf8 => {
                        ShallowizeError::UsageError(err.to_string())
                    }
                    _ => ShallowizeError::Other(err.to_string()),
                };

                eprintln!("{}", error.to_json());
                return ExitCode::from(error.exit_code() as u8);
            }

            err.exit();
        }
    };

    // Initialize structured logging
    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::debug!(elapsed = ?start.elapsed(), "parse_args");

    match commands::dispatch::run(&cli, start) {
        Ok(()) => ExitCode::from(ShallowizeExitCode::Success as u8),
        Err(e) => {
            let exit_code = e.exit_code();

            if cli.format == OutputFormat::Json {
                eprintln!("{}", e.to_json());
            } else if !cli.quiet {
                eprintln!("error: {}", e);
            }

            ExitCode::from(exit_code as u8)
        }
    }
}

/// Whether the arguments select JSON output, explicitly or by default
fn format_is_json<I: IntoIterator<Item = String>>(args: I) -> bool {
    let mut json = true;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--format" {
            if let Some(value) = args.next() {
                json = value == "json";
            }
        } else if let Some(value) = arg.strip_prefix("--format=") {
            json = value == "json";
        }
    }
    json
}
