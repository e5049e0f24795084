mod cli;
mod dispatch;
mod logging;
mod output;
mod stdout_io;

use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use nestegg_client::ClientError;
use stdout_io::write_stdout_text;

const ROOT_HELP: &str = "Nestegg - local net worth and cash flow ledger

Usage:
  nestegg <command>

Start here:
  nestegg import --help
  nestegg summary
";

const TOP_LEVEL_HELP: &str = "Nestegg — local net worth and cash flow ledger

USAGE: nestegg <command>

Bring your data in:
  nestegg import --help                     Read what files are understood and how rows merge
  nestegg import <path>                     Import a CSV, spreadsheet or PDF export

See where you stand:
  nestegg summary                           Net worth, totals by class, passive income
  nestegg cashflow [--month YYYY-MM]        Income and expenses, recurring entries included
  nestegg snapshot [--month YYYY-MM]        Record this month's totals for the history
  nestegg snapshot --clear                  Forget every recorded month

Keep your data safe:
  nestegg export [--format csv|json]        Print the ledger to stdout
  nestegg restore <backup.json>             Replace the ledger with a JSON backup

Preferences:
  nestegg settings                          Show base currency and tax rate
  nestegg settings --currency USD --tax-rate 25

Data lives in ~/.nestegg (override with NESTEGG_HOME).
Set NESTEGG_LOG=debug to see what the importer decides for each file.
";

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn run() -> Result<ExitCode, ExitCode> {
    logging::init();

    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }
    let parsed = cli::Cli::try_parse();
    let cli = match parsed {
        Ok(value) => value,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                let text = if is_top_level_help_request(&raw_args) {
                    TOP_LEVEL_HELP.to_string()
                } else {
                    err.to_string()
                };
                if write_stdout_text(&text).is_err() {
                    return Err(ExitCode::from(2));
                }
                return Ok(ExitCode::SUCCESS);
            }
            let command_hint = if matches!(
                err.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::InvalidValue
                    | ErrorKind::ValueValidation
                    | ErrorKind::WrongNumberOfValues
                    | ErrorKind::UnknownArgument
                    | ErrorKind::InvalidSubcommand
            ) {
                command_from_args(&raw_args)
            } else {
                None
            };
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error =
                ClientError::invalid_argument_for_command(&clean_message, command_hint.as_deref());
            let mode = infer_requested_output_mode(&raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            return Err(ExitCode::from(1));
        }
    };
    let mode = output::mode_for_command(&cli.command);

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Drops clap's trailing Usage line and "For more information" hint; the
/// rendered error carries its own next steps.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// First non-flag argument, when it names a known command.
fn command_from_args(raw_args: &[String]) -> Option<String> {
    raw_args
        .iter()
        .skip(1)
        .find(|value| !value.starts_with('-'))
        .filter(|value| {
            matches!(
                value.as_str(),
                "import" | "summary" | "cashflow" | "snapshot" | "export" | "restore" | "settings"
            )
        })
        .cloned()
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if is_internal_error(error) {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn is_internal_error(error: &ClientError) -> bool {
    error.code.starts_with("internal_")
        || error.code.starts_with("store_")
        || matches!(error.code.as_str(), "migration_failed" | "state_corrupt")
}
