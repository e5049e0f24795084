use nestegg_client::commands;
use nestegg_client::commands::export::ExportFormat;
use nestegg_client::commands::import::ImportRunOptions;
use nestegg_client::{ClientResult, SuccessEnvelope};

use crate::cli::{Cli, Commands};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Import { path, today, .. } => {
            commands::import::run_with_options(ImportRunOptions {
                path: path.clone(),
                home_override: None,
                today: *today,
            })
        }
        Commands::Summary { .. } => commands::summary::run(),
        Commands::Cashflow { month, .. } => commands::cashflow::run(month.as_deref()),
        Commands::Snapshot { month, clear, .. } => commands::snapshot::run(month.as_deref(), *clear),
        Commands::Export { format } => commands::export::run(ExportFormat::parse(format)?),
        Commands::Restore { path, .. } => commands::restore::run(path),
        Commands::Settings {
            currency,
            tax_rate,
            ..
        } => commands::settings::run(currency.as_deref(), *tax_rate),
    }
}
