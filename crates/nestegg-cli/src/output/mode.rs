use crate::cli::Commands;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
    /// The command's payload is already a document; print it untouched.
    Raw,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    match command {
        Commands::Import { json, .. }
        | Commands::Summary { json }
        | Commands::Cashflow { json, .. }
        | Commands::Snapshot { json, .. }
        | Commands::Restore { json, .. }
        | Commands::Settings { json, .. } => {
            if *json {
                OutputMode::Json
            } else {
                OutputMode::Text
            }
        }
        Commands::Export { .. } => OutputMode::Raw,
    }
}
