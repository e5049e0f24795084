use std::path::Path;

use crate::commands::common::load_ledger;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::ExportData;
use crate::export::{state_to_csv, state_to_json};
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(value: &str) -> ClientResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ClientError::invalid_argument_for_command(
                &format!("Unsupported export format `{value}`. Use `csv` or `json`."),
                Some("export"),
            )),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Default)]
pub struct ExportOptions<'a> {
    pub format: ExportFormat,
    pub home_override: Option<&'a Path>,
}

pub fn run(format: ExportFormat) -> ClientResult<SuccessEnvelope> {
    run_with_options(ExportOptions {
        format,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ExportOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let (_, _, state) = load_ledger(options.home_override)?;
    let content = match options.format {
        ExportFormat::Csv => state_to_csv(&state)?,
        ExportFormat::Json => state_to_json(&state)?,
    };

    success(
        "export",
        ExportData {
            format: options.format.as_str().to_string(),
            content,
            asset_count: state.assets.len(),
            liability_count: state.liabilities.len(),
            transaction_count: state.transactions.len(),
        },
    )
}
