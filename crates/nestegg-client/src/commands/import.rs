use std::path::Path;

use chrono::{Local, NaiveDate};

use crate::commands::common::load_setup;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{ImportData, ImportPosition, ImportSection};
use crate::import::{self, ImportExecutionResult};
use crate::import::sections::delimiter_label;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct ImportRunOptions<'a> {
    pub path: String,
    pub home_override: Option<&'a Path>,
    /// Date given to movements without one. Defaults to the local date.
    pub today: Option<NaiveDate>,
}

pub fn run(path: &str) -> ClientResult<SuccessEnvelope> {
    run_with_options(ImportRunOptions {
        path: path.to_string(),
        home_override: None,
        today: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ImportRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    if options.path.trim().is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "An import file path is required.",
            Some("import"),
        ));
    }

    let setup = load_setup(options.home_override)?;
    let mut store = setup.open_store()?;
    let today = options.today.unwrap_or_else(|| Local::now().date_naive());
    let execution = import::execute(&mut store, &options.path, today)?;

    success("import", import_data(&options.path, execution))
}

fn import_data(path: &str, execution: ImportExecutionResult) -> ImportData {
    let outcome = &execution.outcome;
    let message = summary_message(&execution);

    ImportData {
        path: path.to_string(),
        source_format: execution.source_format.as_str().to_string(),
        encoding: execution.encoding,
        message,
        added_assets: outcome.added_assets,
        added_liabilities: outcome.added_liabilities,
        added_movements: outcome.added_movements,
        updated_assets: outcome.updated_assets,
        updated_liabilities: outcome.updated_liabilities,
        duplicate_movements: outcome.duplicate_movements,
        unknown_count: execution.unknown_count,
        sample_unknown_row: execution.sample_unknown_row.as_ref().map(|row| row.to_json()),
        total_rows_read: execution.total_rows_read,
        trade_rows: execution.trade_rows,
        detected_columns: execution.detected_columns,
        sections: execution
            .sections
            .into_iter()
            .map(|section| ImportSection {
                start_line: section.start_line,
                delimiter: delimiter_label(section.delimiter),
                header_fields: section.header_fields,
            })
            .collect(),
        positions: execution
            .positions
            .iter()
            .map(|position| ImportPosition {
                ticker: position.ticker.clone(),
                currency: position.currency.clone(),
                qty: position.qty,
                cost_basis: position.cost_basis,
                commission: position.commission,
                average_price: position.average_price(),
                open: position.is_open(),
            })
            .collect(),
        warnings: execution.warnings,
        state_written: execution.state_written,
    }
}

fn summary_message(execution: &ImportExecutionResult) -> String {
    let outcome = &execution.outcome;
    if execution.total_rows_read == 0 {
        return "No importable rows were found.".to_string();
    }
    if !execution.state_written {
        return "Nothing new to import; your data already matches this file.".to_string();
    }
    format!(
        "Imported {} new, {} updated and {} skipped as already present.",
        outcome.added_assets + outcome.added_liabilities + outcome.added_movements,
        outcome.updated_assets + outcome.updated_liabilities,
        outcome.duplicate_movements,
    )
}
