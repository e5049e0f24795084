use csv::WriterBuilder;

use crate::dates::format_iso_date;
use crate::model::{LedgerState, STATE_VERSION};
use crate::{ClientError, ClientResult};

const HOLDINGS_HEADER: [&str; 8] = [
    "type",
    "class",
    "name",
    "value",
    "income_type",
    "income_value",
    "favorite",
    "notes",
];
const MOVEMENTS_HEADER: [&str; 7] = ["type", "date", "category", "amount", "notes", "recurring", "until"];

/// Two comma-delimited sections (holdings, then movements) separated by a blank line.
/// Importing the result into an empty ledger reproduces the same totals.
pub(crate) fn state_to_csv(state: &LedgerState) -> ClientResult<String> {
    let mut holdings = Vec::new();
    holdings.push(to_record(&HOLDINGS_HEADER));
    for asset in &state.assets {
        holdings.push(vec![
            "asset".to_string(),
            asset.class.clone(),
            asset.name.clone(),
            asset.value.to_string(),
            asset.income_type.as_str().to_string(),
            asset.income_value.to_string(),
            asset.favorite.to_string(),
            asset.notes.clone(),
        ]);
    }
    for liability in &state.liabilities {
        holdings.push(vec![
            "liability".to_string(),
            liability.class.clone(),
            liability.name.clone(),
            liability.value.to_string(),
            String::new(),
            String::new(),
            liability.favorite.to_string(),
            liability.notes.clone(),
        ]);
    }

    let mut movements = Vec::new();
    movements.push(to_record(&MOVEMENTS_HEADER));
    for transaction in &state.transactions {
        movements.push(vec![
            transaction.kind.as_str().to_string(),
            format_iso_date(&transaction.date),
            transaction.category.clone(),
            transaction.amount.to_string(),
            transaction.notes.clone(),
            transaction
                .recurring
                .map(|rule| rule.freq.as_str().to_string())
                .unwrap_or_default(),
            transaction
                .recurring
                .and_then(|rule| rule.until)
                .map(|until| format_iso_date(&until))
                .unwrap_or_default(),
        ]);
    }

    let mut content = write_records(&holdings)?;
    content.push('\n');
    content.push_str(&write_records(&movements)?);
    Ok(content)
}

pub(crate) fn state_to_json(state: &LedgerState) -> ClientResult<String> {
    serde_json::to_string_pretty(state)
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))
}

/// Decodes and validates a JSON backup. Collections and settings missing from older
/// backups fall back to their defaults.
pub(crate) fn state_from_backup(path: &str, text: &str) -> ClientResult<LedgerState> {
    let mut state = serde_json::from_str::<LedgerState>(text)
        .map_err(|error| ClientError::invalid_backup(path, &error.to_string()))?;

    for asset in &state.assets {
        check_amount(path, "asset", &asset.name, asset.value)?;
        check_amount(path, "asset income", &asset.name, asset.income_value)?;
    }
    for liability in &state.liabilities {
        check_amount(path, "liability", &liability.name, liability.value)?;
    }
    for transaction in &state.transactions {
        check_amount(path, "transaction", &transaction.id, transaction.amount)?;
    }
    for snapshot in &state.snapshots {
        let totals = [
            snapshot.assets_total,
            snapshot.liabilities_total,
            snapshot.net_worth,
            snapshot.passive_gross_annual,
            snapshot.passive_net_annual,
        ];
        if totals.iter().any(|value| !value.is_finite()) {
            return Err(ClientError::invalid_backup(
                path,
                &format!("snapshot `{}` has a non-numeric total.", snapshot.ym),
            ));
        }
    }
    if !state.settings.tax_rate.is_finite() {
        return Err(ClientError::invalid_backup(path, "`taxRate` must be a number."));
    }
    if state.settings.currency.trim().is_empty() {
        return Err(ClientError::invalid_backup(path, "`currency` must not be empty."));
    }

    state.version = STATE_VERSION;
    Ok(state)
}

fn check_amount(path: &str, what: &str, label: &str, value: f64) -> ClientResult<()> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(ClientError::invalid_backup(
        path,
        &format!("{what} `{label}` has a negative or non-numeric amount."),
    ))
}

fn to_record(header: &[&str]) -> Vec<String> {
    header.iter().map(|value| (*value).to_string()).collect()
}

fn write_records(records: &[Vec<String>]) -> ClientResult<String> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    for record in records {
        writer
            .write_record(record)
            .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
    String::from_utf8(bytes).map_err(|error| ClientError::internal_serialization(&error.to_string()))
}
