use std::path::Path;

use crate::commands::common::load_ledger;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::SettingsData;
use crate::store::save_state;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct SettingsOptions<'a> {
    pub currency: Option<String>,
    pub tax_rate: Option<f64>,
    pub home_override: Option<&'a Path>,
}

pub fn run(currency: Option<&str>, tax_rate: Option<f64>) -> ClientResult<SuccessEnvelope> {
    run_with_options(SettingsOptions {
        currency: currency.map(std::string::ToString::to_string),
        tax_rate,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: SettingsOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let currency = options.currency.as_deref().map(validate_currency).transpose()?;
    let tax_rate = options.tax_rate.map(validate_tax_rate).transpose()?;

    let (setup, mut store, mut state) = load_ledger(options.home_override)?;
    let mut updated = false;
    if let Some(code) = currency
        && code != state.settings.currency
    {
        state.settings.currency = code;
        updated = true;
    }
    if let Some(rate) = tax_rate
        && (rate - state.settings.tax_rate).abs() > f64::EPSILON
    {
        state.settings.tax_rate = rate;
        updated = true;
    }
    if updated {
        save_state(&mut store, &state)?;
    }

    success(
        "settings",
        SettingsData {
            settings: state.settings,
            updated,
            store_path: setup.db_path.display().to_string(),
            schema_version: setup.schema_version,
        },
    )
}

fn validate_currency(value: &str) -> ClientResult<String> {
    let code = value.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Ok(code);
    }
    Err(ClientError::invalid_argument_for_command(
        &format!("`{value}` is not a three-letter currency code such as EUR or USD."),
        Some("settings"),
    ))
}

fn validate_tax_rate(value: f64) -> ClientResult<f64> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        return Ok(value);
    }
    Err(ClientError::invalid_argument_for_command(
        "`tax-rate` must be a percentage between 0 and 100.",
        Some("settings"),
    ))
}
