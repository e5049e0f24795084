use std::collections::BTreeMap;

use serde::Serialize;

use crate::import::build::{TradeLeg, is_crypto_ticker};
use crate::model::{Asset, CRYPTO_CLASS, IncomeType, STOCK_CLASS, identity_key, new_id};

/// Net holding for one ticker in one currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Position {
    pub ticker: String,
    pub currency: String,
    pub qty: f64,
    pub cost_basis: f64,
    pub commission: f64,
}

impl Position {
    fn new(ticker: &str, currency: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            currency: currency.to_string(),
            qty: 0.0,
            cost_basis: 0.0,
            commission: 0.0,
        }
    }

    pub(crate) fn average_price(&self) -> f64 {
        if self.qty > 0.0 {
            self.cost_basis / self.qty
        } else {
            0.0
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.qty > 0.0 && self.cost_basis > 0.0
    }

    pub(crate) fn value(&self) -> f64 {
        self.cost_basis + self.commission
    }

    fn apply(&mut self, leg: &TradeLeg) {
        if leg.quantity >= 0.0 {
            self.qty += leg.quantity;
            self.cost_basis += leg.quantity * leg.cost_per_share;
            self.commission += leg.commission.max(0.0);
            return;
        }

        let sell_qty = leg.quantity.abs();
        let average_cost = if self.qty > 0.0 {
            self.cost_basis / self.qty
        } else {
            leg.cost_per_share
        };
        self.qty = (self.qty - sell_qty).max(0.0);
        self.cost_basis = (self.cost_basis - sell_qty * average_cost).max(0.0);
    }
}

/// Running positions keyed `TICKER|CURRENCY`, ordered so flushing is deterministic.
#[derive(Debug, Clone, Default)]
pub(crate) struct PositionBook {
    positions: BTreeMap<String, Position>,
}

impl PositionBook {
    pub(crate) fn apply(&mut self, leg: &TradeLeg) {
        let key = format!("{}|{}", leg.ticker, leg.currency);
        self.positions
            .entry(key)
            .or_insert_with(|| Position::new(&leg.ticker, &leg.currency))
            .apply(leg);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub(crate) fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Turns open positions into assets, overwriting same-name/same-class assets
    /// already in `assets` in place. Returns how many were newly added.
    pub(crate) fn flush_into(&self, assets: &mut Vec<Asset>) -> usize {
        let mut added = 0;
        for position in self.positions.values().filter(|position| position.is_open()) {
            let class = if is_crypto_ticker(&position.ticker) {
                CRYPTO_CLASS
            } else {
                STOCK_CLASS
            };
            let notes = format!(
                "From trades: qty {}, avg price {:.4} {}",
                format_quantity(position.qty),
                position.average_price(),
                position.currency
            );
            let key = identity_key(&position.ticker, class);

            if let Some(existing) = assets
                .iter_mut()
                .find(|asset| identity_key(&asset.name, &asset.class) == key)
            {
                existing.value = position.value();
                existing.income_type = IncomeType::None;
                existing.income_value = 0.0;
                existing.notes = notes;
                continue;
            }

            assets.push(Asset {
                id: new_id("ast"),
                class: class.to_string(),
                name: position.ticker.clone(),
                value: position.value(),
                income_type: IncomeType::None,
                income_value: 0.0,
                notes,
                favorite: false,
            });
            added += 1;
        }
        added
    }
}

fn format_quantity(quantity: f64) -> String {
    let rounded = format!("{quantity:.8}");
    rounded
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
