use serde::Serialize;

use crate::dates::parse_flexible_date;
use crate::import::aliases::{Field, FieldMap, normalize_key};
use crate::import::numeric::normalize_number;

pub(crate) const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RowKind {
    Asset,
    Liability,
    Movement,
    Trade,
    Unknown,
}

impl RowKind {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Movement => "movement",
            Self::Trade => "trade",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ClassifiedRow {
    pub kind: RowKind,
    pub fields: FieldMap,
}

const ASSET_TYPE_WORDS: [&str; 8] = [
    "asset",
    "assets",
    "ativo",
    "ativos",
    "activo",
    "holding",
    "investment",
    "investimento",
];

const LIABILITY_TYPE_WORDS: [&str; 9] = [
    "liability",
    "liabilities",
    "passivo",
    "passivos",
    "pasivo",
    "debt",
    "divida",
    "deuda",
    "loan",
];

const MOVEMENT_TYPE_WORDS: [&str; 16] = [
    "movement",
    "movimento",
    "movimiento",
    "transaction",
    "transacao",
    "transaccion",
    "dividend",
    "dividendo",
    "income",
    "expense",
    "receita",
    "despesa",
    "entrada",
    "saida",
    "ingreso",
    "gasto",
];

pub(crate) const DEBT_KEYWORDS: [&str; 14] = [
    "loan",
    "mortgage",
    "credit_card",
    "cartao_de_credito",
    "cartao",
    "credito_habitacao",
    "emprestimo",
    "hipoteca",
    "divida",
    "debt",
    "prestamo",
    "leasing",
    "overdraft",
    "descoberto",
];

/// Labels one row. Pure: same map in, same kind out.
pub(crate) fn classify(fields: FieldMap) -> ClassifiedRow {
    let kind = classify_kind(&fields);
    ClassifiedRow { kind, fields }
}

pub(crate) fn classify_kind(fields: &FieldMap) -> RowKind {
    if let Some(kind) = fields.lookup(Field::Type).and_then(explicit_kind) {
        return kind;
    }

    if fields.has(Field::Ticker)
        && numeric(fields, Field::Quantity).is_some()
        && numeric(fields, Field::Price).is_some()
    {
        return RowKind::Trade;
    }

    let has_date = has_parseable_date(fields);
    if has_date
        && first_numeric(fields, &[Field::Amount, Field::Value, Field::Total])
            .is_some_and(|value| value.abs() > EPSILON)
    {
        return RowKind::Movement;
    }

    if mentions_debt(fields)
        && first_numeric(
            fields,
            &[Field::MarketValue, Field::Value, Field::Amount, Field::Total],
        )
        .is_some()
    {
        return RowKind::Liability;
    }

    if has_identity(fields) {
        let positive_value = first_numeric(fields, &[Field::MarketValue, Field::Value])
            .is_some_and(|value| value > EPSILON);
        let quantity_and_price = numeric(fields, Field::Quantity).is_some()
            && numeric(fields, Field::Price).is_some();
        let undated_amount = !has_date
            && first_numeric(fields, &[Field::Amount, Field::Total])
                .is_some_and(|value| value > EPSILON);
        if positive_value || quantity_and_price || undated_amount {
            return RowKind::Asset;
        }
    }

    RowKind::Unknown
}

pub(crate) fn explicit_kind(value: &str) -> Option<RowKind> {
    let normalized = normalize_key(value);
    let word = normalized.as_str();
    if ASSET_TYPE_WORDS.contains(&word) {
        return Some(RowKind::Asset);
    }
    if LIABILITY_TYPE_WORDS.contains(&word) {
        return Some(RowKind::Liability);
    }
    if MOVEMENT_TYPE_WORDS.contains(&word) {
        return Some(RowKind::Movement);
    }
    None
}

pub(crate) fn numeric(fields: &FieldMap, field: Field) -> Option<f64> {
    fields.lookup(field).and_then(normalize_number)
}

pub(crate) fn first_numeric(fields: &FieldMap, candidates: &[Field]) -> Option<f64> {
    candidates
        .iter()
        .find_map(|field| numeric(fields, *field))
}

fn has_parseable_date(fields: &FieldMap) -> bool {
    fields
        .lookup(Field::Date)
        .and_then(parse_flexible_date)
        .is_some()
}

fn has_identity(fields: &FieldMap) -> bool {
    [Field::Ticker, Field::Isin, Field::Name, Field::Instrument]
        .iter()
        .any(|field| fields.has(*field))
}

pub(crate) fn mentions_debt(fields: &FieldMap) -> bool {
    [Field::Class, Field::Category]
        .iter()
        .filter_map(|field| fields.lookup(*field))
        .map(normalize_key)
        .any(|text| DEBT_KEYWORDS.iter().any(|keyword| text.contains(keyword)))
}

#[cfg(test)]
mod tests {
    use super::{RowKind, classify, classify_kind};
    use crate::import::aliases::{FieldMap, normalize_key};

    fn row(pairs: &[(&str, &str)]) -> FieldMap {
        FieldMap::from_pairs(
            pairs
                .iter()
                .map(|(key, value)| (normalize_key(key), value.to_string()))
                .collect(),
        )
    }

    #[test]
    fn explicit_type_short_circuits() {
        let fields = row(&[("Tipo", "Passivo"), ("Nome", "Carro"), ("Valor", "8000")]);
        assert_eq!(classify_kind(&fields), RowKind::Liability);
        let fields = row(&[("type", "Despesa"), ("valor", "12")]);
        assert_eq!(classify_kind(&fields), RowKind::Movement);
        let fields = row(&[("type", "asset"), ("name", "Gold bar"), ("value", "0")]);
        assert_eq!(classify_kind(&fields), RowKind::Asset);
    }

    #[test]
    fn ticker_quantity_price_is_a_trade_even_with_a_date() {
        let fields = row(&[
            ("Date", "2025-01-10"),
            ("Symbol", "AAPL"),
            ("Shares", "10"),
            ("Price", "150,00"),
            ("Amount", "-1500"),
        ]);
        assert_eq!(classify_kind(&fields), RowKind::Trade);
    }

    #[test]
    fn dated_nonzero_amount_is_a_movement() {
        let fields = row(&[("Data", "15/01/2025"), ("Descrição", "Renda"), ("Montante", "-750,00")]);
        assert_eq!(classify_kind(&fields), RowKind::Movement);
        let zero = row(&[("Data", "15/01/2025"), ("Montante", "0,00")]);
        assert_eq!(classify_kind(&zero), RowKind::Unknown);
    }

    #[test]
    fn debt_vocabulary_in_class_makes_a_liability() {
        let fields = row(&[("Name", "House"), ("Class", "Mortgage"), ("Value", "180000")]);
        assert_eq!(classify_kind(&fields), RowKind::Liability);
        let fields = row(&[("Nome", "Visa"), ("Categoria", "Cartão de crédito"), ("Saldo", "-450")]);
        assert_eq!(classify_kind(&fields), RowKind::Liability);
    }

    #[test]
    fn identity_with_value_is_an_asset() {
        let fields = row(&[("Name", "Savings"), ("Class", "Cash"), ("Value", "1.000,00")]);
        assert_eq!(classify_kind(&fields), RowKind::Asset);
        let fields = row(&[("ISIN", "IE00B4L5Y983"), ("Quantity", "3"), ("Price", "80")]);
        assert_eq!(classify_kind(&fields), RowKind::Asset);
        let fields = row(&[("Instrument", "Bond"), ("Amount", "500")]);
        assert_eq!(classify_kind(&fields), RowKind::Asset);
    }

    #[test]
    fn weak_rows_are_unknown() {
        assert_eq!(classify_kind(&row(&[("foo", "bar")])), RowKind::Unknown);
        let negative_value = row(&[("Name", "Thing"), ("Value", "-10")]);
        assert_eq!(classify_kind(&negative_value), RowKind::Unknown);
        let no_identity = row(&[("Value", "10"), ("Class", "Cash")]);
        assert_eq!(classify_kind(&no_identity), RowKind::Unknown);
    }

    #[test]
    fn classify_keeps_the_fields() {
        let classified = classify(row(&[("Name", "Savings"), ("Value", "10")]));
        assert_eq!(classified.kind, RowKind::Asset);
        assert_eq!(classified.fields.entries().len(), 2);
    }
}
