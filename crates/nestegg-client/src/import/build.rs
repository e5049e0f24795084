use chrono::NaiveDate;

use crate::dates::parse_flexible_date;
use crate::import::aliases::{Field, FieldMap, normalize_key};
use crate::import::classify::{EPSILON, first_numeric, numeric};
use crate::import::numeric::normalize_number;
use crate::model::{
    Asset, CRYPTO_CLASS, DEFAULT_LIABILITY_CLASS, DEFAULT_MOVEMENT_CATEGORY, ETF_CLASS,
    FALLBACK_ASSET_CLASS, Frequency, IncomeType, Liability, Recurrence, STOCK_CLASS, Transaction,
    TransactionKind, new_id,
};

const DEFAULT_ITEM_NAME: &str = "Item";

const CRYPTO_SYMBOLS: [&str; 18] = [
    "BTC", "ETH", "SOL", "ADA", "XRP", "DOT", "DOGE", "LTC", "BNB", "USDT", "USDC", "AVAX",
    "MATIC", "LINK", "ATOM", "XLM", "TRX", "SHIB",
];
const CRYPTO_PAIR_SUFFIXES: [&str; 6] = ["-USD", "-EUR", "-USDT", "/USD", "/EUR", "USDT"];

const ETF_TICKERS: [&str; 15] = [
    "SPY", "VOO", "VTI", "QQQ", "IVV", "VWCE", "IWDA", "CSPX", "EUNL", "VWRL", "SXR8", "VUSA",
    "EIMI", "AGG", "BND",
];

const EXPENSE_WORDS: [&str; 12] = [
    "expense",
    "despesa",
    "saida",
    "gasto",
    "debit",
    "debito",
    "withdrawal",
    "levantamento",
    "payment",
    "pagamento",
    "egreso",
    "charge",
];
const INCOME_WORDS: [&str; 14] = [
    "income",
    "receita",
    "entrada",
    "dividend",
    "dividendo",
    "ingreso",
    "credit",
    "credito",
    "deposit",
    "deposito",
    "interest",
    "juros",
    "salary",
    "salario",
];
const SELL_WORDS: [&str; 7] = ["sell", "sale", "sold", "venda", "vender", "vendido", "s"];
const TRUE_WORDS: [&str; 9] = ["true", "yes", "y", "1", "sim", "si", "x", "*", "★"];

/// Inputs the builders need that do not come from the row itself.
#[derive(Debug, Clone)]
pub(crate) struct BuildContext {
    pub today: NaiveDate,
    pub base_currency: String,
}

/// One buy (positive quantity) or sell (negative quantity).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TradeLeg {
    pub ticker: String,
    pub quantity: f64,
    pub cost_per_share: f64,
    pub currency: String,
    pub commission: f64,
}

struct ItemDraft {
    name: String,
    class: Option<String>,
    value: f64,
    notes: String,
    favorite: bool,
}

fn build_item(fields: &FieldMap) -> Option<ItemDraft> {
    let name = [Field::Instrument, Field::Name, Field::Ticker, Field::Description]
        .iter()
        .find_map(|field| fields.lookup(*field))
        .unwrap_or(DEFAULT_ITEM_NAME)
        .to_string();

    let value = first_numeric(
        fields,
        &[Field::MarketValue, Field::Value, Field::Amount, Field::Total],
    )
    .map(f64::abs)
    .or_else(|| {
        let quantity = numeric(fields, Field::Quantity)?;
        let price = numeric(fields, Field::Price)?;
        Some((quantity * price).abs())
    })
    .filter(|value| *value > EPSILON)?;

    Some(ItemDraft {
        name,
        class: fields.lookup(Field::Class).map(str::to_string),
        value,
        notes: fields.lookup(Field::Notes).unwrap_or_default().to_string(),
        favorite: fields.lookup(Field::Favorite).is_some_and(is_truthy),
    })
}

pub(crate) fn build_asset(fields: &FieldMap) -> Option<Asset> {
    let draft = build_item(fields)?;
    let class = match draft.class {
        Some(class) => class,
        None => infer_asset_class(fields, &draft.name).to_string(),
    };
    let (income_type, income_value) = income_for(fields);

    Some(Asset {
        id: new_id("ast"),
        class,
        name: draft.name,
        value: draft.value,
        income_type,
        income_value,
        notes: draft.notes,
        favorite: draft.favorite,
    })
}

pub(crate) fn build_liability(fields: &FieldMap) -> Option<Liability> {
    let draft = build_item(fields)?;
    let class = draft
        .class
        .or_else(|| fields.lookup(Field::Category).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LIABILITY_CLASS.to_string());

    Some(Liability {
        id: new_id("lia"),
        class,
        name: draft.name,
        value: draft.value,
        notes: draft.notes,
        favorite: draft.favorite,
    })
}

pub(crate) fn build_movement(fields: &FieldMap, context: &BuildContext) -> Option<Transaction> {
    let signed = first_numeric(fields, &[Field::Amount, Field::Value, Field::Total])?;
    if signed.abs() <= EPSILON {
        return None;
    }

    let explicit = fields.lookup(Field::Type).map(normalize_key);
    let kind = match explicit.as_deref() {
        Some(word) if EXPENSE_WORDS.contains(&word) => TransactionKind::Expense,
        Some(word) if INCOME_WORDS.contains(&word) => TransactionKind::Income,
        _ if signed >= 0.0 => TransactionKind::Income,
        _ => TransactionKind::Expense,
    };

    let date = movement_date(fields).unwrap_or(context.today);
    let category = fields
        .lookup(Field::Category)
        .or_else(|| fields.lookup(Field::Class))
        .unwrap_or(DEFAULT_MOVEMENT_CATEGORY)
        .to_string();
    let notes = [
        Field::Description,
        Field::Notes,
        Field::Name,
        Field::Instrument,
        Field::Ticker,
    ]
    .iter()
    .find_map(|field| fields.lookup(*field))
    .unwrap_or_default()
    .to_string();
    let recurring = fields
        .lookup(Field::Frequency)
        .and_then(Frequency::parse)
        .map(|freq| Recurrence {
            freq,
            until: fields.lookup(Field::Until).and_then(parse_flexible_date),
        });

    Some(Transaction {
        id: new_id("txn"),
        kind,
        category,
        amount: signed.abs(),
        date,
        notes,
        recurring,
    })
}

/// The row's own date, when it has a readable one.
pub(crate) fn movement_date(fields: &FieldMap) -> Option<NaiveDate> {
    fields.lookup(Field::Date).and_then(parse_flexible_date)
}

pub(crate) fn build_trade(fields: &FieldMap, context: &BuildContext) -> Option<TradeLeg> {
    let ticker = fields.lookup(Field::Ticker)?.to_uppercase();
    let mut quantity = numeric(fields, Field::Quantity)?;
    let cost_per_share = numeric(fields, Field::Price)?.abs();
    let commission = numeric(fields, Field::Commission).map_or(0.0, f64::abs);
    let currency = fields
        .lookup(Field::Currency)
        .map(str::to_uppercase)
        .unwrap_or_else(|| context.base_currency.clone());

    let is_sell = fields
        .lookup(Field::Type)
        .map(normalize_key)
        .is_some_and(|word| SELL_WORDS.contains(&word.as_str()));
    if is_sell && quantity > 0.0 {
        quantity = -quantity;
    }

    Some(TradeLeg {
        ticker,
        quantity,
        cost_per_share,
        currency,
        commission,
    })
}

fn income_for(fields: &FieldMap) -> (IncomeType, f64) {
    let explicit_type = fields.lookup(Field::IncomeType).and_then(IncomeType::parse);
    let income_value = fields.lookup(Field::IncomeValue).and_then(normalize_number);
    let yield_pct = numeric(fields, Field::Yield);

    match (explicit_type, income_value.or(yield_pct)) {
        (Some(IncomeType::None), _) | (Some(_), None) => (IncomeType::None, 0.0),
        (Some(kind), Some(value)) => (kind, value.max(0.0)),
        (None, _) => match yield_pct {
            Some(value) if value > 0.0 => (IncomeType::YieldPct, value),
            _ => (IncomeType::None, 0.0),
        },
    }
}

fn infer_asset_class(fields: &FieldMap, name: &str) -> &'static str {
    let ticker = fields.lookup(Field::Ticker).map(str::to_uppercase);
    if let Some(symbol) = ticker.as_deref()
        && is_crypto_ticker(symbol)
    {
        return CRYPTO_CLASS;
    }

    let name_mentions_etf = name
        .to_uppercase()
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .any(|token| token == "ETF");
    if name_mentions_etf || ticker.as_deref().is_some_and(|symbol| ETF_TICKERS.contains(&symbol)) {
        return ETF_CLASS;
    }

    if ticker.is_some() {
        return STOCK_CLASS;
    }
    FALLBACK_ASSET_CLASS
}

pub(crate) fn is_crypto_ticker(ticker: &str) -> bool {
    let upper = ticker.trim().to_uppercase();
    if CRYPTO_SYMBOLS.contains(&upper.as_str()) {
        return true;
    }
    CRYPTO_PAIR_SUFFIXES.iter().any(|suffix| {
        upper
            .strip_suffix(suffix)
            .is_some_and(|base| !base.is_empty() && (CRYPTO_SYMBOLS.contains(&base) || *suffix == "USDT"))
    })
}

fn is_truthy(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    TRUE_WORDS.contains(&lowered.as_str())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        BuildContext, build_asset, build_liability, build_movement, build_trade, is_crypto_ticker,
    };
    use crate::dates::format_iso_date;
    use crate::import::aliases::{FieldMap, normalize_key};
    use crate::model::{Frequency, IncomeType, TransactionKind};

    fn row(pairs: &[(&str, &str)]) -> FieldMap {
        FieldMap::from_pairs(
            pairs
                .iter()
                .map(|(key, value)| (normalize_key(key), value.to_string()))
                .collect(),
        )
    }

    fn context() -> BuildContext {
        BuildContext {
            today: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default(),
            base_currency: "EUR".to_string(),
        }
    }

    #[test]
    fn asset_value_prefers_market_value_then_quantity_times_price() {
        let asset = build_asset(&row(&[("Name", "Fund A"), ("Market value", "2.000,50")]));
        assert!(asset.is_some());
        if let Some(value) = asset {
            assert!((value.value - 2000.5).abs() < 1e-9);
            assert_eq!(value.class, "Other");
            assert!(value.id.starts_with("ast_"));
        }

        let asset = build_asset(&row(&[("Ticker", "msft"), ("Quantity", "4"), ("Price", "-100")]));
        assert!(asset.is_some());
        if let Some(value) = asset {
            assert!((value.value - 400.0).abs() < 1e-9);
            assert_eq!(value.name, "msft");
            assert_eq!(value.class, "Stocks");
        }
    }

    #[test]
    fn zero_value_items_are_discarded() {
        assert!(build_asset(&row(&[("Name", "Empty"), ("Value", "0")])).is_none());
        assert!(build_liability(&row(&[("Name", "Paid off"), ("Value", "0,00")])).is_none());
    }

    #[test]
    fn class_inference_covers_crypto_and_etfs() {
        let crypto = build_asset(&row(&[("Ticker", "BTC-EUR"), ("Value", "900")]));
        assert_eq!(crypto.map(|asset| asset.class), Some("Crypto".to_string()));
        let etf = build_asset(&row(&[("Name", "iShares Core ETF"), ("Value", "900")]));
        assert_eq!(etf.map(|asset| asset.class), Some("ETFs".to_string()));
        let listed = build_asset(&row(&[("Ticker", "VWCE"), ("Value", "900")]));
        assert_eq!(listed.map(|asset| asset.class), Some("ETFs".to_string()));
        let explicit = build_asset(&row(&[("Name", "Flat"), ("Classe", "Real estate"), ("Valor", "1")]));
        assert_eq!(explicit.map(|asset| asset.class), Some("Real estate".to_string()));
    }

    #[test]
    fn income_fields_are_read() {
        let asset = build_asset(&row(&[
            ("Name", "Flat"),
            ("Value", "200000"),
            ("Income type", "rent"),
            ("Income value", "850"),
        ]));
        assert!(asset.is_some());
        if let Some(value) = asset {
            assert_eq!(value.income_type, IncomeType::RentPerMonth);
            assert!((value.income_value - 850.0).abs() < 1e-9);
        }

        let asset = build_asset(&row(&[("Name", "Bond"), ("Value", "1000"), ("Yield", "3,5%")]));
        assert!(asset.is_some());
        if let Some(value) = asset {
            assert_eq!(value.income_type, IncomeType::YieldPct);
            assert!((value.income_value - 3.5).abs() < 1e-9);
        }
    }

    #[test]
    fn liability_defaults_to_debt_class() {
        let liability = build_liability(&row(&[("Name", "Car loan"), ("Value", "-8.000")]));
        assert!(liability.is_some());
        if let Some(value) = liability {
            assert_eq!(value.class, "Debt");
            assert!((value.value - 8.0).abs() < 1e-9);
            assert!(value.id.starts_with("lia_"));
        }
    }

    #[test]
    fn movement_kind_follows_sign_unless_type_says_otherwise() {
        let movement = build_movement(
            &row(&[("Data", "15/01/2025"), ("Descrição", "Renda"), ("Montante", "-750,00")]),
            &context(),
        );
        assert!(movement.is_some());
        if let Some(value) = movement {
            assert_eq!(value.kind, TransactionKind::Expense);
            assert!((value.amount - 750.0).abs() < 1e-9);
            assert_eq!(format_iso_date(&value.date), "2025-01-15");
            assert_eq!(value.category, "Imported");
            assert_eq!(value.notes, "Renda");
        }

        let movement = build_movement(
            &row(&[("Type", "expense"), ("Amount", "20"), ("Category", "Food")]),
            &context(),
        );
        assert!(movement.is_some());
        if let Some(value) = movement {
            assert_eq!(value.kind, TransactionKind::Expense);
            assert_eq!(value.category, "Food");
            assert_eq!(format_iso_date(&value.date), "2025-06-01");
        }
    }

    #[test]
    fn movement_reads_recurrence_columns() {
        let movement = build_movement(
            &row(&[
                ("Date", "2025-01-01"),
                ("Amount", "1200"),
                ("Recurring", "mensal"),
                ("Until", "2025-12-31"),
            ]),
            &context(),
        );
        assert!(movement.is_some());
        if let Some(value) = movement {
            assert!(value.recurring.is_some());
            if let Some(rule) = value.recurring {
                assert_eq!(rule.freq, Frequency::Monthly);
                assert_eq!(rule.until.map(|date| format_iso_date(&date)), Some("2025-12-31".to_string()));
            }
        }
    }

    #[test]
    fn zero_amount_movement_is_rejected() {
        assert!(build_movement(&row(&[("Date", "2025-01-01"), ("Amount", "0")]), &context()).is_none());
    }

    #[test]
    fn trade_leg_normalizes_ticker_currency_and_sell_side() {
        let leg = build_trade(
            &row(&[
                ("Symbol", "aapl"),
                ("Side", "Venda"),
                ("Quantity", "8"),
                ("Price", "120"),
                ("Fee", "(1,50)"),
            ]),
            &context(),
        );
        assert!(leg.is_some());
        if let Some(value) = leg {
            assert_eq!(value.ticker, "AAPL");
            assert!((value.quantity + 8.0).abs() < 1e-9);
            assert!((value.commission - 1.5).abs() < 1e-9);
            assert_eq!(value.currency, "EUR");
        }

        let missing_price = build_trade(&row(&[("Symbol", "AAPL"), ("Quantity", "1")]), &context());
        assert!(missing_price.is_none());
    }

    #[test]
    fn crypto_detection_handles_pairs() {
        assert!(is_crypto_ticker("btc"));
        assert!(is_crypto_ticker("ETH-USD"));
        assert!(is_crypto_ticker("PEPEUSDT"));
        assert!(!is_crypto_ticker("AAPL"));
        assert!(!is_crypto_ticker("USDT-"));
    }
}
