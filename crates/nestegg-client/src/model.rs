use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

pub const STATE_VERSION: u32 = 1;
pub const DEFAULT_CURRENCY: &str = "EUR";
pub const DEFAULT_TAX_RATE: f64 = 28.0;

pub const DEFAULT_CLASSES: [&str; 12] = [
    "Real estate",
    "Cash",
    "Stocks",
    "ETFs",
    "Funds",
    "Retirement",
    "Term deposits",
    "Gold",
    "Silver",
    "Art",
    "Crypto",
    "Other",
];

pub const FALLBACK_ASSET_CLASS: &str = "Other";
pub const STOCK_CLASS: &str = "Stocks";
pub const ETF_CLASS: &str = "ETFs";
pub const CRYPTO_CLASS: &str = "Crypto";
pub const DEFAULT_LIABILITY_CLASS: &str = "Debt";
pub const DEFAULT_MOVEMENT_CATEGORY: &str = "Imported";

/// How an asset produces passive income.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeType {
    #[default]
    None,
    /// Percentage of the asset value per year.
    #[serde(alias = "div_yield", alias = "rate")]
    YieldPct,
    #[serde(alias = "div_amount")]
    AmountPerYear,
    #[serde(alias = "rent")]
    RentPerMonth,
}

impl IncomeType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::YieldPct => "yield_pct",
            Self::AmountPerYear => "amount_per_year",
            Self::RentPerMonth => "rent_per_month",
        }
    }

    /// Accepts the stored spellings plus the loose vocabulary found in exports.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "" | "none" | "no" | "nenhum" => Some(Self::None),
            "yield_pct" | "yield" | "div_yield" | "rate" | "pct" | "%" | "taxa" => {
                Some(Self::YieldPct)
            }
            "amount_per_year" | "div_amount" | "annual" | "anual" | "per_year" => {
                Some(Self::AmountPerYear)
            }
            "rent_per_month" | "rent" | "renda" | "aluguel" | "monthly_rent" => {
                Some(Self::RentPerMonth)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub class: String,
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub income_type: IncomeType,
    #[serde(default)]
    pub income_value: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Liability {
    pub id: String,
    pub class: String,
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub favorite: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Monthly,
    Yearly,
}

impl Frequency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" | "mensal" | "mensual" | "mes" | "m" => Some(Self::Monthly),
            "yearly" | "annual" | "annually" | "year" | "anual" | "anualmente" | "y" => {
                Some(Self::Yearly)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub freq: Frequency,
    #[serde(default)]
    pub until: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(alias = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub recurring: Option<Recurrence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub currency: String,
    pub tax_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            tax_rate: DEFAULT_TAX_RATE,
        }
    }
}

/// Totals recorded for one month, kept to draw net worth and income trends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// `YYYY-MM`; at most one snapshot per month.
    pub ym: String,
    pub assets_total: f64,
    pub liabilities_total: f64,
    pub net_worth: f64,
    pub passive_gross_annual: f64,
    pub passive_net_annual: f64,
    #[serde(default, alias = "ts")]
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Everything the app persists, stored as one serialized blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub liabilities: Vec<Liability>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            settings: Settings::default(),
            assets: Vec::new(),
            liabilities: Vec::new(),
            transactions: Vec::new(),
            snapshots: Vec::new(),
        }
    }
}

fn default_version() -> u32 {
    STATE_VERSION
}

pub(crate) fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Ulid::new())
}

/// Identity used to merge imported items into existing ones.
pub(crate) fn identity_key(name: &str, class: &str) -> (String, String) {
    (name.trim().to_uppercase(), class.trim().to_lowercase())
}
