use serde::Serialize;
use serde_json::Value;

use crate::model::{Asset, Liability, Settings, Snapshot};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportData {
    pub path: String,
    pub source_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    pub message: String,
    pub added_assets: usize,
    pub added_liabilities: usize,
    pub added_movements: usize,
    pub updated_assets: usize,
    pub updated_liabilities: usize,
    pub duplicate_movements: usize,
    pub unknown_count: usize,
    pub sample_unknown_row: Option<Value>,
    pub total_rows_read: usize,
    pub trade_rows: usize,
    pub detected_columns: Vec<String>,
    pub sections: Vec<ImportSection>,
    pub positions: Vec<ImportPosition>,
    pub warnings: Vec<String>,
    pub state_written: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSection {
    pub start_line: usize,
    pub delimiter: String,
    pub header_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPosition {
    pub ticker: String,
    pub currency: String,
    pub qty: f64,
    pub cost_basis: f64,
    pub commission: f64,
    pub average_price: f64,
    pub open: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassTotal {
    pub class: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassiveIncomeLine {
    pub asset_id: String,
    pub name: String,
    pub class: String,
    pub income_type: String,
    pub annual_gross: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryData {
    pub currency: String,
    pub tax_rate: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub net_worth: f64,
    pub passive_income_gross: f64,
    pub passive_income_net: f64,
    pub passive_income_monthly_net: f64,
    pub asset_count: usize,
    pub liability_count: usize,
    pub transaction_count: usize,
    pub assets_by_class: Vec<ClassTotal>,
    pub liabilities_by_class: Vec<ClassTotal>,
    pub passive_income: Vec<PassiveIncomeLine>,
    pub favorite_assets: Vec<Asset>,
    pub favorite_liabilities: Vec<Liability>,
    /// Recorded month snapshots, oldest first.
    pub history: Vec<Snapshot>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowMonth {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub result: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowEntry {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub kind: String,
    pub category: String,
    pub amount: f64,
    pub date: String,
    pub notes: String,
    pub synthetic: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowData {
    pub currency: String,
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub result: f64,
    pub expenses_by_category: Vec<CategoryTotal>,
    pub entries: Vec<CashflowEntry>,
    pub trailing_months: Vec<CashflowMonth>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub format: String,
    pub content: String,
    pub asset_count: usize,
    pub liability_count: usize,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreData {
    pub path: String,
    pub message: String,
    pub asset_count: usize,
    pub liability_count: usize,
    pub transaction_count: usize,
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsData {
    pub settings: Settings,
    pub updated: bool,
    pub store_path: String,
    pub schema_version: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    pub currency: String,
    /// `recorded`, `replaced` or `cleared`.
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    pub history: Vec<Snapshot>,
}
