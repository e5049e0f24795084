use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::{add_months_clamped, add_years_clamped};
use crate::model::{Frequency, Transaction, TransactionKind};

pub const MONTHLY_HORIZON: usize = 24;
pub const YEARLY_HORIZON: usize = 5;
pub const UNTIL_HARD_CAP: usize = 600;

/// One concrete dated occurrence, either a stored transaction or a projected instance
/// of a recurring template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedTransaction {
    pub id: String,
    pub template_id: Option<String>,
    pub instance_index: Option<usize>,
    pub kind: TransactionKind,
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub notes: String,
    pub synthetic: bool,
}

impl ExpandedTransaction {
    fn passthrough(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id.clone(),
            template_id: None,
            instance_index: None,
            kind: transaction.kind,
            category: transaction.category.clone(),
            amount: transaction.amount,
            date: transaction.date,
            notes: transaction.notes.clone(),
            synthetic: false,
        }
    }

    fn instance(template: &Transaction, index: usize, date: NaiveDate) -> Self {
        Self {
            id: format!("{}#{index}", template.id),
            template_id: Some(template.id.clone()),
            instance_index: Some(index),
            kind: template.kind,
            category: template.category.clone(),
            amount: template.amount,
            date,
            notes: template.notes.clone(),
            synthetic: index > 0,
        }
    }
}

/// Replaces every recurring template by its dated instances; other transactions pass
/// through unchanged. Input order is preserved, instances in date order.
pub fn expand_transactions(transactions: &[Transaction]) -> Vec<ExpandedTransaction> {
    let mut expanded = Vec::with_capacity(transactions.len());
    for transaction in transactions {
        match transaction.recurring {
            None => expanded.push(ExpandedTransaction::passthrough(transaction)),
            Some(rule) => {
                for (index, date) in instance_dates(transaction.date, rule.freq, rule.until)
                    .into_iter()
                    .enumerate()
                {
                    expanded.push(ExpandedTransaction::instance(transaction, index, date));
                }
            }
        }
    }
    expanded
}

/// Dates are always offset from `base`, so a 31st keeps returning to month end
/// instead of drifting to the 28th after February.
pub fn instance_dates(base: NaiveDate, freq: Frequency, until: Option<NaiveDate>) -> Vec<NaiveDate> {
    let limit = match (until, freq) {
        (Some(_), _) => UNTIL_HARD_CAP,
        (None, Frequency::Monthly) => MONTHLY_HORIZON,
        (None, Frequency::Yearly) => YEARLY_HORIZON,
    };

    let mut dates = Vec::new();
    for step in 0..limit {
        let Ok(offset) = i32::try_from(step) else {
            break;
        };
        let date = match freq {
            Frequency::Monthly => add_months_clamped(base, offset),
            Frequency::Yearly => add_years_clamped(base, offset),
        };
        if let Some(end) = until
            && date > end
        {
            break;
        }
        dates.push(date);
    }
    dates
}
