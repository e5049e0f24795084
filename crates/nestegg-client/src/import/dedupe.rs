use std::collections::HashMap;

use crate::import::ImportBatch;
use crate::model::{Asset, LedgerState, Liability, Transaction, identity_key};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MergeOutcome {
    pub added_assets: usize,
    pub updated_assets: usize,
    pub added_liabilities: usize,
    pub updated_liabilities: usize,
    pub added_movements: usize,
    pub duplicate_movements: usize,
}

impl MergeOutcome {
    pub(crate) fn changed_state(&self) -> bool {
        self.added_assets
            + self.updated_assets
            + self.added_liabilities
            + self.updated_liabilities
            + self.added_movements
            > 0
    }
}

/// Key for recognising a movement that is already stored.
pub(crate) fn movement_key(transaction: &Transaction) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let cents = (transaction.amount * 100.0).round() as i64;
    format!(
        "{}|{}|{cents}|{}|{}|{}",
        transaction.date,
        transaction.kind.as_str(),
        transaction.category.trim().to_lowercase(),
        transaction.notes.trim().to_lowercase(),
        transaction
            .recurring
            .map_or("", |rule| rule.freq.as_str()),
    )
}

/// Folds an import batch into `state`.
///
/// Items whose name and class match an existing, not yet matched item update it in
/// place; movements already present (same key, counted with multiplicity) are
/// skipped. Importing the same file twice therefore changes nothing the second time.
pub(crate) fn merge_batch(state: &mut LedgerState, batch: ImportBatch) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    let (added, updated) = merge_assets(&mut state.assets, batch.assets);
    outcome.added_assets = added;
    outcome.updated_assets = updated;

    let (added, updated) = merge_liabilities(&mut state.liabilities, batch.liabilities);
    outcome.added_liabilities = added;
    outcome.updated_liabilities = updated;

    let mut existing_counts: HashMap<String, usize> = HashMap::new();
    for transaction in &state.transactions {
        *existing_counts.entry(movement_key(transaction)).or_default() += 1;
    }
    for transaction in batch.transactions {
        let key = movement_key(&transaction);
        if let Some(remaining) = existing_counts.get_mut(&key)
            && *remaining > 0
        {
            *remaining -= 1;
            outcome.duplicate_movements += 1;
            continue;
        }
        state.transactions.push(transaction);
        outcome.added_movements += 1;
    }

    outcome
}

fn merge_assets(existing: &mut Vec<Asset>, incoming: Vec<Asset>) -> (usize, usize) {
    let original_len = existing.len();
    let mut claimed = vec![false; original_len];
    let (mut added, mut updated) = (0, 0);

    for asset in incoming {
        let key = identity_key(&asset.name, &asset.class);
        let matched = (0..original_len)
            .find(|index| !claimed[*index] && identity_key(&existing[*index].name, &existing[*index].class) == key);
        match matched {
            Some(index) => {
                claimed[index] = true;
                let current = &mut existing[index];
                if asset_differs(current, &asset) {
                    updated += 1;
                }
                current.value = asset.value;
                current.income_type = asset.income_type;
                current.income_value = asset.income_value;
                if !asset.notes.is_empty() {
                    current.notes = asset.notes;
                }
                current.favorite = current.favorite || asset.favorite;
            }
            None => {
                existing.push(asset);
                added += 1;
            }
        }
    }
    (added, updated)
}

fn merge_liabilities(existing: &mut Vec<Liability>, incoming: Vec<Liability>) -> (usize, usize) {
    let original_len = existing.len();
    let mut claimed = vec![false; original_len];
    let (mut added, mut updated) = (0, 0);

    for liability in incoming {
        let key = identity_key(&liability.name, &liability.class);
        let matched = (0..original_len)
            .find(|index| !claimed[*index] && identity_key(&existing[*index].name, &existing[*index].class) == key);
        match matched {
            Some(index) => {
                claimed[index] = true;
                let current = &mut existing[index];
                if (current.value - liability.value).abs() > 1e-9
                    || (!liability.notes.is_empty() && current.notes != liability.notes)
                {
                    updated += 1;
                }
                current.value = liability.value;
                if !liability.notes.is_empty() {
                    current.notes = liability.notes;
                }
                current.favorite = current.favorite || liability.favorite;
            }
            None => {
                existing.push(liability);
                added += 1;
            }
        }
    }
    (added, updated)
}

fn asset_differs(current: &Asset, incoming: &Asset) -> bool {
    (current.value - incoming.value).abs() > 1e-9
        || current.income_type != incoming.income_type
        || (current.income_value - incoming.income_value).abs() > 1e-9
        || (!incoming.notes.is_empty() && current.notes != incoming.notes)
        || (incoming.favorite && !current.favorite)
}
