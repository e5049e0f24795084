pub(crate) mod aggregate;
pub(crate) mod aliases;
pub(crate) mod build;
pub(crate) mod classify;
pub(crate) mod dedupe;
pub(crate) mod input;
pub(crate) mod numeric;
pub(crate) mod pdf;
pub(crate) mod sections;
pub(crate) mod spreadsheet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::ClientResult;
use crate::dates::format_iso_date;
use crate::import::aggregate::{Position, PositionBook};
use crate::import::aliases::FieldMap;
use crate::import::build::{
    BuildContext, build_asset, build_liability, build_movement, build_trade, movement_date,
};
use crate::import::classify::{ClassifiedRow, RowKind, classify};
use crate::import::dedupe::{MergeOutcome, merge_batch};
use crate::import::input::{SourceFormat, decode_source, read_source};
use crate::import::sections::{SectionHeader, extract_rows};
use crate::model::{Asset, Liability, Transaction};
use crate::store::{KeyValueStore, load_state, save_state};

/// Everything one import produced, before it touches stored state.
#[derive(Debug, Clone, Default)]
pub(crate) struct ImportBatch {
    pub assets: Vec<Asset>,
    pub liabilities: Vec<Liability>,
    pub transactions: Vec<Transaction>,
    pub positions: Vec<Position>,
    pub total_rows_read: usize,
    pub trade_rows: usize,
    pub unknown_count: usize,
    /// Movements dated with the import day because their own date was missing.
    pub undated_movements: usize,
    pub sample_unknown_row: Option<FieldMap>,
    pub detected_columns: Vec<String>,
    pub sections: Vec<SectionHeader>,
}

struct ImportAccumulator<'a> {
    context: &'a BuildContext,
    assets: Vec<Asset>,
    liabilities: Vec<Liability>,
    transactions: Vec<Transaction>,
    book: PositionBook,
    rows_read: usize,
    trade_rows: usize,
    unknown_count: usize,
    undated_movements: usize,
    sample_unknown_row: Option<FieldMap>,
}

impl<'a> ImportAccumulator<'a> {
    fn new(context: &'a BuildContext) -> Self {
        Self {
            context,
            assets: Vec::new(),
            liabilities: Vec::new(),
            transactions: Vec::new(),
            book: PositionBook::default(),
            rows_read: 0,
            trade_rows: 0,
            unknown_count: 0,
            undated_movements: 0,
            sample_unknown_row: None,
        }
    }

    fn accept(&mut self, row: ClassifiedRow) {
        self.rows_read += 1;
        let fields = row.fields;
        let accepted = match row.kind {
            RowKind::Asset => match build_asset(&fields) {
                Some(asset) => {
                    self.assets.push(asset);
                    true
                }
                None => false,
            },
            RowKind::Liability => match build_liability(&fields) {
                Some(liability) => {
                    self.liabilities.push(liability);
                    true
                }
                None => false,
            },
            RowKind::Movement => match build_movement(&fields, self.context) {
                Some(transaction) => {
                    if movement_date(&fields).is_none() {
                        self.undated_movements += 1;
                    }
                    self.transactions.push(transaction);
                    true
                }
                None => false,
            },
            RowKind::Trade => match build_trade(&fields, self.context) {
                Some(leg) => {
                    self.trade_rows += 1;
                    self.book.apply(&leg);
                    true
                }
                None => false,
            },
            RowKind::Unknown => false,
        };

        if !accepted {
            if row.kind != RowKind::Unknown {
                debug!(kind = row.kind.as_str(), "row demoted to unknown");
            }
            self.unknown_count += 1;
            if self.sample_unknown_row.is_none() {
                self.sample_unknown_row = Some(fields);
            }
        }
    }

    fn finish(mut self, sections: Vec<SectionHeader>, detected_columns: Vec<String>) -> ImportBatch {
        let positions = self.book.positions().cloned().collect::<Vec<Position>>();
        if !self.book.is_empty() {
            let added = self.book.flush_into(&mut self.assets);
            debug!(positions = positions.len(), added, "flushed trade positions");
        }

        ImportBatch {
            assets: self.assets,
            liabilities: self.liabilities,
            transactions: self.transactions,
            positions,
            total_rows_read: self.rows_read,
            trade_rows: self.trade_rows,
            unknown_count: self.unknown_count,
            undated_movements: self.undated_movements,
            sample_unknown_row: self.sample_unknown_row,
            detected_columns,
            sections,
        }
    }
}

/// Detect, classify, build and aggregate. Pure apart from id generation.
pub(crate) fn run_pipeline(text: &str, context: &BuildContext) -> ImportBatch {
    let table = extract_rows(text);
    let mut accumulator = ImportAccumulator::new(context);
    for raw_row in table.rows {
        accumulator.accept(classify(raw_row.fields));
    }
    accumulator.finish(table.sections, table.columns)
}

#[derive(Debug, Clone)]
pub(crate) struct ImportExecutionResult {
    pub source_format: SourceFormat,
    pub encoding: Option<String>,
    pub outcome: MergeOutcome,
    pub total_rows_read: usize,
    pub trade_rows: usize,
    pub unknown_count: usize,
    pub sample_unknown_row: Option<FieldMap>,
    pub detected_columns: Vec<String>,
    pub sections: Vec<SectionHeader>,
    pub positions: Vec<Position>,
    pub warnings: Vec<String>,
    pub state_written: bool,
}

/// Reads `path`, imports it into the stored state and writes the state back once.
///
/// Content problems never fail the call: they surface as counters and warnings.
pub(crate) fn execute(
    store: &mut dyn KeyValueStore,
    path: &str,
    today: NaiveDate,
) -> ClientResult<ImportExecutionResult> {
    let mut state = load_state(store)?;
    let document = read_source(path)?;
    let decoded = decode_source(&document);

    let context = BuildContext {
        today,
        base_currency: state.settings.currency.clone(),
    };
    let mut batch = run_pipeline(&decoded.text, &context);

    let mut warnings = decoded.warnings;
    if batch.sections.is_empty() && warnings.is_empty() {
        warnings.push("No header row or data rows were found.".to_string());
    }
    if batch.unknown_count > 0 {
        warnings.push(format!(
            "{} row(s) could not be classified and were skipped.",
            batch.unknown_count
        ));
    }

    if batch.undated_movements > 0 {
        warnings.push(format!(
            "{} movement(s) had no readable date and were dated {}; importing this file on another day will add them again.",
            batch.undated_movements,
            format_iso_date(&today)
        ));
    }

    let sample_unknown_row = batch.sample_unknown_row.take();
    let detected_columns = std::mem::take(&mut batch.detected_columns);
    let sections = std::mem::take(&mut batch.sections);
    let positions = std::mem::take(&mut batch.positions);
    let (total_rows_read, trade_rows, unknown_count) =
        (batch.total_rows_read, batch.trade_rows, batch.unknown_count);

    let outcome = merge_batch(&mut state, batch);
    let state_written = outcome.changed_state();
    if state_written {
        save_state(store, &state)?;
    }

    if unknown_count > 0 {
        warn!(unknown_count, path = %document.path, "some rows were not recognised");
    }
    info!(
        path = %document.path,
        format = document.format.as_str(),
        rows = total_rows_read,
        added_assets = outcome.added_assets,
        added_liabilities = outcome.added_liabilities,
        added_movements = outcome.added_movements,
        duplicates = outcome.duplicate_movements,
        "import finished"
    );

    Ok(ImportExecutionResult {
        source_format: document.format,
        encoding: decoded.encoding,
        outcome,
        total_rows_read,
        trade_rows,
        unknown_count,
        sample_unknown_row,
        detected_columns,
        sections,
        positions,
        warnings,
        state_written,
    })
}
