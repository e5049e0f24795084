use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use nestegg_client::commands::export::{ExportFormat, ExportOptions};
use nestegg_client::commands::import::ImportRunOptions;
use nestegg_client::commands::summary::SummaryOptions;
use nestegg_client::commands::{export, import, summary};
use nestegg_client::contracts::envelope::failure_from_error;
use nestegg_client::setup::ensure_initialized_at;
use nestegg_client::store::{KeyValueStore, STATE_KEY};
use serde_json::Value;
use tempfile::tempdir;

fn write_file(path: &Path, body: &[u8]) {
    let result = fs::write(path, body);
    assert!(result.is_ok());
}

fn temp_home() -> std::io::Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempdir()?;
    let home = dir.path().join("nestegg-home");
    Ok((dir, home))
}

fn run_import(home: &Path, path: &Path) -> nestegg_client::ClientResult<nestegg_client::SuccessEnvelope> {
    import::run_with_options(ImportRunOptions {
        path: path.display().to_string(),
        home_override: Some(home),
        today: NaiveDate::from_ymd_opt(2025, 6, 1),
    })
}

fn run_summary(home: &Path) -> Option<Value> {
    let result = summary::run_with_options(SummaryOptions {
        home_override: Some(home),
    });
    assert!(result.is_ok());
    result.ok().map(|envelope| envelope.data)
}

fn as_u64(data: &Value, key: &str) -> u64 {
    data.get(key).and_then(Value::as_u64).unwrap_or(u64::MAX)
}

fn as_f64(data: &Value, key: &str) -> f64 {
    data.get(key).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

const HOLDINGS_WITH_GARBAGE: &str = "\
Name;Class;Value;Yield
Savings account;Cash;12.500,00;2,5
House;Real estate;250.000,00;
Fund A;Funds;8.000,00;
Gold coins;Gold;3.250,40;
BTC wallet;Crypto;1.234,56;
;;;
totals below;;;
???;;;
—;;n/a;
";

#[test]
fn holdings_with_garbage_rows_report_unknowns() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let file = dir.path().join("holdings.csv");
        write_file(&file, HOLDINGS_WITH_GARBAGE.as_bytes());

        let result = run_import(&home, &file);
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(envelope.command, "import");
            let data = envelope.data;
            assert_eq!(as_u64(&data, "addedAssets"), 5);
            assert_eq!(as_u64(&data, "addedLiabilities"), 0);
            assert_eq!(as_u64(&data, "addedMovements"), 0);
            assert_eq!(as_u64(&data, "unknownCount"), 3);
            assert_eq!(as_u64(&data, "totalRowsRead"), 8);
            assert!(data.get("sampleUnknownRow").is_some_and(Value::is_object));
            assert_eq!(data.get("sourceFormat").and_then(Value::as_str), Some("delimited"));
        }

        let totals = run_summary(&home);
        assert!(totals.is_some());
        if let Some(data) = totals {
            assert!((as_f64(&data, "totalAssets") - 274_984.96).abs() < 1e-6);
            assert!((as_f64(&data, "passiveIncomeGross") - 312.5).abs() < 1e-6);
        }
    }
}

#[test]
fn reimporting_the_same_file_adds_nothing() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let file = dir.path().join("statement.csv");
        write_file(
            &file,
            b"Data;Descricao;Montante;Categoria\n15/01/2025;Salario;2.500,00;Salary\n20/01/2025;Supermercado;-45,10;Food\n20/01/2025;Supermercado;-45,10;Food\n",
        );

        let first = run_import(&home, &file);
        assert!(first.is_ok());
        if let Ok(envelope) = first {
            assert_eq!(as_u64(&envelope.data, "addedMovements"), 3);
            assert_eq!(envelope.data.get("stateWritten").and_then(Value::as_bool), Some(true));
        }

        let second = run_import(&home, &file);
        assert!(second.is_ok());
        if let Ok(envelope) = second {
            assert_eq!(as_u64(&envelope.data, "addedMovements"), 0);
            assert_eq!(as_u64(&envelope.data, "duplicateMovements"), 3);
            assert_eq!(envelope.data.get("stateWritten").and_then(Value::as_bool), Some(false));
        }

        let totals = run_summary(&home);
        if let Some(data) = totals {
            assert_eq!(as_u64(&data, "transactionCount"), 3);
        }
    }
}

#[test]
fn undated_movements_are_flagged_in_warnings() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let file = dir.path().join("undated.csv");
        write_file(
            &file,
            b"Type,Date,Description,Amount\nexpense,,Cash withdrawal,40\nexpense,2025-01-02,Coffee,3.20\n",
        );

        let imported = run_import(&home, &file);
        assert!(imported.is_ok());
        if let Ok(envelope) = imported {
            assert_eq!(as_u64(&envelope.data, "addedMovements"), 2);
            let warnings = envelope
                .data
                .get("warnings")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            assert_eq!(warnings.len(), 1);
            let text = warnings[0].as_str().unwrap_or_default();
            assert!(text.starts_with("1 movement(s) had no readable date and were dated 2025-06-01"));
        }
    }
}

#[test]
fn csv_export_reimports_to_the_same_totals() {
    let first = temp_home();
    let second = temp_home();
    assert!(first.is_ok() && second.is_ok());
    if let (Ok((dir, home_a)), Ok((_other, home_b))) = (first, second) {
        let file = dir.path().join("mixed.csv");
        write_file(
            &file,
            "\
Type,Name,Class,Value,Date,Amount,Category,Notes,Income type,Income value
asset,\"Flat, Lisbon\",Real estate,\"310,000.00\",,,,\"rented
two-year lease\",rent_per_month,1100
asset,Broker cash,Cash,1520.75,,,,,,
asset,Vanguard Total Bond,Funds,10000,,,,fixed rate,yield_pct,3.5
asset,Total Return ETF,ETFs,4200,,,,,amount_per_year,120
liability,Mortgage,Mortgage,\"180,000\",,,,fixed rate,,
income,,,,2025-02-01,2500,Salary,February,,
expense,,,,2025-02-03,81.3,Food,Rate update,,
"
            .as_bytes(),
        );
        assert!(run_import(&home_a, &file).is_ok());

        let exported = export::run_with_options(ExportOptions {
            format: ExportFormat::Csv,
            home_override: Some(&home_a),
        });
        assert!(exported.is_ok());
        let content = exported
            .ok()
            .and_then(|envelope| envelope.data.get("content").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();
        assert!(content.starts_with("type,class,name,value"));

        let export_file = dir.path().join("export.csv");
        write_file(&export_file, content.as_bytes());
        let reimport = run_import(&home_b, &export_file);
        assert!(reimport.is_ok());
        if let Ok(envelope) = reimport {
            assert_eq!(as_u64(&envelope.data, "addedAssets"), 4);
            assert_eq!(as_u64(&envelope.data, "addedLiabilities"), 1);
            assert_eq!(as_u64(&envelope.data, "addedMovements"), 2);
            assert_eq!(as_u64(&envelope.data, "unknownCount"), 0);
            let sections = envelope.data.get("sections").and_then(Value::as_array).map_or(0, Vec::len);
            assert_eq!(sections, 2);
        }

        let before = run_summary(&home_a);
        let after = run_summary(&home_b);
        assert!(before.is_some() && after.is_some());
        if let (Some(a), Some(b)) = (before, after) {
            for key in ["totalAssets", "totalLiabilities", "netWorth", "passiveIncomeGross"] {
                assert!((as_f64(&a, key) - as_f64(&b, key)).abs() < 1e-6);
            }
            assert!((as_f64(&b, "totalAssets") - 325_720.75).abs() < 1e-6);
            assert!((as_f64(&b, "passiveIncomeGross") - 13_670.0).abs() < 1e-6);
            assert_eq!(as_u64(&a, "transactionCount"), as_u64(&b, "transactionCount"));
        }
    }
}

#[test]
fn trades_flush_into_position_assets() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let file = dir.path().join("trades.csv");
        write_file(
            &file,
            b"Trade date,Symbol,Side,Quantity,Price,Commission,Currency\n2025-01-02,AAPL,buy,10,100,1,USD\n2025-02-02,AAPL,buy,5,110,0,USD\n2025-03-02,AAPL,sell,8,120,1,USD\n2025-03-05,TSLA,buy,1,200,0,USD\n2025-03-06,TSLA,sell,3,210,0,USD\n",
        );

        let result = run_import(&home, &file);
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            let data = envelope.data;
            assert_eq!(as_u64(&data, "tradeRows"), 5);
            assert_eq!(as_u64(&data, "addedAssets"), 1);
            let positions = data.get("positions").and_then(Value::as_array).cloned().unwrap_or_default();
            assert_eq!(positions.len(), 2);
        }

        let totals = run_summary(&home);
        if let Some(data) = totals {
            assert!((as_f64(&data, "totalAssets") - 724.333_333_333).abs() < 1e-6);
        }
    }
}

#[test]
fn latin1_semicolon_file_is_decoded() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let file = dir.path().join("extrato.csv");
        write_file(
            &file,
            b"Data;Descri\xE7\xE3o;Montante\n02/03/2025;Pagamento servi\xE7os;-12,40\n",
        );
        let result = run_import(&home, &file);
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(as_u64(&envelope.data, "addedMovements"), 1);
            assert_eq!(envelope.data.get("encoding").and_then(Value::as_str), Some("windows-1252"));
        }
    }
}

#[test]
fn empty_or_undecodable_files_are_not_errors() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let empty = dir.path().join("empty.csv");
        write_file(&empty, b"");
        let result = run_import(&home, &empty);
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(as_u64(&envelope.data, "totalRowsRead"), 0);
            let warnings = envelope.data.get("warnings").and_then(Value::as_array).map_or(0, Vec::len);
            assert!(warnings > 0);
        }

        let broken = dir.path().join("broken.xlsx");
        write_file(&broken, b"definitely not a workbook");
        let result = run_import(&home, &broken);
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            assert_eq!(as_u64(&envelope.data, "addedAssets"), 0);
            assert_eq!(envelope.data.get("sourceFormat").and_then(Value::as_str), Some("spreadsheet"));
        }
    }
}

#[test]
fn missing_file_is_an_error_with_recovery_steps() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let result = run_import(&home, &dir.path().join("missing.csv"));
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "import_source_unreadable");
            let failure = failure_from_error(&error);
            assert!(!failure.ok);
            assert!(!failure.error.recovery_steps.is_empty());
        }
    }
}

#[test]
fn corrupt_state_blob_is_reported_not_overwritten() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let setup = ensure_initialized_at(&home);
        assert!(setup.is_ok());
        if let Ok(context) = setup {
            let store = context.open_store();
            assert!(store.is_ok());
            if let Ok(mut store) = store {
                assert!(store.set(STATE_KEY, "{\"assets\": [").is_ok());
            }
        }

        let file = dir.path().join("holdings.csv");
        write_file(&file, HOLDINGS_WITH_GARBAGE.as_bytes());
        let result = run_import(&home, &file);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "state_corrupt");
        }
    }
}
