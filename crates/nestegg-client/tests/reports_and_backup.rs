use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use nestegg_client::commands::cashflow::CashflowOptions;
use nestegg_client::commands::export::{ExportFormat, ExportOptions};
use nestegg_client::commands::import::ImportRunOptions;
use nestegg_client::commands::restore::RestoreOptions;
use nestegg_client::commands::settings::SettingsOptions;
use nestegg_client::commands::snapshot::SnapshotOptions;
use nestegg_client::commands::summary::SummaryOptions;
use nestegg_client::commands::{cashflow, export, import, restore, settings, snapshot, summary};
use nestegg_client::model::{Frequency, Recurrence, Transaction, TransactionKind};
use nestegg_client::recurrence::expand_transactions;
use serde_json::Value;
use tempfile::tempdir;

fn temp_home() -> std::io::Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempdir()?;
    let home = dir.path().join("nestegg-home");
    Ok((dir, home))
}

fn import_text(home: &Path, dir: &Path, name: &str, body: &str) {
    let file = dir.join(name);
    assert!(fs::write(&file, body).is_ok());
    let result = import::run_with_options(ImportRunOptions {
        path: file.display().to_string(),
        home_override: Some(home),
        today: NaiveDate::from_ymd_opt(2025, 6, 1),
    });
    assert!(result.is_ok());
}

fn number(data: &Value, key: &str) -> f64 {
    data.get(key).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

#[test]
fn monthly_template_expands_to_two_years() {
    let template = Transaction {
        id: "txn_gym".to_string(),
        kind: TransactionKind::Expense,
        category: "Health".to_string(),
        amount: 35.0,
        date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap_or_default(),
        notes: "Gym".to_string(),
        recurring: Some(Recurrence {
            freq: Frequency::Monthly,
            until: None,
        }),
    };
    let expanded = expand_transactions(&[template]);
    assert_eq!(expanded.len(), 24);
    assert_eq!(expanded[12].date, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap_or_default());
    assert!(expanded.windows(2).all(|pair| pair[0].date < pair[1].date));
}

#[test]
fn cashflow_includes_recurring_instances() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        import_text(
            &home,
            dir.path(),
            "movements.csv",
            "\
type,date,category,amount,notes,recurring,until
expense,2025-01-05,Housing,900,Rent,monthly,
income,2025-03-01,Salary,2500,March pay,,
expense,2025-03-12,Food,120.5,Market,,
",
        );

        let result = cashflow::run_with_options(CashflowOptions {
            month: Some("2025-03".to_string()),
            home_override: Some(&home),
        });
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            let data = envelope.data;
            assert_eq!(data.get("month").and_then(Value::as_str), Some("2025-03"));
            assert!((number(&data, "income") - 2_500.0).abs() < 1e-9);
            assert!((number(&data, "expenses") - 1_020.5).abs() < 1e-9);
            assert!((number(&data, "result") - 1_479.5).abs() < 1e-9);
            let entries = data.get("entries").and_then(Value::as_array).cloned().unwrap_or_default();
            assert_eq!(entries.len(), 3);
            assert!(entries.iter().any(|entry| entry.get("synthetic").and_then(Value::as_bool) == Some(true)));
            let trailing = data.get("trailingMonths").and_then(Value::as_array).map_or(0, Vec::len);
            assert_eq!(trailing, 12);
        }
    }
}

#[test]
fn invalid_month_is_rejected() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let result = cashflow::run_with_options(CashflowOptions {
            month: Some("March".to_string()),
            home_override: Some(&home),
        });
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "invalid_argument");
        }
    }
}

#[test]
fn settings_change_net_passive_income() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        import_text(
            &home,
            dir.path(),
            "holdings.csv",
            "Name,Class,Value,Income type,Income value\nFlat,Real estate,200000,rent_per_month,800\nBonds,Funds,10000,yield_pct,4\n",
        );

        let updated = settings::run_with_options(SettingsOptions {
            currency: Some("usd".to_string()),
            tax_rate: Some(10.0),
            home_override: Some(&home),
        });
        assert!(updated.is_ok());
        if let Ok(envelope) = updated {
            assert_eq!(envelope.data.get("updated").and_then(Value::as_bool), Some(true));
        }

        let result = summary::run_with_options(SummaryOptions {
            home_override: Some(&home),
        });
        assert!(result.is_ok());
        if let Ok(envelope) = result {
            let data = envelope.data;
            assert_eq!(data.get("currency").and_then(Value::as_str), Some("USD"));
            assert!((number(&data, "passiveIncomeGross") - 10_000.0).abs() < 1e-9);
            assert!((number(&data, "passiveIncomeNet") - 9_000.0).abs() < 1e-9);
        }
    }
}

#[test]
fn json_backup_restores_into_a_fresh_home() {
    let source = temp_home();
    let target = temp_home();
    assert!(source.is_ok() && target.is_ok());
    if let (Ok((dir, home_a)), Ok((_other, home_b))) = (source, target) {
        import_text(
            &home_a,
            dir.path(),
            "holdings.csv",
            "Name;Class;Value\nSavings;Cash;1.000,00\nCar loan;Loan;4.000,00\n",
        );

        let exported = export::run_with_options(ExportOptions {
            format: ExportFormat::Json,
            home_override: Some(&home_a),
        });
        assert!(exported.is_ok());
        let content = exported
            .ok()
            .and_then(|envelope| envelope.data.get("content").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();

        let backup = dir.path().join("backup.json");
        assert!(fs::write(&backup, &content).is_ok());
        let restored = restore::run_with_options(RestoreOptions {
            path: backup.display().to_string(),
            home_override: Some(&home_b),
        });
        assert!(restored.is_ok());
        if let Ok(envelope) = restored {
            assert_eq!(envelope.data.get("assetCount").and_then(Value::as_u64), Some(1));
            assert_eq!(envelope.data.get("liabilityCount").and_then(Value::as_u64), Some(1));
        }

        let result = summary::run_with_options(SummaryOptions {
            home_override: Some(&home_b),
        });
        if let Ok(envelope) = result {
            assert!((number(&envelope.data, "netWorth") + 3_000.0).abs() < 1e-9);
        }

        let broken = dir.path().join("broken.json");
        assert!(fs::write(&broken, "{\"assets\": 3}").is_ok());
        let rejected = restore::run_with_options(RestoreOptions {
            path: broken.display().to_string(),
            home_override: Some(&home_b),
        });
        assert!(rejected.is_err());
        if let Err(error) = rejected {
            assert_eq!(error.code, "invalid_backup");
        }
    }
}

fn take_snapshot(home: &Path, month: Option<&str>, clear: bool) -> nestegg_client::ClientResult<Value> {
    snapshot::run_with_options(SnapshotOptions {
        month: month.map(str::to_string),
        clear,
        home_override: Some(home),
    })
    .map(|envelope| envelope.data)
}

#[test]
fn snapshots_record_replace_and_show_in_summary() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        import_text(&home, dir.path(), "start.csv", "Name,Class,Value\nSavings,Cash,1000\n");
        let first = take_snapshot(&home, Some("2025-02"), false);
        assert!(first.is_ok());
        if let Ok(data) = first {
            assert_eq!(data["action"], Value::String("recorded".to_string()));
            assert!((number(&data["snapshot"], "netWorth") - 1_000.0).abs() < 1e-9);
        }

        import_text(&home, dir.path(), "later.csv", "Name,Class,Value\nSavings,Cash,1500\n");
        assert!(take_snapshot(&home, Some("2025-01"), false).is_ok());
        let replaced = take_snapshot(&home, Some("2025-02"), false);
        assert!(replaced.is_ok());
        if let Ok(data) = replaced {
            assert_eq!(data["action"], Value::String("replaced".to_string()));
        }

        let summary = summary::run_with_options(SummaryOptions {
            home_override: Some(&home),
        });
        assert!(summary.is_ok());
        if let Ok(envelope) = summary {
            let history = envelope.data["history"].as_array().cloned().unwrap_or_default();
            assert_eq!(history.len(), 2);
            assert_eq!(history[0]["ym"], Value::String("2025-01".to_string()));
            assert!((number(&history[1], "netWorth") - 1_500.0).abs() < 1e-9);
            assert!((number(&history[1], "assetsTotal") - 1_500.0).abs() < 1e-9);
        }

        let cleared = take_snapshot(&home, None, true);
        assert!(cleared.is_ok());
        if let Ok(data) = cleared {
            assert_eq!(data["action"], Value::String("cleared".to_string()));
            assert_eq!(data["history"].as_array().map_or(usize::MAX, Vec::len), 0);
        }
    }
}

#[test]
fn snapshot_rejects_bad_month_and_conflicting_flags() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        for (month, clear) in [(Some("Feb 2025"), false), (Some("2025-02"), true)] {
            let result = take_snapshot(&home, month, clear);
            assert!(result.is_err());
            if let Err(error) = result {
                assert_eq!(error.code, "invalid_argument");
            }
        }
    }
}
