use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::tempdir;

const EXPECTED_ROOT_HELP: &str = "Nestegg - local net worth and cash flow ledger

Usage:
  nestegg <command>

Start here:
  nestegg import --help
  nestegg summary
";

struct CliRun {
    code: Option<i32>,
    stdout: String,
}

fn run_cli_in_home(home: &Path, args: &[&str]) -> CliRun {
    let mut command = Command::new(env!("CARGO_BIN_EXE_nestegg"));
    command.args(args);
    command.env("NESTEGG_HOME", home);
    command.env_remove("NESTEGG_LOG");
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let output = command.output();
    assert!(output.is_ok());
    match output {
        Ok(result) => CliRun {
            code: result.status.code(),
            stdout: String::from_utf8_lossy(&result.stdout).into_owned(),
        },
        Err(_) => CliRun {
            code: None,
            stdout: String::new(),
        },
    }
}

fn parse_json(text: &str) -> Value {
    let parsed = serde_json::from_str::<Value>(text);
    assert!(parsed.is_ok(), "stdout was not JSON: {text}");
    parsed.unwrap_or(Value::Null)
}

#[test]
fn bare_invocation_prints_root_help() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(dir) = temp {
        let run = run_cli_in_home(&dir.path().join("home"), &[]);
        assert_eq!(run.code, Some(0));
        assert_eq!(run.stdout, EXPECTED_ROOT_HELP);
    }
}

#[test]
fn top_level_help_lists_every_command() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(dir) = temp {
        let run = run_cli_in_home(&dir.path().join("home"), &["--help"]);
        assert_eq!(run.code, Some(0));
        for command in ["import", "summary", "cashflow", "snapshot", "export", "restore", "settings"] {
            assert!(run.stdout.contains(&format!("nestegg {command}")));
        }
    }
}

#[test]
fn import_then_summary_json_round_trip() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(dir) = temp {
        let home = dir.path().join("home");
        let file = dir.path().join("holdings.csv");
        assert!(fs::write(&file, "Name;Class;Value\nSavings;Cash;1.500,00\nMortgage;Mortgage;900,00\n").is_ok());
        let path = file.display().to_string();

        let imported = run_cli_in_home(&home, &["import", &path, "--json"]);
        assert_eq!(imported.code, Some(0));
        let body = parse_json(&imported.stdout);
        assert_eq!(body["ok"], Value::Bool(true));
        assert_eq!(body["command"], Value::String("import".to_string()));
        assert_eq!(body["data"]["addedAssets"], Value::from(1));
        assert_eq!(body["data"]["addedLiabilities"], Value::from(1));

        let summary = run_cli_in_home(&home, &["summary", "--json"]);
        assert_eq!(summary.code, Some(0));
        let body = parse_json(&summary.stdout);
        assert_eq!(body["data"]["netWorth"].as_f64(), Some(600.0));
        assert_eq!(body["data"]["currency"], Value::String("EUR".to_string()));
    }
}

#[test]
fn snapshot_is_listed_in_summary_history() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(dir) = temp {
        let home = dir.path().join("home");
        let file = dir.path().join("holdings.csv");
        assert!(fs::write(&file, "Name,Class,Value\nSavings,Cash,2500\n").is_ok());
        let path = file.display().to_string();
        assert_eq!(run_cli_in_home(&home, &["import", &path]).code, Some(0));

        let recorded = run_cli_in_home(&home, &["snapshot", "--month", "2025-02", "--json"]);
        assert_eq!(recorded.code, Some(0));
        let body = parse_json(&recorded.stdout);
        assert_eq!(body["command"], Value::String("snapshot".to_string()));
        assert_eq!(body["data"]["action"], Value::String("recorded".to_string()));

        let text = run_cli_in_home(&home, &["snapshot", "--month", "2025-02"]);
        assert_eq!(text.code, Some(0));
        assert!(text.stdout.starts_with("Snapshot for 2025-02 replaced."));

        let summary = run_cli_in_home(&home, &["summary", "--json"]);
        let body = parse_json(&summary.stdout);
        assert_eq!(body["data"]["history"][0]["ym"], Value::String("2025-02".to_string()));
        assert_eq!(body["data"]["history"][0]["netWorth"].as_f64(), Some(2500.0));
    }
}

#[test]
fn import_text_output_reports_counts() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(dir) = temp {
        let home = dir.path().join("home");
        let file = dir.path().join("statement.csv");
        assert!(fs::write(&file, "Date,Description,Amount\n2025-01-03,Coffee,-3.20\n").is_ok());
        let path = file.display().to_string();

        let run = run_cli_in_home(&home, &["import", &path]);
        assert_eq!(run.code, Some(0));
        assert!(run.stdout.starts_with("Import completed successfully."));
        assert!(run.stdout.contains("Movements added:"));
    }
}

#[test]
fn export_prints_raw_csv() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(dir) = temp {
        let run = run_cli_in_home(&dir.path().join("home"), &["export"]);
        assert_eq!(run.code, Some(0));
        assert!(run.stdout.starts_with("type,class,name,value,income_type,income_value,favorite,notes\n"));
        assert!(run.stdout.contains("type,date,category,amount,notes,recurring,until"));
    }
}

#[test]
fn settings_update_is_persisted() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(dir) = temp {
        let home = dir.path().join("home");
        let updated = run_cli_in_home(&home, &["settings", "--currency", "usd", "--tax-rate", "15", "--json"]);
        assert_eq!(updated.code, Some(0));
        let body = parse_json(&updated.stdout);
        assert_eq!(body["data"]["updated"], Value::Bool(true));

        let shown = run_cli_in_home(&home, &["settings"]);
        assert_eq!(shown.code, Some(0));
        assert!(shown.stdout.starts_with("Current settings."));
        assert!(shown.stdout.contains("USD"));
        assert!(shown.stdout.contains("15%"));
    }
}

#[test]
fn invalid_arguments_exit_with_one() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(dir) = temp {
        let home = dir.path().join("home");

        let bad_month = run_cli_in_home(&home, &["cashflow", "--month", "2025-13", "--json"]);
        assert_eq!(bad_month.code, Some(1));
        let body = parse_json(&bad_month.stdout);
        assert_eq!(body["ok"], Value::Bool(false));
        assert_eq!(body["error"]["code"], Value::String("invalid_argument".to_string()));

        let bad_format = run_cli_in_home(&home, &["export", "--format", "xml"]);
        assert_eq!(bad_format.code, Some(1));
        assert!(bad_format.stdout.contains("invalid_argument"));

        let missing = run_cli_in_home(&home, &["import", "/definitely/not/here.csv"]);
        assert_eq!(missing.code, Some(1));
        assert!(missing.stdout.contains("import_source_unreadable"));
    }
}

#[test]
fn corrupt_store_exits_with_two() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(dir) = temp {
        let home = dir.path().join("home");
        assert!(fs::create_dir_all(&home).is_ok());
        assert!(fs::write(home.join("state.db"), "not-a-sqlite-database").is_ok());

        let run = run_cli_in_home(&home, &["summary", "--json"]);
        assert_eq!(run.code, Some(2));
        let body = parse_json(&run.stdout);
        assert_eq!(body["error"]["code"], Value::String("store_corrupt".to_string()));
    }
}

#[test]
fn restore_replaces_the_ledger() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(dir) = temp {
        let home = dir.path().join("home");
        let backup = dir.path().join("backup.json");
        let document = r#"{
  "version": 1,
  "settings": {"currency": "GBP", "taxRate": 20},
  "assets": [{"id": "ast_1", "class": "Cash", "name": "ISA", "value": 5000}],
  "liabilities": [],
  "transactions": []
}"#;
        assert!(fs::write(&backup, document).is_ok());
        let path = backup.display().to_string();

        let restored = run_cli_in_home(&home, &["restore", &path, "--json"]);
        assert_eq!(restored.code, Some(0));
        let body = parse_json(&restored.stdout);
        assert_eq!(body["data"]["assetCount"], Value::from(1));

        let summary = run_cli_in_home(&home, &["summary", "--json"]);
        let body = parse_json(&summary.stdout);
        assert_eq!(body["data"]["currency"], Value::String("GBP".to_string()));
        assert_eq!(body["data"]["totalAssets"].as_f64(), Some(5000.0));
    }
}
