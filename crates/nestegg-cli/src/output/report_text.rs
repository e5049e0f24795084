use std::io;

use serde_json::{Map, Value};

use super::format::{self, Align, Column, format_money, format_percent};

const MAX_CASHFLOW_ENTRIES: usize = 25;
const MAX_HISTORY_ROWS: usize = 12;

pub fn render_summary(data: &Value) -> io::Result<String> {
    let object = as_object(data, "summary")?;
    let currency = get_str(object, "currency");

    let mut lines = vec!["Net worth".to_string(), String::new()];
    lines.extend(format::key_value_rows(
        &[
            ("Assets:", format_money(get_f64(object, "totalAssets"), currency)),
            ("Debts:", format_money(get_f64(object, "totalLiabilities"), currency)),
            ("Net worth:", format_money(get_f64(object, "netWorth"), currency)),
        ],
        2,
    ));

    for (title, key) in [("Assets by class:", "assetsByClass"), ("Debts by class:", "liabilitiesByClass")] {
        let rows = class_rows(object, key, currency);
        if rows.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(title.to_string());
        let columns = [
            Column {
                name: "Class",
                align: Align::Left,
            },
            Column {
                name: "Items",
                align: Align::Right,
            },
            Column {
                name: "Total",
                align: Align::Right,
            },
        ];
        lines.extend(format::render_table_or_blocks(
            &columns,
            &rows,
            format::terminal_width(),
            "Class",
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Passive income (after {} tax):",
        format_percent(get_f64(object, "taxRate"))
    ));
    lines.extend(format::key_value_rows(
        &[
            ("Gross per year:", format_money(get_f64(object, "passiveIncomeGross"), currency)),
            ("Net per year:", format_money(get_f64(object, "passiveIncomeNet"), currency)),
            (
                "Net per month:",
                format_money(get_f64(object, "passiveIncomeMonthlyNet"), currency),
            ),
        ],
        2,
    ));

    let favorites = favorite_names(object);
    if !favorites.is_empty() {
        lines.push(String::new());
        lines.push("Favorites:".to_string());
        for (name, value) in favorites {
            lines.push(format!("  ★ {name}  {}", format_money(value, currency)));
        }
    }

    let history = render_history(object, currency);
    if !history.is_empty() {
        lines.push(String::new());
        lines.push("History:".to_string());
        lines.extend(history);
    }

    if get_u64(object, "assetCount") == 0 && get_u64(object, "liabilityCount") == 0 {
        lines.push(String::new());
        lines.push("Your ledger is empty. Run `nestegg import <path>` to add holdings.".to_string());
    }

    Ok(lines.join("\n"))
}

pub fn render_cashflow(data: &Value) -> io::Result<String> {
    let object = as_object(data, "cashflow")?;
    let currency = get_str(object, "currency");

    let mut lines = vec![format!("Cash flow for {}", get_str(object, "month")), String::new()];
    lines.extend(format::key_value_rows(
        &[
            ("Income:", format_money(get_f64(object, "income"), currency)),
            ("Expenses:", format_money(get_f64(object, "expenses"), currency)),
            ("Result:", format_money(get_f64(object, "result"), currency)),
        ],
        2,
    ));

    let categories = get_array(object, "expensesByCategory")
        .iter()
        .map(|row| {
            vec![
                row.get("category").and_then(Value::as_str).unwrap_or("").to_string(),
                format_money(row.get("total").and_then(Value::as_f64).unwrap_or(0.0), ""),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    if !categories.is_empty() {
        lines.push(String::new());
        lines.push("Expenses by category:".to_string());
        let columns = [
            Column {
                name: "Category",
                align: Align::Left,
            },
            Column {
                name: "Total",
                align: Align::Right,
            },
        ];
        lines.extend(format::render_table_or_blocks(
            &columns,
            &categories,
            format::terminal_width(),
            "Category",
        ));
    }

    let entries = get_array(object, "entries");
    if entries.is_empty() {
        lines.push(String::new());
        lines.push("No movements fall in this month.".to_string());
    } else {
        lines.push(String::new());
        lines.push("Movements (↻ recurring):".to_string());
        let rows = entries
            .iter()
            .take(MAX_CASHFLOW_ENTRIES)
            .map(entry_row)
            .collect::<Vec<Vec<String>>>();
        let columns = [
            Column {
                name: "Date",
                align: Align::Left,
            },
            Column {
                name: "Category",
                align: Align::Left,
            },
            Column {
                name: "Notes",
                align: Align::Left,
            },
            Column {
                name: "Amount",
                align: Align::Right,
            },
        ];
        lines.extend(format::render_table_or_blocks(
            &columns,
            &rows,
            format::terminal_width(),
            "Movement",
        ));
        if entries.len() > MAX_CASHFLOW_ENTRIES {
            lines.push(format!(
                "  … {} more (use --json for all)",
                entries.len() - MAX_CASHFLOW_ENTRIES
            ));
        }
    }

    let trailing = get_array(object, "trailingMonths");
    if !trailing.is_empty() {
        lines.push(String::new());
        lines.push("Last 12 months:".to_string());
        let rows = trailing
            .iter()
            .map(|month| {
                vec![
                    month.get("month").and_then(Value::as_str).unwrap_or("").to_string(),
                    format_money(month.get("income").and_then(Value::as_f64).unwrap_or(0.0), ""),
                    format_money(month.get("expenses").and_then(Value::as_f64).unwrap_or(0.0), ""),
                    format_money(month.get("result").and_then(Value::as_f64).unwrap_or(0.0), ""),
                ]
            })
            .collect::<Vec<Vec<String>>>();
        let columns = [
            Column {
                name: "Month",
                align: Align::Left,
            },
            Column {
                name: "Income",
                align: Align::Right,
            },
            Column {
                name: "Expenses",
                align: Align::Right,
            },
            Column {
                name: "Result",
                align: Align::Right,
            },
        ];
        lines.extend(format::render_table_or_blocks(
            &columns,
            &rows,
            format::terminal_width(),
            "Month",
        ));
    }

    Ok(lines.join("\n"))
}

pub fn render_restore(data: &Value) -> io::Result<String> {
    let object = as_object(data, "restore")?;
    let mut lines = vec![get_str(object, "message").to_string(), String::new()];
    lines.extend(format::key_value_rows(
        &[
            ("Backup:", get_str(object, "path").to_string()),
            ("Assets:", get_u64(object, "assetCount").to_string()),
            ("Debts:", get_u64(object, "liabilityCount").to_string()),
            ("Movements:", get_u64(object, "transactionCount").to_string()),
        ],
        2,
    ));
    lines.extend(render_settings_rows(object.get("settings")));
    Ok(lines.join("\n"))
}

pub fn render_snapshot(data: &Value) -> io::Result<String> {
    let object = as_object(data, "snapshot")?;
    let currency = get_str(object, "currency");
    let snapshot = object.get("snapshot").and_then(Value::as_object);
    let month = snapshot.map_or("", |values| get_str(values, "ym"));

    let mut lines = vec![match get_str(object, "action") {
        "cleared" => "Snapshot history cleared.".to_string(),
        "replaced" => format!("Snapshot for {month} replaced."),
        _ => format!("Snapshot recorded for {month}."),
    }];

    if let Some(values) = snapshot {
        lines.push(String::new());
        lines.extend(format::key_value_rows(
            &[
                ("Assets:", format_money(get_f64(values, "assetsTotal"), currency)),
                ("Debts:", format_money(get_f64(values, "liabilitiesTotal"), currency)),
                ("Net worth:", format_money(get_f64(values, "netWorth"), currency)),
                (
                    "Passive gross/yr:",
                    format_money(get_f64(values, "passiveGrossAnnual"), currency),
                ),
                (
                    "Passive net/yr:",
                    format_money(get_f64(values, "passiveNetAnnual"), currency),
                ),
            ],
            2,
        ));
    }

    let history = render_history(object, currency);
    if !history.is_empty() {
        lines.push(String::new());
        lines.push("History:".to_string());
        lines.extend(history);
    }
    Ok(lines.join("\n"))
}

pub fn render_settings(data: &Value) -> io::Result<String> {
    let object = as_object(data, "settings")?;
    let mut lines = vec![if get_bool(object, "updated") {
        "Settings updated.".to_string()
    } else {
        "Current settings.".to_string()
    }];
    lines.push(String::new());
    lines.extend(render_settings_rows(object.get("settings")));
    lines.extend(format::key_value_rows(
        &[
            ("Store:", get_str(object, "storePath").to_string()),
            ("Schema:", get_str(object, "schemaVersion").to_string()),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

fn render_settings_rows(settings: Option<&Value>) -> Vec<String> {
    let Some(settings) = settings.and_then(Value::as_object) else {
        return Vec::new();
    };
    format::key_value_rows(
        &[
            ("Currency:", get_str(settings, "currency").to_string()),
            ("Tax rate:", format_percent(get_f64(settings, "taxRate"))),
        ],
        2,
    )
}

/// The most recent snapshots as a table, oldest of them first.
fn render_history(object: &Map<String, Value>, currency: &str) -> Vec<String> {
    let history = get_array(object, "history");
    if history.is_empty() {
        return Vec::new();
    }
    let skipped = history.len().saturating_sub(MAX_HISTORY_ROWS);
    let rows = history
        .iter()
        .skip(skipped)
        .map(|snapshot| {
            vec![
                snapshot.get("ym").and_then(Value::as_str).unwrap_or("").to_string(),
                format_money(snapshot.get("netWorth").and_then(Value::as_f64).unwrap_or(0.0), currency),
                format_money(
                    snapshot
                        .get("passiveNetAnnual")
                        .and_then(Value::as_f64)
                        .unwrap_or(0.0),
                    currency,
                ),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    let columns = [
        Column {
            name: "Month",
            align: Align::Left,
        },
        Column {
            name: "Net worth",
            align: Align::Right,
        },
        Column {
            name: "Passive net/yr",
            align: Align::Right,
        },
    ];
    let mut lines = format::render_table_or_blocks(&columns, &rows, format::terminal_width(), "Month");
    if skipped > 0 {
        lines.push(format!("  … {skipped} earlier months (use --json for all)"));
    }
    lines
}

fn class_rows(object: &Map<String, Value>, key: &str, currency: &str) -> Vec<Vec<String>> {
    get_array(object, key)
        .iter()
        .map(|row| {
            vec![
                row.get("class").and_then(Value::as_str).unwrap_or("").to_string(),
                row.get("count").and_then(Value::as_u64).unwrap_or(0).to_string(),
                format_money(row.get("total").and_then(Value::as_f64).unwrap_or(0.0), currency),
            ]
        })
        .collect()
}

fn favorite_names(object: &Map<String, Value>) -> Vec<(String, f64)> {
    ["favoriteAssets", "favoriteLiabilities"]
        .iter()
        .flat_map(|key| get_array(object, key))
        .map(|item| {
            (
                item.get("name").and_then(Value::as_str).unwrap_or("").to_string(),
                item.get("value").and_then(Value::as_f64).unwrap_or(0.0),
            )
        })
        .collect()
}

fn entry_row(entry: &Value) -> Vec<String> {
    let synthetic = entry.get("synthetic").and_then(Value::as_bool).unwrap_or(false);
    let income = entry.get("kind").and_then(Value::as_str) == Some("income");
    let amount = entry.get("amount").and_then(Value::as_f64).unwrap_or(0.0);
    let date = entry.get("date").and_then(Value::as_str).unwrap_or("");
    vec![
        if synthetic {
            format!("{date} ↻")
        } else {
            date.to_string()
        },
        entry.get("category").and_then(Value::as_str).unwrap_or("").to_string(),
        entry.get("notes").and_then(Value::as_str).unwrap_or("").to_string(),
        format_money(if income { amount } else { -amount }, ""),
    ]
}

fn as_object<'a>(data: &'a Value, command: &str) -> io::Result<&'a Map<String, Value>> {
    data.as_object()
        .ok_or_else(|| io::Error::other(format!("{command} output requires an object payload")))
}

fn get_array<'a>(object: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn get_str<'a>(object: &'a Map<String, Value>, key: &str) -> &'a str {
    object.get(key).and_then(Value::as_str).unwrap_or("")
}

fn get_f64(object: &Map<String, Value>, key: &str) -> f64 {
    object.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn get_u64(object: &Map<String, Value>, key: &str) -> u64 {
    object.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn get_bool(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}
