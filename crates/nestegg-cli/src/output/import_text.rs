use std::io;

use serde_json::{Map, Value};

use super::format::{self, Align, Column};

const MAX_SAMPLE_FIELDS: usize = 6;

pub fn render_import_run(data: &Value) -> io::Result<String> {
    let object = data
        .as_object()
        .ok_or_else(|| io::Error::other("import output requires an object payload"))?;

    let mut lines = Vec::new();
    let written = get_bool(object, "stateWritten");
    lines.push(if written {
        "Import completed successfully.".to_string()
    } else {
        "Import finished without changes.".to_string()
    });
    if let Some(message) = object.get("message").and_then(Value::as_str) {
        lines.push(message.to_string());
    }

    lines.push(String::new());
    lines.push("Source:".to_string());
    let mut source = vec![
        ("File:", get_str(object, "path").to_string()),
        ("Format:", get_str(object, "sourceFormat").to_string()),
    ];
    if let Some(encoding) = object.get("encoding").and_then(Value::as_str) {
        source.push(("Encoding:", encoding.to_string()));
    }
    source.push(("Rows read:", get_count(object, "totalRowsRead").to_string()));
    lines.extend(format::key_value_rows(&source, 2));

    lines.push(String::new());
    lines.push("Changes:".to_string());
    let changes = [
        ("Assets added:", get_count(object, "addedAssets")),
        ("Assets updated:", get_count(object, "updatedAssets")),
        ("Debts added:", get_count(object, "addedLiabilities")),
        ("Debts updated:", get_count(object, "updatedLiabilities")),
        ("Movements added:", get_count(object, "addedMovements")),
        ("Already present:", get_count(object, "duplicateMovements")),
        ("Trade rows:", get_count(object, "tradeRows")),
        ("Unrecognized rows:", get_count(object, "unknownCount")),
    ]
    .into_iter()
    .map(|(label, count)| (label, count.to_string()))
    .collect::<Vec<(&str, String)>>();
    lines.extend(format::key_value_rows(&changes, 2));

    let positions = render_positions(object);
    if !positions.is_empty() {
        lines.push(String::new());
        lines.push("Positions from trades:".to_string());
        lines.extend(positions);
    }

    let sections = render_sections(object);
    if !sections.is_empty() {
        lines.push(String::new());
        lines.push("Tables found:".to_string());
        lines.extend(sections);
    }

    if let Some(sample) = object.get("sampleUnknownRow").and_then(Value::as_object) {
        lines.push(String::new());
        lines.push("Example of a row that was not recognized:".to_string());
        lines.extend(render_sample_row(sample));
    }

    let warnings = object
        .get("warnings")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_str).collect::<Vec<&str>>())
        .unwrap_or_default();
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings:".to_string());
        for warning in warnings {
            lines.push(format!("  {warning}"));
        }
    }

    lines.push(String::new());
    lines.push("Next step:".to_string());
    lines.push("  nestegg summary".to_string());

    Ok(lines.join("\n"))
}

fn render_positions(object: &Map<String, Value>) -> Vec<String> {
    let rows = object
        .get("positions")
        .and_then(Value::as_array)
        .map(|positions| {
            positions
                .iter()
                .map(|position| {
                    let currency = position.get("currency").and_then(Value::as_str).unwrap_or("");
                    let qty = position.get("qty").and_then(Value::as_f64).unwrap_or(0.0);
                    let average = position
                        .get("averagePrice")
                        .and_then(Value::as_f64)
                        .unwrap_or(0.0);
                    let open = position.get("open").and_then(Value::as_bool).unwrap_or(false);
                    vec![
                        position
                            .get("ticker")
                            .and_then(Value::as_str)
                            .unwrap_or("")
                            .to_string(),
                        format_quantity(qty),
                        format::format_money(average, currency),
                        if open { "open" } else { "closed" }.to_string(),
                    ]
                })
                .collect::<Vec<Vec<String>>>()
        })
        .unwrap_or_default();
    if rows.is_empty() {
        return Vec::new();
    }

    let columns = [
        Column {
            name: "Ticker",
            align: Align::Left,
        },
        Column {
            name: "Quantity",
            align: Align::Right,
        },
        Column {
            name: "Avg price",
            align: Align::Right,
        },
        Column {
            name: "Status",
            align: Align::Left,
        },
    ];
    format::render_table_or_blocks(&columns, &rows, format::terminal_width(), "Position")
}

fn render_sections(object: &Map<String, Value>) -> Vec<String> {
    let sections = object
        .get("sections")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if sections.len() < 2 {
        return Vec::new();
    }

    sections
        .iter()
        .map(|section| {
            let line = section.get("startLine").and_then(Value::as_u64).unwrap_or(0);
            let delimiter = match section.get("delimiter").and_then(Value::as_str) {
                Some("\\t") => "tab",
                Some(other) => other,
                None => "?",
            };
            let fields = section
                .get("headerFields")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            format!("  line {line}: {fields} columns separated by {delimiter}")
        })
        .collect()
}

fn render_sample_row(sample: &Map<String, Value>) -> Vec<String> {
    let mut lines = sample
        .iter()
        .filter_map(|(key, value)| {
            let text = value.as_str()?.trim();
            (!text.is_empty()).then(|| format!("  {key}: {text}"))
        })
        .take(MAX_SAMPLE_FIELDS)
        .collect::<Vec<String>>();
    if lines.is_empty() {
        lines.push("  (all cells empty)".to_string());
    }
    lines
}

fn format_quantity(qty: f64) -> String {
    if qty.fract().abs() < 1e-9 {
        return format!("{qty:.0}");
    }
    let text = format!("{qty:.6}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn get_bool(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn get_str<'a>(object: &'a Map<String, Value>, key: &str) -> &'a str {
    object.get(key).and_then(Value::as_str).unwrap_or("")
}

fn get_count(object: &Map<String, Value>, key: &str) -> u64 {
    object.get(key).and_then(Value::as_u64).unwrap_or(0)
}
