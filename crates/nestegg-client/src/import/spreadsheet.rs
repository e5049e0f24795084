use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::dates::{excel_serial_to_date, format_iso_date};

/// Rendered cells of one worksheet.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

pub(crate) fn decode_workbook(bytes: &[u8]) -> Result<Vec<SheetGrid>, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|error| format!("Could not open workbook: {error}"))?;

    let mut grids = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|error| format!("Could not read sheet `{name}`: {error}"))?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(render_cell).collect::<Vec<String>>())
            .collect::<Vec<Vec<String>>>();
        grids.push(SheetGrid { name, rows });
    }
    Ok(grids)
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Int(value) => value.to_string(),
        Data::Float(value) => render_float(*value),
        Data::String(value) => value.trim().to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => excel_serial_to_date(value.as_f64())
            .map(|date| format_iso_date(&date))
            .unwrap_or_default(),
        Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

fn render_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Writes a grid as tab-delimited text so it goes through the same detector as
/// delimited files.
pub(crate) fn render_grid_as_text(grid: &SheetGrid) -> Result<String, String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(Vec::new());
    for row in &grid.rows {
        if row.is_empty() {
            writer
                .write_record([""])
                .map_err(|error| error.to_string())?;
            continue;
        }
        writer.write_record(row).map_err(|error| error.to_string())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|error| format!("Could not render sheet `{}`: {error}", grid.name))?;
    String::from_utf8(bytes).map_err(|error| error.to_string())
}

/// Every sheet rendered and joined with a blank line between sheets.
pub(crate) fn workbook_text(bytes: &[u8]) -> Result<String, String> {
    let grids = decode_workbook(bytes)?;
    let mut parts = Vec::with_capacity(grids.len());
    for grid in &grids {
        parts.push(render_grid_as_text(grid)?);
    }
    Ok(parts.join("\n"))
}
