use chrono::{Datelike, Duration, NaiveDate};

use crate::{ClientError, ClientResult};

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_year_month(date: &NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn add_months_clamped(date: NaiveDate, months: i32) -> NaiveDate {
    let current_month = i32::try_from(date.month()).unwrap_or(1);
    let total = date.year() * 12 + (current_month - 1) + months;
    let year = total.div_euclid(12);
    let month_u32 = u32::try_from(total.rem_euclid(12) + 1).unwrap_or(1);

    let day = date.day().min(days_in_month(year, month_u32));
    if let Some(result) = NaiveDate::from_ymd_opt(year, month_u32, day) {
        return result;
    }
    date
}

pub fn add_years_clamped(date: NaiveDate, years: i32) -> NaiveDate {
    add_months_clamped(date, years.saturating_mul(12))
}

/// Converts a spreadsheet serial day number (1900 date system) to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    #[allow(clippy::cast_possible_truncation)]
    let days = serial.floor() as i64;
    base.checked_add_signed(Duration::days(days))
}

/// Parses the date shapes that show up in bank and broker exports.
///
/// Day-first is preferred for slash/dash/dot dates; month-first is only used when
/// the first part cannot be a month. Two-digit years are read as 20yy.
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim().trim_matches('"');
    if trimmed.is_empty() {
        return None;
    }

    if let Some(serial) = parse_serial(trimmed) {
        return excel_serial_to_date(serial);
    }

    let date_part = match trimmed.get(..11) {
        Some(head) if head.ends_with('T') => &head[..10],
        _ => trimmed,
    };

    let parts = date_part
        .split(|ch: char| matches!(ch, '-' | '/' | '.' | ' ' | ','))
        .filter(|part| !part.is_empty())
        .take(3)
        .collect::<Vec<&str>>();
    if parts.len() < 3 {
        return None;
    }

    let (first, second, third) = (parts[0], parts[1], parts[2]);

    if first.len() == 4 && is_all_digits(first) {
        let year = first.parse::<i32>().ok()?;
        let month = month_from_part(second)?;
        let day = leading_number(third)?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let year = parse_year(third)?;

    if let Some(month) = month_name(first) {
        let day = leading_number(second)?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(month) = month_name(second) {
        let day = leading_number(first)?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let a = leading_number(first)?;
    let b = leading_number(second)?;
    if b <= 12
        && let Some(date) = NaiveDate::from_ymd_opt(year, b, a)
    {
        return Some(date);
    }
    if a <= 12 {
        return NaiveDate::from_ymd_opt(year, a, b);
    }
    None
}

pub fn parse_iso_date_strict(
    value: &str,
    field_name: &str,
    command: &str,
) -> ClientResult<NaiveDate> {
    if !looks_like_iso_date(value) {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with a real calendar date."),
            Some(command),
        ));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with valid calendar values."),
            Some(command),
        )
    })
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_year_month(value: &str, command: &str) -> ClientResult<NaiveDate> {
    let invalid = || {
        ClientError::invalid_argument_for_command(
            "`month` must use YYYY-MM format, for example 2025-03.",
            Some(command),
        )
    };
    let (year_part, month_part) = value.split_once('-').ok_or_else(invalid)?;
    if year_part.len() != 4 || month_part.len() != 2 {
        return Err(invalid());
    }
    let year = year_part.parse::<i32>().map_err(|_| invalid())?;
    let month = month_part.parse::<u32>().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn looks_like_iso_date(value: &str) -> bool {
    if value.len() != 10 {
        return false;
    }
    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return false;
        }
    }
    true
}

fn parse_serial(value: &str) -> Option<f64> {
    if !value.chars().all(|ch| ch.is_ascii_digit() || ch == '.') {
        return None;
    }
    let serial = value.parse::<f64>().ok()?;
    // Plausible spreadsheet dates only (1954..2119), so bare years and amounts stay out.
    if (20_000.0..80_000.0).contains(&serial) {
        Some(serial)
    } else {
        None
    }
}

fn parse_year(part: &str) -> Option<i32> {
    let digits = part
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>();
    match digits.len() {
        2 => digits.parse::<i32>().ok().map(|year| 2000 + year),
        4 => digits.parse::<i32>().ok(),
        _ => None,
    }
}

fn month_from_part(part: &str) -> Option<u32> {
    month_name(part).or_else(|| leading_number(part).filter(|month| (1..=12).contains(month)))
}

fn leading_number(part: &str) -> Option<u32> {
    let digits = part
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>();
    if digits.is_empty() || digits.len() > 2 {
        return None;
    }
    digits.parse::<u32>().ok()
}

fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}

fn month_name(part: &str) -> Option<u32> {
    let lowered = part.to_lowercase();
    let prefix = lowered.chars().take(3).collect::<String>();
    let month = match prefix.as_str() {
        "jan" | "ene" => 1,
        "fev" | "feb" => 2,
        "mar" => 3,
        "abr" | "apr" => 4,
        "mai" | "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "ago" | "aug" => 8,
        "set" | "sep" => 9,
        "out" | "oct" => 10,
        "nov" => 11,
        "dez" | "dec" | "dic" => 12,
        _ => return None,
    };
    Some(month)
}
