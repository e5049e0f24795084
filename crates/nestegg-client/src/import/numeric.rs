/// Parses a locale-ambiguous numeric string.
///
/// Currency symbols, percent signs and any other non-numeric noise are ignored.
/// Wrapping parentheses or a minus sign anywhere make the result negative (once).
/// Separator roles are inferred from position: when both `,` and `.` appear the
/// last one is the decimal point; a lone `,` is decimal only before 1-2 trailing
/// digits; a lone `.` is decimal unless it repeats without a short trailing group.
pub(crate) fn normalize_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let wrapped_in_parens = trimmed.starts_with('(') && trimmed.ends_with(')');
    let has_minus = trimmed.chars().any(|ch| matches!(ch, '-' | '\u{2212}'));

    let cleaned = trimmed
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, ',' | '.'))
        .collect::<String>();
    if !cleaned.chars().any(|ch| ch.is_ascii_digit()) {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let decimal_at = match (last_comma, last_dot) {
        (Some(comma), Some(dot)) => Some(comma.max(dot)),
        (Some(comma), None) => short_trailing_group(&cleaned, comma).then_some(comma),
        (None, Some(dot)) => {
            let dot_count = cleaned.matches('.').count();
            if dot_count == 1 || short_trailing_group(&cleaned, dot) {
                Some(dot)
            } else {
                None
            }
        }
        (None, None) => None,
    };

    let canonical = match decimal_at {
        Some(position) => {
            let integer_part = digits_only(&cleaned[..position]);
            let fraction_part = digits_only(&cleaned[position + 1..]);
            match (integer_part.is_empty(), fraction_part.is_empty()) {
                (true, _) => format!("0.{fraction_part}"),
                (false, true) => integer_part,
                (false, false) => format!("{integer_part}.{fraction_part}"),
            }
        }
        None => digits_only(&cleaned),
    };

    let magnitude = canonical.parse::<f64>().ok().filter(|value| value.is_finite())?;
    if has_minus || wrapped_in_parens {
        Some(-magnitude)
    } else {
        Some(magnitude)
    }
}

/// Convenience for fields where only the magnitude matters.
pub(crate) fn normalize_magnitude(raw: &str) -> Option<f64> {
    normalize_number(raw).map(f64::abs)
}

fn short_trailing_group(cleaned: &str, separator_at: usize) -> bool {
    let tail = &cleaned[separator_at + 1..];
    (1..=2).contains(&tail.len()) && tail.chars().all(|ch| ch.is_ascii_digit())
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}
