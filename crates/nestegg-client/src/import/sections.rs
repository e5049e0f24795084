use serde::Serialize;
use tracing::debug;

use crate::dates::parse_flexible_date;
use crate::import::aliases::{FieldMap, header_score, normalize_key};
use crate::import::numeric::normalize_number;

pub(crate) const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

const MIN_HEADER_SCORE: usize = 2;
const MIN_HEADER_FIELDS: usize = 3;
/// Letters tolerated in a numeric cell (`1.500,00 EUR`).
const MAX_LETTERS_IN_VALUE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SectionHeader {
    /// Zero-based line index of the header row.
    pub start_line: usize,
    #[serde(serialize_with = "serialize_delimiter")]
    pub delimiter: u8,
    pub header_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawRow {
    pub line: usize,
    pub fields: FieldMap,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DetectedTable {
    pub sections: Vec<SectionHeader>,
    pub rows: Vec<RawRow>,
    pub columns: Vec<String>,
}

pub(crate) fn delimiter_label(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => char::from(other).to_string(),
    }
}

fn serialize_delimiter<S>(delimiter: &u8, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&delimiter_label(*delimiter))
}

/// Splits one record, honoring double quotes and `""` escapes.
pub(crate) fn split_line(line: &str, delimiter: u8) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(|field| field.trim().to_string()).collect(),
        _ => vec![line.trim().to_string()],
    }
}

struct LineSplit {
    score: usize,
    delimiter: u8,
    fields: Vec<String>,
}

/// Amounts and dates only ever appear in data rows.
fn looks_like_value(cell: &str) -> bool {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return false;
    }
    if parse_flexible_date(trimmed).is_some() {
        return true;
    }
    trimmed.chars().filter(|ch| ch.is_alphabetic()).count() <= MAX_LETTERS_IN_VALUE
        && normalize_number(trimmed).is_some()
}

/// Header score of a split, or zero when any cell holds a value.
fn header_like_score(fields: &[String]) -> usize {
    if fields.iter().any(|field| looks_like_value(field)) {
        return 0;
    }
    header_score(fields)
}

fn best_header_split(line: &str) -> Option<LineSplit> {
    let mut best: Option<LineSplit> = None;
    for delimiter in CANDIDATE_DELIMITERS {
        let fields = split_line(line, delimiter);
        let score = header_like_score(&fields);
        if score < MIN_HEADER_SCORE || fields.len() < MIN_HEADER_FIELDS {
            continue;
        }
        let better = match &best {
            Some(current) => (score, fields.len()) > (current.score, current.fields.len()),
            None => true,
        };
        if better {
            best = Some(LineSplit {
                score,
                delimiter,
                fields,
            });
        }
    }
    best
}

fn best_line_score(line: &str) -> usize {
    CANDIDATE_DELIMITERS
        .iter()
        .map(|delimiter| header_like_score(&split_line(line, *delimiter)))
        .max()
        .unwrap_or(0)
}

/// Finds every header row in document order, falling back to the first
/// non-blank line split by whichever delimiter yields the most fields.
pub(crate) fn detect_sections(lines: &[&str]) -> Vec<SectionHeader> {
    let mut sections = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| {
            best_header_split(line).map(|split| SectionHeader {
                start_line: index,
                delimiter: split.delimiter,
                header_fields: split.fields,
            })
        })
        .collect::<Vec<SectionHeader>>();

    if sections.is_empty()
        && let Some((index, line)) = lines
            .iter()
            .enumerate()
            .find(|(_, line)| !line.trim().is_empty())
    {
        let mut chosen = (CANDIDATE_DELIMITERS[0], split_line(line, CANDIDATE_DELIMITERS[0]));
        for delimiter in &CANDIDATE_DELIMITERS[1..] {
            let fields = split_line(line, *delimiter);
            if fields.len() > chosen.1.len() {
                chosen = (*delimiter, fields);
            }
        }
        sections.push(SectionHeader {
            start_line: index,
            delimiter: chosen.0,
            header_fields: chosen.1,
        });
    }

    sections
}

/// One logical record and the physical line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Record {
    line: usize,
    text: String,
}

/// Regroups physical lines so a quoted field may contain line breaks. A quote only
/// opens a field at the start of a line or right after a candidate delimiter.
fn split_records(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut pending: Option<Record> = None;
    let mut inside_quotes = false;

    for (index, line) in text.lines().enumerate() {
        let record = match pending.take() {
            Some(mut open) => {
                open.text.push('\n');
                open.text.push_str(line);
                open
            }
            None => Record {
                line: index,
                text: line.to_string(),
            },
        };
        inside_quotes = ends_inside_quotes(line, inside_quotes);
        if inside_quotes {
            pending = Some(record);
        } else {
            records.push(record);
        }
    }
    if let Some(open) = pending {
        records.push(open);
    }
    records
}

fn ends_inside_quotes(line: &str, mut inside: bool) -> bool {
    let mut previous: Option<char> = None;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if inside {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    inside = false;
                }
            }
        } else if ch == '"'
            && previous.is_none_or(|before| {
                u8::try_from(before).is_ok_and(|byte| CANDIDATE_DELIMITERS.contains(&byte))
            })
        {
            inside = true;
        }
        previous = Some(ch);
    }
    inside
}

/// Splits `text` into sections and zips every data record against its header.
/// Line numbers in the result are physical, zero-based lines.
pub(crate) fn extract_rows(text: &str) -> DetectedTable {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let records = split_records(text);
    let lines = records
        .iter()
        .map(|record| record.text.as_str())
        .collect::<Vec<&str>>();
    let physical_line = |index: usize| records.get(index).map_or(index, |record| record.line);
    let mut sections = detect_sections(&lines);

    let mut rows = Vec::new();
    let mut columns: Vec<String> = Vec::new();

    for (section_index, section) in sections.iter().enumerate() {
        let end = sections
            .get(section_index + 1)
            .map_or(lines.len(), |next| next.start_line);
        let keys = header_keys(&section.header_fields);

        for header in &section.header_fields {
            if !header.is_empty() && !columns.contains(header) {
                columns.push(header.clone());
            }
        }

        debug!(
            start_line = section.start_line,
            delimiter = %delimiter_label(section.delimiter),
            columns = section.header_fields.len(),
            "detected section"
        );

        for (line_index, line) in lines
            .iter()
            .enumerate()
            .take(end)
            .skip(section.start_line + 1)
        {
            if line.trim().is_empty() {
                continue;
            }
            let fields = split_line(line, section.delimiter);
            if fields.len() == 1 && keys.len() > 2 {
                continue;
            }
            if best_line_score(line) >= MIN_HEADER_SCORE {
                break;
            }

            let pairs = keys
                .iter()
                .enumerate()
                .map(|(position, key)| {
                    let value = fields.get(position).cloned().unwrap_or_default();
                    (key.clone(), value)
                })
                .collect::<Vec<(String, String)>>();
            let field_map = FieldMap::from_pairs(pairs);
            if field_map.is_blank() {
                continue;
            }
            rows.push(RawRow {
                line: physical_line(line_index),
                fields: field_map,
            });
        }
    }

    for section in &mut sections {
        section.start_line = physical_line(section.start_line);
    }

    DetectedTable {
        sections,
        rows,
        columns,
    }
}

/// Normalized, unique keys for a header row.
fn header_keys(header_fields: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(header_fields.len());
    for (position, header) in header_fields.iter().enumerate() {
        let mut key = normalize_key(header);
        if key.is_empty() {
            key = format!("column_{}", position + 1);
        }
        if keys.contains(&key) {
            let mut suffix = 2;
            while keys.contains(&format!("{key}_{suffix}")) {
                suffix += 1;
            }
            key = format!("{key}_{suffix}");
        }
        keys.push(key);
    }
    keys
}
