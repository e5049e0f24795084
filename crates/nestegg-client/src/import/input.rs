use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, WINDOWS_1252};
use serde::Serialize;
use tracing::warn;

use crate::import::{pdf, spreadsheet};
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SourceFormat {
    Delimited,
    Spreadsheet,
    Pdf,
}

impl SourceFormat {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Delimited => "delimited",
            Self::Spreadsheet => "spreadsheet",
            Self::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SourceDocument {
    pub path: String,
    pub format: SourceFormat,
    pub bytes: Vec<u8>,
}

/// Text ready for the detector. Decoding problems become warnings, never errors.
#[derive(Debug, Clone, Default)]
pub(crate) struct DecodedSource {
    pub text: String,
    pub encoding: Option<String>,
    pub warnings: Vec<String>,
}

pub(crate) fn read_source(path: &str) -> ClientResult<SourceDocument> {
    let bytes = fs::read(path)
        .map_err(|error| ClientError::import_source_unreadable(path, &error.to_string()))?;
    let format = detect_format(Path::new(path), &bytes);
    Ok(SourceDocument {
        path: path.to_string(),
        format,
        bytes,
    })
}

pub(crate) fn detect_format(path: &Path, bytes: &[u8]) -> SourceFormat {
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("csv" | "txt" | "tsv" | "tab") => return SourceFormat::Delimited,
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => return SourceFormat::Spreadsheet,
        Some("pdf") => return SourceFormat::Pdf,
        _ => {}
    }

    if bytes.starts_with(b"%PDF") {
        SourceFormat::Pdf
    } else if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
        SourceFormat::Spreadsheet
    } else {
        SourceFormat::Delimited
    }
}

pub(crate) fn decode_source(document: &SourceDocument) -> DecodedSource {
    let decoded = match document.format {
        SourceFormat::Delimited => {
            let (text, encoding) = decode_text(&document.bytes);
            Ok((text, Some(encoding)))
        }
        SourceFormat::Spreadsheet => spreadsheet::workbook_text(&document.bytes).map(|text| (text, None)),
        SourceFormat::Pdf => pdf::pdf_text(&document.bytes).map(|text| (text, None)),
    };

    match decoded {
        Ok((text, encoding)) => {
            let mut warnings = Vec::new();
            if text.trim().is_empty() {
                warnings.push(format!("`{}` contains no readable rows.", document.path));
            }
            DecodedSource {
                text,
                encoding,
                warnings,
            }
        }
        Err(detail) => {
            warn!(path = %document.path, format = document.format.as_str(), %detail, "could not decode import source");
            DecodedSource {
                text: String::new(),
                encoding: None,
                warnings: vec![detail],
            }
        }
    }
}

/// BOM first, then strict UTF-8, then Windows-1252 (what spreadsheet apps emit for
/// Western European locales).
pub(crate) fn decode_text(bytes: &[u8]) -> (String, String) {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return (text.into_owned(), encoding.name().to_string());
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), "UTF-8".to_string()),
        Err(_) => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            (text.into_owned(), WINDOWS_1252.name().to_string())
        }
    }
}
