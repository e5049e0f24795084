/// Extracts statement text from a PDF, turning column gaps into tabs.
pub(crate) fn pdf_text(bytes: &[u8]) -> Result<String, String> {
    if !bytes.starts_with(b"%PDF") {
        return Err("File does not start with a PDF header.".to_string());
    }
    let raw = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|error| format!("Could not extract PDF text: {error}"))?;
    Ok(columnize(&raw))
}

/// Runs of two or more spaces become a tab; single spaces stay inside cells.
pub(crate) fn columnize(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let mut out = String::with_capacity(line.len());
            let mut spaces = 0usize;
            for ch in line.trim().chars() {
                if ch == ' ' || ch == '\u{a0}' {
                    spaces += 1;
                    continue;
                }
                match spaces {
                    0 => {}
                    1 => out.push(' '),
                    _ => out.push('\t'),
                }
                spaces = 0;
                out.push(ch);
            }
            out
        })
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{columnize, pdf_text};

    #[test]
    fn wide_gaps_become_tabs() {
        let text = columnize("  Data      Descrição     Montante  \n15/01/2025  Supermercado Pingo  -45,10");
        assert_eq!(
            text,
            "Data\tDescrição\tMontante\n15/01/2025\tSupermercado Pingo\t-45,10"
        );
    }

    #[test]
    fn non_pdf_bytes_fail_softly() {
        assert!(pdf_text(b"plain text").is_err());
    }
}
