// CSV import

use std::path::Path;

use monthend_recon::{Cell, Table};

use crate::error::IoError;

pub fn import(path: &Path) -> Result<Table, IoError> {
    let bytes = std::fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    import_from_bytes(&bytes)
}

pub fn import_from_bytes(bytes: &[u8]) -> Result<Table, IoError> {
    let content = decode(bytes);
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter)
}

/// Decode file bytes to text. UTF-8 (with or without BOM) is used as is;
/// anything else is taken as EUC-KR, the encoding Korean Excel writes CSV in.
pub fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, had_errors) = encoding_rs::EUC_KR.decode(bytes);
            if had_errors {
                tracing::warn!("CSV is neither UTF-8 nor EUC-KR; undecodable bytes were replaced");
            }
            decoded.into_owned()
        }
    }
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        let Some(&target) = counts.first() else {
            continue;
        };
        if target <= 1 {
            continue;
        }

        // Lines agreeing with the header, weighted by field count
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn import_from_string(content: &str, delimiter: u8) -> Result<Table, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => return Ok(Table::default()),
    };

    let mut rows = Vec::new();
    for result in records {
        let record = result?;
        rows.push(record.iter().map(to_cell).collect());
    }

    Ok(crate::build_table(header, rows))
}

fn to_cell(field: &str) -> Cell {
    if field.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(field.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_semicolon_and_tab() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a,b\n1,2\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn euc_kr_content_is_decoded() {
        let (encoded, _, _) = encoding_rs::EUC_KR.encode("[택배사],수량\nCJ대한통운,3\n");
        assert!(std::str::from_utf8(&encoded).is_err());
        let table = import_from_bytes(&encoded).unwrap();
        assert_eq!(table.columns(), &["[택배사]", "수량"]);
        assert_eq!(table.cell(0, "[택배사]"), Some(&Cell::from("CJ대한통운")));
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let table = import_from_bytes("\u{feff}일자,수량\n2026-09-01,1\n".as_bytes()).unwrap();
        assert_eq!(table.columns()[0], "일자");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn blank_fields_are_empty_and_short_rows_padded() {
        let table = import_from_bytes(b"a,b,c\n1,,3\n4\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][1], Cell::Empty);
        assert_eq!(table.rows()[1], vec![Cell::from("4"), Cell::Empty, Cell::Empty]);
    }

    #[test]
    fn header_only_file_is_empty_table() {
        let table = import_from_bytes(b"a,b\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.width(), 2);
    }
}
