//! Upload readers and report export.
//!
//! Excel-family files go through calamine, CSV through the `csv` crate. Both
//! produce a [`Table`] whose first row became the header. Reports are written
//! with rust_xlsxwriter.

use std::collections::HashMap;
use std::path::Path;

use monthend_recon::{Cell, Table, Upload};

pub mod csv;
pub mod error;
pub mod xlsx;

pub use error::IoError;
pub use xlsx::{export_report, write_report, ExportResult};

const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Read one upload, choosing the reader by file extension.
pub fn read_upload(path: &Path) -> Result<Upload, IoError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let table = if EXCEL_EXTENSIONS.contains(&ext.as_str()) {
        xlsx::import(path)?
    } else if ext == "csv" {
        csv::import(path)?
    } else {
        return Err(IoError::UnsupportedFormat(path.display().to_string()));
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    tracing::debug!(file = %name, rows = table.len(), columns = table.width(), "read upload");
    Ok(Upload::new(name, table))
}

/// Header cells to column names. Blank headers become `Unnamed: <i>`; repeats
/// get a `.1`, `.2`, ... suffix so every name stays addressable.
pub(crate) fn header_names(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.trim();
            let name = if name.is_empty() {
                format!("Unnamed: {i}")
            } else {
                name.to_string()
            };
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            unique
        })
        .collect()
}

/// Build a table from a header row and data rows, dropping trailing blank rows.
pub(crate) fn build_table(header: Vec<String>, mut rows: Vec<Vec<Cell>>) -> Table {
    while rows.last().is_some_and(|row| row.iter().all(Cell::is_empty)) {
        rows.pop();
    }
    Table::with_rows(header_names(header), rows)
}
