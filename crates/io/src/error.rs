use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported file type: {0} (expected .xlsx, .xlsm, .xls, .xlsb, .ods or .csv)")]
    UnsupportedFormat(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("workbook contains no sheets")]
    NoSheets,

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("sheet '{sheet}' is too large for xlsx ({rows} rows x {cols} columns)")]
    SheetTooLarge { sheet: String, rows: usize, cols: usize },

    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
