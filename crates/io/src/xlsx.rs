// Excel import (first worksheet) and settlement workbook export

use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::Datelike;
use monthend_recon::normalize::parse_datetime_str;
use monthend_recon::{Cell, Report, Table};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, Worksheet};

use crate::error::IoError;

/// Excel row limit, header included.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import the first worksheet of an Excel file (xlsx, xlsm, xls, xlsb, ods).
pub fn import(path: &Path) -> Result<Table, IoError> {
    let mut workbook = open_workbook_auto(path)?;
    first_sheet(&mut workbook)
}

/// Same as [`import`], from an in-memory file.
pub fn import_from_bytes(bytes: Vec<u8>) -> Result<Table, IoError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    first_sheet(&mut workbook)
}

fn first_sheet<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Table, IoError> {
    let sheet_names = workbook.sheet_names();
    let Some(first) = sheet_names.first() else {
        return Err(IoError::NoSheets);
    };
    let range = workbook.worksheet_range(first)?;
    Ok(range_to_table(&range))
}

fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Table::default();
    };
    let header = header.iter().map(|cell| to_cell(cell).as_text()).collect();
    let data = rows.map(|row| row.iter().map(to_cell).collect()).collect();
    crate::build_table(header, data)
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => Cell::Text(e.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or_else(|| Cell::Number(dt.as_f64()), Cell::DateTime),
        Data::DateTimeIso(s) => parse_datetime_str(s).map_or_else(|| Cell::Text(s.clone()), Cell::DateTime),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Statistics from a report export.
#[derive(Debug, Default, Clone)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub rows_exported: usize,
    pub cells_exported: usize,
    pub export_duration_ms: u128,
}

impl ExportResult {
    pub fn summary(&self) -> String {
        format!(
            "{} sheets, {} rows, {} cells in {}ms",
            self.sheets_exported, self.rows_exported, self.cells_exported, self.export_duration_ms
        )
    }
}

/// Serialize a report to xlsx bytes.
///
/// The document creation time is pinned to the report date, so the same
/// report always serializes to the same bytes.
pub fn export_report(report: &Report) -> Result<(Vec<u8>, ExportResult), IoError> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();

    let mut workbook = Workbook::new();
    let date = report.generated_on;
    let created = ExcelDateTime::from_ymd(
        u16::try_from(date.year()).unwrap_or_default(),
        date.month() as u8,
        date.day() as u8,
    )?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    let header_format = Format::new().set_bold();

    for sheet in &report.sheets {
        let table = &sheet.table;
        if table.len() + 1 > MAX_ROWS || table.width() > MAX_COLS {
            return Err(IoError::SheetTooLarge {
                sheet: sheet.name().to_string(),
                rows: table.len(),
                cols: table.width(),
            });
        }

        let worksheet = workbook.add_worksheet().set_name(sheet.name())?;
        result.cells_exported += write_table(worksheet, table, &header_format)?;
        worksheet.autofit();

        result.rows_exported += table.len();
        result.sheets_exported += 1;
    }

    let bytes = workbook.save_to_buffer()?;
    result.export_duration_ms = start_time.elapsed().as_millis();
    Ok((bytes, result))
}

/// Export a report and write it to `path`.
pub fn write_report(report: &Report, path: &Path) -> Result<ExportResult, IoError> {
    let (bytes, result) = export_report(report)?;
    std::fs::write(path, bytes).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(result)
}

/// Header row plus data rows. Returns the number of non-blank cells written.
fn write_table(worksheet: &mut Worksheet, table: &Table, header_format: &Format) -> Result<usize, IoError> {
    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, header_format)?;
    }

    let mut cells = 0;
    for (row_idx, row) in table.rows().iter().enumerate() {
        let target_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let target_col = col_idx as u16;
            match cell {
                Cell::Empty => continue,
                Cell::Text(s) => worksheet.write_string(target_row, target_col, s)?,
                Cell::Number(n) => worksheet.write_number(target_row, target_col, *n)?,
                Cell::Bool(b) => worksheet.write_boolean(target_row, target_col, *b)?,
                Cell::DateTime(dt) => worksheet.write_string(
                    target_row,
                    target_col,
                    dt.format(DATETIME_FORMAT).to_string(),
                )?,
            };
            cells += 1;
        }
    }
    Ok(cells)
}
