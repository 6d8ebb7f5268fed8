//! Previous-month windowing.
//!
//! Every domain table is cut down to the calendar month before the run date
//! before any classification happens.

use chrono::{Datelike, NaiveDate};

use crate::normalize::parse_datetime;
use crate::table::{Cell, Table};

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportPeriod {
    pub year: i32,
    pub month: u32,
}

impl ReportPeriod {
    /// The calendar month immediately before `today`'s month.
    pub fn preceding(today: NaiveDate) -> Self {
        if today.month() == 1 {
            Self {
                year: today.year() - 1,
                month: 12,
            }
        } else {
            Self {
                year: today.year(),
                month: today.month() - 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        next.and_then(|d| d.pred_opt()).unwrap_or_default()
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Rows of `table` dated inside `period`.
///
/// A table with more than one row loses its last row first (exports end with
/// a summary line). Rows whose date does not parse are dropped. A missing date
/// column or empty input yields an empty table. Kept rows carry the parsed
/// date-time in the date column.
pub fn filter_previous_month(table: &Table, date_col: &str, period: ReportPeriod) -> Table {
    let Some(idx) = table.column_index(date_col) else {
        return Table::default();
    };
    if table.is_empty() {
        return Table::default();
    }

    let mut out = table.clone();
    if out.len() > 1 {
        out.drop_last_row();
    }
    out.map_column(idx, |cell| parse_datetime(cell).map_or(Cell::Empty, Cell::DateTime));
    out.retain_rows(|row| match &row[idx] {
        Cell::DateTime(dt) => period.contains(dt.date()),
        _ => false,
    });
    out
}
