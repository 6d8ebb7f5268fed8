use std::fmt;

use chrono::NaiveDateTime;

use crate::error::SettleError;
use crate::model::Domain;

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A loosely typed spreadsheet value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Text rendering used for comparisons and string normalization.
    pub fn as_text(&self) -> String {
        self.to_string()
    }

    /// True when the text rendering equals `value`.
    pub fn text_eq(&self, value: &str) -> bool {
        match self {
            Self::Text(s) => s == value,
            other => other.to_string() == value,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Self::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<Option<String>> for Cell {
    fn from(s: Option<String>) -> Self {
        s.map_or(Self::Empty, Self::Text)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Ordered columns plus rows of cells. Every row has the table's width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<Cell>>,
    ) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Index of the first column with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Like `column_index`, but a missing column is a `MissingColumn` error.
    pub fn require_column(&self, domain: Domain, name: &str) -> Result<usize, SettleError> {
        self.column_index(name).ok_or_else(|| SettleError::MissingColumn {
            domain,
            column: name.to_string(),
        })
    }

    /// Append a row, padding with `Empty` or truncating to the table width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |r| &r[idx])
    }

    /// Replace the values of an existing column, or append a new one.
    /// `values` must have one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Set every row of `name` to the same value.
    pub fn fill_column(&mut self, name: &str, value: Cell) {
        let values = vec![value; self.rows.len()];
        self.set_column(name, values);
    }

    /// Rewrite one column cell by cell.
    pub fn map_column(&mut self, idx: usize, mut f: impl FnMut(&Cell) -> Cell) {
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Cell]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Split into (matching, non-matching), preserving row order in both.
    pub fn partition(self, mut pred: impl FnMut(&[Cell]) -> bool) -> (Table, Table) {
        let mut yes = Table::new(self.columns.clone());
        let mut no = Table::new(self.columns);
        for row in self.rows {
            if pred(&row) {
                yes.rows.push(row);
            } else {
                no.rows.push(row);
            }
        }
        (yes, no)
    }

    /// Drop the final row.
    pub fn drop_last_row(&mut self) {
        self.rows.pop();
    }

    /// Rename columns in place.
    pub fn rename_columns(&mut self, mut f: impl FnMut(&str) -> Option<String>) {
        for column in &mut self.columns {
            if let Some(renamed) = f(column) {
                *column = renamed;
            }
        }
    }

    /// Project onto `layout`, in that order. A column missing from the table
    /// is materialized as `Empty`. Duplicate source names resolve to the first.
    pub fn select(&self, layout: &[&str]) -> Table {
        let indices: Vec<Option<usize>> = layout.iter().map(|c| self.column_index(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|idx| idx.map_or(Cell::Empty, |i| row[i].clone()))
                    .collect()
            })
            .collect();
        Table {
            columns: layout.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    /// Stack tables, aligning columns by name. Resulting columns are the union
    /// in first-seen order; cells a part lacks become `Empty`.
    pub fn concat(parts: impl IntoIterator<Item = Table>) -> Table {
        let mut out = Table::default();
        for part in parts {
            for column in &part.columns {
                if !out.has_column(column) {
                    out.columns.push(column.clone());
                    for row in &mut out.rows {
                        row.push(Cell::Empty);
                    }
                }
            }
            let mapping: Vec<usize> = part
                .columns
                .iter()
                .map(|c| out.column_index(c).unwrap_or_default())
                .collect();
            for row in part.rows {
                let mut merged = vec![Cell::Empty; out.columns.len()];
                for (value, &target) in row.into_iter().zip(&mapping) {
                    if merged[target].is_empty() {
                        merged[target] = value;
                    }
                }
                out.rows.push(merged);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::with_rows(
            ["a", "b"],
            vec![
                vec![Cell::from("x"), Cell::from(1.0)],
                vec![Cell::from("y"), Cell::from(2.5)],
                vec![Cell::from("z")],
            ],
        )
    }

    #[test]
    fn short_rows_are_padded() {
        let t = sample();
        assert_eq!(t.len(), 3);
        assert_eq!(t.rows()[2][1], Cell::Empty);
    }

    #[test]
    fn number_rendering_drops_integral_fraction() {
        assert_eq!(Cell::Number(3.0).as_text(), "3");
        assert_eq!(Cell::Number(2.5).as_text(), "2.5");
        assert_eq!(Cell::Empty.as_text(), "");
        assert!(Cell::Number(12.0).text_eq("12"));
    }

    #[test]
    fn select_fills_missing_columns() {
        let t = sample().select(&["b", "missing", "a"]);
        assert_eq!(t.columns(), &["b", "missing", "a"]);
        assert_eq!(t.rows()[0], vec![Cell::Number(1.0), Cell::Empty, Cell::from("x")]);
    }

    #[test]
    fn partition_keeps_order() {
        let (yes, no) = sample().partition(|r| r[0].text_eq("y"));
        assert_eq!(yes.len(), 1);
        assert_eq!(no.len(), 2);
        assert_eq!(no.rows()[1][0], Cell::from("z"));
    }

    #[test]
    fn concat_aligns_by_name() {
        let left = Table::with_rows(["a", "b"], vec![vec![Cell::from("1"), Cell::from("2")]]);
        let right = Table::with_rows(["b", "c"], vec![vec![Cell::from("3"), Cell::from("4")]]);
        let t = Table::concat([left, right]);
        assert_eq!(t.columns(), &["a", "b", "c"]);
        assert_eq!(t.rows()[0], vec![Cell::from("1"), Cell::from("2"), Cell::Empty]);
        assert_eq!(t.rows()[1], vec![Cell::Empty, Cell::from("3"), Cell::from("4")]);
    }

    #[test]
    fn set_column_replaces_or_appends() {
        let mut t = sample();
        t.fill_column("b", Cell::Number(0.0));
        t.fill_column("c", Cell::from("new"));
        assert_eq!(t.columns(), &["a", "b", "c"]);
        assert!(t.rows().iter().all(|r| r[1] == Cell::Number(0.0)));
        assert_eq!(t.cell(2, "c"), Some(&Cell::from("new")));
    }

    #[test]
    fn require_column_reports_domain() {
        let err = sample().require_column(Domain::Shipping, "zz").unwrap_err();
        assert!(err.to_string().contains("'zz'"));
    }
}
