//! Value coercions shared by the domain classifiers.
//!
//! Source exports carry trailing summary rows, stray blanks and mixed cell
//! types. Everything here absorbs those: bad dates become `None`, bad
//! quantities become zero. Nothing in this module returns an error except the
//! column lookups.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::SettleError;
use crate::model::Domain;
use crate::table::{Cell, Table};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

/// Brand text before the first `:`, trimmed. Idempotent.
pub fn normalize_brand(raw: &str) -> String {
    raw.split(':').next().unwrap_or_default().trim().to_string()
}

/// Sales channel text after the first `": "`, or the whole value.
pub fn normalize_channel(raw: &str) -> String {
    match raw.split_once(": ") {
        Some((_, rest)) => rest.to_string(),
        None => raw.to_string(),
    }
}

/// Parse a cell into a date-time. Unparseable values are `None`.
pub fn parse_datetime(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(dt) => Some(*dt),
        Cell::Text(s) => parse_datetime_str(s),
        _ => None,
    }
}

pub fn parse_datetime_str(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Numeric quantity; anything non-numeric is zero.
pub fn to_quantity(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(n) if n.is_finite() => *n,
        Cell::Text(s) => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Rewrite the brand column to its normalized form, then drop excluded brands.
pub fn exclude_brands(
    table: &mut Table,
    domain: Domain,
    brand_col: &str,
    excluded: &BTreeSet<String>,
) -> Result<(), SettleError> {
    let idx = table.require_column(domain, brand_col)?;
    table.map_column(idx, |cell| Cell::Text(normalize_brand(&cell.as_text())));
    table.retain_rows(|row| match &row[idx] {
        Cell::Text(brand) => !excluded.contains(brand),
        _ => true,
    });
    Ok(())
}
