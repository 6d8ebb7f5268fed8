//! Receiving classification.
//!
//! Free receipts (configured receiving types) keep their quantity and take
//! their new-category from the detail part of the original category text.
//! Everything else that survives the peculiar filters is booked as a return
//! with a negative quantity.

use crate::config::{ColumnMap, ReceivingRules, SettlementConfig};
use crate::error::SettleError;
use crate::finalize::{self, CATEGORY, NEW_CATEGORY, QUANTITY, RECEIVING_COLUMNS, SOURCE_UNIT};
use crate::model::{Domain, ReceivingOutput};
use crate::normalize::{exclude_brands, to_quantity};
use crate::period::{filter_previous_month, ReportPeriod};
use crate::returns::RETURN_CATEGORY;
use crate::table::{Cell, Table};

/// Separator between the category and its detail, e.g. `무상 : 샘플`.
const CATEGORY_SEPARATOR: &str = " : ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Free,
    Peculiar,
}

pub fn classify_receiving(
    raw: &Table,
    config: &SettlementConfig,
    period: ReportPeriod,
) -> Result<ReceivingOutput, SettleError> {
    let rules = &config.rules.receiving;

    let mut table = filter_previous_month(raw, &rules.date_col, period);
    if table.is_empty() {
        return Ok(ReceivingOutput::default());
    }

    exclude_brands(&mut table, Domain::Receiving, &rules.brand_col, &config.general.excluded_brands)?;
    let type_idx = table.require_column(Domain::Receiving, &rules.type_col)?;
    table.require_column(Domain::Receiving, &rules.qty_col)?;

    let (free, mut peculiar) =
        table.partition(|row| rules.free_types.contains(&row[type_idx].as_text()));
    for filter in &rules.peculiar_filters {
        filter.apply(&mut peculiar, Domain::Receiving)?;
    }

    Ok(ReceivingOutput {
        peculiar: finalize_bucket(peculiar, &rules.final_columns_peculiar, rules, Bucket::Peculiar),
        free: finalize_bucket(free, &rules.final_columns_free, rules, Bucket::Free),
    })
}

fn finalize_bucket(mut table: Table, map: &ColumnMap, rules: &ReceivingRules, bucket: Bucket) -> Table {
    // Read before renaming; the source and canonical quantity names can collide.
    let original: Vec<f64> = match table.column_index(&rules.qty_col) {
        Some(idx) => table.column_values(idx).map(to_quantity).collect(),
        None => vec![0.0; table.len()],
    };

    finalize::rename_columns(&mut table, map, &[rules.qty_col.as_str(), SOURCE_UNIT]);

    let (quantities, categories): (Vec<Cell>, Vec<Cell>) = match bucket {
        Bucket::Free => {
            let details = match table.column_index(CATEGORY) {
                Some(idx) => table.column_values(idx).map(category_detail).collect(),
                None => vec![Cell::Empty; table.len()],
            };
            (original.into_iter().map(Cell::Number).collect(), details)
        }
        Bucket::Peculiar => (
            original.into_iter().map(|q| Cell::Number(-q.abs())).collect(),
            vec![Cell::from(RETURN_CATEGORY); table.len()],
        ),
    };
    table.set_column(QUANTITY, quantities);
    table.set_column(NEW_CATEGORY, categories);
    finalize::stamp(&mut table, &rules.source_label);

    table.select(&RECEIVING_COLUMNS)
}

/// Second `" : "` segment of a category, blank when there is none.
fn category_detail(cell: &Cell) -> Cell {
    let detail = cell
        .as_str()
        .and_then(|s| s.split(CATEGORY_SEPARATOR).nth(1))
        .map(str::to_string);
    Cell::from(detail)
}
