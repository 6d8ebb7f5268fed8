//! Shipping classification.
//!
//! Windowed rows go through brand exclusion and the configured filters, then
//! split three ways: a type anomaly when the shipment type is not normal, a
//! mall anomaly when the channel is not in the allow-list, main otherwise.

use crate::config::{SettlementConfig, ShippingRules};
use crate::error::SettleError;
use crate::finalize::{self, NEW_CATEGORY, SETTLEMENT_COLUMNS, TYPE_ANOMALY_COLUMNS};
use crate::model::{Domain, ShippingOutput};
use crate::normalize::{exclude_brands, normalize_channel, to_quantity};
use crate::period::{filter_previous_month, ReportPeriod};
use crate::table::{Cell, Table};

pub fn classify_shipping(
    raw: &Table,
    config: &SettlementConfig,
    period: ReportPeriod,
) -> Result<ShippingOutput, SettleError> {
    let rules = &config.rules.shipping;

    let mut table = filter_previous_month(raw, &rules.date_col, period);
    if table.is_empty() {
        return Ok(ShippingOutput::default());
    }

    exclude_brands(&mut table, Domain::Shipping, &rules.brand_col, &config.general.excluded_brands)?;
    for filter in &rules.filters {
        filter.apply(&mut table, Domain::Shipping)?;
    }

    let brand_idx = table.require_column(Domain::Shipping, &rules.brand_col)?;
    let channel_idx = table.require_column(Domain::Shipping, &rules.channel_col)?;
    let type_idx = table.require_column(Domain::Shipping, &rules.type_col)?;
    table.map_column(channel_idx, |cell| Cell::Text(normalize_channel(&cell.as_text())));

    // An explicit qty_col must exist; the one inferred from final_columns may not.
    let qty_idx = match &rules.qty_col {
        Some(column) => Some(table.require_column(Domain::Shipping, column)?),
        None => rules.quantity_column().and_then(|column| table.column_index(column)),
    };
    if let Some(idx) = qty_idx {
        table.map_column(idx, |cell| Cell::Number(to_quantity(cell)));
    }

    let conditions = &rules.type_conditions;
    let (normal, type_anomaly) = table.partition(|row| {
        conditions.is_normal(&row[type_idx].as_text(), &row[channel_idx].as_text())
    });
    let (mut main, mut mall_anomaly) =
        normal.partition(|row| rules.mall_list.contains(&row[channel_idx].as_text()));

    assign_category(&mut main, rules, brand_idx, channel_idx);
    assign_category(&mut mall_anomaly, rules, brand_idx, channel_idx);

    Ok(ShippingOutput {
        main: finalize::finalize(main, &rules.final_columns, &rules.source_label, &SETTLEMENT_COLUMNS),
        type_anomaly: finalize::finalize(
            type_anomaly,
            &rules.final_columns,
            &rules.source_label,
            &TYPE_ANOMALY_COLUMNS,
        ),
        mall_anomaly: finalize::finalize(
            mall_anomaly,
            &rules.final_columns,
            &rules.source_label,
            &SETTLEMENT_COLUMNS,
        ),
    })
}

/// Category map lookup by channel, then the seeding override on (brand, channel).
fn assign_category(table: &mut Table, rules: &ShippingRules, brand_idx: usize, channel_idx: usize) {
    let categories = table
        .rows()
        .iter()
        .map(|row| {
            let brand = row[brand_idx].as_text();
            let channel = row[channel_idx].as_text();
            let category = match &rules.seeding_map {
                Some(seed) if seed.matches(&brand, &channel) => seed.category.as_str(),
                _ => rules.category_map.category_for(&channel),
            };
            Cell::from(category)
        })
        .collect();
    table.set_column(NEW_CATEGORY, categories);
}
