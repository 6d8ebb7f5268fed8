//! Return classification.
//!
//! Every windowed row is booked as a return with a negative quantity. Rows
//! whose status appears in the status map are booked a second time under the
//! mapped category with a positive quantity, so flagged rows count twice.

use crate::config::SettlementConfig;
use crate::error::SettleError;
use crate::finalize::{self, NEW_CATEGORY, SETTLEMENT_COLUMNS};
use crate::model::Domain;
use crate::normalize::{exclude_brands, to_quantity};
use crate::period::{filter_previous_month, ReportPeriod};
use crate::table::{Cell, Table};

/// New-category of every return row. Quantities under it are negative.
pub const RETURN_CATEGORY: &str = "반품";

pub fn classify_returns(
    raw: &Table,
    config: &SettlementConfig,
    period: ReportPeriod,
) -> Result<Table, SettleError> {
    let rules = &config.rules.returns;

    let mut table = filter_previous_month(raw, &rules.date_col, period);
    if table.is_empty() {
        return Ok(Table::default());
    }

    exclude_brands(&mut table, Domain::Return, &rules.brand_col, &config.general.excluded_brands)?;
    let qty_idx = table.require_column(Domain::Return, &rules.qty_col)?;
    let status_idx = table.require_column(Domain::Return, &rules.status_col)?;
    table.map_column(qty_idx, |cell| Cell::Number(to_quantity(cell)));

    let mut returned = table.clone();
    returned.fill_column(NEW_CATEGORY, Cell::from(RETURN_CATEGORY));

    let mut relabeled = table;
    relabeled.retain_rows(|row| rules.status_category_map.contains_key(&row[status_idx].as_text()));
    let mapped = relabeled
        .column_values(status_idx)
        .map(|status| Cell::from(rules.status_category_map.get(&status.as_text()).cloned()))
        .collect();
    relabeled.set_column(NEW_CATEGORY, mapped);

    let mut combined = Table::concat([returned, relabeled]);
    apply_sign(&mut combined, qty_idx);

    Ok(finalize::finalize(
        combined,
        &rules.final_columns,
        &rules.source_label,
        &SETTLEMENT_COLUMNS,
    ))
}

/// |q| everywhere, negated for rows still booked as plain returns.
fn apply_sign(table: &mut Table, qty_idx: usize) {
    let Some(category_idx) = table.column_index(NEW_CATEGORY) else {
        return;
    };
    let signed: Vec<Cell> = table
        .rows()
        .iter()
        .map(|row| {
            let q = to_quantity(&row[qty_idx]).abs();
            if row[category_idx].text_eq(RETURN_CATEGORY) {
                Cell::Number(-q)
            } else {
                Cell::Number(q)
            }
        })
        .collect();
    let name = table.columns()[qty_idx].clone();
    table.set_column(&name, signed);
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const COLUMNS: [&str; 7] = [
        "[반품일자]",
        "[주문번호]",
        "[브랜드]",
        "[반품상태]",
        "[상품코드]",
        "[상품명]",
        "[반품수량]",
    ];

    fn config() -> SettlementConfig {
        SettlementConfig::from_toml(include_str!("../tests/fixtures/settle.toml")).unwrap()
    }

    fn period() -> ReportPeriod {
        ReportPeriod::preceding(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    fn row(order: &str, brand: &str, status: &str, qty: Cell) -> Vec<Cell> {
        vec![
            Cell::from("2026-09-10"),
            Cell::from(order),
            Cell::from(brand),
            Cell::from(status),
            Cell::from("P-200"),
            Cell::from("반품상품"),
            qty,
        ]
    }

    fn table(mut rows: Vec<Vec<Cell>>) -> Table {
        rows.push(vec![Cell::from("합계")]);
        Table::with_rows(COLUMNS, rows)
    }

    fn booked(t: &Table) -> Vec<(String, String, f64)> {
        (0..t.len())
            .map(|i| {
                let order = t.cell(i, "주문번호").map(Cell::as_text).unwrap_or_default();
                let category = t.cell(i, NEW_CATEGORY).map(Cell::as_text).unwrap_or_default();
                let qty = t.cell(i, "수량").map(to_quantity).unwrap_or_default();
                (order, category, qty)
            })
            .collect()
    }

    #[test]
    fn defective_row_is_booked_twice() {
        let raw = table(vec![row("R-1", "브랜드B", "불량", Cell::Number(3.0))]);
        let out = classify_returns(&raw, &config(), period()).unwrap();
        assert_eq!(
            booked(&out),
            vec![
                ("R-1".to_string(), "반품".to_string(), -3.0),
                ("R-1".to_string(), "불량".to_string(), 3.0),
            ]
        );
        assert_eq!(out.columns(), &SETTLEMENT_COLUMNS);
    }

    #[test]
    fn plain_returns_first_then_relabeled_copies() {
        let raw = table(vec![
            row("R-1", "브랜드B", "파손", Cell::Number(-2.0)),
            row("R-2", "브랜드B", "단순변심", Cell::from("4")),
            row("R-3", "브랜드B", "불량", Cell::Number(1.0)),
        ]);
        let out = classify_returns(&raw, &config(), period()).unwrap();
        let rows = booked(&out);
        assert_eq!(rows.len(), 5);
        let orders: Vec<&str> = rows.iter().map(|(o, _, _)| o.as_str()).collect();
        assert_eq!(orders, ["R-1", "R-2", "R-3", "R-1", "R-3"]);
        for (_, category, qty) in &rows {
            if category == RETURN_CATEGORY {
                assert!(*qty <= 0.0);
            } else {
                assert!(*qty >= 0.0);
            }
        }
        assert_eq!(rows[3], ("R-1".to_string(), "파손".to_string(), 2.0));
    }

    #[test]
    fn non_numeric_quantity_is_zero_and_excluded_brand_dropped() {
        let raw = table(vec![
            row("R-1", "브랜드B", "단순변심", Cell::from("확인필요")),
            row("R-2", "내부테스트", "불량", Cell::Number(5.0)),
        ]);
        let out = classify_returns(&raw, &config(), period()).unwrap();
        let rows = booked(&out);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].2, 0.0);
        assert_eq!(out.cell(0, "자료출처"), Some(&Cell::from("삼일 반품데이터")));
        assert_eq!(out.cell(0, "단위(EA)"), Some(&Cell::Number(1.0)));
    }

    #[test]
    fn missing_quantity_column_is_reported() {
        let raw = table(vec![
            row("R-1", "브랜드B", "불량", Cell::Number(3.0)),
            row("R-2", "브랜드B", "불량", Cell::Number(3.0)),
        ])
        .select(&["[반품일자]", "[브랜드]", "[반품상태]"]);
        let err = classify_returns(&raw, &config(), period()).unwrap_err();
        assert_eq!(err.to_string(), "return data: missing column '[반품수량]'");
    }
}
