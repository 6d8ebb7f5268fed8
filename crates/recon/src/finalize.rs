//! Canonical output layouts.
//!
//! Each classifier ends by renaming source columns through its configured
//! [`ColumnMap`], stamping the constant columns and projecting onto one of
//! the fixed layouts below. Columns a table lacks come out blank.

use crate::config::ColumnMap;
use crate::table::{Cell, Table};

pub const DATE: &str = "일자";
pub const ORDER_NO: &str = "주문번호";
pub const NEW_CATEGORY: &str = "구분(new)";
pub const CATEGORY: &str = "구분";
pub const PRODUCT_CODE: &str = "상품코드";
pub const PRODUCT_NAME: &str = "품목명";
pub const UNIT: &str = "단위(EA)";
pub const QUANTITY: &str = "수량";
pub const SOURCE: &str = "자료출처";
pub const SHIPMENT_TYPE: &str = "출고타입";
pub const STATUS: &str = "상태";
pub const REMARKS: &str = "상품비고";
pub const BRAND: &str = "브랜드";

/// Unit column as it appears in source exports.
pub const SOURCE_UNIT: &str = "단위";

/// Shipping and return rows.
pub const SETTLEMENT_COLUMNS: [&str; 9] = [
    DATE,
    ORDER_NO,
    NEW_CATEGORY,
    CATEGORY,
    PRODUCT_CODE,
    PRODUCT_NAME,
    UNIT,
    QUANTITY,
    SOURCE,
];

/// Shipments whose type failed the normal-type test.
pub const TYPE_ANOMALY_COLUMNS: [&str; 10] = [
    SHIPMENT_TYPE,
    DATE,
    ORDER_NO,
    NEW_CATEGORY,
    CATEGORY,
    PRODUCT_CODE,
    PRODUCT_NAME,
    UNIT,
    QUANTITY,
    SOURCE,
];

/// Both receiving buckets.
pub const RECEIVING_COLUMNS: [&str; 12] = [
    DATE,
    ORDER_NO,
    NEW_CATEGORY,
    CATEGORY,
    PRODUCT_CODE,
    PRODUCT_NAME,
    UNIT,
    QUANTITY,
    SOURCE,
    STATUS,
    REMARKS,
    BRAND,
];

/// Rename source columns to their canonical names. Sources listed in `skip`
/// keep their original name. Engine-owned columns are never renamed.
pub fn rename_columns(table: &mut Table, map: &ColumnMap, skip: &[&str]) {
    table.rename_columns(|source| {
        if source == NEW_CATEGORY || skip.contains(&source) {
            return None;
        }
        map.canonical_for(source).map(str::to_string)
    });
}

/// Set the data-source label and the constant unit on every row.
pub fn stamp(table: &mut Table, label: &str) {
    table.fill_column(SOURCE, Cell::from(label));
    table.fill_column(UNIT, Cell::Number(1.0));
}

/// Rename, stamp and project onto `layout`.
pub fn finalize(mut table: Table, map: &ColumnMap, label: &str, layout: &[&str]) -> Table {
    rename_columns(&mut table, map, &[]);
    stamp(&mut table, label);
    table.select(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> ColumnMap {
        ColumnMap::new([
            ("일자", "[출고일자]"),
            ("수량", "[수량]"),
            ("구분", "[주문구분]"),
        ])
    }

    fn raw() -> Table {
        Table::with_rows(
            ["[출고일자]", "[수량]", "[주문구분]", "[기타]", "단위"],
            vec![vec![
                Cell::from("2026-09-01"),
                Cell::Number(4.0),
                Cell::from("일반"),
                Cell::from("버림"),
                Cell::Number(12.0),
            ]],
        )
    }

    #[test]
    fn projects_onto_fixed_layout() {
        let out = finalize(raw(), &map(), "삼일 출고데이터", &SETTLEMENT_COLUMNS);
        assert_eq!(out.columns(), &SETTLEMENT_COLUMNS);
        assert_eq!(out.cell(0, DATE), Some(&Cell::from("2026-09-01")));
        assert_eq!(out.cell(0, QUANTITY), Some(&Cell::Number(4.0)));
        assert_eq!(out.cell(0, SOURCE), Some(&Cell::from("삼일 출고데이터")));
        assert_eq!(out.cell(0, UNIT), Some(&Cell::Number(1.0)));
        assert_eq!(out.cell(0, ORDER_NO), Some(&Cell::Empty));
    }

    #[test]
    fn skipped_sources_keep_their_name() {
        let mut t = raw();
        rename_columns(&mut t, &map(), &["[수량]"]);
        assert!(t.has_column("[수량]"));
        assert!(!t.has_column(QUANTITY));
        assert!(t.has_column(DATE));
    }

    #[test]
    fn empty_input_keeps_layout() {
        let out = finalize(Table::new(["[출고일자]"]), &map(), "x", &TYPE_ANOMALY_COLUMNS);
        assert!(out.is_empty());
        assert_eq!(out.columns()[0], SHIPMENT_TYPE);
    }
}
