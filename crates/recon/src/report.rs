//! Report assembly: sheet selection, date formatting and the validation tally.

use chrono::{NaiveDate, NaiveDateTime};

use crate::finalize::DATE;
use crate::model::{ReceivingOutput, Report, Sheet, SheetKind, ShippingOutput, ValidationTally};
use crate::normalize::parse_datetime;
use crate::period::ReportPeriod;
use crate::table::{Cell, Table};

pub const VALIDATION_ITEM: &str = "항목";
pub const VALIDATION_COUNT: &str = "건수";

const TALLY_NORMAL: &str = "일반 출고";
const TALLY_TYPE_ANOMALY: &str = "출고타입 이상";
const TALLY_MALL_ANOMALY: &str = "매출처 이상";
const TALLY_TOTAL: &str = "처리된 총 출고건수 (검증용)";

/// Merge classifier outputs into the ordered sheet list.
///
/// The summary is main shipments followed by returns. Empty tables produce no
/// sheet; the validation sheet is always last.
pub fn assemble(
    shipping: ShippingOutput,
    returns: Table,
    receiving: ReceivingOutput,
    period: ReportPeriod,
    generated_on: NaiveDate,
) -> Report {
    let tally = ValidationTally {
        normal: shipping.main.len(),
        type_anomaly: shipping.type_anomaly.len(),
        mall_anomaly: shipping.mall_anomaly.len(),
    };

    let summary = Table::concat([shipping.main, returns]);
    let candidates = [
        (SheetKind::Summary, summary),
        (SheetKind::MallAnomaly, shipping.mall_anomaly),
        (SheetKind::TypeAnomaly, shipping.type_anomaly),
        (SheetKind::ReceivingAnomaly, receiving.peculiar),
        (SheetKind::FreeReceiving, receiving.free),
    ];

    let mut sheets: Vec<Sheet> = candidates
        .into_iter()
        .filter(|(_, table)| !table.is_empty())
        .map(|(kind, mut table)| {
            format_date_column(&mut table);
            Sheet { kind, table }
        })
        .collect();
    sheets.push(Sheet {
        kind: SheetKind::Validation,
        table: validation_table(&tally),
    });

    Report {
        period,
        generated_on,
        sheets,
        tally,
    }
}

/// Render the `일자` column as `YYYY-MM-DD` text; unparseable values go blank.
pub fn format_date_column(table: &mut Table) {
    let Some(idx) = table.column_index(DATE) else {
        return;
    };
    table.map_column(idx, |cell| {
        parse_datetime(cell).map_or(Cell::Empty, |dt| Cell::Text(dt.format("%Y-%m-%d").to_string()))
    });
}

pub fn validation_table(tally: &ValidationTally) -> Table {
    let rows = [
        (TALLY_NORMAL, tally.normal),
        (TALLY_TYPE_ANOMALY, tally.type_anomaly),
        (TALLY_MALL_ANOMALY, tally.mall_anomaly),
        (TALLY_TOTAL, tally.total()),
    ];
    Table::with_rows(
        [VALIDATION_ITEM, VALIDATION_COUNT],
        rows.into_iter()
            .map(|(label, count)| vec![Cell::from(label), Cell::Number(count as f64)]),
    )
}

/// `정산요약_<yymmdd>_<HHMM>.xlsx`
pub fn suggested_filename(now: NaiveDateTime) -> String {
    format!("정산요약_{}.xlsx", now.format("%y%m%d_%H%M"))
}
