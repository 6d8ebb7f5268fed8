use std::path::PathBuf;

use chrono::NaiveDate;
use monthend_recon::model::ValidationTally;
use monthend_recon::normalize::to_quantity;
use monthend_recon::{run, Cell, Domain, RunOutcome, SettlementConfig, SheetKind, Table, Upload};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config() -> SettlementConfig {
    let path = fixtures_dir().join("settle.toml");
    let input = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    SettlementConfig::from_toml(&input).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn text_row(values: &[&str]) -> Vec<Cell> {
    values.iter().map(|v| Cell::from(*v)).collect()
}

// -------------------------------------------------------------------------
// Fixtures
// -------------------------------------------------------------------------

fn shipping_upload() -> Upload {
    let columns = [
        "[출고일자]",
        "[주문번호]",
        "[브랜드]",
        "[출고상태]",
        "[주문유형]",
        "[창고]",
        "[매출처]",
        "[택배사]",
        "[상품코드]",
        "[상품명]",
        "[출고수량]",
    ];
    let rows = [
        // in month: 3 normal listed, 1 normal unlisted, 1 abnormal type
        ["2026-09-01", "S-1", "브랜드B", "출고완료", "일반", "본창고", "001: 쿠팡", "CJ대한통운", "P-1", "상품1", "1"],
        ["2026-09-02", "S-2", "브랜드B", "출고완료", "일반", "본창고", "네이버 스마트스토어", "CJ대한통운", "P-1", "상품1", "2"],
        ["2026-09-03", "S-3", "브랜드A", "출고완료", "일반", "본창고", "자사몰", "직배송", "P-2", "상품2", "3"],
        ["2026-09-04", "S-4", "브랜드B", "출고완료", "일반", "본창고", "오픈마켓", "CJ대한통운", "P-2", "상품2", "4"],
        ["2026-09-05", "S-5", "브랜드B", "출고완료", "일반", "본창고", "쿠팡", "퀵서비스", "P-3", "상품3", "5"],
        // out of month
        ["2026-08-31", "S-6", "브랜드B", "출고완료", "일반", "본창고", "쿠팡", "CJ대한통운", "P-1", "상품1", "1"],
        ["2026-10-02", "S-7", "브랜드B", "출고완료", "일반", "본창고", "쿠팡", "CJ대한통운", "P-1", "상품1", "1"],
        // totals line
        ["합계", "", "", "", "", "", "", "", "", "", "17"],
    ];
    Upload::new(
        "출고_9월.xlsx",
        Table::with_rows(columns, rows.iter().map(|r| text_row(r))),
    )
}

fn return_upload() -> Upload {
    let columns = [
        "[반품일자]",
        "[주문번호]",
        "[브랜드]",
        "[반품상태]",
        "[상품코드]",
        "[상품명]",
        "[반품수량]",
    ];
    let rows = [
        ["2026-09-11", "R-1", "브랜드B", "불량", "P-1", "상품1", "-3"],
        ["합계", "", "", "", "", "", "-3"],
    ];
    Upload::new(
        "반품_9월.xlsx",
        Table::with_rows(columns, rows.iter().map(|r| text_row(r))),
    )
}

fn receiving_upload() -> Upload {
    let columns = [
        "[입고일자]",
        "[입고번호]",
        "[브랜드]",
        "[입고유형]",
        "[입고상세]",
        "[처리상태]",
        "[상품코드]",
        "[상품명]",
        "[입고수량]",
        "[비고]",
    ];
    let rows = [
        ["2026-09-20", "I-1", "브랜드C", "무상입고", "무상 : 샘플", "완료", "P-9", "상품9", "6", ""],
        ["2026-09-21", "I-2", "브랜드C", "반품입고", "", "완료", "P-9", "상품9", "2", "오배송"],
        ["2026-09-22", "I-3", "브랜드C", "정상입고", "", "완료", "P-9", "상품9", "50", ""],
        ["합계", "", "", "", "", "", "", "", "58", ""],
    ];
    Upload::new(
        "입고_9월.xlsx",
        Table::with_rows(columns, rows.iter().map(|r| text_row(r))),
    )
}

fn run_all() -> RunOutcome {
    let uploads = vec![
        shipping_upload(),
        Upload::new("메모.xlsx", Table::with_rows(["메모"], vec![text_row(&["참고"])])),
        return_upload(),
        receiving_upload(),
    ];
    run(&config(), uploads, today()).unwrap()
}

fn column_text(table: &Table, column: &str) -> Vec<String> {
    let idx = table.column_index(column).unwrap();
    table.column_values(idx).map(Cell::as_text).collect()
}

// -------------------------------------------------------------------------
// End-to-end
// -------------------------------------------------------------------------

#[test]
fn batch_identifies_and_skips() {
    let outcome = run_all();
    assert_eq!(
        outcome.identified,
        vec![
            ("출고_9월.xlsx".to_string(), Domain::Shipping),
            ("반품_9월.xlsx".to_string(), Domain::Return),
            ("입고_9월.xlsx".to_string(), Domain::Receiving),
        ]
    );
    assert_eq!(outcome.skipped, ["메모.xlsx"]);
}

#[test]
fn shipping_scenario_tally() {
    let report = run_all().report;
    assert_eq!(
        report.tally,
        ValidationTally {
            normal: 3,
            type_anomaly: 1,
            mall_anomaly: 1,
        }
    );

    let validation = &report.sheet(SheetKind::Validation).unwrap().table;
    assert_eq!(column_text(validation, "건수"), ["3", "1", "1", "5"]);

    // 3 shipments + 2 return bookings
    let summary = &report.sheet(SheetKind::Summary).unwrap().table;
    assert_eq!(summary.len(), 5);
    assert_eq!(report.sheet(SheetKind::MallAnomaly).unwrap().table.len(), 1);
    assert_eq!(report.sheet(SheetKind::TypeAnomaly).unwrap().table.len(), 1);
}

#[test]
fn summary_rows_are_settled() {
    let report = run_all().report;
    let summary = &report.sheet(SheetKind::Summary).unwrap().table;

    assert_eq!(
        column_text(summary, "일자"),
        ["2026-09-01", "2026-09-02", "2026-09-03", "2026-09-11", "2026-09-11"]
    );
    assert_eq!(
        column_text(summary, "구분(new)"),
        ["온라인", "온라인", "시딩", "반품", "불량"]
    );
    assert_eq!(
        column_text(summary, "자료출처"),
        ["삼일 출고데이터", "삼일 출고데이터", "삼일 출고데이터", "삼일 반품데이터", "삼일 반품데이터"]
    );

    let qty_idx = summary.column_index("수량").unwrap();
    let quantities: Vec<f64> = summary.column_values(qty_idx).map(to_quantity).collect();
    assert_eq!(quantities, [1.0, 2.0, 3.0, -3.0, 3.0]);
}

#[test]
fn receiving_sheets() {
    let report = run_all().report;
    let peculiar = &report.sheet(SheetKind::ReceivingAnomaly).unwrap().table;
    assert_eq!(peculiar.len(), 1);
    assert_eq!(peculiar.cell(0, "주문번호"), Some(&Cell::from("I-2")));
    assert_eq!(peculiar.cell(0, "수량"), Some(&Cell::Number(-2.0)));

    let free = &report.sheet(SheetKind::FreeReceiving).unwrap().table;
    assert_eq!(free.len(), 1);
    assert_eq!(free.cell(0, "구분(new)"), Some(&Cell::from("샘플")));
    assert_eq!(free.cell(0, "수량"), Some(&Cell::Number(6.0)));
}

#[test]
fn sheet_order_is_fixed() {
    let report = run_all().report;
    let names: Vec<&str> = report.sheets.iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        ["정산요약", "매출처 이상", "출고타입 이상", "입고 특이사항", "무상 정상 입고", "검증"]
    );
}

#[test]
fn repeated_runs_agree() {
    let first = run_all().report;
    let second = run_all().report;
    assert_eq!(first.sheets.len(), second.sheets.len());
    for (a, b) in first.sheets.iter().zip(&second.sheets) {
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.table, b.table);
    }
}

#[test]
fn january_run_settles_december() {
    let columns = ["[반품일자]", "[브랜드]", "[반품상태]", "[반품수량]"];
    let rows = [
        ["2025-12-31", "브랜드B", "단순변심", "1"],
        ["2026-01-02", "브랜드B", "단순변심", "1"],
        ["합계", "", "", "2"],
    ];
    let upload = Upload::new("반품.xlsx", Table::with_rows(columns, rows.iter().map(|r| text_row(r))));
    let report = run(&config(), vec![upload], NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
        .unwrap()
        .report;
    let summary = &report.sheet(SheetKind::Summary).unwrap().table;
    assert_eq!(column_text(summary, "일자"), ["2025-12-31"]);
}

#[test]
fn missing_column_aborts_run() {
    let upload = Upload::new(
        "출고.xlsx",
        Table::with_rows(
            ["[출고일자]", "[택배사]"],
            vec![text_row(&["2026-09-01", "CJ대한통운"]), text_row(&["합계", ""])],
        ),
    );
    let err = run(&config(), vec![upload], today()).unwrap_err();
    assert_eq!(err.kind(), "MissingColumn");
    assert!(err.to_string().starts_with("shipping data"));
}
