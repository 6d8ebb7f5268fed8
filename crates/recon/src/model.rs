use chrono::NaiveDate;

use crate::period::ReportPeriod;
use crate::table::Table;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Warehouse transaction domain of an uploaded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Shipping,
    Return,
    Receiving,
}

impl Domain {
    /// Identification precedence: the first marker found wins.
    pub const ALL: [Domain; 3] = [Domain::Shipping, Domain::Return, Domain::Receiving];
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shipping => write!(f, "shipping"),
            Self::Return => write!(f, "return"),
            Self::Receiving => write!(f, "receiving"),
        }
    }
}

/// One uploaded file, already parsed into a table.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub table: Table,
}

impl Upload {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier outputs
// ---------------------------------------------------------------------------

/// Shipping rows split into the normal path and the two anomaly buckets.
#[derive(Debug, Clone, Default)]
pub struct ShippingOutput {
    pub main: Table,
    pub type_anomaly: Table,
    pub mall_anomaly: Table,
}

#[derive(Debug, Clone, Default)]
pub struct ReceivingOutput {
    pub peculiar: Table,
    pub free: Table,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Summary,
    MallAnomaly,
    TypeAnomaly,
    ReceivingAnomaly,
    FreeReceiving,
    Validation,
}

impl SheetKind {
    /// Sheet name written to the workbook.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Self::Summary => "정산요약",
            Self::MallAnomaly => "매출처 이상",
            Self::TypeAnomaly => "출고타입 이상",
            Self::ReceivingAnomaly => "입고 특이사항",
            Self::FreeReceiving => "무상 정상 입고",
            Self::Validation => "검증",
        }
    }
}

impl std::fmt::Display for SheetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sheet_name())
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub kind: SheetKind,
    pub table: Table,
}

impl Sheet {
    pub fn name(&self) -> &'static str {
        self.kind.sheet_name()
    }
}

/// Shipment row counts per bucket, for the human cross-check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationTally {
    pub normal: usize,
    pub type_anomaly: usize,
    pub mall_anomaly: usize,
}

impl ValidationTally {
    pub fn total(&self) -> usize {
        self.normal + self.type_anomaly + self.mall_anomaly
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub period: ReportPeriod,
    pub generated_on: NaiveDate,
    pub sheets: Vec<Sheet>,
    pub tally: ValidationTally,
}

impl Report {
    pub fn sheet(&self, kind: SheetKind) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.kind == kind)
    }
}

// ---------------------------------------------------------------------------
// Run outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Report,
    /// Upload names with the domain their marker column matched.
    pub identified: Vec<(String, Domain)>,
    /// Upload names that matched no marker column.
    pub skipped: Vec<String>,
}
