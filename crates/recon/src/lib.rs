//! `monthend-recon`: Rule-driven monthly warehouse settlement engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns the assembled report.
//! No CLI or IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod finalize;
pub mod model;
pub mod normalize;
pub mod period;
pub mod receiving;
pub mod report;
pub mod returns;
pub mod shipping;
pub mod table;

pub use config::SettlementConfig;
pub use engine::run;
pub use error::SettleError;
pub use model::{Domain, Report, RunOutcome, Sheet, SheetKind, Upload};
pub use period::ReportPeriod;
pub use table::{Cell, Table};
