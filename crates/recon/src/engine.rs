use chrono::NaiveDate;

use crate::config::{FileIdentifiers, SettlementConfig};
use crate::error::SettleError;
use crate::model::{Domain, RunOutcome, Upload};
use crate::period::ReportPeriod;
use crate::receiving::classify_receiving;
use crate::report::assemble;
use crate::returns::classify_returns;
use crate::shipping::classify_shipping;
use crate::table::Table;

/// Domain of a table, by the first marker column it contains.
pub fn identify(table: &Table, identifiers: &FileIdentifiers) -> Option<Domain> {
    Domain::ALL
        .into_iter()
        .find(|&domain| table.has_column(identifiers.marker(domain)))
}

/// Settle one batch of uploads for the month before `today`.
pub fn run(
    config: &SettlementConfig,
    uploads: Vec<Upload>,
    today: NaiveDate,
) -> Result<RunOutcome, SettleError> {
    let period = ReportPeriod::preceding(today);

    let mut shipping_parts = Vec::new();
    let mut return_parts = Vec::new();
    let mut receiving_parts = Vec::new();
    let mut identified = Vec::new();
    let mut skipped = Vec::new();

    for upload in uploads {
        let Some(domain) = identify(&upload.table, &config.file_identifiers) else {
            tracing::warn!(file = %upload.name, "file type not identified, skipping");
            skipped.push(upload.name);
            continue;
        };
        tracing::info!(file = %upload.name, %domain, rows = upload.table.len(), "identified upload");
        identified.push((upload.name, domain));
        match domain {
            Domain::Shipping => shipping_parts.push(upload.table),
            Domain::Return => return_parts.push(upload.table),
            Domain::Receiving => receiving_parts.push(upload.table),
        }
    }

    let shipping_raw = Table::concat(shipping_parts);
    let return_raw = Table::concat(return_parts);
    let receiving_raw = Table::concat(receiving_parts);

    let shipping = classify_shipping(&shipping_raw, config, period)?;
    tracing::debug!(
        input = shipping_raw.len(),
        main = shipping.main.len(),
        type_anomaly = shipping.type_anomaly.len(),
        mall_anomaly = shipping.mall_anomaly.len(),
        "shipping classified"
    );

    let returns = classify_returns(&return_raw, config, period)?;
    tracing::debug!(input = return_raw.len(), output = returns.len(), "returns classified");

    let receiving = classify_receiving(&receiving_raw, config, period)?;
    tracing::debug!(
        input = receiving_raw.len(),
        peculiar = receiving.peculiar.len(),
        free = receiving.free.len(),
        "receiving classified"
    );

    let report = assemble(shipping, returns, receiving, period, today);
    tracing::info!(%period, sheets = report.sheets.len(), total = report.tally.total(), "report assembled");

    Ok(RunOutcome {
        report,
        identified,
        skipped,
    })
}
