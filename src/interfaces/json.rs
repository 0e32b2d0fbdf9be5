use crate::domain::inventory::Inventory;
use crate::domain::outcome::SettlementOutcome;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Full simulation report: every settlement outcome, then the final stock.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub outcomes: &'a [SettlementOutcome],
    pub stock: &'a Inventory,
}

pub fn write_report<W: Write>(mut sink: W, report: &Report<'_>) -> Result<()> {
    serde_json::to_writer_pretty(&mut sink, report)?;
    writeln!(sink)?;
    Ok(())
}
