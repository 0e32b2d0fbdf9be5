use crate::domain::inventory::Inventory;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct StockRow {
    denomination: u32,
    count: u32,
}

/// Writes a coin stock as `denomination,count` CSV rows, smallest coin first.
pub struct StockWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StockWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_stock(&mut self, stock: &Inventory) -> Result<()> {
        if stock.is_empty() {
            self.writer.write_record(["denomination", "count"])?;
        }
        for (denomination, count) in stock.iter() {
            self.writer.serialize(StockRow {
                denomination: denomination.value(),
                count,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
