use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// One line of the batch report.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct ReportRow {
    pub op: String,
    pub order: String,
    pub id: String,
    pub status: String,
    pub success: bool,
    pub error: String,
}

/// Writes batch results as CSV to any `Write` sink.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_row(&mut self, row: &ReportRow) -> Result<()> {
        self.writer.serialize(row)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
