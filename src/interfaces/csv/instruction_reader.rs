use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum InstructionKind {
    Payment,
    Refund,
    SaveMethod,
    DeleteMethod,
}

/// One row of a batch file.
///
/// Which columns are required depends on `op`; the reader stays permissive
/// and the runner validates per operation so a bad row never aborts the
/// batch. `reference` carries the order id for refunds, the single-use
/// provider credential for save-method rows, and the method id for
/// delete-method rows.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Instruction {
    pub op: InstructionKind,
    pub order: Option<String>,
    pub customer: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub method: Option<String>,
    pub provider: Option<String>,
    pub reference: Option<String>,
    pub r#default: Option<bool>,
}

/// Reads batch instructions from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<Instruction>`. It handles whitespace trimming and flexible record
/// lengths automatically.
pub struct InstructionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> InstructionReader<R> {
    /// Creates a new `InstructionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes instructions.
    pub fn instructions(self) -> impl Iterator<Item = Result<Instruction>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
