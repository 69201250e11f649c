//! Inbound/outbound adapters for the batch runner.

pub mod csv;
