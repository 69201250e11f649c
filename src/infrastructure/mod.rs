//! Infrastructure adapters: ledger store implementations and the simulated
//! provider network used by the batch runner and the test suites.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod simulator;
