use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("order {0} already has an open or succeeded payment")]
    DuplicateOrder(String),
    #[error("refunds for payment {0} would exceed the captured amount")]
    RefundCapExceeded(uuid::Uuid),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("provider error: {0}")]
    Provider(String),
}

pub type Result<T, E = PaymentError> = std::result::Result<T, E>;
