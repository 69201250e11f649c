use crate::domain::method::PaymentMethod;
use crate::domain::payment::{Payment, PaymentStatus, Refund, RefundStatus};
use crate::domain::ports::{MethodStore, PaymentQuery, PaymentStore, RefundStore};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family for payment records.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for refund records.
pub const CF_REFUNDS: &str = "refunds";
/// Column Family for stored payment methods.
pub const CF_METHODS: &str = "methods";

/// A persistent ledger implementation using RocksDB.
///
/// Each record type lives in its own Column Family, keyed by the record id
/// and stored as JSON. Invariant-bearing writes (payment insert, refund
/// reservation, default swap) are serialized through `write_gate`, which
/// makes their scan-then-put sequences atomic with respect to each other.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    write_gate: Arc<Mutex<()>>,
}

impl RocksDbLedger {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = vec![
            ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_REFUNDS, Options::default()),
            ColumnFamilyDescriptor::new(CF_METHODS, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::Storage(format!("{name} column family not found")))
    }

    fn put<T: Serialize>(&self, cf_name: &str, id: Uuid, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, id.as_bytes(), bytes)?;
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, id: Uuid) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl PaymentStore for RocksDbLedger {
    async fn insert(&self, payment: Payment) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let conflict = self.scan::<Payment>(CF_PAYMENTS)?.into_iter().any(|existing| {
            existing.order_id == payment.order_id
                && (existing.status.is_open() || existing.status == PaymentStatus::Succeeded)
        });
        if conflict {
            return Err(PaymentError::DuplicateOrder(payment.order_id));
        }
        self.put(CF_PAYMENTS, payment.id, &payment)
    }

    async fn update(&self, payment: Payment) -> Result<()> {
        self.put(CF_PAYMENTS, payment.id, &payment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        self.read(CF_PAYMENTS, id)
    }

    async fn find_succeeded_by_order(&self, order_id: &str) -> Result<Option<Payment>> {
        Ok(self
            .scan::<Payment>(CF_PAYMENTS)?
            .into_iter()
            .find(|p| p.order_id == order_id && p.status == PaymentStatus::Succeeded))
    }

    async fn list(&self, query: &PaymentQuery) -> Result<Vec<Payment>> {
        let mut matching: Vec<Payment> = self
            .scan::<Payment>(CF_PAYMENTS)?
            .into_iter()
            .filter(|p| {
                query
                    .customer_id
                    .as_ref()
                    .is_none_or(|customer| &p.customer_id == customer)
                    && query.order_id.as_ref().is_none_or(|order| &p.order_id == order)
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matching
            .into_iter()
            .skip(query.skip)
            .take(query.take)
            .collect())
    }
}

#[async_trait]
impl RefundStore for RocksDbLedger {
    async fn insert(&self, refund: Refund, cap: Decimal) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let reserved: Decimal = self
            .scan::<Refund>(CF_REFUNDS)?
            .into_iter()
            .filter(|r| r.payment_id == refund.payment_id && r.status != RefundStatus::Failed)
            .map(|r| r.amount)
            .sum();
        if reserved + refund.amount > cap {
            return Err(PaymentError::RefundCapExceeded(refund.payment_id));
        }
        self.put(CF_REFUNDS, refund.id, &refund)
    }

    async fn update(&self, refund: Refund) -> Result<()> {
        self.put(CF_REFUNDS, refund.id, &refund)
    }

    async fn succeeded_total(&self, payment_id: Uuid) -> Result<Decimal> {
        Ok(self
            .scan::<Refund>(CF_REFUNDS)?
            .into_iter()
            .filter(|r| r.payment_id == payment_id && r.status == RefundStatus::Succeeded)
            .map(|r| r.amount)
            .sum())
    }
}

#[async_trait]
impl MethodStore for RocksDbLedger {
    async fn upsert(&self, method: PaymentMethod) -> Result<PaymentMethod> {
        let _gate = self.write_gate.lock().await;
        let existing = self
            .scan::<PaymentMethod>(CF_METHODS)?
            .into_iter()
            .find(|m| m.provider == method.provider && m.token == method.token);
        let target_id = existing.as_ref().map_or(method.id, |m| m.id);

        if method.is_default {
            for mut other in self.scan::<PaymentMethod>(CF_METHODS)? {
                if other.customer_id == method.customer_id
                    && other.id != target_id
                    && other.is_default
                {
                    other.is_default = false;
                    other.updated_at = method.updated_at;
                    self.put(CF_METHODS, other.id, &other)?;
                }
            }
        }

        let stored = match existing {
            Some(mut row) => {
                row.method_type = method.method_type;
                row.brand = method.brand;
                row.last4 = method.last4;
                row.exp_month = method.exp_month;
                row.exp_year = method.exp_year;
                row.is_default = method.is_default;
                row.updated_at = method.updated_at;
                row
            }
            None => method,
        };
        self.put(CF_METHODS, stored.id, &stored)?;
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PaymentMethod>> {
        self.read(CF_METHODS, id)
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        let cf = self.cf(CF_METHODS)?;
        let existed = self.db.get_pinned_cf(cf, id.as_bytes())?.is_some();
        if existed {
            self.db.delete_cf(cf, id.as_bytes())?;
        }
        Ok(existed)
    }

    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<PaymentMethod>> {
        let mut matching: Vec<PaymentMethod> = self
            .scan::<PaymentMethod>(CF_METHODS)?
            .into_iter()
            .filter(|m| m.customer_id == customer_id)
            .collect();
        matching.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(matching)
    }
}
