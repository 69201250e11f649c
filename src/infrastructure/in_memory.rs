use crate::domain::method::PaymentMethod;
use crate::domain::payment::{Payment, PaymentStatus, Refund, RefundStatus};
use crate::domain::ports::{MethodStore, PaymentQuery, PaymentStore, RefundStore};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory ledger implementing all three store ports.
///
/// Uses `Arc<RwLock<HashMap>>` per record type to allow shared concurrent
/// access. Every invariant-bearing write (payment insert, refund
/// reservation, default swap) takes the write lock exactly once, so its
/// check-then-write sequence is atomic with respect to racing requests.
/// Ideal for testing or batch runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    payments: Arc<RwLock<HashMap<Uuid, Payment>>>,
    refunds: Arc<RwLock<HashMap<Uuid, Refund>>>,
    methods: Arc<RwLock<HashMap<Uuid, PaymentMethod>>>,
}

impl InMemoryLedger {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryLedger {
    async fn insert(&self, payment: Payment) -> Result<()> {
        let mut payments = self.payments.write().await;
        let conflict = payments.values().any(|existing| {
            existing.order_id == payment.order_id
                && (existing.status.is_open() || existing.status == PaymentStatus::Succeeded)
        });
        if conflict {
            return Err(PaymentError::DuplicateOrder(payment.order_id));
        }
        payments.insert(payment.id, payment);
        Ok(())
    }

    async fn update(&self, payment: Payment) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).cloned())
    }

    async fn find_succeeded_by_order(&self, order_id: &str) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .find(|p| p.order_id == order_id && p.status == PaymentStatus::Succeeded)
            .cloned())
    }

    async fn list(&self, query: &PaymentQuery) -> Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        let mut matching: Vec<Payment> = payments
            .values()
            .filter(|p| {
                query
                    .customer_id
                    .as_ref()
                    .is_none_or(|customer| &p.customer_id == customer)
                    && query.order_id.as_ref().is_none_or(|order| &p.order_id == order)
            })
            .cloned()
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
impl RefundStore for InMemoryLedger {
    async fn insert(&self, refund: Refund, cap: Decimal) -> Result<()> {
        let mut refunds = self.refunds.write().await;
        // Open refunds count as reserved so racing requests cannot together
        // overshoot the cap.
        let reserved: Decimal = refunds
            .values()
            .filter(|r| r.payment_id == refund.payment_id && r.status != RefundStatus::Failed)
            .map(|r| r.amount)
            .sum();
        if reserved + refund.amount > cap {
            return Err(PaymentError::RefundCapExceeded(refund.payment_id));
        }
        refunds.insert(refund.id, refund);
        Ok(())
    }

    async fn update(&self, refund: Refund) -> Result<()> {
        let mut refunds = self.refunds.write().await;
        refunds.insert(refund.id, refund);
        Ok(())
    }

    async fn succeeded_total(&self, payment_id: Uuid) -> Result<Decimal> {
        let refunds = self.refunds.read().await;
        Ok(refunds
            .values()
            .filter(|r| r.payment_id == payment_id && r.status == RefundStatus::Succeeded)
            .map(|r| r.amount)
            .sum())
    }
}

#[async_trait]
impl MethodStore for InMemoryLedger {
    async fn upsert(&self, method: PaymentMethod) -> Result<PaymentMethod> {
        let mut methods = self.methods.write().await;
        let existing_id = methods
            .values()
            .find(|m| m.provider == method.provider && m.token == method.token)
            .map(|m| m.id);

        let target_id = existing_id.unwrap_or(method.id);
        if method.is_default {
            for other in methods.values_mut() {
                if other.customer_id == method.customer_id
                    && other.id != target_id
                    && other.is_default
                {
                    other.is_default = false;
                    other.updated_at = method.updated_at;
                }
            }
        }

        let stored = match existing_id {
            Some(id) => {
                // Re-saving a known token refreshes the record in place.
                let row = methods
                    .get_mut(&id)
                    .ok_or_else(|| PaymentError::Storage("method row vanished".to_string()))?;
                row.method_type = method.method_type;
                row.brand = method.brand;
                row.last4 = method.last4;
                row.exp_month = method.exp_month;
                row.exp_year = method.exp_year;
                row.is_default = method.is_default;
                row.updated_at = method.updated_at;
                row.clone()
            }
            None => {
                methods.insert(method.id, method.clone());
                method
            }
        };
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PaymentMethod>> {
        let methods = self.methods.read().await;
        Ok(methods.get(&id).cloned())
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        let mut methods = self.methods.write().await;
        Ok(methods.remove(&id).is_some())
    }

    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<PaymentMethod>> {
        let methods = self.methods.read().await;
        let mut matching: Vec<PaymentMethod> = methods
            .values()
            .filter(|m| m.customer_id == customer_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Metadata;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn payment(order_id: &str, status: PaymentStatus) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            order_id: order_id.to_string(),
            customer_id: "cust-1".to_string(),
            amount: dec!(100.00),
            currency: "USD".to_string(),
            provider: "alphapay".to_string(),
            method: Some("card".to_string()),
            status,
            provider_transaction_id: None,
            provider_reference: None,
            failure_reason: None,
            metadata: Metadata::new(),
            created_at: Utc::now(),
            created_by: "tests".to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        }
    }

    fn refund(payment_id: Uuid, amount: Decimal, status: RefundStatus) -> Refund {
        Refund {
            id: Uuid::new_v4(),
            payment_id,
            amount,
            currency: "USD".to_string(),
            status,
            provider_refund_id: None,
            reason: None,
            failure_reason: None,
            metadata: Metadata::new(),
            created_at: Utc::now(),
            created_by: "tests".to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        }
    }

    fn method(customer_id: &str, token: &str, is_default: bool) -> PaymentMethod {
        PaymentMethod {
            id: Uuid::new_v4(),
            customer_id: customer_id.to_string(),
            provider: "alphapay".to_string(),
            token: token.to_string(),
            method_type: "card".to_string(),
            brand: Some("visa".to_string()),
            last4: Some("4242".to_string()),
            exp_month: Some(12),
            exp_year: Some(2030),
            is_default,
            created_at: Utc::now(),
            created_by: "tests".to_string(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_order_uniqueness_backstop() {
        let ledger = InMemoryLedger::new();
        let first = payment("ORD-1", PaymentStatus::Pending);
        PaymentStore::insert(&ledger, first.clone()).await.unwrap();

        // A second open attempt for the same order is rejected.
        let second = payment("ORD-1", PaymentStatus::Pending);
        assert!(matches!(
            PaymentStore::insert(&ledger, second.clone()).await,
            Err(PaymentError::DuplicateOrder(_))
        ));

        // Once the first attempt fails, a retry can be recorded.
        let mut failed = first;
        failed.status = PaymentStatus::Failed;
        PaymentStore::update(&ledger, failed).await.unwrap();
        PaymentStore::insert(&ledger, second).await.unwrap();
    }

    #[tokio::test]
    async fn test_succeeded_order_blocks_new_attempts() {
        let ledger = InMemoryLedger::new();
        PaymentStore::insert(&ledger, payment("ORD-1", PaymentStatus::Succeeded))
            .await
            .unwrap();
        assert!(matches!(
            PaymentStore::insert(&ledger, payment("ORD-1", PaymentStatus::Pending)).await,
            Err(PaymentError::DuplicateOrder(_))
        ));
        assert!(
            ledger
                .find_succeeded_by_order("ORD-1")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            ledger
                .find_succeeded_by_order("ORD-2")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_refund_reservation_counts_open_refunds() {
        let ledger = InMemoryLedger::new();
        let payment_id = Uuid::new_v4();
        let cap = dec!(100.00);

        RefundStore::insert(&ledger, refund(payment_id, dec!(60.00), RefundStatus::Pending), cap)
            .await
            .unwrap();

        // A second open refund that would overshoot the cap is rejected even
        // though nothing has succeeded yet.
        let blocked = refund(payment_id, dec!(60.00), RefundStatus::Pending);
        assert!(matches!(
            RefundStore::insert(&ledger, blocked.clone(), cap).await,
            Err(PaymentError::RefundCapExceeded(_))
        ));

        // Failed refunds release their reservation.
        let mut failed = refund(payment_id, dec!(30.00), RefundStatus::Pending);
        RefundStore::insert(&ledger, failed.clone(), cap).await.unwrap();
        failed.status = RefundStatus::Failed;
        RefundStore::update(&ledger, failed).await.unwrap();
        RefundStore::insert(&ledger, refund(payment_id, dec!(40.00), RefundStatus::Pending), cap)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_succeeded_total_ignores_other_statuses() {
        let ledger = InMemoryLedger::new();
        let payment_id = Uuid::new_v4();
        let cap = dec!(100.00);

        let mut first = refund(payment_id, dec!(40.00), RefundStatus::Pending);
        RefundStore::insert(&ledger, first.clone(), cap).await.unwrap();
        first.status = RefundStatus::Succeeded;
        RefundStore::update(&ledger, first).await.unwrap();

        RefundStore::insert(&ledger, refund(payment_id, dec!(20.00), RefundStatus::Pending), cap)
            .await
            .unwrap();

        assert_eq!(ledger.succeeded_total(payment_id).await.unwrap(), dec!(40.00));
        assert_eq!(ledger.succeeded_total(Uuid::new_v4()).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_default_swap_is_atomic_per_customer() {
        let ledger = InMemoryLedger::new();
        let old_default = method("cust-1", "tok-1", true);
        ledger.upsert(old_default.clone()).await.unwrap();
        // Another customer's default must not be touched.
        let other_customer = method("cust-2", "tok-2", true);
        ledger.upsert(other_customer.clone()).await.unwrap();

        let new_default = method("cust-1", "tok-3", true);
        ledger.upsert(new_default.clone()).await.unwrap();

        let methods = ledger.list_for_customer("cust-1").await.unwrap();
        let defaults: Vec<_> = methods.iter().filter(|m| m.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, new_default.id);

        let untouched = MethodStore::get(&ledger, other_customer.id)
            .await
            .unwrap()
            .unwrap();
        assert!(untouched.is_default);
    }

    #[tokio::test]
    async fn test_upsert_is_keyed_by_provider_token() {
        let ledger = InMemoryLedger::new();
        let original = method("cust-1", "tok-1", false);
        ledger.upsert(original.clone()).await.unwrap();

        let mut resaved = method("cust-1", "tok-1", true);
        resaved.brand = Some("mastercard".to_string());
        let stored = ledger.upsert(resaved).await.unwrap();

        // Same row, refreshed fields.
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.brand.as_deref(), Some("mastercard"));
        assert!(stored.is_default);
        assert_eq!(ledger.list_for_customer("cust-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_method_listing_order() {
        let ledger = InMemoryLedger::new();
        let mut oldest = method("cust-1", "tok-1", false);
        oldest.created_at = Utc::now() - Duration::minutes(10);
        let mut default = method("cust-1", "tok-2", true);
        default.created_at = Utc::now() - Duration::minutes(5);
        let newest = method("cust-1", "tok-3", false);

        ledger.upsert(oldest.clone()).await.unwrap();
        ledger.upsert(default.clone()).await.unwrap();
        ledger.upsert(newest.clone()).await.unwrap();

        let listed = ledger.list_for_customer("cust-1").await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![default.id, newest.id, oldest.id]);
    }

    #[tokio::test]
    async fn test_remove_reports_missing_rows() {
        let ledger = InMemoryLedger::new();
        let row = method("cust-1", "tok-1", false);
        ledger.upsert(row.clone()).await.unwrap();

        assert!(ledger.remove(row.id).await.unwrap());
        assert!(!ledger.remove(row.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_payment_listing_filters_and_pages() {
        let ledger = InMemoryLedger::new();
        let mut a = payment("ORD-1", PaymentStatus::Succeeded);
        a.customer_id = "cust-1".to_string();
        a.created_at = Utc::now() - Duration::minutes(2);
        let mut b = payment("ORD-2", PaymentStatus::Failed);
        b.customer_id = "cust-2".to_string();
        b.created_at = Utc::now() - Duration::minutes(1);
        let mut c = payment("ORD-3", PaymentStatus::Succeeded);
        c.customer_id = "cust-1".to_string();

        for p in [a.clone(), b.clone(), c.clone()] {
            PaymentStore::insert(&ledger, p).await.unwrap();
        }

        let query = PaymentQuery {
            customer_id: Some("cust-1".to_string()),
            take: 10,
            ..Default::default()
        };
        let listed = ledger.list(&query).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![c.id, a.id]);

        let paged = ledger
            .list(&PaymentQuery {
                customer_id: Some("cust-1".to_string()),
                skip: 1,
                take: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].id, a.id);
    }
}
