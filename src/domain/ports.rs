use super::method::PaymentMethod;
use super::payment::{Payment, Refund};
use super::provider::{
    ChargeRequest, ProviderCharge, ProviderRefund, ProviderToken, SaveMethodRequest,
};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Filter and pagination for payment listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentQuery {
    pub customer_id: Option<String>,
    pub order_id: Option<String>,
    pub skip: usize,
    pub take: usize,
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new payment attempt.
    ///
    /// This is the storage backstop for the duplicate-charge defense: the
    /// insert must atomically fail with [`PaymentError::DuplicateOrder`] when
    /// the order already has an open or succeeded payment, even when two
    /// requests race past the application-level check.
    ///
    /// [`PaymentError::DuplicateOrder`]: crate::error::PaymentError::DuplicateOrder
    async fn insert(&self, payment: Payment) -> Result<()>;

    /// Replaces the stored row with the reconciled one, keyed by id.
    async fn update(&self, payment: Payment) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<Payment>>;

    async fn find_succeeded_by_order(&self, order_id: &str) -> Result<Option<Payment>>;

    /// Lists payments matching the query, newest first.
    async fn list(&self, query: &PaymentQuery) -> Result<Vec<Payment>>;
}

#[async_trait]
pub trait RefundStore: Send + Sync {
    /// Inserts a new refund attempt, reserving its amount against `cap` (the
    /// parent payment's amount).
    ///
    /// The store must atomically verify that the sum of all non-failed
    /// refunds for the payment, plus this one, stays within `cap`, failing
    /// with [`PaymentError::RefundCapExceeded`] otherwise. Counting open
    /// refunds as reserved is what keeps two racing refunds from both
    /// reaching their provider.
    ///
    /// [`PaymentError::RefundCapExceeded`]: crate::error::PaymentError::RefundCapExceeded
    async fn insert(&self, refund: Refund, cap: Decimal) -> Result<()>;

    async fn update(&self, refund: Refund) -> Result<()>;

    /// Sum of the amounts of all succeeded refunds for the payment.
    async fn succeeded_total(&self, payment_id: Uuid) -> Result<Decimal>;
}

#[async_trait]
pub trait MethodStore: Send + Sync {
    /// Inserts or updates a method, keyed by `(provider, token)`.
    ///
    /// When the incoming method is the customer's default, every other
    /// default flag for that customer is cleared within the same storage
    /// transaction boundary. Returns the stored record.
    async fn upsert(&self, method: PaymentMethod) -> Result<PaymentMethod>;

    async fn get(&self, id: Uuid) -> Result<Option<PaymentMethod>>;

    /// Removes the method. Returns `false` when no such row exists.
    async fn remove(&self, id: Uuid) -> Result<bool>;

    /// Lists a customer's methods, default first, then newest first.
    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<PaymentMethod>>;
}

/// One external payment network behind the uniform capability contract.
///
/// Implementations report refusals (including operations they simply do not
/// support) as failure results; `Err` is reserved for transport or SDK
/// breakage. The correlation id accompanies every call for cross-system
/// tracing.
#[async_trait]
pub trait PaymentProvider: Send + Sync + std::fmt::Debug {
    /// Stable name this provider registers and resolves under.
    fn name(&self) -> &str;

    fn enabled(&self) -> bool;

    /// Payment-method labels this provider can process.
    fn supported_methods(&self) -> &[String];

    async fn charge(&self, request: &ChargeRequest, correlation_id: &str)
    -> Result<ProviderCharge>;

    async fn refund(
        &self,
        payment: &Payment,
        amount: Decimal,
        reason: Option<&str>,
        correlation_id: &str,
    ) -> Result<ProviderRefund>;

    async fn save_method(
        &self,
        request: &SaveMethodRequest,
        correlation_id: &str,
    ) -> Result<ProviderToken>;

    /// Revokes a stored token. Returns `false` when the provider does not
    /// acknowledge the token.
    async fn delete_method(&self, token: &str, correlation_id: &str) -> Result<bool>;
}

pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type RefundStoreBox = Box<dyn RefundStore>;
pub type MethodStoreBox = Box<dyn MethodStore>;
pub type ProviderHandle = Arc<dyn PaymentProvider>;
