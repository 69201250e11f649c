use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Free-form record annotations: string keys mapping to arbitrary JSON values.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Merges two metadata snapshots into a fresh map.
///
/// Keys from `overlay` win on conflict. Neither input is mutated; records
/// that are read and updated across await points always replace their
/// metadata wholesale with the merged result.
pub fn merge_metadata(base: &Metadata, overlay: &Metadata) -> Metadata {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    /// An open payment is one whose provider outcome has not been recorded.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A durable record of one payment attempt against an order.
///
/// Rows are created in `Pending` before the provider is invoked and mutated
/// exactly once with the provider's outcome. They are never deleted.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: String,
    pub customer_id: String,
    pub amount: Decimal,
    pub currency: String,
    /// Name of the provider that processed (or is processing) this attempt.
    pub provider: String,
    pub method: Option<String>,
    pub status: PaymentStatus,
    /// Identifier assigned by the provider for this charge.
    pub provider_transaction_id: Option<String>,
    /// The provider's own reference when distinct from the transaction id.
    pub provider_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// A durable record of one refund attempt against a succeeded payment.
///
/// Many refunds may reference the same payment; the currency is inherited
/// from the parent. Same lifecycle discipline as [`Payment`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Refund {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: RefundStatus,
    pub provider_refund_id: Option<String>,
    pub reason: Option<String>,
    pub failure_reason: Option<String>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}
