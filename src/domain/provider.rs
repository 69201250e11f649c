use super::payment::{Metadata, PaymentStatus, RefundStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome reported by a provider for a single charge, refund or
/// tokenization call.
///
/// A provider that cannot or will not perform an operation reports `Failed`
/// with a reason; only transport/SDK breakage travels as an `Err`. A call
/// whose remote side has not settled yet reports `Processing`, and the caller
/// records that rather than assuming either terminal outcome.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Succeeded,
    Processing,
    Failed,
}

impl From<ProviderStatus> for PaymentStatus {
    fn from(status: ProviderStatus) -> Self {
        match status {
            ProviderStatus::Succeeded => PaymentStatus::Succeeded,
            ProviderStatus::Processing => PaymentStatus::Processing,
            ProviderStatus::Failed => PaymentStatus::Failed,
        }
    }
}

impl From<ProviderStatus> for RefundStatus {
    fn from(status: ProviderStatus) -> Self {
        match status {
            ProviderStatus::Succeeded => RefundStatus::Succeeded,
            ProviderStatus::Processing => RefundStatus::Processing,
            ProviderStatus::Failed => RefundStatus::Failed,
        }
    }
}

/// The generic charge request handed to a provider.
///
/// This is the in-process contract, not a wire format; each implementation
/// translates it into its own network's protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    pub order_id: String,
    pub customer_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub method: Option<String>,
    pub description: Option<String>,
    pub metadata: Metadata,
}

/// Tokenization request. `credential` is a single-use handle obtained from
/// the provider's client-side SDK, never raw card data.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveMethodRequest {
    pub customer_id: String,
    pub method_type: String,
    pub credential: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCharge {
    pub status: ProviderStatus,
    pub transaction_id: Option<String>,
    /// The provider's own reference when distinct from the transaction id.
    pub reference: Option<String>,
    pub failure_reason: Option<String>,
    pub metadata: Metadata,
}

impl ProviderCharge {
    pub fn approved(transaction_id: impl Into<String>) -> Self {
        Self {
            status: ProviderStatus::Succeeded,
            transaction_id: Some(transaction_id.into()),
            reference: None,
            failure_reason: None,
            metadata: Metadata::new(),
        }
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        Self {
            status: ProviderStatus::Failed,
            transaction_id: None,
            reference: None,
            failure_reason: Some(reason.into()),
            metadata: Metadata::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRefund {
    pub status: ProviderStatus,
    pub refund_id: Option<String>,
    pub failure_reason: Option<String>,
    pub metadata: Metadata,
}

impl ProviderRefund {
    pub fn approved(refund_id: impl Into<String>) -> Self {
        Self {
            status: ProviderStatus::Succeeded,
            refund_id: Some(refund_id.into()),
            failure_reason: None,
            metadata: Metadata::new(),
        }
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        Self {
            status: ProviderStatus::Failed,
            refund_id: None,
            failure_reason: Some(reason.into()),
            metadata: Metadata::new(),
        }
    }
}

/// Result of a tokenization call. On approval `token` is the permanent
/// opaque handle; the display fields describe the stored instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderToken {
    pub approved: bool,
    pub token: Option<String>,
    pub brand: Option<String>,
    pub last4: Option<String>,
    pub exp_month: Option<u8>,
    pub exp_year: Option<u16>,
    pub failure_reason: Option<String>,
}

impl ProviderToken {
    pub fn approved(token: impl Into<String>) -> Self {
        Self {
            approved: true,
            token: Some(token.into()),
            brand: None,
            last4: None,
            exp_month: None,
            exp_year: None,
            failure_reason: None,
        }
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            token: None,
            brand: None,
            last4: None,
            exp_month: None,
            exp_year: None,
            failure_reason: Some(reason.into()),
        }
    }
}
