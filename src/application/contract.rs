use crate::domain::method::PaymentMethod;
use crate::domain::payment::{Metadata, Payment, PaymentStatus, Refund, RefundStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Per-request identity and tracing context.
///
/// Threaded explicitly through every orchestrator call instead of living in
/// ambient task-local storage; the correlation id is propagated into record
/// metadata and into every provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub correlation_id: String,
    pub initiated_by: String,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>, initiated_by: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            initiated_by: initiated_by.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentRequest {
    pub order_id: String,
    pub customer_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub method: Option<String>,
    pub provider: Option<String>,
    pub description: Option<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefundRequest {
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMethodRequest {
    pub customer_id: String,
    pub provider: Option<String>,
    pub method_type: String,
    /// Single-use credential from the provider's client SDK, exchanged for a
    /// permanent token.
    pub credential: String,
    pub set_default: bool,
}

/// The expected-failure tier: domain rejections that are part of the normal
/// contract and carry a caller-meaningful message. These are folded into
/// outcome structs, never raised as errors through the public surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Decline {
    EmptyOrderId,
    NonPositiveAmount,
    DuplicatePayment,
    PaymentNotFound,
    PaymentNotRefundable(PaymentStatus),
    RefundExceedsBalance,
    UnknownProvider(String),
    ProviderDisabled(String),
    NoProviderForMethod(String),
    NoDefaultProvider,
    /// Tokenization refused; the provider's reason is passed through
    /// verbatim because it is typically actionable by the caller.
    MethodRejected(String),
}

impl fmt::Display for Decline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyOrderId => write!(f, "Order id is required"),
            Self::NonPositiveAmount => write!(f, "Amount must be greater than zero"),
            Self::DuplicatePayment => write!(f, "Payment already exists for this order"),
            Self::PaymentNotFound => write!(f, "Payment not found"),
            Self::PaymentNotRefundable(status) => {
                write!(f, "Payment is not refundable in status {status}")
            }
            Self::RefundExceedsBalance => {
                write!(f, "Refund amount exceeds the remaining refundable balance")
            }
            Self::UnknownProvider(name) => write!(f, "Unsupported payment provider: {name}"),
            Self::ProviderDisabled(name) => {
                write!(f, "Payment provider {name} is currently disabled")
            }
            Self::NoProviderForMethod(method) => {
                write!(f, "No enabled provider supports payment method {method}")
            }
            Self::NoDefaultProvider => write!(f, "No default payment provider is configured"),
            Self::MethodRejected(reason) => f.write_str(reason),
        }
    }
}

/// Non-specific messages for the unexpected-failure tier. Full detail goes to
/// the log, never to the caller.
pub(crate) const GENERIC_PAYMENT_ERROR: &str = "Payment could not be processed";
pub(crate) const GENERIC_REFUND_ERROR: &str = "Refund could not be processed";
pub(crate) const GENERIC_METHOD_ERROR: &str = "Payment method could not be saved";

/// Normalized result of a payment attempt.
///
/// `success` means the attempt was not rejected and did not fail: a
/// `processing` outcome is reported as successful submission, with `status`
/// telling the caller it has not settled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentOutcome {
    pub success: bool,
    pub payment_id: Option<Uuid>,
    pub provider_transaction_id: Option<String>,
    pub provider_reference: Option<String>,
    pub status: Option<PaymentStatus>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub error: Option<String>,
}

impl PaymentOutcome {
    pub fn declined(decline: &Decline) -> Self {
        Self {
            success: false,
            payment_id: None,
            provider_transaction_id: None,
            provider_reference: None,
            status: None,
            amount: None,
            currency: None,
            error: Some(decline.to_string()),
        }
    }

    pub(crate) fn failed_internally() -> Self {
        Self {
            success: false,
            payment_id: None,
            provider_transaction_id: None,
            provider_reference: None,
            status: None,
            amount: None,
            currency: None,
            error: Some(GENERIC_PAYMENT_ERROR.to_string()),
        }
    }

    pub fn from_payment(payment: &Payment) -> Self {
        let success = !matches!(
            payment.status,
            PaymentStatus::Failed | PaymentStatus::Cancelled
        );
        Self {
            success,
            payment_id: Some(payment.id),
            provider_transaction_id: payment.provider_transaction_id.clone(),
            provider_reference: payment.provider_reference.clone(),
            status: Some(payment.status),
            amount: Some(payment.amount),
            currency: Some(payment.currency.clone()),
            error: if success {
                None
            } else {
                payment.failure_reason.clone()
            },
        }
    }
}

/// Normalized result of a refund attempt, mirroring [`PaymentOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundOutcome {
    pub success: bool,
    pub refund_id: Option<Uuid>,
    pub payment_id: Option<Uuid>,
    pub provider_refund_id: Option<String>,
    pub status: Option<RefundStatus>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub error: Option<String>,
}

impl RefundOutcome {
    pub fn declined(decline: &Decline) -> Self {
        Self {
            success: false,
            refund_id: None,
            payment_id: None,
            provider_refund_id: None,
            status: None,
            amount: None,
            currency: None,
            error: Some(decline.to_string()),
        }
    }

    pub(crate) fn failed_internally() -> Self {
        Self {
            success: false,
            refund_id: None,
            payment_id: None,
            provider_refund_id: None,
            status: None,
            amount: None,
            currency: None,
            error: Some(GENERIC_REFUND_ERROR.to_string()),
        }
    }

    pub fn from_refund(refund: &Refund) -> Self {
        let success = refund.status != RefundStatus::Failed;
        Self {
            success,
            refund_id: Some(refund.id),
            payment_id: Some(refund.payment_id),
            provider_refund_id: refund.provider_refund_id.clone(),
            status: Some(refund.status),
            amount: Some(refund.amount),
            currency: Some(refund.currency.clone()),
            error: if success {
                None
            } else {
                refund.failure_reason.clone()
            },
        }
    }
}

/// Normalized result of saving a payment method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodOutcome {
    pub success: bool,
    pub method: Option<PaymentMethod>,
    pub error: Option<String>,
}

impl MethodOutcome {
    pub fn saved(method: PaymentMethod) -> Self {
        Self {
            success: true,
            method: Some(method),
            error: None,
        }
    }

    pub fn declined(decline: &Decline) -> Self {
        Self {
            success: false,
            method: None,
            error: Some(decline.to_string()),
        }
    }

    pub(crate) fn failed_internally() -> Self {
        Self {
            success: false,
            method: None,
            error: Some(GENERIC_METHOD_ERROR.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decline_messages() {
        assert_eq!(
            Decline::DuplicatePayment.to_string(),
            "Payment already exists for this order"
        );
        assert_eq!(
            Decline::PaymentNotRefundable(PaymentStatus::Pending).to_string(),
            "Payment is not refundable in status pending"
        );
        assert_eq!(
            Decline::UnknownProvider("gamma".to_string()).to_string(),
            "Unsupported payment provider: gamma"
        );
        // Tokenization refusals surface the provider's words untouched.
        assert_eq!(
            Decline::MethodRejected("card declined".to_string()).to_string(),
            "card declined"
        );
    }

    #[test]
    fn test_outcome_success_flags() {
        use chrono::Utc;
        use rust_decimal_macros::dec;

        let mut payment = Payment {
            id: Uuid::new_v4(),
            order_id: "ORD-1".to_string(),
            customer_id: "cust-1".to_string(),
            amount: dec!(100.00),
            currency: "USD".to_string(),
            provider: "alphapay".to_string(),
            method: Some("card".to_string()),
            status: PaymentStatus::Succeeded,
            provider_transaction_id: Some("txn-1".to_string()),
            provider_reference: None,
            failure_reason: None,
            metadata: Metadata::new(),
            created_at: Utc::now(),
            created_by: "tests".to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        };

        let outcome = PaymentOutcome::from_payment(&payment);
        assert!(outcome.success);
        assert_eq!(outcome.status, Some(PaymentStatus::Succeeded));
        assert!(outcome.error.is_none());

        payment.status = PaymentStatus::Processing;
        assert!(PaymentOutcome::from_payment(&payment).success);

        payment.status = PaymentStatus::Failed;
        payment.failure_reason = Some("card declined".to_string());
        let outcome = PaymentOutcome::from_payment(&payment);
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("card declined"));
    }
}
