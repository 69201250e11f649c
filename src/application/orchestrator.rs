use super::contract::{
    Decline, MethodOutcome, NewMethodRequest, PaymentOutcome, PaymentRequest, RefundOutcome,
    RefundRequest, RequestContext,
};
use super::registry::ProviderRegistry;
use crate::domain::method::PaymentMethod;
use crate::domain::money::Amount;
use crate::domain::payment::{Payment, PaymentStatus, Refund, RefundStatus, merge_metadata};
use crate::domain::ports::{MethodStoreBox, PaymentQuery, PaymentStoreBox, RefundStoreBox};
use crate::domain::provider::{ChargeRequest, SaveMethodRequest};
use crate::error::{PaymentError, Result};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Upper bound applied to the `take` of every listing query.
const MAX_PAGE_TAKE: usize = 100;
/// Page size used when the caller does not ask for one.
const DEFAULT_PAGE_TAKE: usize = 50;

/// The payment orchestration engine.
///
/// Coordinates the durable ledger with external providers: it validates
/// requests, enforces the financial invariants against stored state, drives
/// the create-pending/invoke-provider/reconcile flow, and returns normalized
/// outcomes. Expected rejections come back as unsuccessful outcomes with a
/// specific message; unexpected failures are logged with the correlation id
/// and come back as unsuccessful outcomes with a generic one. No public
/// method returns an error or panics for either tier.
///
/// The orchestrator holds no per-request state and is safe to share across
/// concurrent requests; all correctness comes from the invariants the stores
/// enforce at write time.
pub struct PaymentOrchestrator {
    payments: PaymentStoreBox,
    refunds: RefundStoreBox,
    methods: MethodStoreBox,
    registry: ProviderRegistry,
}

impl PaymentOrchestrator {
    pub fn new(
        payments: PaymentStoreBox,
        refunds: RefundStoreBox,
        methods: MethodStoreBox,
        registry: ProviderRegistry,
    ) -> Self {
        Self {
            payments,
            refunds,
            methods,
            registry,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Processes a payment intent for an order.
    pub async fn process_payment(
        &self,
        request: PaymentRequest,
        ctx: &RequestContext,
    ) -> PaymentOutcome {
        // Validation happens before any side effect, including record creation.
        if request.order_id.trim().is_empty() {
            return PaymentOutcome::declined(&Decline::EmptyOrderId);
        }
        let amount = match Amount::new(request.amount) {
            Ok(amount) => amount,
            Err(_) => return PaymentOutcome::declined(&Decline::NonPositiveAmount),
        };

        match self.try_process_payment(request, amount, ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    correlation_id = %ctx.correlation_id,
                    error = %e,
                    "payment processing failed"
                );
                PaymentOutcome::failed_internally()
            }
        }
    }

    async fn try_process_payment(
        &self,
        request: PaymentRequest,
        amount: Amount,
        ctx: &RequestContext,
    ) -> Result<PaymentOutcome> {
        // Sole duplicate-charge defense: check before any side effect. The
        // store insert below backstops the race this check can lose.
        if self
            .payments
            .find_succeeded_by_order(&request.order_id)
            .await?
            .is_some()
        {
            return Ok(PaymentOutcome::declined(&Decline::DuplicatePayment));
        }

        let provider = match self
            .registry
            .resolve(request.provider.as_deref(), request.method.as_deref())
        {
            Ok(provider) => provider,
            Err(decline) => return Ok(PaymentOutcome::declined(&decline)),
        };

        let now = Utc::now();
        let mut metadata = request.metadata.clone();
        metadata.insert("correlation_id".to_string(), json!(ctx.correlation_id));
        metadata.insert("initiated_by".to_string(), json!(ctx.initiated_by));

        let mut payment = Payment {
            id: Uuid::new_v4(),
            order_id: request.order_id.clone(),
            customer_id: request.customer_id.clone(),
            amount: amount.value(),
            currency: request.currency.clone(),
            provider: provider.name().to_string(),
            method: request.method.clone(),
            status: PaymentStatus::Pending,
            provider_transaction_id: None,
            provider_reference: None,
            failure_reason: None,
            metadata,
            created_at: now,
            created_by: ctx.initiated_by.clone(),
            updated_at: now,
            updated_by: None,
        };

        // Persisted before the provider call: a crash mid-call still leaves a
        // durable record of the attempt.
        match self.payments.insert(payment.clone()).await {
            Ok(()) => {}
            Err(PaymentError::DuplicateOrder(_)) => {
                return Ok(PaymentOutcome::declined(&Decline::DuplicatePayment));
            }
            Err(e) => return Err(e),
        }
        debug!(
            correlation_id = %ctx.correlation_id,
            payment_id = %payment.id,
            order_id = %payment.order_id,
            provider = provider.name(),
            "payment attempt recorded"
        );

        let charge_request = ChargeRequest {
            order_id: payment.order_id.clone(),
            customer_id: payment.customer_id.clone(),
            amount: payment.amount,
            currency: payment.currency.clone(),
            method: payment.method.clone(),
            description: request.description.clone(),
            metadata: payment.metadata.clone(),
        };

        match provider.charge(&charge_request, &ctx.correlation_id).await {
            Ok(charge) => {
                payment.metadata = merge_metadata(&payment.metadata, &charge.metadata);
                payment.provider_transaction_id = charge.transaction_id;
                payment.provider_reference = charge.reference;
                payment.status = charge.status.into();
                payment.failure_reason = charge.failure_reason;
            }
            Err(e) => {
                // A broken provider call fails this attempt; it must not fail
                // the request pipeline.
                error!(
                    correlation_id = %ctx.correlation_id,
                    payment_id = %payment.id,
                    provider = provider.name(),
                    error = %e,
                    "provider charge call failed"
                );
                payment.status = PaymentStatus::Failed;
                payment.failure_reason = Some(super::contract::GENERIC_PAYMENT_ERROR.to_string());
            }
        }

        payment.updated_at = Utc::now();
        payment.updated_by = Some(ctx.initiated_by.clone());
        self.payments.update(payment.clone()).await?;

        debug!(
            correlation_id = %ctx.correlation_id,
            payment_id = %payment.id,
            status = %payment.status,
            "payment reconciled"
        );
        Ok(PaymentOutcome::from_payment(&payment))
    }

    /// Processes a refund against a previously succeeded payment.
    pub async fn process_refund(
        &self,
        request: RefundRequest,
        ctx: &RequestContext,
    ) -> RefundOutcome {
        let amount = match Amount::new(request.amount) {
            Ok(amount) => amount,
            Err(_) => return RefundOutcome::declined(&Decline::NonPositiveAmount),
        };

        match self.try_process_refund(request, amount, ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    correlation_id = %ctx.correlation_id,
                    error = %e,
                    "refund processing failed"
                );
                RefundOutcome::failed_internally()
            }
        }
    }

    async fn try_process_refund(
        &self,
        request: RefundRequest,
        amount: Amount,
        ctx: &RequestContext,
    ) -> Result<RefundOutcome> {
        let payment = match self.payments.get(request.payment_id).await? {
            Some(payment) => payment,
            None => return Ok(RefundOutcome::declined(&Decline::PaymentNotFound)),
        };
        if payment.status != PaymentStatus::Succeeded {
            return Ok(RefundOutcome::declined(&Decline::PaymentNotRefundable(
                payment.status,
            )));
        }

        // The financial-safety check runs against durable prior state; the
        // store insert below re-checks it atomically for racing requests.
        let refunded = self.refunds.succeeded_total(payment.id).await?;
        if refunded + amount.value() > payment.amount {
            return Ok(RefundOutcome::declined(&Decline::RefundExceedsBalance));
        }

        // Refunds are not portable: only the provider that captured the
        // payment can return it.
        let provider = match self.registry.by_name(&payment.provider) {
            Ok(provider) => provider,
            Err(decline) => return Ok(RefundOutcome::declined(&decline)),
        };

        let now = Utc::now();
        let mut metadata = request.metadata.clone();
        metadata.insert("correlation_id".to_string(), json!(ctx.correlation_id));
        metadata.insert("initiated_by".to_string(), json!(ctx.initiated_by));

        let mut refund = Refund {
            id: Uuid::new_v4(),
            payment_id: payment.id,
            amount: amount.value(),
            currency: payment.currency.clone(),
            status: RefundStatus::Pending,
            provider_refund_id: None,
            reason: request.reason.clone(),
            failure_reason: None,
            metadata,
            created_at: now,
            created_by: ctx.initiated_by.clone(),
            updated_at: now,
            updated_by: None,
        };

        match self.refunds.insert(refund.clone(), payment.amount).await {
            Ok(()) => {}
            Err(PaymentError::RefundCapExceeded(_)) => {
                return Ok(RefundOutcome::declined(&Decline::RefundExceedsBalance));
            }
            Err(e) => return Err(e),
        }
        debug!(
            correlation_id = %ctx.correlation_id,
            refund_id = %refund.id,
            payment_id = %payment.id,
            "refund attempt recorded"
        );

        match provider
            .refund(
                &payment,
                refund.amount,
                request.reason.as_deref(),
                &ctx.correlation_id,
            )
            .await
        {
            Ok(result) => {
                refund.metadata = merge_metadata(&refund.metadata, &result.metadata);
                refund.provider_refund_id = result.refund_id;
                refund.status = result.status.into();
                refund.failure_reason = result.failure_reason;
            }
            Err(e) => {
                error!(
                    correlation_id = %ctx.correlation_id,
                    refund_id = %refund.id,
                    provider = provider.name(),
                    error = %e,
                    "provider refund call failed"
                );
                refund.status = RefundStatus::Failed;
                refund.failure_reason = Some(super::contract::GENERIC_REFUND_ERROR.to_string());
            }
        }

        refund.updated_at = Utc::now();
        refund.updated_by = Some(ctx.initiated_by.clone());
        self.refunds.update(refund.clone()).await?;

        Ok(RefundOutcome::from_refund(&refund))
    }

    /// Exchanges a single-use credential for a stored payment method.
    pub async fn save_method(
        &self,
        request: NewMethodRequest,
        ctx: &RequestContext,
    ) -> MethodOutcome {
        match self.try_save_method(request, ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    correlation_id = %ctx.correlation_id,
                    error = %e,
                    "saving payment method failed"
                );
                MethodOutcome::failed_internally()
            }
        }
    }

    async fn try_save_method(
        &self,
        request: NewMethodRequest,
        ctx: &RequestContext,
    ) -> Result<MethodOutcome> {
        // No method-label inference here: tokenization goes to the named
        // provider or the default one.
        let provider = match self.registry.resolve(request.provider.as_deref(), None) {
            Ok(provider) => provider,
            Err(decline) => return Ok(MethodOutcome::declined(&decline)),
        };

        let save_request = SaveMethodRequest {
            customer_id: request.customer_id.clone(),
            method_type: request.method_type.clone(),
            credential: request.credential.clone(),
        };
        let token = provider
            .save_method(&save_request, &ctx.correlation_id)
            .await?;

        if !token.approved {
            let reason = token
                .failure_reason
                .unwrap_or_else(|| "Payment method was declined".to_string());
            return Ok(MethodOutcome::declined(&Decline::MethodRejected(reason)));
        }
        let Some(stored_token) = token.token else {
            return Err(PaymentError::Provider(format!(
                "{} approved tokenization without a token",
                provider.name()
            )));
        };

        let now = Utc::now();
        let method = PaymentMethod {
            id: Uuid::new_v4(),
            customer_id: request.customer_id.clone(),
            provider: provider.name().to_string(),
            token: stored_token,
            method_type: request.method_type.clone(),
            brand: token.brand,
            last4: token.last4,
            exp_month: token.exp_month,
            exp_year: token.exp_year,
            is_default: request.set_default,
            created_at: now,
            created_by: ctx.initiated_by.clone(),
            updated_at: now,
        };

        // The default swap happens inside the store's transaction boundary.
        let stored = self.methods.upsert(method).await?;
        debug!(
            correlation_id = %ctx.correlation_id,
            method_id = %stored.id,
            provider = %stored.provider,
            "payment method saved"
        );
        Ok(MethodOutcome::saved(stored))
    }

    /// Deletes a stored payment method.
    ///
    /// Returns `false` when the method does not exist. The remote revoke is
    /// best effort: the local row is removed even when the provider call
    /// fails, and the mismatch is logged for offline reconciliation.
    pub async fn delete_method(&self, method_id: Uuid, ctx: &RequestContext) -> bool {
        match self.try_delete_method(method_id, ctx).await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!(
                    correlation_id = %ctx.correlation_id,
                    method_id = %method_id,
                    error = %e,
                    "deleting payment method failed"
                );
                false
            }
        }
    }

    async fn try_delete_method(&self, method_id: Uuid, ctx: &RequestContext) -> Result<bool> {
        let method = match self.methods.get(method_id).await? {
            Some(method) => method,
            None => return Ok(false),
        };

        match self.registry.by_name(&method.provider) {
            Ok(provider) => {
                match provider.delete_method(&method.token, &ctx.correlation_id).await {
                    Ok(true) => {}
                    Ok(false) => warn!(
                        correlation_id = %ctx.correlation_id,
                        method_id = %method_id,
                        provider = %method.provider,
                        "provider did not acknowledge token revocation"
                    ),
                    Err(e) => warn!(
                        correlation_id = %ctx.correlation_id,
                        method_id = %method_id,
                        provider = %method.provider,
                        error = %e,
                        "remote token revocation failed; deleting locally"
                    ),
                }
            }
            Err(decline) => warn!(
                correlation_id = %ctx.correlation_id,
                method_id = %method_id,
                provider = %method.provider,
                reason = %decline,
                "provider unavailable for token revocation; deleting locally"
            ),
        }

        self.methods.remove(method_id).await
    }

    /// Looks up a single payment. Read failures degrade to `None`.
    pub async fn payment(&self, id: Uuid) -> Option<Payment> {
        match self.payments.get(id).await {
            Ok(payment) => payment,
            Err(e) => {
                warn!(payment_id = %id, error = %e, "payment lookup failed");
                None
            }
        }
    }

    /// Lists payments, newest first. Read failures degrade to empty.
    pub async fn payments(&self, query: PaymentQuery) -> Vec<Payment> {
        let query = clamp_query(query);
        match self.payments.list(&query).await {
            Ok(payments) => payments,
            Err(e) => {
                warn!(error = %e, "payment listing failed");
                Vec::new()
            }
        }
    }

    /// Lists a customer's stored methods, default first, then newest first.
    /// Read failures degrade to empty.
    pub async fn methods_for_customer(&self, customer_id: &str) -> Vec<PaymentMethod> {
        match self.methods.list_for_customer(customer_id).await {
            Ok(methods) => methods,
            Err(e) => {
                warn!(customer_id, error = %e, "method listing failed");
                Vec::new()
            }
        }
    }
}

fn clamp_query(mut query: PaymentQuery) -> PaymentQuery {
    if query.take == 0 {
        query.take = DEFAULT_PAGE_TAKE;
    }
    query.take = query.take.min(MAX_PAGE_TAKE);
    query
}
