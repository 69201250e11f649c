use crate::domain::payment::Payment;
use crate::domain::ports::PaymentProvider;
use crate::domain::provider::{
    ChargeRequest, ProviderCharge, ProviderRefund, ProviderStatus, ProviderToken,
    SaveMethodRequest,
};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Scripted behavior for one operation of a [`SimulatedProvider`].
#[derive(Debug, Clone, Default)]
pub enum Script {
    /// The network approves the operation.
    #[default]
    Approve,
    /// The network refuses with the given reason. Also how a provider that
    /// simply cannot perform an operation (e.g. tokenization) is expressed.
    Decline(String),
    /// The network accepts the submission but has not settled it.
    Hold,
    /// The call breaks at the transport/SDK level.
    Fail(String),
}

/// A deterministic, fully scriptable payment network.
///
/// Stands in for a real provider SDK in the batch runner and the test
/// suites: each operation follows its configured [`Script`] and counts its
/// invocations.
#[derive(Debug)]
pub struct SimulatedProvider {
    name: String,
    enabled: bool,
    methods: Vec<String>,
    charge_script: Script,
    refund_script: Script,
    tokenize_script: Script,
    revoke_script: Script,
    charge_calls: AtomicUsize,
    refund_calls: AtomicUsize,
    tokenize_calls: AtomicUsize,
    revoke_calls: AtomicUsize,
    sequence: AtomicU64,
}

impl SimulatedProvider {
    pub fn new(name: impl Into<String>, methods: &[&str]) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            methods: methods.iter().map(|m| m.to_string()).collect(),
            charge_script: Script::Approve,
            refund_script: Script::Approve,
            tokenize_script: Script::Approve,
            revoke_script: Script::Approve,
            charge_calls: AtomicUsize::new(0),
            refund_calls: AtomicUsize::new(0),
            tokenize_calls: AtomicUsize::new(0),
            revoke_calls: AtomicUsize::new(0),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn charge_script(mut self, script: Script) -> Self {
        self.charge_script = script;
        self
    }

    pub fn refund_script(mut self, script: Script) -> Self {
        self.refund_script = script;
        self
    }

    pub fn tokenize_script(mut self, script: Script) -> Self {
        self.tokenize_script = script;
        self
    }

    pub fn revoke_script(mut self, script: Script) -> Self {
        self.revoke_script = script;
        self
    }

    pub fn charge_calls(&self) -> usize {
        self.charge_calls.load(Ordering::SeqCst)
    }

    pub fn refund_calls(&self) -> usize {
        self.refund_calls.load(Ordering::SeqCst)
    }

    pub fn tokenize_calls(&self) -> usize {
        self.tokenize_calls.load(Ordering::SeqCst)
    }

    pub fn revoke_calls(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl PaymentProvider for SimulatedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn supported_methods(&self) -> &[String] {
        &self.methods
    }

    async fn charge(
        &self,
        _request: &ChargeRequest,
        _correlation_id: &str,
    ) -> Result<ProviderCharge> {
        self.charge_calls.fetch_add(1, Ordering::SeqCst);
        match &self.charge_script {
            Script::Approve => {
                let seq = self.next_sequence();
                let mut charge = ProviderCharge::approved(format!("{}-txn-{seq}", self.name));
                charge.reference = Some(format!("{}-ref-{seq}", self.name));
                charge
                    .metadata
                    .insert("network".to_string(), json!(self.name));
                charge
                    .metadata
                    .insert("auth_code".to_string(), json!(format!("A{seq:06}")));
                Ok(charge)
            }
            Script::Decline(reason) => Ok(ProviderCharge::declined(reason.clone())),
            Script::Hold => {
                let seq = self.next_sequence();
                Ok(ProviderCharge {
                    status: ProviderStatus::Processing,
                    transaction_id: Some(format!("{}-txn-{seq}", self.name)),
                    reference: None,
                    failure_reason: None,
                    metadata: Default::default(),
                })
            }
            Script::Fail(message) => Err(PaymentError::Provider(message.clone())),
        }
    }

    async fn refund(
        &self,
        _payment: &Payment,
        _amount: Decimal,
        _reason: Option<&str>,
        _correlation_id: &str,
    ) -> Result<ProviderRefund> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        match &self.refund_script {
            Script::Approve => {
                let seq = self.next_sequence();
                let mut refund = ProviderRefund::approved(format!("{}-rfn-{seq}", self.name));
                refund
                    .metadata
                    .insert("network".to_string(), json!(self.name));
                Ok(refund)
            }
            Script::Decline(reason) => Ok(ProviderRefund::declined(reason.clone())),
            Script::Hold => {
                let seq = self.next_sequence();
                Ok(ProviderRefund {
                    status: ProviderStatus::Processing,
                    refund_id: Some(format!("{}-rfn-{seq}", self.name)),
                    failure_reason: None,
                    metadata: Default::default(),
                })
            }
            Script::Fail(message) => Err(PaymentError::Provider(message.clone())),
        }
    }

    async fn save_method(
        &self,
        request: &SaveMethodRequest,
        _correlation_id: &str,
    ) -> Result<ProviderToken> {
        self.tokenize_calls.fetch_add(1, Ordering::SeqCst);
        match &self.tokenize_script {
            Script::Approve => {
                let seq = self.next_sequence();
                let mut token = ProviderToken::approved(format!("{}-tok-{seq}", self.name));
                if request.method_type == "card" {
                    token.brand = Some("visa".to_string());
                }
                let digits: String = request
                    .credential
                    .chars()
                    .filter(|c| c.is_ascii_digit())
                    .collect();
                if digits.len() >= 4 {
                    token.last4 = Some(digits[digits.len() - 4..].to_string());
                }
                token.exp_month = Some(12);
                token.exp_year = Some(2030);
                Ok(token)
            }
            Script::Decline(reason) => Ok(ProviderToken::declined(reason.clone())),
            Script::Hold => Ok(ProviderToken::declined(
                "Tokenization is still pending with the network".to_string(),
            )),
            Script::Fail(message) => Err(PaymentError::Provider(message.clone())),
        }
    }

    async fn delete_method(&self, _token: &str, _correlation_id: &str) -> Result<bool> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        match &self.revoke_script {
            Script::Approve => Ok(true),
            Script::Decline(_) | Script::Hold => Ok(false),
            Script::Fail(message) => Err(PaymentError::Provider(message.clone())),
        }
    }
}
