#![allow(dead_code)]

use payrail::application::contract::{PaymentRequest, RequestContext};
use payrail::application::orchestrator::PaymentOrchestrator;
use payrail::application::registry::ProviderRegistry;
use payrail::infrastructure::in_memory::InMemoryLedger;
use payrail::infrastructure::simulator::SimulatedProvider;
use rust_decimal::Decimal;
use std::sync::Arc;

pub fn ctx() -> RequestContext {
    RequestContext::new("corr-test", "tests")
}

/// Builds an orchestrator over a fresh in-memory ledger. The ledger handle is
/// returned as well so tests can assert on stored state directly.
pub fn orchestrator_with(
    providers: Vec<Arc<SimulatedProvider>>,
    default: Option<&str>,
) -> (PaymentOrchestrator, InMemoryLedger) {
    let ledger = InMemoryLedger::new();
    (orchestrator_over(ledger.clone(), providers, default), ledger)
}

/// Builds an orchestrator sharing an existing ledger, for scenarios that need
/// a different provider roster against the same stored state.
pub fn orchestrator_over(
    ledger: InMemoryLedger,
    providers: Vec<Arc<SimulatedProvider>>,
    default: Option<&str>,
) -> PaymentOrchestrator {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(provider);
    }
    if let Some(name) = default {
        registry.set_default(name);
    }
    PaymentOrchestrator::new(
        Box::new(ledger.clone()),
        Box::new(ledger.clone()),
        Box::new(ledger),
        registry,
    )
}

pub fn payment_request(order_id: &str, amount: Decimal) -> PaymentRequest {
    PaymentRequest {
        order_id: order_id.to_string(),
        customer_id: "cust-1".to_string(),
        amount,
        currency: "USD".to_string(),
        method: Some("card".to_string()),
        ..Default::default()
    }
}
