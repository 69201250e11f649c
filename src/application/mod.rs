//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `PaymentOrchestrator`, the primary entry point for
//! processing payments, refunds and stored payment methods, together with the
//! provider registry and the request/outcome contract it exposes to callers.

pub mod contract;
pub mod orchestrator;
pub mod registry;
