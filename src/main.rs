use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payrail::application::contract::{
    Decline, NewMethodRequest, PaymentRequest, RefundRequest, RequestContext,
};
use payrail::application::orchestrator::PaymentOrchestrator;
use payrail::application::registry::ProviderRegistry;
use payrail::domain::payment::{Metadata, PaymentStatus};
use payrail::domain::ports::{MethodStoreBox, PaymentQuery, PaymentStoreBox, RefundStoreBox};
use payrail::infrastructure::in_memory::InMemoryLedger;
#[cfg(feature = "storage-rocksdb")]
use payrail::infrastructure::rocksdb::RocksDbLedger;
use payrail::infrastructure::simulator::{Script, SimulatedProvider};
use payrail::interfaces::csv::instruction_reader::{
    Instruction, InstructionKind, InstructionReader,
};
use payrail::interfaces::csv::report_writer::{ReportRow, ReportWriter};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input instructions CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Provider used when an instruction names none and no method label matches.
    #[arg(long, default_value = "alphapay")]
    default_provider: String,

    /// Disable a provider by name (repeatable).
    #[arg(long)]
    disable: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let (payments, refunds, methods) = build_stores(cli.db_path.as_ref())?;
    let registry = build_registry(&cli.default_provider, &cli.disable);
    let orchestrator = PaymentOrchestrator::new(payments, refunds, methods, registry);
    debug!(roster = ?orchestrator.registry().enabled_providers(), "enabled providers");

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = InstructionReader::new(file);

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    for instruction_result in reader.instructions() {
        match instruction_result {
            Ok(instruction) => {
                let row = execute(&orchestrator, instruction).await;
                writer.write_row(&row).into_diagnostic()?;
            }
            Err(e) => {
                eprintln!("Error reading instruction: {}", e);
            }
        }
    }
    writer.flush().into_diagnostic()?;

    Ok(())
}

type Stores = (PaymentStoreBox, RefundStoreBox, MethodStoreBox);

fn build_stores(db_path: Option<&PathBuf>) -> Result<Stores> {
    match db_path {
        Some(db_path) => {
            #[cfg(feature = "storage-rocksdb")]
            {
                let ledger = RocksDbLedger::open(db_path).into_diagnostic()?;
                Ok((
                    Box::new(ledger.clone()),
                    Box::new(ledger.clone()),
                    Box::new(ledger),
                ))
            }
            #[cfg(not(feature = "storage-rocksdb"))]
            {
                let _ = db_path;
                eprintln!(
                    "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
                );
                let ledger = InMemoryLedger::new();
                Ok((
                    Box::new(ledger.clone()),
                    Box::new(ledger.clone()),
                    Box::new(ledger),
                ))
            }
        }
        None => {
            let ledger = InMemoryLedger::new();
            Ok((
                Box::new(ledger.clone()),
                Box::new(ledger.clone()),
                Box::new(ledger),
            ))
        }
    }
}

/// Fixed roster of simulated networks: alphapay handles card and wallet
/// methods and can tokenize; betapay handles bank transfers and refuses
/// tokenization.
fn build_registry(default_provider: &str, disabled: &[String]) -> ProviderRegistry {
    let mut alphapay = SimulatedProvider::new("alphapay", &["card", "wallet"]);
    if disabled.iter().any(|name| name == "alphapay") {
        alphapay = alphapay.disabled();
    }

    let mut betapay = SimulatedProvider::new("betapay", &["bank-transfer"]).tokenize_script(
        Script::Decline("betapay does not store payment methods".to_string()),
    );
    if disabled.iter().any(|name| name == "betapay") {
        betapay = betapay.disabled();
    }

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(alphapay));
    registry.register(Arc::new(betapay));
    registry.set_default(default_provider);
    registry
}

async fn execute(orchestrator: &PaymentOrchestrator, instruction: Instruction) -> ReportRow {
    let ctx = RequestContext::new(Uuid::new_v4().to_string(), "cli");
    match instruction.op {
        InstructionKind::Payment => {
            let order = instruction.order.clone().unwrap_or_default();
            let request = PaymentRequest {
                order_id: order.clone(),
                customer_id: instruction.customer.clone().unwrap_or_default(),
                amount: instruction.amount.unwrap_or_default(),
                currency: instruction
                    .currency
                    .clone()
                    .unwrap_or_else(|| "USD".to_string()),
                method: instruction.method.clone(),
                provider: instruction.provider.clone(),
                description: None,
                metadata: Metadata::new(),
            };
            let outcome = orchestrator.process_payment(request, &ctx).await;
            ReportRow {
                op: "payment".to_string(),
                order,
                id: outcome
                    .payment_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                status: outcome.status.map(|s| s.to_string()).unwrap_or_default(),
                success: outcome.success,
                error: outcome.error.unwrap_or_default(),
            }
        }
        InstructionKind::Refund => {
            let order = instruction.reference.clone().unwrap_or_default();
            let target = orchestrator
                .payments(PaymentQuery {
                    order_id: Some(order.clone()),
                    ..Default::default()
                })
                .await
                .into_iter()
                .find(|p| p.status == PaymentStatus::Succeeded);
            match target {
                Some(payment) => {
                    let request = RefundRequest {
                        payment_id: payment.id,
                        amount: instruction.amount.unwrap_or_default(),
                        reason: None,
                        metadata: Metadata::new(),
                    };
                    let outcome = orchestrator.process_refund(request, &ctx).await;
                    ReportRow {
                        op: "refund".to_string(),
                        order,
                        id: outcome
                            .refund_id
                            .map(|id| id.to_string())
                            .unwrap_or_default(),
                        status: outcome.status.map(|s| s.to_string()).unwrap_or_default(),
                        success: outcome.success,
                        error: outcome.error.unwrap_or_default(),
                    }
                }
                None => ReportRow {
                    op: "refund".to_string(),
                    order,
                    id: String::new(),
                    status: String::new(),
                    success: false,
                    error: Decline::PaymentNotFound.to_string(),
                },
            }
        }
        InstructionKind::SaveMethod => {
            let request = NewMethodRequest {
                customer_id: instruction.customer.clone().unwrap_or_default(),
                provider: instruction.provider.clone(),
                method_type: instruction
                    .method
                    .clone()
                    .unwrap_or_else(|| "card".to_string()),
                credential: instruction.reference.clone().unwrap_or_default(),
                set_default: instruction.r#default.unwrap_or(false),
            };
            let outcome = orchestrator.save_method(request, &ctx).await;
            ReportRow {
                op: "save-method".to_string(),
                order: instruction.order.clone().unwrap_or_default(),
                id: outcome
                    .method
                    .map(|m| m.id.to_string())
                    .unwrap_or_default(),
                status: String::new(),
                success: outcome.success,
                error: outcome.error.unwrap_or_default(),
            }
        }
        InstructionKind::DeleteMethod => {
            let parsed = instruction
                .reference
                .as_deref()
                .and_then(|r| Uuid::parse_str(r).ok());
            match parsed {
                Some(method_id) => {
                    let deleted = orchestrator.delete_method(method_id, &ctx).await;
                    ReportRow {
                        op: "delete-method".to_string(),
                        order: String::new(),
                        id: method_id.to_string(),
                        status: String::new(),
                        success: deleted,
                        error: if deleted {
                            String::new()
                        } else {
                            "Payment method not found".to_string()
                        },
                    }
                }
                None => ReportRow {
                    op: "delete-method".to_string(),
                    order: String::new(),
                    id: String::new(),
                    status: String::new(),
                    success: false,
                    error: "delete-method requires a method id in the reference column"
                        .to_string(),
                },
            }
        }
    }
}
