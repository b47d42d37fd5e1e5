//! Payum - payment runtime assembled from configuration

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tracing::{error, info};

use payum::{
    Payum,
    builder::PayumBuilder,
    cli::{Cli, Command},
    config::PayumConfig,
    factory::{FIELD_PAID, GatewayFactory},
    gateway::{FACTORY_TITLE_KEY, Gateway, GatewayConfig},
    model::{self, ModelId, Payment},
    registry::{GatewayFactoryRegistry, GatewayRegistry, StorageRegistry},
    request::{Request, RequestKind},
    setup_tracing,
    storage::Storage,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let payum = match build(cli.config.as_deref()) {
        Ok(payum) => payum,
        Err(e) => {
            error!(error = %e, "Failed to build payment runtime");
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Command::Check) {
        Command::Check => run_check(&payum),
        Command::Factories { details } => run_factories(&payum, details),
        Command::Gateways => run_gateways(&payum),
        Command::Capture {
            gateway,
            amount,
            currency,
            paid,
        } => run_capture(&payum, &gateway, amount, currency, paid).await,
    }
}

fn build(config: Option<&Path>) -> payum::Result<Payum> {
    let config = PayumConfig::load(config)?;
    config.apply(PayumBuilder::new()).build()
}

fn run_check(payum: &Payum) -> ExitCode {
    println!("✅ Payment runtime built");
    println!("   Gateways: {}", payum.gateways().len());
    println!("   Storages: {}", payum.storages().len());
    println!("   Gateway factories: {}", payum.catalog().len());
    println!("   Token storage: {}", payum.token_storage().model());
    ExitCode::SUCCESS
}

fn run_factories(payum: &Payum, details: bool) -> ExitCode {
    for name in payum.catalog().names() {
        if !details {
            println!("{name}");
            continue;
        }
        let title = payum
            .gateway_factory(name)
            .and_then(|f| f.create_config(GatewayConfig::new()))
            .ok()
            .and_then(|c| c.get_str(FACTORY_TITLE_KEY).map(str::to_string))
            .unwrap_or_default();
        println!("{name:<28} {title}");
    }
    ExitCode::SUCCESS
}

fn run_gateways(payum: &Payum) -> ExitCode {
    let gateways = payum.gateways();
    if gateways.is_empty() {
        println!("No gateways configured.");
        return ExitCode::SUCCESS;
    }
    for (name, gateway) in &gateways {
        println!("{name:<20} {}", gateway.factory_name().unwrap_or("-"));
    }
    ExitCode::SUCCESS
}

async fn run_capture(
    payum: &Payum,
    gateway_name: &str,
    amount: u64,
    currency: String,
    paid: bool,
) -> ExitCode {
    match capture(payum, gateway_name, amount, currency, paid).await {
        Ok(status) => {
            println!("✅ Capture done, status: {status}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Capture failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn capture(
    payum: &Payum,
    gateway_name: &str,
    amount: u64,
    currency: String,
    paid: bool,
) -> payum::Result<String> {
    let gateway = payum.gateway(gateway_name)?;
    let storage = payum.storage(ModelId::of::<Payment>().as_str())?;

    let payment = Payment {
        number: uuid::Uuid::new_v4().simple().to_string(),
        total_amount: amount,
        currency_code: currency,
        ..Payment::default()
    };
    let mut record = model::to_record(&payment)?;
    record.insert(FIELD_PAID.to_string(), Value::Bool(paid));
    let identity = storage.update(&mut record).await?;
    info!(payment = %identity, gateway = %gateway_name, "Payment created");

    gateway
        .execute(&mut Request::for_identity(RequestKind::Capture, identity.clone()))
        .await?;

    let mut status = Request::for_identity(RequestKind::GetStatus, identity);
    gateway.execute(&mut status).await?;
    Ok(status
        .status
        .map_or_else(|| "unknown".to_string(), |s| s.to_string()))
}
