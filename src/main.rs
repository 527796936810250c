//! Command-line front end: load the customer table, apply a selection and
//! print the dashboard payload as JSON.

use std::path::PathBuf;

use clap::Parser;
use strum::IntoEnumIterator;

use churnlens::category::{CodedCategory, ContractType, PaymentMethod};
use churnlens::config::{DashboardConfig, DEFAULT_DATA_PATH};
use churnlens::{ChartVariant, DashboardPayload, FilterSelection, Locale};

#[derive(Parser)]
#[command(name = "churnlens", about = "Customer churn dashboard aggregates")]
struct Cli {
    /// Customer CSV to load
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    /// Contract type to keep (repeatable; label or code)
    #[arg(long = "contract")]
    contracts: Vec<String>,

    /// Payment method to keep (repeatable; label or code)
    #[arg(long = "payment")]
    payment_methods: Vec<String>,

    /// Chart set: classic or full
    #[arg(long, default_value = "full")]
    variant: ChartVariant,

    /// Label language: en or pt-br
    #[arg(long, default_value = "en")]
    locale: Locale,

    /// List the selector options and exit
    #[arg(long)]
    options: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    if cli.options {
        println!("Contracts:");
        for contract in ContractType::iter() {
            println!("  {} = {}", contract.code(), contract.label());
        }
        println!("Payment methods:");
        for method in PaymentMethod::iter() {
            println!("  {} = {}", method.code(), method.label());
        }
        return Ok(());
    }

    let config = DashboardConfig {
        data_path: cli.data,
        variant: cli.variant,
        locale: cli.locale,
    };
    let engine = config.build_engine()?;

    let selection = FilterSelection::from_labels(&cli.contracts, &cli.payment_methods);
    let result = engine.compute(&selection)?;
    if result.is_empty() {
        log::warn!("No customers match the selection");
    }

    println!(
        "{}",
        DashboardPayload::new(&result, config.locale).to_json(cli.pretty)?
    );
    Ok(())
}
