//! Value a block of annuities from a CSV of parameter records
//!
//! Writes one summary row per record and prints block totals.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use annuity_system::mortality::load_registry;
use annuity_system::mortality::loader::DEFAULT_TABLES_PATH;
use annuity_system::valuation::{AnnuityParameters, ParameterRecord, ValuationConfig, ValuationEngine};
use annuity_system::ValuationRunner;

#[derive(Parser)]
#[command(name = "value_block", about = "Value every annuity in a CSV block")]
struct Cli {
    /// Input CSV with camelCase parameter columns
    #[arg(default_value = "annuity_block.csv")]
    input: PathBuf,

    /// Output summary CSV
    #[arg(long, default_value = "block_valuation_output.csv")]
    output: PathBuf,

    /// Directory of additional CSV mortality tables [default: data/mortality if present]
    #[arg(long)]
    tables_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    #[serde(rename = "Row")]
    row: usize,
    #[serde(rename = "Type")]
    annuity_type: &'a str,
    #[serde(rename = "Age")]
    age: u32,
    #[serde(rename = "Sex")]
    sex: &'a str,
    #[serde(rename = "Table")]
    table: &'a str,
    #[serde(rename = "PresentValue")]
    present_value: f64,
    #[serde(rename = "MonthlyPayment")]
    monthly_payment: f64,
    #[serde(rename = "TotalPayments")]
    total_payments: f64,
    #[serde(rename = "LifeExpectancy")]
    life_expectancy: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let start = Instant::now();
    println!("Loading annuities from {}...", cli.input.display());

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&cli.input)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;
    let block = reader
        .deserialize::<ParameterRecord>()
        .map(|record| record.map(AnnuityParameters::from))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to parse parameter records")?;
    println!("Loaded {} annuities in {:?}", block.len(), start.elapsed());

    println!("Running valuations...");
    let valuation_start = Instant::now();
    let tables_dir = cli.tables_dir.as_deref();
    let registry = load_registry(tables_dir).with_context(|| {
        let dir = tables_dir.unwrap_or(Path::new(DEFAULT_TABLES_PATH));
        format!("Failed to load mortality tables from {}", dir.display())
    })?;
    let runner = ValuationRunner::with_engine(ValuationEngine::new(registry, ValuationConfig::default()));
    let results = runner.run_batch(&block);
    println!("Valuations complete in {:?}", valuation_start.elapsed());

    let file = File::create(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    for (row, (params, result)) in block.iter().zip(&results).enumerate() {
        writer.serialize(SummaryRow {
            row: row + 1,
            annuity_type: params.kind().as_str(),
            age: params.age,
            sex: params.sex.as_str(),
            table: params.mortality_table.as_str(),
            present_value: result.present_value,
            monthly_payment: result.monthly_payment,
            total_payments: result.total_payments,
            life_expectancy: result.life_expectancy,
        })?;
    }
    writer.flush()?;
    println!("Output written to {}", cli.output.display());

    let total_pv: f64 = results.iter().map(|r| r.present_value).sum();
    let total_payments: f64 = results.iter().map(|r| r.total_payments).sum();
    println!("\nBlock Summary:");
    println!("  Annuities:       {}", results.len());
    println!("  Present value:   ${:.0}", total_pv);
    println!("  Total payments:  ${:.0}", total_payments);
    if !results.is_empty() {
        let mean_le = results.iter().map(|r| r.life_expectancy).sum::<f64>() / results.len() as f64;
        println!("  Mean LE:         {:.1} years", mean_le);
    }

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
