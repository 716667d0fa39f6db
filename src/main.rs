//! Annuity valuation CLI
//!
//! Values a single annuity, lists stored calculations, or shows the
//! available mortality tables.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use annuity_system::export::{summary_lines, to_json, write_projection_csv};
use annuity_system::history::{CalculationHistory, FileStore};
use annuity_system::mortality::loader::DEFAULT_TABLES_PATH;
use annuity_system::mortality::{load_registry, MortalityRegistry, Sex};
use annuity_system::validation::validate;
use annuity_system::valuation::{
    AnnuityParameters, AnnuityResult, ParameterRecord, ValuationConfig, ValuationEngine,
};

/// Life annuity present values and cash-flow projections
#[derive(Parser)]
#[command(name = "annuity", version, about = "Life annuity present values and cash-flow projections")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value one annuity
    Value(ValueArgs),
    /// List stored calculations, newest first
    History(HistoryArgs),
    /// List mortality tables with life expectancy at 65
    Tables(TablesArgs),
}

#[derive(Args)]
struct ValueArgs {
    /// Annuity type: simple, reversible, temporary, deferred or growing
    #[arg(long = "type", default_value = "simple")]
    annuity_type: String,

    /// Age of the annuitant
    #[arg(long, allow_negative_numbers = true)]
    age: i64,

    /// Sex of the annuitant
    #[arg(long, default_value = "male")]
    sex: String,

    /// Technical interest rate in percent
    #[arg(long, default_value_t = 2.5)]
    rate: f64,

    /// Annual payment amount
    #[arg(long)]
    amount: f64,

    /// Mortality table id
    #[arg(long, default_value = "TGH05")]
    table: String,

    /// Term in years (temporary)
    #[arg(long)]
    duration: Option<u32>,

    /// Waiting period in years (deferred)
    #[arg(long)]
    deferral: Option<u32>,

    /// Yearly payment growth in percent (growing)
    #[arg(long)]
    growth: Option<f64>,

    /// Survivor share in percent (reversible)
    #[arg(long)]
    reversal: Option<f64>,

    /// Spouse age (reversible)
    #[arg(long, allow_negative_numbers = true)]
    spouse_age: Option<i64>,

    /// Directory of additional CSV mortality tables [default: data/mortality if present]
    #[arg(long)]
    tables_dir: Option<PathBuf>,

    /// Record the calculation in the history kept in this directory
    #[arg(long)]
    history_dir: Option<PathBuf>,

    /// Reject parameters outside the form ranges before valuing
    #[arg(long)]
    validate: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,
}

#[derive(Args)]
struct HistoryArgs {
    /// Directory holding the history
    #[arg(long)]
    history_dir: PathBuf,
}

#[derive(Args)]
struct TablesArgs {
    /// Directory of additional CSV mortality tables [default: data/mortality if present]
    #[arg(long)]
    tables_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Value(args) => run_value(args),
        Commands::History(args) => run_history(args),
        Commands::Tables(args) => run_tables(args),
    }
}

/// Built-in tables plus any CSV tables from `tables_dir` or the default directory
fn registry(tables_dir: Option<&Path>) -> Result<Arc<MortalityRegistry>> {
    let dir = tables_dir.unwrap_or(Path::new(DEFAULT_TABLES_PATH));
    load_registry(tables_dir)
        .with_context(|| format!("Failed to load mortality tables from {}", dir.display()))
}

fn run_value(args: ValueArgs) -> Result<()> {
    let record = ParameterRecord {
        annuity_type: args.annuity_type,
        age: args.age,
        sex: args.sex,
        interest_rate: args.rate,
        annual_amount: args.amount,
        mortality_table: args.table,
        duration: args.duration,
        deferral_period: args.deferral,
        growth_rate: args.growth,
        reversal_rate: args.reversal,
        spouse_age: args.spouse_age,
    };
    let params = AnnuityParameters::from(record);

    if args.validate {
        validate(&params).context("Parameters rejected")?;
    }

    let engine = ValuationEngine::new(registry(args.tables_dir.as_deref())?, ValuationConfig::default());
    let result = engine.evaluate(&params);

    match args.output {
        OutputFormat::Table => print_table(&params, &result),
        OutputFormat::Json => println!("{}", to_json(&params, &result)?),
        OutputFormat::Csv => write_projection_csv(io::stdout().lock(), &params, &result)?,
    }

    if let Some(dir) = args.history_dir {
        let store = FileStore::open(&dir)
            .with_context(|| format!("Failed to open history store {}", dir.display()))?;
        let mut history = CalculationHistory::open(store)?;
        let entry = history.record(params, result)?;
        eprintln!("Recorded calculation #{} in {}", entry.id, dir.display());
    }

    Ok(())
}

fn print_table(params: &AnnuityParameters, result: &AnnuityResult) {
    println!("Annuity Valuation");
    println!("=================\n");
    for line in summary_lines(params, result) {
        println!("  {}", line);
    }
    println!();

    println!("{:>5} {:>14} {:>16} {:>10}", "Year", "Payment", "Cumulative", "Survival");
    println!("{}", "-".repeat(48));
    for point in &result.projections {
        println!(
            "{:>5} {:>14.0} {:>16.0} {:>10.2}",
            point.year, point.payment, point.cumulative_payment, point.survival_probability
        );
    }
}

fn run_history(args: HistoryArgs) -> Result<()> {
    let store = FileStore::open(&args.history_dir)
        .with_context(|| format!("Failed to open history store {}", args.history_dir.display()))?;
    let history = CalculationHistory::open(store)?;

    if history.is_empty() {
        println!("No stored calculations");
        return Ok(());
    }

    println!("{:>4} {:<20} {:<11} {:>4} {:>7} {:>14}", "Id", "Timestamp", "Type", "Age", "Sex", "PresentValue");
    println!("{}", "-".repeat(65));
    for entry in history.entries() {
        println!(
            "{:>4} {:<20} {:<11} {:>4} {:>7} {:>14.0}",
            entry.id,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.kind.as_str(),
            entry.parameters.age,
            entry.parameters.sex.as_str(),
            entry.result.present_value,
        );
    }

    Ok(())
}

fn run_tables(args: TablesArgs) -> Result<()> {
    let registry = registry(args.tables_dir.as_deref())?;

    println!("{:<12} {:>6} {:>10} {:>10}", "Table", "Ages", "LE65 male", "LE65 fem.");
    println!("{}", "-".repeat(41));
    for id in registry.table_ids() {
        let ages = registry.curve(&id, Sex::Male).len();
        println!(
            "{:<12} {:>6} {:>10.1} {:>10.1}",
            id.as_str(),
            ages,
            registry.life_expectancy(65, Sex::Male, &id),
            registry.life_expectancy(65, Sex::Female, &id),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_age_is_a_value() {
        let cli = Cli::try_parse_from([
            "annuity", "value", "--age", "-5", "--amount", "1200", "--type", "reversible",
            "--spouse-age", "-1",
        ])
        .unwrap();

        match cli.command {
            Commands::Value(args) => {
                assert_eq!(args.age, -5);
                assert_eq!(args.spouse_age, Some(-1));
            }
            _ => panic!("expected the value subcommand"),
        }
    }

    #[test]
    fn test_value_defaults() {
        let cli = Cli::try_parse_from(["annuity", "value", "--age", "65", "--amount", "12000"]).unwrap();
        match cli.command {
            Commands::Value(args) => {
                assert_eq!(args.annuity_type, "simple");
                assert_eq!(args.table, "TGH05");
                assert_eq!(args.rate, 2.5);
                assert!(args.tables_dir.is_none());
            }
            _ => panic!("expected the value subcommand"),
        }
    }
}
