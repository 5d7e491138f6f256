mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::scenarios::{CashflowsArgs, EvaluateArgs, MetricsArgs, ProjectionArgs};
use commands::sensitivity::SensitivityArgs;

/// Photovoltaic investment scenarios under Italian incentive regimes
#[derive(Parser)]
#[command(
    name = "pvf",
    version,
    about = "Photovoltaic investment scenarios under Italian incentive regimes",
    long_about = "Evaluate a photovoltaic installation with decimal precision under the \
                  PNRR grant, IRPEF deduction, CER community and P.IVA depreciation regimes. \
                  Reports NPV, IRR and simple/discounted payback per scenario."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every incentive scenario (full output envelope)
    Evaluate(EvaluateArgs),
    /// NPV, IRR and payback per scenario
    Metrics(MetricsArgs),
    /// Yearly cash flows of one scenario
    Cashflows(CashflowsArgs),
    /// Yearly production, price and CER detail of the base projection
    Projection(ProjectionArgs),
    /// One-way sensitivity of scenario metrics to an input
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::scenarios::run_evaluate(args),
        Commands::Metrics(args) => commands::scenarios::run_metrics(args),
        Commands::Cashflows(args) => commands::scenarios::run_cashflows(args),
        Commands::Projection(args) => commands::scenarios::run_projection(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Version => {
            println!("pvf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => output::format_output(&cli.output, &value),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
