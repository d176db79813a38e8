mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::fixed_income::{BondValuationArgs, BondYieldArgs, CouponScheduleArgs};
use commands::real_assets::RealEstateArgs;
use commands::wealth::{CagrArgs, CompoundInterestArgs, LoanArgs};

/// Bond valuation and personal-finance calculations
#[derive(Parser)]
#[command(
    name = "fincalc",
    version,
    about = "Bond valuation and personal-finance calculations",
    long_about = "A CLI for bond valuation (accrued interest, dirty price, yield to maturity) \
                  and personal-finance projections with decimal precision. Supports loans, \
                  compound interest, CAGR and buy-to-let real estate."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Value a bond: accrued interest, dirty price, cash flows and YTM
    BondValuation(BondValuationArgs),
    /// Yield analysis from price and maturity only (Newton-Raphson)
    BondYield(BondYieldArgs),
    /// List coupon dates and locate a purchase date in the schedule
    CouponSchedule(CouponScheduleArgs),
    /// Loan instalment, total cost and amortization schedule
    Loan(LoanArgs),
    /// Compound interest with contributions and inflation
    CompoundInterest(CompoundInterestArgs),
    /// Compound annual growth rate
    Cagr(CagrArgs),
    /// Buy-to-let real estate projection
    RealEstate(RealEstateArgs),
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

/// Logs go to stderr so stdout stays parseable. `RUST_LOG` wins unless a
/// `-v` flag is given.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::BondValuation(args) => commands::fixed_income::run_bond_valuation(args),
        Commands::BondYield(args) => commands::fixed_income::run_bond_yield(args),
        Commands::CouponSchedule(args) => commands::fixed_income::run_coupon_schedule(args),
        Commands::Loan(args) => commands::wealth::run_loan(args),
        Commands::CompoundInterest(args) => commands::wealth::run_compound_interest(args),
        Commands::Cagr(args) => commands::wealth::run_cagr(args),
        Commands::RealEstate(args) => commands::real_assets::run_real_estate(args),
        Commands::Version => {
            println!("fincalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
