use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use fincalc_core::time_value::{self, CagrInput};
use fincalc_core::wealth::compounding::{self, CompoundInterestInput, ContributionFrequency};
use fincalc_core::wealth::loans::{self, LoanInput};

use crate::input;

/// Arguments for loan amortization
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate (TAN) in percent, e.g. 3.5
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Annual percentage rate of charge (TAEG) in percent
    #[arg(long)]
    pub apr: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Include the monthly amortization schedule
    #[arg(long)]
    pub schedule: bool,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input = match (args.principal, args.rate, args.years) {
        (Some(principal), Some(rate_pct), Some(years)) => LoanInput {
            principal,
            rate_pct,
            apr_pct: args.apr,
            years,
            include_schedule: args.schedule,
        },
        _ => match input::read_input::<LoanInput>(args.input.as_deref())? {
            Some(data) => data,
            None => {
                return Err(
                    "--principal, --rate and --years, or --input <file.json>/stdin, required \
                     for loan"
                        .into(),
                )
            }
        },
    };
    let result = loans::calculate_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for compound interest projection
#[derive(Args)]
pub struct CompoundInterestArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Initial investment
    #[arg(long)]
    pub initial: Option<Decimal>,

    /// Nominal annual return in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Investment horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Total contributed each year
    #[arg(long, default_value = "0")]
    pub contribution: Decimal,

    /// Expected annual inflation in percent
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub inflation: Decimal,

    /// Pay contributions monthly (monthly compounding)
    #[arg(long)]
    pub monthly: bool,
}

pub fn run_compound_interest(
    args: CompoundInterestArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let ci_input = match (args.initial, args.rate, args.years) {
        (Some(initial_investment), Some(rate_pct), Some(years)) => CompoundInterestInput {
            initial_investment,
            rate_pct,
            years,
            annual_contribution: args.contribution,
            inflation_pct: args.inflation,
            contribution_frequency: if args.monthly {
                ContributionFrequency::Monthly
            } else {
                ContributionFrequency::Annual
            },
        },
        _ => match input::read_input::<CompoundInterestInput>(args.input.as_deref())? {
            Some(data) => data,
            None => {
                return Err(
                    "--initial, --rate and --years, or --input <file.json>/stdin, required \
                     for compound interest"
                        .into(),
                )
            }
        },
    };
    let result = compounding::project_compound_interest(&ci_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for CAGR
#[derive(Args)]
pub struct CagrArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Starting capital
    #[arg(long)]
    pub initial: Option<Decimal>,

    /// Ending capital
    #[arg(long = "final", allow_hyphen_values = true)]
    pub final_capital: Option<Decimal>,

    /// Holding period in years (fractions allowed)
    #[arg(long)]
    pub years: Option<Decimal>,
}

pub fn run_cagr(args: CagrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cagr_input = match (args.initial, args.final_capital, args.years) {
        (Some(initial_capital), Some(final_capital), Some(years)) => CagrInput {
            initial_capital,
            final_capital,
            years,
        },
        _ => match input::read_input::<CagrInput>(args.input.as_deref())? {
            Some(data) => data,
            None => {
                return Err(
                    "--initial, --final and --years, or --input <file.json>/stdin, required \
                     for CAGR"
                        .into(),
                )
            }
        },
    };
    let result = time_value::calculate_cagr(&cagr_input)?;
    Ok(serde_json::to_value(result)?)
}
