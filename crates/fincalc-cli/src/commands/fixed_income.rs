use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;
use tracing::info;

use fincalc_core::fixed_income::bond_yield::{self, BondYieldInput};
use fincalc_core::fixed_income::calendar::{self, CouponFrequency, CouponScheduleInput};
use fincalc_core::fixed_income::valuation::{self, BondValuationInput};

use crate::input;

/// Arguments for bond valuation
#[derive(Args)]
pub struct BondValuationArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_bond_valuation(args: BondValuationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let Some(valuation_input) = input::read_input::<BondValuationInput>(args.input.as_deref())?
    else {
        return Err("--input <file.json> or stdin required for bond valuation".into());
    };
    info!(
        purchase_date = %valuation_input.purchase_date,
        method = %valuation_input.yield_method,
        "valuing bond"
    );
    let result = valuation::calculate_bond_valuation(&valuation_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the price-and-maturity yield workflow
#[derive(Args)]
pub struct BondYieldArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_bond_yield(args: BondYieldArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let Some(yield_input) = input::read_input::<BondYieldInput>(args.input.as_deref())? else {
        return Err("--input <file.json> or stdin required for bond yield".into());
    };
    let result = bond_yield::calculate_bond_yield(&yield_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for coupon schedule generation
#[derive(Args)]
pub struct CouponScheduleArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// First coupon date (YYYY-MM-DD)
    #[arg(long)]
    pub first_coupon: Option<NaiveDate>,

    /// Maturity date (YYYY-MM-DD)
    #[arg(long)]
    pub maturity: Option<NaiveDate>,

    /// Coupon frequency: annual, semiannual, quarterly
    #[arg(long, default_value = "annual")]
    pub frequency: CouponFrequency,

    /// Optional purchase date to locate in the schedule
    #[arg(long)]
    pub purchase_date: Option<NaiveDate>,
}

pub fn run_coupon_schedule(args: CouponScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input = match (args.first_coupon, args.maturity) {
        (Some(first_coupon_date), Some(maturity_date)) => CouponScheduleInput {
            first_coupon_date,
            maturity_date,
            frequency: args.frequency,
            purchase_date: args.purchase_date,
        },
        _ => match input::read_input::<CouponScheduleInput>(args.input.as_deref())? {
            Some(data) => data,
            None => {
                return Err(
                    "--first-coupon and --maturity, or --input <file.json>/stdin, required \
                     for coupon schedule"
                        .into(),
                )
            }
        },
    };
    let result = calendar::build_coupon_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
