use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::time_value::fv;
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

/// Longest projection horizon accepted, in years.
pub const MAX_YEARS: u32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How often recurring contributions are paid and interest compounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionFrequency {
    /// One contribution per year, yearly compounding.
    #[default]
    Annual,
    /// A twelfth of the annual contribution each month, monthly compounding.
    Monthly,
}

impl ContributionFrequency {
    fn periods_per_year(self) -> u32 {
        match self {
            ContributionFrequency::Annual => 1,
            ContributionFrequency::Monthly => 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundInterestInput {
    pub initial_investment: Money,
    /// Nominal annual return in percent.
    pub rate_pct: Decimal,
    pub years: u32,
    /// Total contributed per year, whatever the payment frequency.
    #[serde(default)]
    pub annual_contribution: Money,
    #[serde(default)]
    pub inflation_pct: Decimal,
    #[serde(default)]
    pub contribution_frequency: ContributionFrequency,
}

/// Future value breakdown at a single rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub total_future_value: Money,
    pub fv_initial: Money,
    pub fv_contributions: Money,
    pub total_invested: Money,
    pub total_gains: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundInterestOutput {
    pub nominal: Projection,
    /// Projection at the real rate (nominal − inflation).
    pub real: Projection,
    pub real_rate_pct: Decimal,
    /// `(1 + inflation)^years`
    pub inflation_factor: Decimal,
    /// Nominal future value expressed in today's money.
    pub purchasing_power: Money,
    pub purchasing_power_loss: Money,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Compute (1 + r)^n via iterative multiplication.
fn compound(rate: Rate, n: u32) -> FinCalcResult<Decimal> {
    let mut result = Decimal::ONE;
    let factor = Decimal::ONE + rate;
    for _ in 0..n {
        result = result.checked_mul(factor).ok_or_else(overflow)?;
    }
    Ok(result)
}

fn overflow() -> FinCalcError {
    FinCalcError::InvalidInput {
        field: "years".into(),
        reason: "Projected value overflows for this rate and horizon".into(),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Future value of `initial` plus a level contribution stream at
/// `rate_pct`, compounding at `frequency`.
pub fn project(
    initial: Money,
    rate_pct: Decimal,
    years: u32,
    annual_contribution: Money,
    frequency: ContributionFrequency,
) -> FinCalcResult<Projection> {
    let ppy = frequency.periods_per_year();
    let periodic_rate = pct_to_rate(rate_pct) / Decimal::from(ppy);
    let periods = years.checked_mul(ppy).ok_or_else(overflow)?;
    let contribution = annual_contribution / Decimal::from(ppy);

    let fv_initial = initial
        .checked_mul(compound(periodic_rate, periods)?)
        .ok_or_else(overflow)?;
    let fv_contributions = if contribution > Decimal::ZERO {
        // Contributions are outflows: fv() returns them as a positive balance.
        fv(periodic_rate, periods, -contribution, Decimal::ZERO)?
    } else {
        Decimal::ZERO
    };

    let total_future_value = fv_initial
        .checked_add(fv_contributions)
        .ok_or_else(overflow)?;
    let total_invested = initial + annual_contribution * Decimal::from(years);

    Ok(Projection {
        total_future_value,
        fv_initial,
        fv_contributions,
        total_invested,
        total_gains: total_future_value - total_invested,
    })
}

pub fn project_compound_interest(
    input: &CompoundInterestInput,
) -> FinCalcResult<ComputationOutput<CompoundInterestOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.initial_investment < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "initial_investment".into(),
            reason: "Initial investment cannot be negative".into(),
        });
    }
    if input.annual_contribution < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "annual_contribution".into(),
            reason: "Contributions cannot be negative".into(),
        });
    }
    if input.years == 0 {
        return Err(FinCalcError::InvalidInput {
            field: "years".into(),
            reason: "Investment horizon must be at least one year".into(),
        });
    }
    if input.years > MAX_YEARS {
        return Err(FinCalcError::InvalidInput {
            field: "years".into(),
            reason: format!("Investment horizon cannot exceed {MAX_YEARS} years"),
        });
    }
    if input.inflation_pct <= dec!(-100) {
        return Err(FinCalcError::InvalidInput {
            field: "inflation_pct".into(),
            reason: "Inflation must be greater than -100%".into(),
        });
    }

    let freq = input.contribution_frequency;
    let nominal = project(
        input.initial_investment,
        input.rate_pct,
        input.years,
        input.annual_contribution,
        freq,
    )?;

    let real_rate_pct = input.rate_pct - input.inflation_pct;
    if real_rate_pct < Decimal::ZERO {
        warnings.push(format!(
            "Real return is negative ({real_rate_pct}%): inflation exceeds the nominal rate"
        ));
    }
    let real = project(
        input.initial_investment,
        real_rate_pct,
        input.years,
        input.annual_contribution,
        freq,
    )?;

    let inflation_factor = compound(pct_to_rate(input.inflation_pct), input.years)?;
    let purchasing_power = nominal
        .total_future_value
        .checked_div(inflation_factor)
        .ok_or_else(|| FinCalcError::DivisionByZero {
            context: "inflation factor".into(),
        })?;
    let purchasing_power_loss = nominal.total_future_value - purchasing_power;

    let output = CompoundInterestOutput {
        nominal,
        real,
        real_rate_pct,
        inflation_factor,
        purchasing_power,
        purchasing_power_loss,
    };

    let methodology = match freq {
        ContributionFrequency::Annual => "Compound interest (annual compounding, year-end contributions)",
        ContributionFrequency::Monthly => {
            "Compound interest (monthly compounding, month-end contributions)"
        }
    };

    let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
