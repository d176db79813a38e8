use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::FinCalcResult;

/// `(1 + rate)^nper`, or `InvalidInput` when the factor leaves Decimal range.
fn growth_factor(rate: Rate, nper: u32) -> FinCalcResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powd(Decimal::from(nper))
        .ok_or_else(|| overflow("(1 + rate)^nper"))
}

fn overflow(context: &str) -> FinCalcError {
    FinCalcError::InvalidInput {
        field: "nper".into(),
        reason: format!("{context} overflows for this rate and number of periods"),
    }
}

/// Future Value
pub fn fv(rate: Rate, nper: u32, pmt: Money, present_value: Money) -> FinCalcResult<Money> {
    if rate.is_zero() {
        let paid = pmt
            .checked_mul(Decimal::from(nper))
            .ok_or_else(|| overflow("Total payments"))?;
        return Ok(-(present_value + paid));
    }

    let factor = growth_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    present_value
        .checked_mul(factor)
        .zip(pmt.checked_mul(annuity_factor))
        .and_then(|(grown, annuity)| grown.checked_add(annuity))
        .map(|total| -total)
        .ok_or_else(|| overflow("Future value"))
}

/// Payment (PMT)
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> FinCalcResult<Money> {
    if nper == 0 {
        return Err(FinCalcError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let factor = growth_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    let grown = present_value
        .checked_mul(factor)
        .and_then(|v| v.checked_add(future_value))
        .ok_or_else(|| overflow("Payment"))?;
    Ok(-grown / annuity_factor)
}

// ---------------------------------------------------------------------------
// CAGR
// ---------------------------------------------------------------------------

/// Input for a compound annual growth rate calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CagrInput {
    pub initial_capital: Money,
    pub final_capital: Money,
    pub years: Years,
}

/// Compound annual growth rate alongside the undiscounted total return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CagrOutput {
    pub cagr: Rate,
    pub total_return: Rate,
}

/// CAGR = (final / initial)^(1 / years) - 1
pub fn cagr(initial: Money, final_value: Money, years: Years) -> FinCalcResult<CagrOutput> {
    if initial <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "initial_capital".into(),
            reason: "Initial capital must be positive".into(),
        });
    }
    if years <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "years".into(),
            reason: "Years must be positive".into(),
        });
    }

    let out_of_range = || FinCalcError::InvalidInput {
        field: "years".into(),
        reason: "Growth over this holding period overflows".into(),
    };
    let growth = final_value.checked_div(initial).ok_or_else(out_of_range)?;
    let total_return = growth - Decimal::ONE;
    let cagr = if growth <= Decimal::ZERO {
        // Total loss: the growth factor has no real root.
        -Decimal::ONE
    } else {
        growth
            .checked_powd(Decimal::ONE / years)
            .ok_or_else(out_of_range)?
            - Decimal::ONE
    };

    Ok(CagrOutput { cagr, total_return })
}

/// CAGR wrapped in the standard output envelope.
pub fn calculate_cagr(input: &CagrInput) -> FinCalcResult<ComputationOutput<CagrOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let output = cagr(input.initial_capital, input.final_capital, input.years)?;
    if input.final_capital <= Decimal::ZERO {
        warnings.push("Final capital is zero or negative; CAGR floored at -100%".into());
    }

    let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    Ok(with_metadata(
        "Compound Annual Growth Rate",
        input,
        warnings,
        elapsed,
        output,
    ))
}
