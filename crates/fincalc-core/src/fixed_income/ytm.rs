//! Yield-to-maturity solvers.
//!
//! Two interchangeable methods, both returning an annualized decimal yield:
//!
//! * [`ytm_newton`]: Newton-Raphson on the discounted cash flows of the
//!   remaining coupons and the principal, over a real-valued number of
//!   periods.
//! * [`ytm_linear`]: simple-interest annualization of the holding-period
//!   return, suited to short holding periods.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use super::calendar::CouponFrequency;
use crate::error::FinCalcError;
use crate::types::{pct_to_rate, Money, Rate};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Iteration cap for the Newton-Raphson solve.
pub const MAX_NEWTON_ITERATIONS: u32 = 100;

/// Converged once the theoretical price is within one cent of the target.
pub const PRICE_TOLERANCE: Money = dec!(0.01);

/// Annual yield the solver starts from.
const INITIAL_ANNUAL_GUESS: Rate = dec!(0.05);

/// Floor for the periodic yield so that `1 + g` stays positive.
const MIN_PERIODIC_YIELD: Rate = dec!(-0.99);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which YTM algorithm a valuation uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldMethod {
    /// Simple-interest annualization of total return over the holding period.
    #[default]
    Linear,
    /// Newton-Raphson over discounted cash flows.
    Newton,
}

impl fmt::Display for YieldMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YieldMethod::Linear => f.write_str("linear"),
            YieldMethod::Newton => f.write_str("newton"),
        }
    }
}

/// Result of a Newton-Raphson YTM solve. The solver always yields a number;
/// `converged` reports whether the price tolerance was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YtmSolution {
    /// Annualized yield (periodic yield × periods per year).
    pub ytm: Rate,
    /// Yield per coupon period at the final iterate.
    pub periodic_yield: Rate,
    /// Iterations performed.
    pub iterations: u32,
    /// True when |theoretical − target| < [`PRICE_TOLERANCE`].
    pub converged: bool,
    /// Theoretical price minus target price at the last evaluation.
    pub residual: Money,
}

// ---------------------------------------------------------------------------
// Newton-Raphson
// ---------------------------------------------------------------------------

/// Solve for the yield that prices the bond at `price`.
///
/// Theoretical price at periodic yield `g` over `n` periods:
///
/// `P(g) = Σ_{p=1..⌊n⌋} C / (1+g)^p + N / (1+g)^n`
///
/// starting from `g = 5% / periods_per_year` and stepping
/// `g ← g − (P(g) − price) / P'(g)` until within one cent or
/// [`MAX_NEWTON_ITERATIONS`] is reached. Exhausting the cap is reported
/// through `converged = false`, not as an error.
pub fn ytm_newton(
    price: Money,
    nominal: Money,
    annual_rate_pct: Decimal,
    periods_to_maturity: Decimal,
    frequency: CouponFrequency,
) -> FinCalcResult<YtmSolution> {
    validate_newton_input(price, nominal, annual_rate_pct, periods_to_maturity)?;

    let periods_per_year = Decimal::from(frequency.periods_per_year());
    let coupon = nominal * pct_to_rate(annual_rate_pct) / periods_per_year;
    let whole_periods = periods_to_maturity.floor().to_u32().unwrap_or(0);

    let mut guess = INITIAL_ANNUAL_GUESS / periods_per_year;
    let mut residual = Decimal::ZERO;
    let mut converged = false;
    let mut iterations = 0;

    for iteration in 1..=MAX_NEWTON_ITERATIONS {
        iterations = iteration;

        let Some((theoretical, slope)) =
            price_and_slope(guess, coupon, nominal, whole_periods, periods_to_maturity)
        else {
            warn!(guess = %guess, iteration, "YTM price evaluation overflowed; keeping last guess");
            break;
        };

        residual = theoretical - price;
        if residual.abs() < PRICE_TOLERANCE {
            converged = true;
            break;
        }

        if slope.is_zero() {
            warn!(guess = %guess, iteration, "YTM price slope is zero; keeping last guess");
            break;
        }

        let Some(step) = residual.checked_div(slope) else {
            warn!(guess = %guess, iteration, "YTM Newton step overflowed; keeping last guess");
            break;
        };
        guess -= step;

        if guess < MIN_PERIODIC_YIELD {
            guess = MIN_PERIODIC_YIELD;
        }
    }

    if !converged {
        warn!(
            iterations,
            residual = %residual,
            "YTM Newton-Raphson did not reach price tolerance"
        );
    }

    let ytm = guess * periods_per_year;
    debug!(ytm = %ytm, iterations, converged, "solved YTM (Newton-Raphson)");

    Ok(YtmSolution {
        ytm,
        periodic_yield: guess,
        iterations,
        converged,
        residual,
    })
}

fn validate_newton_input(
    price: Money,
    nominal: Money,
    annual_rate_pct: Decimal,
    periods_to_maturity: Decimal,
) -> FinCalcResult<()> {
    if price <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "price".into(),
            reason: "Price must be positive".into(),
        });
    }
    if nominal <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "nominal".into(),
            reason: "Nominal value must be positive".into(),
        });
    }
    if annual_rate_pct < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "coupon_rate_pct".into(),
            reason: "Coupon rate cannot be negative".into(),
        });
    }
    if periods_to_maturity <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "periods_to_maturity".into(),
            reason: "Periods to maturity must be positive".into(),
        });
    }
    Ok(())
}

/// Theoretical price and its derivative with respect to the periodic yield.
/// `None` when a discount factor overflows or collapses to zero.
fn price_and_slope(
    guess: Rate,
    coupon: Money,
    nominal: Money,
    whole_periods: u32,
    periods: Decimal,
) -> Option<(Money, Decimal)> {
    let one_plus_g = Decimal::ONE + guess;
    let mut price = Decimal::ZERO;
    let mut slope = Decimal::ZERO;

    // Coupon discount factors built by repeated multiplication.
    let mut factor = Decimal::ONE;
    for period in 1..=whole_periods {
        factor = factor.checked_mul(one_plus_g)?;
        let factor_next = factor.checked_mul(one_plus_g)?;
        price = price.checked_add(coupon.checked_div(factor)?)?;
        let weighted = Decimal::from(period).checked_mul(coupon)?;
        slope = slope.checked_sub(weighted.checked_div(factor_next)?)?;
    }

    let principal_factor = one_plus_g.checked_powd(periods)?;
    let principal_factor_next = principal_factor.checked_mul(one_plus_g)?;
    price = price.checked_add(nominal.checked_div(principal_factor)?)?;
    let weighted = periods.checked_mul(nominal)?;
    slope = slope.checked_sub(weighted.checked_div(principal_factor_next)?)?;

    Some((price, slope))
}

// ---------------------------------------------------------------------------
// Linear approximation
// ---------------------------------------------------------------------------

/// `(total_future_cash_flows / dirty_price − 1) × 365 / days_to_maturity`
///
/// Zero unless both `dirty_price` and `days_to_maturity` are positive. The
/// result is not a discounted-cash-flow yield and drifts away from
/// [`ytm_newton`] as maturity or coupon grow.
pub fn ytm_linear(dirty_price: Money, total_future_cash_flows: Money, days_to_maturity: i64) -> Rate {
    if dirty_price <= Decimal::ZERO || days_to_maturity <= 0 {
        return Decimal::ZERO;
    }
    (total_future_cash_flows / dirty_price - Decimal::ONE) * dec!(365)
        / Decimal::from(days_to_maturity)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
