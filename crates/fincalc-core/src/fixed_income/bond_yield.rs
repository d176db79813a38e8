//! Quick yield analysis from a quoted price and maturity date alone, without
//! building a coupon schedule.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::calendar::CouponFrequency;
use super::valuation::PricePosition;
use super::ytm::{ytm_newton, YtmSolution};
use crate::error::{DateOrderViolation, FinCalcError};
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money, Rate, Years};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondYieldInput {
    pub nominal: Money,
    /// Annual coupon rate in percent.
    pub coupon_rate_pct: Decimal,
    #[serde(default)]
    pub frequency: CouponFrequency,
    /// Price paid per bond; treated as the clean price.
    pub clean_price: Money,
    pub purchase_date: NaiveDate,
    pub maturity_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondYieldOutput {
    pub ytm: Rate,
    pub solver: YtmSolution,
    pub current_yield: Rate,
    pub coupon_per_period: Money,
    /// Fractional coupon periods to maturity.
    pub periods_to_maturity: Decimal,
    /// Whole coupon periods remaining (`floor(periods_to_maturity)`).
    pub coupon_count: u32,
    pub total_coupon_payments: Money,
    pub capital_gain: Money,
    pub total_return: Money,
    pub total_return_rate: Rate,
    pub days_to_maturity: i64,
    pub years_to_maturity: Years,
    /// Yield compared with the coupon rate.
    pub price_position: PricePosition,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn calculate_bond_yield(input: &BondYieldInput) -> FinCalcResult<ComputationOutput<BondYieldOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.maturity_date <= input.purchase_date {
        return Err(FinCalcError::DateOrder(
            DateOrderViolation::MaturityNotAfterPurchase,
        ));
    }

    let days_to_maturity = (input.maturity_date - input.purchase_date).num_days();
    let years_to_maturity = Decimal::from(days_to_maturity) / dec!(365.25);
    let ppy = Decimal::from(input.frequency.periods_per_year());
    let periods = years_to_maturity * ppy;

    let solver = ytm_newton(
        input.clean_price,
        input.nominal,
        input.coupon_rate_pct,
        periods,
        input.frequency,
    )?;
    if !solver.converged {
        warnings.push(format!(
            "YTM Newton-Raphson did not converge after {} iterations",
            solver.iterations
        ));
    }
    if periods < Decimal::ONE {
        warnings.push("Less than one coupon period to maturity; no coupons counted".into());
    }

    let annual_coupon = input.nominal * pct_to_rate(input.coupon_rate_pct);
    let coupon_per_period = annual_coupon / ppy;
    let coupon_count = periods.floor().to_u32().unwrap_or(0);
    let total_coupon_payments = coupon_per_period * Decimal::from(coupon_count);
    let capital_gain = input.nominal - input.clean_price;
    let total_return = total_coupon_payments + capital_gain;

    let coupon_rate = pct_to_rate(input.coupon_rate_pct);
    let price_position = if solver.ytm > coupon_rate {
        PricePosition::Discount
    } else if solver.ytm < coupon_rate {
        PricePosition::Premium
    } else {
        PricePosition::Par
    };

    let output = BondYieldOutput {
        ytm: solver.ytm,
        current_yield: annual_coupon / input.clean_price,
        coupon_per_period,
        periods_to_maturity: periods,
        coupon_count,
        total_coupon_payments,
        capital_gain,
        total_return,
        total_return_rate: total_return / input.clean_price,
        days_to_maturity,
        years_to_maturity,
        price_position,
        solver,
    };

    let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    Ok(with_metadata(
        "Bond Yield: Newton-Raphson YTM on fractional periods (ACT/365.25)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn base_input() -> BondYieldInput {
        BondYieldInput {
            nominal: dec!(1000),
            coupon_rate_pct: dec!(4),
            frequency: CouponFrequency::Semiannual,
            clean_price: dec!(960),
            purchase_date: d(2025, 1, 10),
            maturity_date: d(2030, 1, 10),
        }
    }

    #[test]
    fn test_discount_price_yields_above_coupon() {
        let out = calculate_bond_yield(&base_input()).unwrap();
        let r = &out.result;
        assert!(r.solver.converged);
        assert!(r.ytm > dec!(0.04), "ytm {} should exceed coupon", r.ytm);
        assert_eq!(r.price_position, PricePosition::Discount);
        assert_eq!(r.capital_gain, dec!(40));
    }

    #[test]
    fn test_coupon_count_is_floor_of_periods() {
        let out = calculate_bond_yield(&base_input()).unwrap();
        let r = &out.result;
        // 1826 days / 365.25 * 2 = 9.9986 periods
        assert_eq!(r.days_to_maturity, 1826);
        assert_eq!(r.coupon_count, 9);
        assert_eq!(r.coupon_per_period, dec!(20));
        assert_eq!(r.total_coupon_payments, dec!(180));
        assert_eq!(r.total_return, dec!(220));
        assert!((r.total_return_rate - dec!(0.229167)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_premium_price() {
        let mut input = base_input();
        input.clean_price = dec!(1080);
        let out = calculate_bond_yield(&input).unwrap();
        assert!(out.result.ytm < dec!(0.04));
        assert_eq!(out.result.price_position, PricePosition::Premium);
        assert!(out.result.capital_gain < Decimal::ZERO);
    }

    #[test]
    fn test_current_yield() {
        let out = calculate_bond_yield(&base_input()).unwrap();
        // 40 / 960
        assert!((out.result.current_yield - dec!(0.041667)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_maturity_before_purchase_rejected() {
        let mut input = base_input();
        input.maturity_date = d(2024, 1, 10);
        match calculate_bond_yield(&input).unwrap_err() {
            FinCalcError::DateOrder(v) => {
                assert_eq!(v, DateOrderViolation::MaturityNotAfterPurchase)
            }
            other => panic!("Expected DateOrder, got {:?}", other),
        }
    }

    #[test]
    fn test_short_horizon_warns() {
        let mut input = base_input();
        input.maturity_date = d(2025, 4, 10);
        let out = calculate_bond_yield(&input).unwrap();
        assert_eq!(out.result.coupon_count, 0);
        assert!(out.warnings.iter().any(|w| w.contains("Less than one coupon period")));
    }

    #[test]
    fn test_non_convergence_warns() {
        let mut input = base_input();
        input.clean_price = dec!(0.01);
        let out = calculate_bond_yield(&input).unwrap();
        assert!(!out.result.solver.converged);
        assert!(out.result.ytm > dec!(0.04));
        assert!(out.warnings.iter().any(|w| w.contains("did not converge")));
    }

    #[test]
    fn test_invalid_price_propagates() {
        let mut input = base_input();
        input.clean_price = dec!(-1);
        match calculate_bond_yield(&input).unwrap_err() {
            FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "price"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }
}
