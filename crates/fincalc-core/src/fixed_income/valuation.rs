//! Bond valuation engine.
//!
//! Given the bond's terms, a purchase date and a clean price, builds the
//! coupon schedule, locates the purchase inside it, accrues interest on an
//! actual/actual basis, and reports dirty price, remaining cash flows and
//! yield to maturity under the selected [`YieldMethod`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::accrued::{accrued_from_issue, accrued_interest};
use super::calendar::{generate_coupon_dates, months_between, CouponFrequency};
use super::ytm::{ytm_linear, ytm_newton, YieldMethod};
use crate::error::{DateOrderViolation, FinCalcError};
use crate::types::{pct_to_rate, with_metadata, CashFlow, ComputationOutput, Money, Rate, Years};
use crate::FinCalcResult;

/// Day basis used to turn day counts into years.
const DAYS_PER_YEAR: Decimal = dec!(365.25);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Contractual terms of a fixed-coupon bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondTerms {
    /// Nominal (face) value redeemed at maturity.
    pub nominal: Money,
    /// Annual coupon rate in percent (3.5 = 3.5%). May be zero.
    pub coupon_rate_pct: Decimal,
    #[serde(default)]
    pub frequency: CouponFrequency,
    pub issue_date: NaiveDate,
    /// First coupon date; may sit off the regular grid (short or long stub).
    pub first_coupon_date: NaiveDate,
    pub maturity_date: NaiveDate,
}

impl BondTerms {
    pub fn annual_coupon(&self) -> Money {
        self.nominal * pct_to_rate(self.coupon_rate_pct)
    }

    /// Coupon paid on each regular date of the schedule.
    pub fn coupon_per_period(&self) -> Money {
        self.annual_coupon() / Decimal::from(self.frequency.periods_per_year())
    }
}

/// Where the clean price sits relative to the nominal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePosition {
    Discount,
    Par,
    Premium,
}

impl PricePosition {
    pub fn of(price: Money, nominal: Money) -> Self {
        if price < nominal {
            PricePosition::Discount
        } else if price > nominal {
            PricePosition::Premium
        } else {
            PricePosition::Par
        }
    }
}

/// Input for [`calculate_bond_valuation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondValuationInput {
    pub terms: BondTerms,
    pub purchase_date: NaiveDate,
    /// Clean price paid per bond.
    pub clean_price: Money,
    #[serde(default = "default_num_bonds")]
    pub num_bonds: u32,
    #[serde(default)]
    pub yield_method: YieldMethod,
}

fn default_num_bonds() -> u32 {
    1
}

/// Output of a bond valuation. Prices, accrued interest, coupons and
/// `cashflows` are per bond; fields documented as position totals are
/// multiplied by `num_bonds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub clean_price: Money,
    pub accrued_interest: Money,
    /// Clean price + accrued interest.
    pub dirty_price: Money,
    pub num_bonds: u32,
    pub annual_coupon: Money,
    pub coupon_per_period: Money,
    pub last_coupon: Option<NaiveDate>,
    pub next_coupon: Option<NaiveDate>,
    /// Coupon dates strictly after the purchase date.
    pub remaining_coupons: u32,
    /// Position total of remaining coupons.
    pub total_future_coupons: Money,
    /// Position total of remaining coupons plus principal redemption.
    pub total_future_cash_flows: Money,
    /// Position total paid at settlement (dirty price × bonds).
    pub settlement_amount: Money,
    pub days_since_issue: i64,
    pub days_to_maturity: i64,
    pub years_to_maturity: Years,
    /// Annualized yield to maturity as a decimal.
    pub ytm: Rate,
    pub yield_method: YieldMethod,
    /// Newton-Raphson convergence flag; absent for the linear method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ytm_converged: Option<bool>,
    /// Annual coupon / clean price.
    pub current_yield: Rate,
    pub price_position: PricePosition,
    /// Position total of (nominal − clean price).
    pub capital_gain: Money,
    /// Position total of future coupons plus capital gain.
    pub total_return: Money,
    /// Total return relative to the clean amount invested.
    pub total_return_rate: Rate,
    /// Remaining per-bond cash flows; the principal rides on the maturity date.
    pub cashflows: Vec<CashFlow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value `num_bonds` bonds bought at `clean_price` on `purchase_date`, with
/// the linear YTM approximation.
pub fn value_bond(
    terms: &BondTerms,
    purchase_date: NaiveDate,
    clean_price: Money,
    num_bonds: u32,
) -> FinCalcResult<ValuationResult> {
    value_bond_with(terms, purchase_date, clean_price, num_bonds, YieldMethod::Linear)
}

/// Same as [`value_bond`] with an explicit YTM method.
pub fn value_bond_with(
    terms: &BondTerms,
    purchase_date: NaiveDate,
    clean_price: Money,
    num_bonds: u32,
    method: YieldMethod,
) -> FinCalcResult<ValuationResult> {
    let mut warnings = Vec::new();
    run_valuation(terms, purchase_date, clean_price, num_bonds, method, &mut warnings)
}

/// Bond valuation wrapped in the standard output envelope, with warnings
/// for irregular schedules and solver diagnostics.
pub fn calculate_bond_valuation(
    input: &BondValuationInput,
) -> FinCalcResult<ComputationOutput<ValuationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = run_valuation(
        &input.terms,
        input.purchase_date,
        input.clean_price,
        input.num_bonds,
        input.yield_method,
        &mut warnings,
    )?;

    let methodology = match input.yield_method {
        YieldMethod::Linear => {
            "Bond Valuation: ACT/ACT accrued interest, linear YTM approximation"
        }
        YieldMethod::Newton => "Bond Valuation: ACT/ACT accrued interest, Newton-Raphson YTM",
    };

    let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_amounts(terms: &BondTerms, clean_price: Money, num_bonds: u32) -> FinCalcResult<()> {
    if terms.nominal <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "nominal".into(),
            reason: "Nominal value must be positive".into(),
        });
    }
    if terms.coupon_rate_pct < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "coupon_rate_pct".into(),
            reason: "Coupon rate cannot be negative".into(),
        });
    }
    if clean_price <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "clean_price".into(),
            reason: "Clean price must be positive".into(),
        });
    }
    if num_bonds == 0 {
        return Err(FinCalcError::InvalidInput {
            field: "num_bonds".into(),
            reason: "At least one bond is required".into(),
        });
    }
    Ok(())
}

fn validate_dates(terms: &BondTerms, purchase_date: NaiveDate) -> FinCalcResult<()> {
    if terms.issue_date >= purchase_date {
        return Err(FinCalcError::DateOrder(
            DateOrderViolation::IssueNotBeforePurchase,
        ));
    }
    if terms.first_coupon_date <= terms.issue_date {
        return Err(FinCalcError::DateOrder(
            DateOrderViolation::FirstCouponNotAfterIssue,
        ));
    }
    if terms.maturity_date <= purchase_date {
        return Err(FinCalcError::DateOrder(
            DateOrderViolation::MaturityNotAfterPurchase,
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

fn run_valuation(
    terms: &BondTerms,
    purchase_date: NaiveDate,
    clean_price: Money,
    num_bonds: u32,
    method: YieldMethod,
    warnings: &mut Vec<String>,
) -> FinCalcResult<ValuationResult> {
    validate_amounts(terms, clean_price, num_bonds)?;
    validate_dates(terms, purchase_date)?;

    // 1. Schedule
    let schedule = generate_coupon_dates(
        terms.first_coupon_date,
        terms.maturity_date,
        terms.frequency,
    );
    let Some(final_coupon) = schedule.last() else {
        return Err(FinCalcError::EmptySchedule {
            first_coupon_date: terms.first_coupon_date,
            maturity_date: terms.maturity_date,
        });
    };

    let stub_months = months_between(terms.issue_date, terms.first_coupon_date);
    if stub_months != terms.frequency.months_per_period() as i32 {
        warnings.push(format!(
            "Irregular first coupon period: {stub_months} months from issue to first coupon \
             for a {} bond",
            terms.frequency
        ));
    }
    if final_coupon != terms.maturity_date {
        warnings.push(format!(
            "Last scheduled coupon {final_coupon} precedes maturity {}; principal is \
             redeemed at maturity without a final coupon",
            terms.maturity_date
        ));
    }

    // 2. Locate purchase
    let period = schedule.period_for(purchase_date);
    debug!(
        %purchase_date,
        last_coupon = ?period.last_coupon,
        next_coupon = ?period.next_coupon,
        "located purchase in coupon schedule"
    );

    // 3. Accrued interest
    let accrued = if period.last_coupon.is_some() {
        accrued_interest(
            terms.nominal,
            terms.coupon_rate_pct,
            period.last_coupon,
            purchase_date,
            period.next_coupon,
        )
    } else if purchase_date > terms.issue_date {
        accrued_from_issue(
            terms.nominal,
            terms.coupon_rate_pct,
            terms.issue_date,
            purchase_date,
            terms.first_coupon_date,
        )
    } else {
        Decimal::ZERO
    };

    // 4. Dirty price
    let dirty_price = clean_price + accrued;

    // 5-6. Remaining coupons and future cash flows
    let remaining_dates = schedule.dates_after(purchase_date);
    let remaining_coupons = u32::try_from(remaining_dates.len()).unwrap_or(u32::MAX);
    let bonds = Decimal::from(num_bonds);
    let annual_coupon = terms.annual_coupon();
    let coupon_per_period = terms.coupon_per_period();

    let total_future_coupons = Decimal::from(remaining_coupons) * coupon_per_period * bonds;
    let total_future_cash_flows = total_future_coupons + terms.nominal * bonds;

    let cashflows = build_cashflows(remaining_dates, coupon_per_period, terms);

    // 7. Yield
    let days_to_maturity = (terms.maturity_date - purchase_date).num_days();
    let days_since_issue = (purchase_date - terms.issue_date).num_days();
    let years_to_maturity = Decimal::from(days_to_maturity) / DAYS_PER_YEAR;

    let (ytm, ytm_converged) = match method {
        YieldMethod::Linear => {
            if days_to_maturity > 365 {
                warnings.push(format!(
                    "Linear YTM annualizes simple return over {days_to_maturity} days and \
                     ignores compounding"
                ));
            }
            let per_bond_flows = total_future_cash_flows / bonds;
            (ytm_linear(dirty_price, per_bond_flows, days_to_maturity), None)
        }
        YieldMethod::Newton => {
            let periods =
                years_to_maturity * Decimal::from(terms.frequency.periods_per_year());
            let solution = ytm_newton(
                clean_price,
                terms.nominal,
                terms.coupon_rate_pct,
                periods,
                terms.frequency,
            )?;
            if !solution.converged {
                warnings.push(format!(
                    "YTM Newton-Raphson did not converge after {} iterations (residual {})",
                    solution.iterations,
                    solution.residual.round_dp(6)
                ));
            }
            (solution.ytm, Some(solution.converged))
        }
    };

    // Returns
    let current_yield = annual_coupon / clean_price;
    let capital_gain = (terms.nominal - clean_price) * bonds;
    let total_return = total_future_coupons + capital_gain;
    let total_return_rate = total_return / (clean_price * bonds);

    debug!(
        accrued = %accrued,
        dirty_price = %dirty_price,
        remaining_coupons,
        ytm = %ytm,
        method = %method,
        "bond valued"
    );

    Ok(ValuationResult {
        clean_price,
        accrued_interest: accrued,
        dirty_price,
        num_bonds,
        annual_coupon,
        coupon_per_period,
        last_coupon: period.last_coupon,
        next_coupon: period.next_coupon,
        remaining_coupons,
        total_future_coupons,
        total_future_cash_flows,
        settlement_amount: dirty_price * bonds,
        days_since_issue,
        days_to_maturity,
        years_to_maturity,
        ytm,
        yield_method: method,
        ytm_converged,
        current_yield,
        price_position: PricePosition::of(clean_price, terms.nominal),
        capital_gain,
        total_return,
        total_return_rate,
        cashflows,
    })
}

/// Per-bond cash flows after the purchase date. The principal is added to
/// the coupon falling on maturity, or paid on its own when maturity is off
/// the coupon grid.
fn build_cashflows(
    remaining_dates: &[NaiveDate],
    coupon_per_period: Money,
    terms: &BondTerms,
) -> Vec<CashFlow> {
    let mut flows: Vec<CashFlow> = remaining_dates
        .iter()
        .map(|&date| CashFlow {
            date,
            amount: coupon_per_period,
            label: Some("coupon".into()),
        })
        .collect();

    match flows.last_mut() {
        Some(last) if last.date == terms.maturity_date => {
            last.amount += terms.nominal;
            last.label = Some("coupon+principal".into());
        }
        _ => flows.push(CashFlow {
            date: terms.maturity_date,
            amount: terms.nominal,
            label: Some("principal".into()),
        }),
    }

    flows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// 2.5% semiannual, long first coupon (issue 2024-02-01, first 2025-03-19).
    fn stub_bond() -> BondTerms {
        BondTerms {
            nominal: dec!(100),
            coupon_rate_pct: dec!(2.5),
            frequency: CouponFrequency::Semiannual,
            issue_date: d(2024, 2, 1),
            first_coupon_date: d(2025, 3, 19),
            maturity_date: d(2026, 3, 19),
        }
    }

    fn regular_bond() -> BondTerms {
        BondTerms {
            nominal: dec!(1000),
            coupon_rate_pct: dec!(5),
            frequency: CouponFrequency::Semiannual,
            issue_date: d(2024, 1, 15),
            first_coupon_date: d(2024, 7, 15),
            maturity_date: d(2029, 1, 15),
        }
    }

    #[test]
    fn test_irregular_first_stub_scenario() {
        let out = value_bond(&stub_bond(), d(2025, 8, 6), dec!(100.359), 1).unwrap();

        assert_eq!(out.last_coupon, Some(d(2025, 3, 19)));
        assert_eq!(out.next_coupon, Some(d(2025, 9, 19)));
        assert_eq!(out.remaining_coupons, 2);

        let expected_accrued = dec!(1.25) * dec!(140) / dec!(184);
        assert!((out.accrued_interest - expected_accrued).abs() < dec!(0.0000001));
        assert_eq!(out.dirty_price, out.clean_price + out.accrued_interest);
        assert!(out.dirty_price >= Decimal::ZERO);

        // 2 coupons of 1.25 plus 100 principal
        assert_eq!(out.total_future_cash_flows, dec!(102.5));
        assert_eq!(out.days_to_maturity, 225);

        let expected_ytm = (dec!(102.5) / out.dirty_price - Decimal::ONE) * dec!(365) / dec!(225);
        assert!((out.ytm - expected_ytm).abs() < dec!(0.0000000001));
        assert!(out.ytm > dec!(0.015) && out.ytm < dec!(0.025), "got {}", out.ytm);
    }

    #[test]
    fn test_scenario_cashflows() {
        let out = value_bond(&stub_bond(), d(2025, 8, 6), dec!(100.359), 1).unwrap();
        assert_eq!(
            out.cashflows,
            vec![
                CashFlow {
                    date: d(2025, 9, 19),
                    amount: dec!(1.25),
                    label: Some("coupon".into()),
                },
                CashFlow {
                    date: d(2026, 3, 19),
                    amount: dec!(101.25),
                    label: Some("coupon+principal".into()),
                },
            ]
        );
    }

    #[test]
    fn test_purchase_before_first_coupon_accrues_from_issue() {
        let purchase = d(2024, 8, 1);
        let out = value_bond(&stub_bond(), purchase, dec!(99.5), 1).unwrap();

        assert_eq!(out.last_coupon, None);
        assert_eq!(out.next_coupon, Some(d(2025, 3, 19)));
        assert_eq!(out.remaining_coupons, 3);

        // 13-month first period accrues a full annual coupon of 2.5
        let elapsed = Decimal::from((purchase - d(2024, 2, 1)).num_days());
        let period = Decimal::from((d(2025, 3, 19) - d(2024, 2, 1)).num_days());
        let expected = dec!(2.5) * elapsed / period;
        assert!((out.accrued_interest - expected).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_purchase_on_coupon_date_has_no_accrued() {
        let out = value_bond(&regular_bond(), d(2025, 1, 15), dec!(990), 1).unwrap();
        assert_eq!(out.last_coupon, Some(d(2025, 1, 15)));
        assert_eq!(out.next_coupon, Some(d(2025, 7, 15)));
        assert!(out.accrued_interest.is_zero());
        assert_eq!(out.dirty_price, dec!(990));
        assert_eq!(out.remaining_coupons, 8);
    }

    #[test]
    fn test_linear_ytm_invariant_in_num_bonds() {
        let one = value_bond(&regular_bond(), d(2025, 4, 10), dec!(985.25), 1).unwrap();
        let ten = value_bond(&regular_bond(), d(2025, 4, 10), dec!(985.25), 10).unwrap();

        assert_eq!(one.ytm, ten.ytm);
        assert_eq!(ten.total_future_cash_flows, one.total_future_cash_flows * dec!(10));
        assert_eq!(ten.settlement_amount, one.settlement_amount * dec!(10));
        assert_eq!(one.dirty_price, ten.dirty_price);
    }

    #[test]
    fn test_issue_on_or_after_purchase_fails() {
        let terms = regular_bond();
        for purchase in [d(2024, 1, 15), d(2023, 12, 1)] {
            match value_bond(&terms, purchase, dec!(1000), 1).unwrap_err() {
                FinCalcError::DateOrder(v) => {
                    assert_eq!(v, DateOrderViolation::IssueNotBeforePurchase)
                }
                other => panic!("Expected DateOrder, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_first_coupon_not_after_issue_fails() {
        let mut terms = regular_bond();
        terms.first_coupon_date = terms.issue_date;
        match value_bond(&terms, d(2025, 1, 1), dec!(1000), 1).unwrap_err() {
            FinCalcError::DateOrder(v) => {
                assert_eq!(v, DateOrderViolation::FirstCouponNotAfterIssue);
                assert_eq!(v.field(), "first_coupon_date");
            }
            other => panic!("Expected DateOrder, got {:?}", other),
        }
    }

    #[test]
    fn test_maturity_not_after_purchase_fails() {
        let terms = regular_bond();
        match value_bond(&terms, d(2029, 1, 15), dec!(1000), 1).unwrap_err() {
            FinCalcError::DateOrder(v) => {
                assert_eq!(v, DateOrderViolation::MaturityNotAfterPurchase)
            }
            other => panic!("Expected DateOrder, got {:?}", other),
        }
    }

    #[test]
    fn test_first_coupon_after_maturity_is_schedule_error() {
        let mut terms = regular_bond();
        terms.first_coupon_date = d(2030, 1, 15);
        match value_bond(&terms, d(2025, 1, 1), dec!(1000), 1).unwrap_err() {
            FinCalcError::EmptySchedule { first_coupon_date, .. } => {
                assert_eq!(first_coupon_date, d(2030, 1, 15))
            }
            other => panic!("Expected EmptySchedule, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_amounts() {
        let terms = regular_bond();
        match value_bond(&terms, d(2025, 1, 1), dec!(0), 1).unwrap_err() {
            FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "clean_price"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
        match value_bond(&terms, d(2025, 1, 1), dec!(1000), 0).unwrap_err() {
            FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "num_bonds"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
        let mut negative_nominal = terms.clone();
        negative_nominal.nominal = dec!(-1000);
        match value_bond(&negative_nominal, d(2025, 1, 1), dec!(1000), 1).unwrap_err() {
            FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "nominal"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_coupon_bond() {
        let terms = BondTerms {
            nominal: dec!(1000),
            coupon_rate_pct: dec!(0),
            frequency: CouponFrequency::Annual,
            issue_date: d(2024, 1, 1),
            first_coupon_date: d(2025, 1, 1),
            maturity_date: d(2027, 1, 1),
        };
        let out = value_bond(&terms, d(2025, 7, 1), dec!(950), 1).unwrap();
        assert!(out.accrued_interest.is_zero());
        assert_eq!(out.total_future_cash_flows, dec!(1000));
        assert_eq!(out.total_future_coupons, Decimal::ZERO);

        let expected = (dec!(1000) / dec!(950) - Decimal::ONE) * dec!(365)
            / Decimal::from(out.days_to_maturity);
        assert!((out.ytm - expected).abs() < dec!(0.0000000001));
        assert_eq!(out.price_position, PricePosition::Discount);
    }

    #[test]
    fn test_newton_method_par_bond() {
        let out = value_bond_with(
            &regular_bond(),
            d(2024, 1, 16),
            dec!(1000),
            1,
            YieldMethod::Newton,
        )
        .unwrap();
        assert_eq!(out.yield_method, YieldMethod::Newton);
        assert_eq!(out.ytm_converged, Some(true));
        // 1826 days -> 9.9986 periods: nine whole coupons are discounted, so
        // the par yield sits below the 5% coupon.
        assert!((out.ytm - dec!(0.04550)).abs() < dec!(0.0002), "got {}", out.ytm);
    }

    #[test]
    fn test_newton_non_convergence_is_a_warning() {
        let input = BondValuationInput {
            terms: regular_bond(),
            purchase_date: d(2024, 1, 16),
            clean_price: dec!(0.01),
            num_bonds: 1,
            yield_method: YieldMethod::Newton,
        };
        let out = calculate_bond_valuation(&input).unwrap();
        assert_eq!(out.result.ytm_converged, Some(false));
        assert!(out.result.ytm > dec!(0.05));
        assert!(out.warnings.iter().any(|w| w.contains("did not converge")));
    }

    #[test]
    fn test_newton_century_quarterly_bond() {
        let terms = BondTerms {
            nominal: dec!(1000),
            coupon_rate_pct: dec!(5),
            frequency: CouponFrequency::Quarterly,
            issue_date: d(2024, 1, 15),
            first_coupon_date: d(2024, 4, 15),
            maturity_date: d(2144, 1, 15),
        };
        let out =
            value_bond_with(&terms, d(2024, 1, 16), dec!(1000), 1, YieldMethod::Newton).unwrap();
        assert_eq!(out.remaining_coupons, 480);
        assert_eq!(out.ytm_converged, Some(true));
        assert!(out.ytm > dec!(0.04) && out.ytm < dec!(0.06), "got {}", out.ytm);
    }

    #[test]
    fn test_derived_returns() {
        let out = value_bond(&regular_bond(), d(2025, 1, 15), dec!(980), 2).unwrap();
        assert_eq!(out.annual_coupon, dec!(50));
        assert_eq!(out.coupon_per_period, dec!(25));
        // 8 coupons x 25 x 2 bonds
        assert_eq!(out.total_future_coupons, dec!(400));
        assert_eq!(out.capital_gain, dec!(40));
        assert_eq!(out.total_return, dec!(440));
        assert_eq!(out.price_position, PricePosition::Discount);
        assert!((out.current_yield - dec!(0.05102)).abs() < dec!(0.00001));
    }

    #[test]
    fn test_envelope_warnings_for_stub_and_long_horizon() {
        let input = BondValuationInput {
            terms: stub_bond(),
            purchase_date: d(2024, 8, 1),
            clean_price: dec!(99.5),
            num_bonds: 1,
            yield_method: YieldMethod::Linear,
        };
        let out = calculate_bond_valuation(&input).unwrap();
        assert!(out.methodology.contains("linear"));
        assert!(out.warnings.iter().any(|w| w.contains("Irregular first coupon")));
        assert!(out.warnings.iter().any(|w| w.contains("ignores compounding")));
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_maturity_off_grid_pays_principal_alone() {
        let mut terms = regular_bond();
        terms.maturity_date = d(2026, 3, 1);
        let out = value_bond(&terms, d(2025, 12, 1), dec!(1000), 1).unwrap();
        // Schedule ends 2026-01-15; principal on 2026-03-01
        assert_eq!(out.remaining_coupons, 1);
        let last = out.cashflows.last().unwrap();
        assert_eq!(last.date, d(2026, 3, 1));
        assert_eq!(last.label.as_deref(), Some("principal"));
        assert_eq!(out.cashflows.len(), 2);
    }

    #[test]
    fn test_input_deserializes_with_defaults() {
        let json = r#"{
            "terms": {
                "nominal": "100",
                "coupon_rate_pct": "2.5",
                "frequency": "semiannual",
                "issue_date": "2024-02-01",
                "first_coupon_date": "2025-03-19",
                "maturity_date": "2026-03-19"
            },
            "purchase_date": "2025-08-06",
            "clean_price": "100.359"
        }"#;
        let input: BondValuationInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.num_bonds, 1);
        assert_eq!(input.yield_method, YieldMethod::Linear);
        assert_eq!(input.terms, stub_bond());
    }
}
