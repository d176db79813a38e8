use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::time_value::pmt;
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

/// Longest loan term accepted, in years.
pub const MAX_YEARS: u32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fixed-rate loan repaid in equal monthly instalments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    /// Nominal annual rate (TAN) in percent.
    pub rate_pct: Decimal,
    /// Annual percentage rate of charge (TAEG) in percent, fees included.
    /// Reported alongside the TAN; the instalment is driven by `rate_pct`.
    #[serde(default)]
    pub apr_pct: Option<Decimal>,
    pub years: u32,
    #[serde(default)]
    pub include_schedule: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOutput {
    pub monthly_payment: Money,
    pub num_payments: u32,
    pub total_cost: Money,
    pub total_interest: Money,
    /// Total interest / principal.
    pub interest_ratio: Rate,
    pub first_payment_interest: Money,
    pub first_payment_principal: Money,
    pub rate_pct: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apr_pct: Option<Decimal>,
    /// APR − nominal rate, in percentage points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apr_spread_pct: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<AmortizationRow>>,
}

/// One month of the amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Monthly instalment for `principal` at `rate_pct` over `years`:
///
/// `P × r(1+r)^n / ((1+r)^n − 1)`, or `P / n` when the rate is zero.
pub fn monthly_payment(principal: Money, rate_pct: Decimal, years: u32) -> FinCalcResult<Money> {
    let monthly_rate = pct_to_rate(rate_pct) / dec!(12);
    let n = years.checked_mul(12).ok_or_else(|| FinCalcError::InvalidInput {
        field: "years".into(),
        reason: "Loan term is too long".into(),
    })?;
    // pmt follows the spreadsheet sign convention: borrowing is an inflow.
    Ok(-pmt(monthly_rate, n, principal, Decimal::ZERO)?)
}

pub fn calculate_loan(input: &LoanInput) -> FinCalcResult<ComputationOutput<LoanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate(input)?;

    let payment = monthly_payment(input.principal, input.rate_pct, input.years)?;
    let num_payments = input.years * 12;
    let monthly_rate = pct_to_rate(input.rate_pct) / dec!(12);

    let total_cost = payment
        .checked_mul(Decimal::from(num_payments))
        .ok_or_else(|| FinCalcError::InvalidInput {
            field: "principal".into(),
            reason: "Total repayment overflows".into(),
        })?;
    let total_interest = total_cost - input.principal;
    let interest_ratio = total_interest / input.principal;

    let first_payment_interest = input.principal * monthly_rate;
    let first_payment_principal = payment - first_payment_interest;

    if interest_ratio > dec!(0.5) {
        warnings.push(format!(
            "Total interest is {}% of the principal",
            (interest_ratio * dec!(100)).round_dp(2)
        ));
    }

    let apr_spread_pct = input.apr_pct.map(|apr| apr - input.rate_pct);
    match apr_spread_pct {
        Some(spread) if spread < Decimal::ZERO => {
            warnings.push("APR is below the nominal rate; check the quoted TAEG".into())
        }
        Some(spread) if spread > Decimal::ONE => warnings.push(format!(
            "APR exceeds the nominal rate by {} points; fees are significant",
            spread.round_dp(2)
        )),
        _ => {}
    }

    let schedule = if input.include_schedule {
        Some(build_schedule(input.principal, monthly_rate, payment, num_payments))
    } else {
        None
    };

    let output = LoanOutput {
        monthly_payment: payment,
        num_payments,
        total_cost,
        total_interest,
        interest_ratio,
        first_payment_interest,
        first_payment_principal,
        rate_pct: input.rate_pct,
        apr_pct: input.apr_pct,
        apr_spread_pct,
        schedule,
    };

    let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    Ok(with_metadata(
        "Loan amortization (French method, monthly instalments)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate(input: &LoanInput) -> FinCalcResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "principal".into(),
            reason: "Loan principal must be positive".into(),
        });
    }
    if input.rate_pct < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "rate_pct".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if input.years == 0 {
        return Err(FinCalcError::InvalidInput {
            field: "years".into(),
            reason: "Loan term must be at least one year".into(),
        });
    }
    if input.years > MAX_YEARS {
        return Err(FinCalcError::InvalidInput {
            field: "years".into(),
            reason: format!("Loan term cannot exceed {MAX_YEARS} years"),
        });
    }
    Ok(())
}

/// The last row absorbs rounding so the balance closes at exactly zero.
fn build_schedule(
    principal: Money,
    monthly_rate: Rate,
    payment: Money,
    num_payments: u32,
) -> Vec<AmortizationRow> {
    let mut rows = Vec::with_capacity(num_payments as usize);
    let mut balance = principal;

    for month in 1..=num_payments {
        let interest = balance * monthly_rate;
        let (principal_part, this_payment) = if month == num_payments {
            (balance, balance + interest)
        } else {
            (payment - interest, payment)
        };
        balance -= principal_part;

        rows.push(AmortizationRow {
            month,
            payment: this_payment,
            interest,
            principal: principal_part,
            balance,
        });
    }

    rows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn mortgage() -> LoanInput {
        LoanInput {
            principal: dec!(100000),
            rate_pct: dec!(3.5),
            apr_pct: Some(dec!(3.8)),
            years: 20,
            include_schedule: false,
        }
    }

    #[test]
    fn test_monthly_payment_standard_mortgage() {
        let payment = monthly_payment(dec!(100000), dec!(3.5), 20).unwrap();
        assert!(
            (payment - dec!(579.96)).abs() < dec!(0.01),
            "Expected ~579.96, got {}",
            payment
        );
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let payment = monthly_payment(dec!(12000), dec!(0), 1).unwrap();
        assert_eq!(payment, dec!(1000));
    }

    #[test]
    fn test_loan_totals_and_first_split() {
        let out = calculate_loan(&mortgage()).unwrap();
        let r = &out.result;
        assert_eq!(r.num_payments, 240);
        assert!((r.total_cost - dec!(139190.33)).abs() < dec!(0.05));
        assert!((r.total_interest - dec!(39190.33)).abs() < dec!(0.05));
        assert!((r.interest_ratio - dec!(0.3919)).abs() < dec!(0.0001));
        assert!((r.first_payment_interest - dec!(291.6667)).abs() < dec!(0.0001));
        assert!((r.first_payment_principal - dec!(288.29)).abs() < dec!(0.01));
        assert_eq!(r.apr_spread_pct, Some(dec!(0.3)));
        assert!(r.schedule.is_none());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_schedule_amortizes_to_zero() {
        let mut input = mortgage();
        input.include_schedule = true;
        let out = calculate_loan(&input).unwrap();
        let schedule = out.result.schedule.as_ref().unwrap();

        assert_eq!(schedule.len(), 240);
        assert_eq!(schedule.last().unwrap().balance, Decimal::ZERO);

        let principal_sum: Decimal = schedule.iter().map(|r| r.principal).sum();
        assert!((principal_sum - dec!(100000)).abs() < dec!(0.000001));

        // Interest share falls as the balance amortizes
        assert!(schedule[0].interest > schedule[239].interest);
        assert!((schedule[0].principal - out.result.first_payment_principal).abs() < dec!(0.000001));
    }

    #[test]
    fn test_high_interest_warns() {
        let input = LoanInput {
            principal: dec!(50000),
            rate_pct: dec!(9),
            apr_pct: Some(dec!(11)),
            years: 25,
            include_schedule: false,
        };
        let out = calculate_loan(&input).unwrap();
        assert!(out.result.interest_ratio > dec!(0.5));
        assert!(out.warnings.iter().any(|w| w.contains("of the principal")));
        assert!(out.warnings.iter().any(|w| w.contains("fees are significant")));
    }

    #[test]
    fn test_invalid_principal() {
        let mut input = mortgage();
        input.principal = Decimal::ZERO;
        match calculate_loan(&input).unwrap_err() {
            FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "principal"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_years_rejected() {
        let mut input = mortgage();
        input.years = 0;
        match calculate_loan(&input).unwrap_err() {
            FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "years"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_term_above_limit_rejected() {
        let input = LoanInput {
            principal: dec!(1000),
            rate_pct: dec!(100),
            apr_pct: None,
            years: 200,
            include_schedule: false,
        };
        match calculate_loan(&input).unwrap_err() {
            FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "years"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_overflowing_rate_is_error() {
        // (1 + 1000%/12)^1200 is far outside Decimal range
        let input = LoanInput {
            principal: dec!(1000),
            rate_pct: dec!(1000),
            apr_pct: None,
            years: MAX_YEARS,
            include_schedule: true,
        };
        match calculate_loan(&input).unwrap_err() {
            FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "nper"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }
}
