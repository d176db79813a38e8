#![cfg(feature = "wealth")]

use fincalc_core::time_value::{calculate_cagr, CagrInput};
use fincalc_core::wealth::compounding::{
    project_compound_interest, CompoundInterestInput, ContributionFrequency,
};
use fincalc_core::wealth::loans::{calculate_loan, LoanInput};
use fincalc_core::FinCalcError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Loans
// ===========================================================================

#[test]
fn test_loan_from_json_with_schedule() {
    let input: LoanInput = serde_json::from_str(
        r#"{"principal": "25000", "rate_pct": "6", "apr_pct": "6.4", "years": 5, "include_schedule": true}"#,
    )
    .unwrap();
    let out = calculate_loan(&input).unwrap();
    let r = &out.result;

    assert_eq!(r.num_payments, 60);
    assert!((r.monthly_payment - dec!(483.32)).abs() < dec!(0.01), "got {}", r.monthly_payment);

    let schedule = r.schedule.as_ref().unwrap();
    assert_eq!(schedule.len(), 60);
    assert!(schedule.last().unwrap().balance.is_zero());

    let interest_sum: Decimal = schedule.iter().map(|row| row.interest).sum();
    assert!((interest_sum - r.total_interest).abs() < dec!(0.01));
}

#[test]
fn test_loan_negative_rate_rejected() {
    let input = LoanInput {
        principal: dec!(1000),
        rate_pct: dec!(-1),
        apr_pct: None,
        years: 1,
        include_schedule: false,
    };
    match calculate_loan(&input).unwrap_err() {
        FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "rate_pct"),
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
}

// ===========================================================================
// Compound interest
// ===========================================================================

#[test]
fn test_monthly_compounding_beats_annual() {
    let annual = CompoundInterestInput {
        initial_investment: dec!(10000),
        rate_pct: dec!(6),
        years: 10,
        annual_contribution: dec!(1200),
        inflation_pct: dec!(2),
        contribution_frequency: ContributionFrequency::Annual,
    };
    let monthly = CompoundInterestInput {
        contribution_frequency: ContributionFrequency::Monthly,
        ..annual.clone()
    };

    let a = project_compound_interest(&annual).unwrap().result;
    let m = project_compound_interest(&monthly).unwrap().result;

    assert!(m.nominal.total_future_value > a.nominal.total_future_value);
    assert_eq!(m.nominal.total_invested, a.nominal.total_invested);
    assert!(m.purchasing_power < m.nominal.total_future_value);
}

// ===========================================================================
// CAGR
// ===========================================================================

#[test]
fn test_cagr_doubling_over_ten_years() {
    let out = calculate_cagr(&CagrInput {
        initial_capital: dec!(10000),
        final_capital: dec!(20000),
        years: dec!(10),
    })
    .unwrap();
    assert!((out.result.cagr - dec!(0.071773)).abs() < dec!(0.000001));
    assert_eq!(out.result.total_return, dec!(1));
}

#[test]
fn test_cagr_zero_years_rejected() {
    let err = calculate_cagr(&CagrInput {
        initial_capital: dec!(10000),
        final_capital: dec!(20000),
        years: Decimal::ZERO,
    })
    .unwrap_err();
    match err {
        FinCalcError::InvalidInput { field, .. } => assert_eq!(field, "years"),
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
}
