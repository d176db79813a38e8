//! Bond valuation: coupon calendars, actual/actual accrued interest,
//! yield-to-maturity solvers and the valuation engine that ties them together.

pub mod accrued;
pub mod bond_yield;
pub mod calendar;
pub mod valuation;
pub mod ytm;

pub use bond_yield::{calculate_bond_yield, BondYieldInput, BondYieldOutput};
pub use calendar::{
    build_coupon_schedule, generate_coupon_dates, CouponFrequency, CouponPeriod, CouponSchedule,
};
pub use valuation::{
    calculate_bond_valuation, value_bond, value_bond_with, BondTerms, BondValuationInput,
    PricePosition, ValuationResult,
};
pub use ytm::{YieldMethod, YtmSolution};
