//! Accrued interest under the actual/actual day count.
//!
//! The coupon amount of a period is re-derived from the period's length in
//! calendar months (see [`CouponFrequency::classify_period_months`]) rather
//! than taken from the bond's nominal frequency, so irregular first periods
//! accrue the coupon that matches their actual length.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::calendar::{months_between, CouponFrequency};
use crate::types::{pct_to_rate, Money};

/// Coupon paid for the period `start..end`, classified by its month count.
pub fn coupon_for_period(
    nominal: Money,
    annual_rate_pct: Decimal,
    start: NaiveDate,
    end: NaiveDate,
) -> Money {
    let annual_coupon = nominal * pct_to_rate(annual_rate_pct);
    let class = CouponFrequency::classify_period_months(months_between(start, end));
    annual_coupon / Decimal::from(class.periods_per_year())
}

/// Interest accrued from `last_coupon` to `purchase_date` inside the period
/// ending at `next_coupon`:
///
/// `coupon_for_period × (purchase − last) / (next − last)`
///
/// Zero when either bound is missing.
pub fn accrued_interest(
    nominal: Money,
    annual_rate_pct: Decimal,
    last_coupon: Option<NaiveDate>,
    purchase_date: NaiveDate,
    next_coupon: Option<NaiveDate>,
) -> Money {
    let (Some(last), Some(next)) = (last_coupon, next_coupon) else {
        return Decimal::ZERO;
    };

    let days_elapsed = (purchase_date - last).num_days();
    let days_in_period = (next - last).num_days();
    if days_in_period <= 0 {
        return Decimal::ZERO;
    }

    let coupon = coupon_for_period(nominal, annual_rate_pct, last, next);
    coupon * Decimal::from(days_elapsed) / Decimal::from(days_in_period)
}

/// Interest accrued since issue for a purchase that precedes the first
/// coupon. The first coupon period runs from `issue_date` to
/// `first_coupon_date` and is classified by its own month count.
pub fn accrued_from_issue(
    nominal: Money,
    annual_rate_pct: Decimal,
    issue_date: NaiveDate,
    purchase_date: NaiveDate,
    first_coupon_date: NaiveDate,
) -> Money {
    accrued_interest(
        nominal,
        annual_rate_pct,
        Some(issue_date),
        purchase_date,
        Some(first_coupon_date),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_zero_when_bound_missing() {
        let purchase = d(2025, 8, 6);
        assert_eq!(
            accrued_interest(dec!(100), dec!(2.5), None, purchase, Some(d(2025, 9, 19))),
            Decimal::ZERO
        );
        assert_eq!(
            accrued_interest(dec!(100), dec!(2.5), Some(d(2025, 3, 19)), purchase, None),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_semiannual_period_actual_actual() {
        // 2025-03-19 -> 2025-08-06 = 140 days of 184; coupon 1.25
        let accrued = accrued_interest(
            dec!(100),
            dec!(2.5),
            Some(d(2025, 3, 19)),
            d(2025, 8, 6),
            Some(d(2025, 9, 19)),
        );
        let expected = dec!(1.25) * dec!(140) / dec!(184);
        assert!((accrued - expected).abs() < dec!(0.0000000001));
        assert!((accrued - dec!(0.9511)).abs() < dec!(0.0001), "got {accrued}");
    }

    #[test]
    fn test_zero_on_last_coupon_and_full_on_next() {
        let last = d(2024, 1, 15);
        let next = d(2024, 7, 15);
        assert_eq!(
            accrued_interest(dec!(1000), dec!(6), Some(last), last, Some(next)),
            Decimal::ZERO
        );
        assert_eq!(
            accrued_interest(dec!(1000), dec!(6), Some(last), next, Some(next)),
            dec!(30)
        );
    }

    #[test]
    fn test_quarterly_period_uses_quarter_coupon() {
        let accrued = accrued_interest(
            dec!(1000),
            dec!(8),
            Some(d(2024, 1, 15)),
            d(2024, 4, 15),
            Some(d(2024, 4, 15)),
        );
        assert_eq!(accrued, dec!(20));
    }

    #[test]
    fn test_annual_period_uses_full_coupon() {
        let accrued = accrued_interest(
            dec!(1000),
            dec!(4),
            Some(d(2023, 6, 1)),
            d(2024, 6, 1),
            Some(d(2024, 6, 1)),
        );
        assert_eq!(accrued, dec!(40));
    }

    #[test]
    fn test_five_month_stub_accrues_semiannual_coupon() {
        assert_eq!(
            coupon_for_period(dec!(1000), dec!(5), d(2024, 1, 10), d(2024, 6, 10)),
            dec!(25)
        );
    }

    #[test]
    fn test_zero_coupon_never_accrues() {
        let accrued = accrued_interest(
            dec!(1000),
            dec!(0),
            Some(d(2024, 1, 15)),
            d(2024, 3, 1),
            Some(d(2024, 7, 15)),
        );
        assert!(accrued.is_zero());
    }

    #[test]
    fn test_long_first_coupon_from_issue() {
        // Issue 2024-02-01, first coupon 2025-03-19: 13 months -> annual class
        let issue = d(2024, 2, 1);
        let first = d(2025, 3, 19);
        let purchase = d(2024, 8, 1);
        let accrued = accrued_from_issue(dec!(100), dec!(2.5), issue, purchase, first);

        let elapsed = Decimal::from((purchase - issue).num_days());
        let period = Decimal::from((first - issue).num_days());
        let expected = dec!(2.5) * elapsed / period;
        assert!((accrued - expected).abs() < dec!(0.0000000001), "got {accrued}");
    }
}
