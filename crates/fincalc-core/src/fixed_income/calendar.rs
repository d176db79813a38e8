//! Coupon calendar: schedule generation by calendar-month stepping and
//! location of a purchase date inside the schedule.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

use crate::error::FinCalcError;
use crate::types::{with_metadata, ComputationOutput};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Coupon payment frequency. A missing frequency means `Annual`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponFrequency {
    #[default]
    Annual,
    #[serde(alias = "semi_annual")]
    Semiannual,
    Quarterly,
}

impl CouponFrequency {
    /// Coupon payments per year: 1, 2 or 4.
    pub fn periods_per_year(self) -> u32 {
        match self {
            CouponFrequency::Annual => 1,
            CouponFrequency::Semiannual => 2,
            CouponFrequency::Quarterly => 4,
        }
    }

    /// Calendar months between consecutive coupons: 12, 6 or 3.
    pub fn months_per_period(self) -> u32 {
        12 / self.periods_per_year()
    }

    pub fn from_periods_per_year(periods: u32) -> Option<Self> {
        match periods {
            1 => Some(CouponFrequency::Annual),
            2 => Some(CouponFrequency::Semiannual),
            4 => Some(CouponFrequency::Quarterly),
            _ => None,
        }
    }

    /// Classify a coupon period by its length in whole calendar months.
    ///
    /// | months | class        |
    /// |--------|--------------|
    /// | <= 3   | `Quarterly`  |
    /// | 4..=6  | `Semiannual` |
    /// | > 6    | `Annual`     |
    ///
    /// Stub periods land in the class whose upper bound they fall under, so a
    /// 5-month stub accrues a semiannual coupon and a 13-month long first
    /// coupon accrues an annual one.
    pub fn classify_period_months(months: i32) -> Self {
        if months <= 3 {
            CouponFrequency::Quarterly
        } else if months <= 6 {
            CouponFrequency::Semiannual
        } else {
            CouponFrequency::Annual
        }
    }
}

impl fmt::Display for CouponFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CouponFrequency::Annual => "annual",
            CouponFrequency::Semiannual => "semiannual",
            CouponFrequency::Quarterly => "quarterly",
        };
        f.write_str(s)
    }
}

impl FromStr for CouponFrequency {
    type Err = FinCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annual" | "1" => Ok(CouponFrequency::Annual),
            "semiannual" | "semi_annual" | "semi-annual" | "2" => Ok(CouponFrequency::Semiannual),
            "quarterly" | "4" => Ok(CouponFrequency::Quarterly),
            other => Err(FinCalcError::InvalidInput {
                field: "frequency".into(),
                reason: format!("Unknown coupon frequency '{other}' (annual, semiannual, quarterly)"),
            }),
        }
    }
}

/// Strictly increasing coupon payment dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponSchedule {
    dates: Vec<NaiveDate>,
}

impl CouponSchedule {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Last/next coupon around `purchase_date`.
    pub fn period_for(&self, purchase_date: NaiveDate) -> CouponPeriod {
        find_coupon_period(&self.dates, purchase_date)
    }

    /// Coupons still to be paid after `purchase_date`.
    pub fn remaining_after(&self, purchase_date: NaiveDate) -> usize {
        count_remaining(&self.dates, purchase_date)
    }

    /// Dates strictly after `purchase_date`.
    pub fn dates_after(&self, purchase_date: NaiveDate) -> &[NaiveDate] {
        let idx = self.dates.partition_point(|d| *d <= purchase_date);
        &self.dates[idx..]
    }
}

impl From<CouponSchedule> for Vec<NaiveDate> {
    fn from(schedule: CouponSchedule) -> Self {
        schedule.dates
    }
}

/// Coupon dates bracketing a purchase date. The period is closed on the
/// left: a purchase on a coupon date has that date as `last_coupon`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponPeriod {
    /// Latest coupon on or before the purchase date.
    pub last_coupon: Option<NaiveDate>,
    /// Earliest coupon strictly after the purchase date.
    pub next_coupon: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate coupon dates from `first_coupon_date`, stepping by the frequency's
/// month increment while the date is on or before `maturity_date`.
///
/// Each date is the previous one plus N calendar months, clamped to the end of
/// the target month (Jan 31 + 1 month = Feb 28/29). An empty schedule means the
/// first coupon falls after maturity; callers treat that as an error.
pub fn generate_coupon_dates(
    first_coupon_date: NaiveDate,
    maturity_date: NaiveDate,
    frequency: CouponFrequency,
) -> CouponSchedule {
    let step = Months::new(frequency.months_per_period());
    let mut dates = Vec::new();
    let mut current = Some(first_coupon_date);

    while let Some(date) = current {
        if date > maturity_date {
            break;
        }
        dates.push(date);
        current = date.checked_add_months(step);
    }

    debug!(
        %first_coupon_date,
        %maturity_date,
        %frequency,
        coupons = dates.len(),
        "generated coupon schedule"
    );

    CouponSchedule { dates }
}

/// Find the last coupon on or before, and the first coupon strictly after,
/// `purchase_date` in one ordered pass over `schedule`.
pub fn find_coupon_period(schedule: &[NaiveDate], purchase_date: NaiveDate) -> CouponPeriod {
    let mut period = CouponPeriod::default();

    for &date in schedule {
        if date <= purchase_date {
            period.last_coupon = Some(date);
        } else {
            period.next_coupon = Some(date);
            break;
        }
    }

    period
}

/// Number of schedule dates strictly after `purchase_date`.
pub fn count_remaining(schedule: &[NaiveDate], purchase_date: NaiveDate) -> usize {
    schedule.iter().filter(|d| **d > purchase_date).count()
}

/// Whole calendar months from `start` to `end`, ignoring the day of month.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32)
}

/// Input for [`build_coupon_schedule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponScheduleInput {
    pub first_coupon_date: NaiveDate,
    pub maturity_date: NaiveDate,
    #[serde(default)]
    pub frequency: CouponFrequency,
    /// Optional date to locate inside the schedule.
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponScheduleOutput {
    pub frequency: CouponFrequency,
    pub count: usize,
    pub dates: CouponSchedule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<CouponPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<usize>,
}

/// Coupon schedule in the standard output envelope, optionally locating a
/// purchase date. An empty schedule is an error.
pub fn build_coupon_schedule(
    input: &CouponScheduleInput,
) -> FinCalcResult<ComputationOutput<CouponScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule =
        generate_coupon_dates(input.first_coupon_date, input.maturity_date, input.frequency);
    let Some(final_coupon) = schedule.last() else {
        return Err(FinCalcError::EmptySchedule {
            first_coupon_date: input.first_coupon_date,
            maturity_date: input.maturity_date,
        });
    };
    if final_coupon != input.maturity_date {
        warnings.push(format!(
            "Last coupon {final_coupon} falls before maturity {}",
            input.maturity_date
        ));
    }

    let output = CouponScheduleOutput {
        frequency: input.frequency,
        count: schedule.len(),
        period: input.purchase_date.map(|d| schedule.period_for(d)),
        remaining: input.purchase_date.map(|d| schedule.remaining_after(d)),
        dates: schedule,
    };

    let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    Ok(with_metadata(
        "Coupon schedule: calendar-month stepping from the first coupon date",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
