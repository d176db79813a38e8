use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::FinCalcError;
use crate::time_value::cagr;
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

/// Longest holding period accepted, in years.
pub const MAX_YEARS: u32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the rent is reset on adjustment years.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentAdjustmentMethod {
    /// Rent tracks the property: current value × initial rent/value ratio.
    PropertyValue,
    /// Rent grows by the inflation compounded over the adjustment interval.
    #[default]
    Inflation,
    /// Rent is never reset.
    None,
}

/// Input parameters for a buy-to-let projection. Percentages are quoted in
/// percent (2 = 2%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealEstateInput {
    /// Purchase value of the property
    pub property_value: Money,
    /// Gross annual rent in year 1
    pub annual_rent: Money,
    /// Annual property appreciation
    pub appreciation_pct: Decimal,
    /// Expected annual inflation
    pub inflation_pct: Decimal,
    /// Share of the year the property sits empty
    #[serde(default)]
    pub vacancy_pct: Decimal,
    /// Extraordinary maintenance, % of current value per year
    #[serde(default)]
    pub maintenance_pct: Decimal,
    /// Tax on effective rent
    #[serde(default)]
    pub rental_tax_pct: Decimal,
    /// Insurance, % of current value per year
    #[serde(default)]
    pub insurance_pct: Decimal,
    /// Other running costs, % of current value per year
    #[serde(default)]
    pub other_costs_pct: Decimal,
    /// Property tax, % of current value per year
    #[serde(default)]
    pub property_tax_pct: Decimal,
    /// Holding period in years
    pub years: u32,
    /// Rent is reset every this many years
    pub adjustment_interval_years: u32,
    #[serde(default)]
    pub adjustment_method: RentAdjustmentMethod,
}

/// One year of the projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealEstateYear {
    pub year: u32,
    /// Property value at year end
    pub property_value: Money,
    pub gross_rent: Money,
    /// Gross rent net of vacancy
    pub effective_rent: Money,
    pub rental_tax: Money,
    /// Value-based costs (maintenance, insurance, other, property tax)
    pub property_costs: Money,
    /// Effective rent − property costs − rental tax
    pub net_rent: Money,
    /// Net rent / initial property value
    pub net_yield: Rate,
    pub rent_adjusted: bool,
}

/// A rent reset applied during the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentAdjustment {
    pub year: u32,
    pub method: RentAdjustmentMethod,
    pub previous_rent: Money,
    pub new_rent: Money,
    /// new / previous − 1
    pub change: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealEstateOutput {
    pub yearly: Vec<RealEstateYear>,
    pub final_value_nominal: Money,
    /// Final value deflated by cumulative inflation
    pub final_value_real: Money,
    pub total_net_rent: Money,
    /// Mean of the yearly net yields
    pub average_net_yield: Rate,
    pub capital_gain_nominal: Money,
    pub capital_gain_real: Money,
    /// Total net rent + nominal capital gain
    pub total_return_nominal: Money,
    pub total_return_real: Money,
    /// CAGR of (final value + total net rent) over the purchase value
    pub cagr_nominal: Rate,
    pub cagr_real: Rate,
    pub final_rent: Money,
    pub rent_growth_total: Rate,
    pub rent_growth_annualized: Rate,
    pub adjustments: Vec<RentAdjustment>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project a rental property year by year: appreciate the value, reset the
/// rent on adjustment years, charge value-based costs and rental tax, and
/// summarise nominal and real returns.
pub fn project_real_estate(
    input: &RealEstateInput,
) -> FinCalcResult<ComputationOutput<RealEstateOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let appreciation = pct_to_rate(input.appreciation_pct);
    let inflation = pct_to_rate(input.inflation_pct);
    let vacancy = pct_to_rate(input.vacancy_pct);
    let rental_tax_rate = pct_to_rate(input.rental_tax_pct);
    let value_cost_rate = pct_to_rate(
        input.maintenance_pct + input.insurance_pct + input.other_costs_pct + input.property_tax_pct,
    );

    let initial_ratio = input.annual_rent / input.property_value;
    let interval = input.adjustment_interval_years;
    let interval_inflation = compound(inflation, interval)?;

    let mut value = input.property_value;
    let mut rent = input.annual_rent;
    let mut yearly: Vec<RealEstateYear> = Vec::with_capacity(input.years as usize);
    let mut adjustments: Vec<RentAdjustment> = Vec::new();

    for year in 1..=input.years {
        value = value
            .checked_mul(Decimal::ONE + appreciation)
            .ok_or_else(overflow)?;

        let mut rent_adjusted = false;
        if year % interval == 0 {
            let new_rent = match input.adjustment_method {
                RentAdjustmentMethod::PropertyValue => Some(value.checked_mul(initial_ratio)),
                RentAdjustmentMethod::Inflation => Some(rent.checked_mul(interval_inflation)),
                RentAdjustmentMethod::None => None,
            }
            .map(|adjusted| adjusted.ok_or_else(overflow))
            .transpose()?;
            if let Some(new_rent) = new_rent {
                let change = if rent.is_zero() {
                    Decimal::ZERO
                } else {
                    new_rent / rent - Decimal::ONE
                };
                adjustments.push(RentAdjustment {
                    year,
                    method: input.adjustment_method,
                    previous_rent: rent,
                    new_rent,
                    change,
                });
                rent = new_rent;
                rent_adjusted = true;
            }
        }

        let effective_rent = rent * (Decimal::ONE - vacancy);
        let rental_tax = effective_rent * rental_tax_rate;
        let property_costs = value.checked_mul(value_cost_rate).ok_or_else(overflow)?;
        let net_rent = effective_rent - property_costs - rental_tax;

        yearly.push(RealEstateYear {
            year,
            property_value: value,
            gross_rent: rent,
            effective_rent,
            rental_tax,
            property_costs,
            net_rent,
            net_yield: net_rent / input.property_value,
            rent_adjusted,
        });
    }

    let final_value_nominal = value;
    let final_value_real = final_value_nominal
        .checked_div(compound(inflation, input.years)?)
        .ok_or_else(|| FinCalcError::DivisionByZero {
            context: "inflation factor".into(),
        })?;
    let total_net_rent: Money = yearly.iter().map(|y| y.net_rent).sum();
    let average_net_yield =
        yearly.iter().map(|y| y.net_yield).sum::<Decimal>() / Decimal::from(input.years);

    let capital_gain_nominal = final_value_nominal - input.property_value;
    let capital_gain_real = final_value_real - input.property_value;

    let years = Decimal::from(input.years);
    let cagr_nominal = cagr(input.property_value, final_value_nominal + total_net_rent, years)?.cagr;
    let cagr_real = cagr(input.property_value, final_value_real + total_net_rent, years)?.cagr;

    let (rent_growth_total, rent_growth_annualized) = if input.annual_rent > Decimal::ZERO {
        let growth = cagr(input.annual_rent, rent, years)?;
        (growth.total_return, growth.cagr)
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    if yearly.iter().any(|y| y.net_rent < Decimal::ZERO) {
        warnings.push("Costs exceed effective rent in at least one year".into());
    }
    if input.adjustment_method != RentAdjustmentMethod::None && interval > input.years {
        warnings.push(format!(
            "Adjustment interval of {interval} years exceeds the holding period; rent never resets"
        ));
    }
    if cagr_real < Decimal::ZERO {
        warnings.push("Negative real CAGR: the investment loses purchasing power".into());
    }

    debug!(
        years = input.years,
        adjustments = adjustments.len(),
        final_value = %final_value_nominal,
        total_net_rent = %total_net_rent,
        "real estate projection complete"
    );

    let output = RealEstateOutput {
        yearly,
        final_value_nominal,
        final_value_real,
        total_net_rent,
        average_net_yield,
        capital_gain_nominal,
        capital_gain_real,
        total_return_nominal: total_net_rent + capital_gain_nominal,
        total_return_real: total_net_rent + capital_gain_real,
        cagr_nominal,
        cagr_real,
        final_rent: rent,
        rent_growth_total,
        rent_growth_annualized,
        adjustments,
    };

    let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    Ok(with_metadata(
        "Buy-to-let projection (annual steps, value-based costs, periodic rent reset)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &RealEstateInput) -> FinCalcResult<()> {
    if input.property_value <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "property_value".into(),
            reason: "Property value must be positive".into(),
        });
    }
    if input.annual_rent < Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: "annual_rent".into(),
            reason: "Rent cannot be negative".into(),
        });
    }
    if input.years == 0 || input.years > MAX_YEARS {
        return Err(FinCalcError::InvalidInput {
            field: "years".into(),
            reason: format!("Holding period must be between 1 and {MAX_YEARS} years"),
        });
    }
    if input.adjustment_interval_years == 0 || input.adjustment_interval_years > MAX_YEARS {
        return Err(FinCalcError::InvalidInput {
            field: "adjustment_interval_years".into(),
            reason: format!("Adjustment interval must be between 1 and {MAX_YEARS} years"),
        });
    }
    if !(Decimal::ZERO..=dec!(100)).contains(&input.vacancy_pct) {
        return Err(FinCalcError::InvalidInput {
            field: "vacancy_pct".into(),
            reason: "Vacancy must be between 0 and 100".into(),
        });
    }
    if input.inflation_pct <= dec!(-100) {
        return Err(FinCalcError::InvalidInput {
            field: "inflation_pct".into(),
            reason: "Inflation must be greater than -100%".into(),
        });
    }
    Ok(())
}

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
        field: "appreciation_pct".into(),
        reason: "Projected values overflow for these growth rates".into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
