use napi::Result as NapiResult;
use napi_derive::napi;
use serde::{de::DeserializeOwned, Serialize};

use fincalc_core::fixed_income::{bond_yield, calendar, valuation};
use fincalc_core::real_assets::real_estate;
use fincalc_core::time_value;
use fincalc_core::wealth::{compounding, loans};
use fincalc_core::FinCalcResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse `input_json`, run `calc`, and serialise its output.
fn run_json<I, O>(input_json: &str, calc: impl FnOnce(&I) -> FinCalcResult<O>) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calc(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Fixed income
// ---------------------------------------------------------------------------

#[napi]
pub fn value_bond(input_json: String) -> NapiResult<String> {
    run_json(&input_json, valuation::calculate_bond_valuation)
}

#[napi]
pub fn calculate_bond_yield(input_json: String) -> NapiResult<String> {
    run_json(&input_json, bond_yield::calculate_bond_yield)
}

#[napi]
pub fn coupon_schedule(input_json: String) -> NapiResult<String> {
    run_json(&input_json, calendar::build_coupon_schedule)
}

// ---------------------------------------------------------------------------
// Wealth
// ---------------------------------------------------------------------------

#[napi]
pub fn loan(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loans::calculate_loan)
}

#[napi]
pub fn compound_interest(input_json: String) -> NapiResult<String> {
    run_json(&input_json, compounding::project_compound_interest)
}

#[napi]
pub fn cagr(input_json: String) -> NapiResult<String> {
    run_json(&input_json, time_value::calculate_cagr)
}

// ---------------------------------------------------------------------------
// Real assets
// ---------------------------------------------------------------------------

#[napi]
pub fn real_estate_projection(input_json: String) -> NapiResult<String> {
    run_json(&input_json, real_estate::project_real_estate)
}
