pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "fixed_income")]
pub mod fixed_income;

#[cfg(feature = "wealth")]
pub mod wealth;

#[cfg(feature = "real_assets")]
pub mod real_assets;

pub use error::{DateOrderViolation, FinCalcError};
pub use types::*;

/// Standard result type for all fincalc operations
pub type FinCalcResult<T> = Result<T, FinCalcError>;
