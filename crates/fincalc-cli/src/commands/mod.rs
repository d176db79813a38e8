pub mod fixed_income;
pub mod real_assets;
pub mod wealth;
