pub mod real_estate;
