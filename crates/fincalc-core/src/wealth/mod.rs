pub mod compounding;
pub mod loans;
