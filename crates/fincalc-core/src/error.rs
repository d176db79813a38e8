use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Which date-ordering precondition of a bond valuation was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrderViolation {
    /// Issue date is on or after the purchase date.
    IssueNotBeforePurchase,
    /// First coupon date is on or before the issue date.
    FirstCouponNotAfterIssue,
    /// Maturity date is on or before the purchase date.
    MaturityNotAfterPurchase,
}

impl DateOrderViolation {
    /// Input field the violation is reported against.
    pub fn field(&self) -> &'static str {
        match self {
            DateOrderViolation::IssueNotBeforePurchase => "issue_date",
            DateOrderViolation::FirstCouponNotAfterIssue => "first_coupon_date",
            DateOrderViolation::MaturityNotAfterPurchase => "maturity_date",
        }
    }
}

impl fmt::Display for DateOrderViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DateOrderViolation::IssueNotBeforePurchase => {
                "issue date must be before the purchase date"
            }
            DateOrderViolation::FirstCouponNotAfterIssue => {
                "first coupon date must be after the issue date"
            }
            DateOrderViolation::MaturityNotAfterPurchase => {
                "maturity date must be after the purchase date"
            }
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Error)]
pub enum FinCalcError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Date validation failed: {0}")]
    DateOrder(DateOrderViolation),

    #[error("Empty coupon schedule: first coupon {first_coupon_date} falls after maturity {maturity_date}")]
    EmptySchedule {
        first_coupon_date: NaiveDate,
        maturity_date: NaiveDate,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FinCalcError {
    fn from(e: serde_json::Error) -> Self {
        FinCalcError::SerializationError(e.to_string())
    }
}
