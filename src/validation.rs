//! Parameter validation for the form layer
//!
//! The engine accepts any parameters; these checks reject out-of-range input
//! before it reaches the engine.

use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{AnnuityError, Result};
use crate::valuation::{AnnuityParameters, AnnuityType};

pub const AGE_RANGE: RangeInclusive<f64> = 18.0..=100.0;
pub const INTEREST_RATE_RANGE: RangeInclusive<f64> = 0.0..=10.0;
pub const DURATION_RANGE: RangeInclusive<f64> = 1.0..=50.0;
pub const DEFERRAL_RANGE: RangeInclusive<f64> = 0.0..=30.0;
pub const GROWTH_RATE_RANGE: RangeInclusive<f64> = 0.0..=10.0;
pub const REVERSAL_RATE_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// One rejected field
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub value: f64,
    pub reason: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.value, self.reason)
    }
}

impl From<ValidationIssue> for AnnuityError {
    fn from(issue: ValidationIssue) -> Self {
        AnnuityError::InvalidParameter {
            field: issue.field,
            value: issue.value,
            reason: issue.reason,
        }
    }
}

fn check_range(
    issues: &mut Vec<ValidationIssue>,
    field: &'static str,
    value: f64,
    range: RangeInclusive<f64>,
) {
    if !range.contains(&value) {
        issues.push(ValidationIssue {
            field,
            value,
            reason: format!("must be between {} and {}", range.start(), range.end()),
        });
    }
}

/// Every out-of-range field, in form order
pub fn validation_issues(params: &AnnuityParameters) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_range(&mut issues, "age", params.age as f64, AGE_RANGE);
    check_range(&mut issues, "interest_rate", params.interest_rate, INTEREST_RATE_RANGE);

    if !(params.annual_amount.is_finite() && params.annual_amount > 0.0) {
        issues.push(ValidationIssue {
            field: "annual_amount",
            value: params.annual_amount,
            reason: "must be a positive amount".to_string(),
        });
    }

    match params.annuity {
        AnnuityType::Simple => {}
        AnnuityType::Temporary { duration } => {
            check_range(&mut issues, "duration", duration as f64, DURATION_RANGE);
        }
        AnnuityType::Deferred { deferral_period } => {
            check_range(&mut issues, "deferral_period", deferral_period as f64, DEFERRAL_RANGE);
        }
        AnnuityType::Growing { growth_rate } => {
            check_range(&mut issues, "growth_rate", growth_rate, GROWTH_RATE_RANGE);
        }
        AnnuityType::Reversible {
            reversal_rate,
            spouse_age,
        } => {
            check_range(&mut issues, "reversal_rate", reversal_rate, REVERSAL_RATE_RANGE);
            check_range(&mut issues, "spouse_age", spouse_age as f64, AGE_RANGE);
        }
    }

    issues
}

/// Reject parameters with the first out-of-range field
pub fn validate(params: &AnnuityParameters) -> Result<()> {
    match validation_issues(params).into_iter().next() {
        Some(issue) => Err(issue.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mortality::Sex;

    fn valid() -> AnnuityParameters {
        AnnuityParameters::new(65, Sex::Male, 2.5, 12_000.0)
    }

    #[test]
    fn test_valid_parameters() {
        assert!(validate(&valid()).is_ok());
        assert!(validate(&valid().temporary(30)).is_ok());
        assert!(validate(&valid().deferred(0)).is_ok());
        assert!(validate(&valid().growing(3.0)).is_ok());
        assert!(validate(&valid().reversible(60.0, None)).is_ok());
    }

    #[test]
    fn test_age_bounds() {
        let young = AnnuityParameters::new(17, Sex::Male, 2.5, 12_000.0);
        let err = validate(&young).unwrap_err();
        assert!(matches!(err, AnnuityError::InvalidParameter { field: "age", .. }));

        assert!(validate(&AnnuityParameters::new(18, Sex::Male, 2.5, 1.0)).is_ok());
        assert!(validate(&AnnuityParameters::new(100, Sex::Male, 2.5, 1.0)).is_ok());
        assert!(validate(&AnnuityParameters::new(101, Sex::Male, 2.5, 1.0)).is_err());
    }

    #[test]
    fn test_collects_every_issue() {
        let mut params = valid().temporary(0);
        params.interest_rate = 12.0;
        params.annual_amount = 0.0;

        let fields: Vec<_> = validation_issues(&params).iter().map(|i| i.field).collect();
        assert_eq!(fields, vec!["interest_rate", "annual_amount", "duration"]);
    }

    #[test]
    fn test_non_finite_amount() {
        let mut params = valid();
        params.annual_amount = f64::NAN;
        assert!(validate(&params).is_err());
    }

    #[test]
    fn test_type_specific_ranges() {
        assert!(validate(&valid().deferred(31)).is_err());
        assert!(validate(&valid().growing(-1.0)).is_err());
        assert!(validate(&valid().reversible(120.0, None)).is_err());
        assert!(validate(&valid().reversible(60.0, Some(16))).is_err());
    }

    #[test]
    fn test_issue_display() {
        let issues = validation_issues(&valid().growing(11.0));
        assert_eq!(issues[0].to_string(), "growth_rate: 11 (must be between 0 and 10)");
    }
}
