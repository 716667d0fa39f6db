//! Valuation output structures

use serde::{Deserialize, Serialize};

/// Expected payment and survival for one projection year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    /// Projection year (1-indexed)
    pub year: u32,

    /// Payment due that year, rounded; 0 outside the payment window
    pub payment: f64,

    /// Survival-weighted payments to date, rounded
    pub cumulative_payment: f64,

    /// Probability the annuitant is alive at the end of the year, 2 decimals
    pub survival_probability: f64,
}

/// Complete valuation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnuityResult {
    /// Present value at the technical rate, whole currency units
    pub present_value: f64,

    /// Annual amount / 12, whole currency units
    pub monthly_payment: f64,

    /// Survival-weighted payments over the projection horizon, whole currency units
    pub total_payments: f64,

    /// Curtate life expectancy, one decimal
    pub life_expectancy: f64,

    pub projections: Vec<ProjectionPoint>,
}

impl AnnuityResult {
    /// Number of projection years with a payment due
    pub fn payment_years(&self) -> usize {
        self.projections.iter().filter(|p| p.payment > 0.0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(year: u32, payment: f64) -> ProjectionPoint {
        ProjectionPoint {
            year,
            payment,
            cumulative_payment: payment * year as f64,
            survival_probability: 0.9,
        }
    }

    #[test]
    fn test_payment_years() {
        let result = AnnuityResult {
            present_value: 1000.0,
            monthly_payment: 100.0,
            total_payments: 2400.0,
            life_expectancy: 3.2,
            projections: vec![point(1, 0.0), point(2, 1200.0), point(3, 1200.0), point(4, 0.0)],
        };
        assert_eq!(result.payment_years(), 2);
    }

    #[test]
    fn test_serializes_field_names() {
        let json = serde_json::to_value(point(1, 12_000.0)).unwrap();
        assert_eq!(json["cumulativePayment"], 12_000.0);
        assert_eq!(json["survivalProbability"], 0.9);
        assert!(json.get("cumulative_payment").is_none());
    }
}
