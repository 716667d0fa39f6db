//! Discounting and rounding helpers shared by the valuation strategies

use serde::{Deserialize, Serialize};

/// Annual effective discount rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountRate {
    /// Annual rate as a decimal (0.025 for 2.5%)
    pub annual_rate: f64,
}

impl DiscountRate {
    pub fn new(annual_rate: f64) -> Self {
        Self { annual_rate }
    }

    /// Rate quoted as a percentage, e.g. 2.5 for 2.5%
    pub fn from_percent(percent: f64) -> Self {
        Self::new(percent / 100.0)
    }

    /// Rate net of a yearly payment growth g: (r - g) / (1 + g)
    pub fn growth_adjusted(&self, growth: f64) -> Self {
        Self::new((self.annual_rate - growth) / (1.0 + growth))
    }

    /// Discount factor to the end of year `years`: (1 + r)^-t
    pub fn factor(&self, years: u32) -> f64 {
        1.0 / compound(1.0 + self.annual_rate, years)
    }
}

/// `base` raised to a whole number of years, valid over the full `u32` range
pub fn compound(base: f64, years: u32) -> f64 {
    match i32::try_from(years) {
        Ok(n) => base.powi(n),
        Err(_) => base.powf(f64::from(years)),
    }
}

/// Round to whole currency units
pub fn round_currency(amount: f64) -> f64 {
    amount.round()
}

/// Round to a fixed number of decimals
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10_f64.powi(decimals as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_percent() {
        let rate = DiscountRate::from_percent(2.5);
        assert_relative_eq!(rate.annual_rate, 0.025);
    }

    #[test]
    fn test_discount_factor() {
        let rate = DiscountRate::new(0.05);
        assert_relative_eq!(rate.factor(0), 1.0);
        assert_relative_eq!(rate.factor(1), 1.0 / 1.05);
        assert_relative_eq!(rate.factor(10), 1.05_f64.powi(-10), max_relative = 1e-12);
    }

    #[test]
    fn test_zero_rate_does_not_discount() {
        let rate = DiscountRate::new(0.0);
        assert_relative_eq!(rate.factor(30), 1.0);
    }

    #[test]
    fn test_growth_adjusted_rate() {
        let rate = DiscountRate::new(0.04).growth_adjusted(0.02);
        assert_relative_eq!(rate.annual_rate, 0.02 / 1.02);

        let unchanged = DiscountRate::new(0.04).growth_adjusted(0.0);
        assert_relative_eq!(unchanged.annual_rate, 0.04);
    }

    #[test]
    fn test_compound_beyond_i32_range() {
        assert_relative_eq!(compound(1.0, u32::MAX), 1.0);
        assert_relative_eq!(compound(1.05, 2), 1.1025, max_relative = 1e-12);
        assert_eq!(DiscountRate::new(0.025).factor(u32::MAX), 0.0);
        assert!(DiscountRate::new(0.025).factor(u32::MAX).is_sign_positive());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_currency(1234.5), 1235.0);
        assert_eq!(round_currency(999.49), 999.0);
        assert_relative_eq!(round_to(0.4839, 2), 0.48);
        assert_relative_eq!(round_to(12.35, 1), 12.4);
    }
}
