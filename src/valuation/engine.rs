//! Annuity valuation engine
//!
//! Turns an `AnnuityParameters` record into an `AnnuityResult`: present value
//! by annuity type, life expectancy, and a yearly projection of expected
//! payments. Every valuation is a pure function of its parameters and the
//! read-only mortality registry.

use std::sync::Arc;

use log::debug;

use super::cashflows::{AnnuityResult, ProjectionPoint};
use super::discount::{compound, round_currency, round_to, DiscountRate};
use super::params::{AnnuityParameters, AnnuityType};
use crate::mortality::{MortalityRegistry, SurvivalCurve, SURVIVAL_THRESHOLD};

/// Maximum number of years in any present value series
pub const MAX_HORIZON_YEARS: u32 = 50;

/// Maximum number of projection years in a result
pub const MAX_PROJECTION_YEARS: u32 = 30;

/// Weight applied to the survivor leg of a reversible annuity
///
/// Stands in for a joint-survival calculation; it has no actuarial
/// derivation and is kept as a literal.
pub const JOINT_LIFE_FACTOR: f64 = 0.6;

/// Configuration for the valuation engine
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationConfig {
    /// Last year of the open-ended (life) series
    pub max_horizon: u32,

    /// Life series stop once survival drops below this probability
    pub survival_threshold: f64,

    /// Cap on the number of projection points
    pub projection_years: u32,

    /// Weight of the survivor leg for reversible annuities
    pub joint_life_factor: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            max_horizon: MAX_HORIZON_YEARS,
            survival_threshold: SURVIVAL_THRESHOLD,
            projection_years: MAX_PROJECTION_YEARS,
            joint_life_factor: JOINT_LIFE_FACTOR,
        }
    }
}

/// Range and shape of one discounted payment series
#[derive(Debug, Clone, Copy)]
struct PaymentSeries {
    first_year: u32,
    last_year: u32,
    /// Stop once survival drops below the threshold
    truncate: bool,
    /// Yearly payment growth as a decimal
    growth: f64,
}

impl PaymentSeries {
    fn life(config: &ValuationConfig) -> Self {
        Self {
            first_year: 1,
            last_year: config.max_horizon,
            truncate: true,
            growth: 0.0,
        }
    }
}

/// Main valuation engine
#[derive(Debug, Clone)]
pub struct ValuationEngine {
    mortality: Arc<MortalityRegistry>,
    config: ValuationConfig,
}

impl ValuationEngine {
    /// Create an engine over a mortality registry
    pub fn new(mortality: Arc<MortalityRegistry>, config: ValuationConfig) -> Self {
        Self { mortality, config }
    }

    /// Engine over the standard registry with default configuration
    pub fn standard() -> Self {
        Self::new(MortalityRegistry::standard(), ValuationConfig::default())
    }

    pub fn mortality(&self) -> &MortalityRegistry {
        &self.mortality
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Value an annuity
    pub fn evaluate(&self, params: &AnnuityParameters) -> AnnuityResult {
        let discount = DiscountRate::from_percent(params.interest_rate);
        let curve = self.mortality.curve(&params.mortality_table, params.sex);

        let life_expectancy = self.life_expectancy_on(curve, params.age);
        let present_value = self.present_value_on(params, curve, discount);
        let (projections, total_payments) = self.project(params, curve, life_expectancy);

        debug!(
            "Valued {} annuity age {} {} on {}: PV {:.2}, LE {:.1}, {} projection years",
            params.kind(),
            params.age,
            params.sex,
            params.mortality_table,
            present_value,
            life_expectancy,
            projections.len()
        );

        AnnuityResult {
            present_value: round_currency(present_value),
            monthly_payment: round_currency(params.annual_amount / 12.0),
            total_payments: round_currency(total_payments),
            life_expectancy,
            projections,
        }
    }

    /// Unrounded present value
    pub fn present_value(&self, params: &AnnuityParameters) -> f64 {
        let discount = DiscountRate::from_percent(params.interest_rate);
        let curve = self.mortality.curve(&params.mortality_table, params.sex);
        self.present_value_on(params, curve, discount)
    }

    /// Life expectancy of the primary annuitant, one decimal
    ///
    /// Uses the configured horizon and survival threshold.
    pub fn life_expectancy(&self, params: &AnnuityParameters) -> f64 {
        let curve = self.mortality.curve(&params.mortality_table, params.sex);
        self.life_expectancy_on(curve, params.age)
    }

    fn life_expectancy_on(&self, curve: &SurvivalCurve, age: u32) -> f64 {
        curve.life_expectancy_within(age, self.config.max_horizon, self.config.survival_threshold)
    }

    fn present_value_on(
        &self,
        params: &AnnuityParameters,
        curve: &SurvivalCurve,
        discount: DiscountRate,
    ) -> f64 {
        let amount = params.annual_amount;
        let life = PaymentSeries::life(&self.config);

        match params.annuity {
            AnnuityType::Simple => self.discounted_series(curve, params.age, amount, discount, life),

            AnnuityType::Temporary { duration } => {
                let series = PaymentSeries {
                    last_year: duration,
                    truncate: false,
                    ..life
                };
                self.discounted_series(curve, params.age, amount, discount, series)
            }

            AnnuityType::Deferred { deferral_period } => {
                let series = PaymentSeries {
                    first_year: deferral_period.saturating_add(1),
                    ..life
                };
                self.discounted_series(curve, params.age, amount, discount, series)
            }

            AnnuityType::Growing { growth_rate } => {
                let growth = growth_rate / 100.0;
                let series = PaymentSeries { growth, ..life };
                let effective = discount.growth_adjusted(growth);
                self.discounted_series(curve, params.age, amount, effective, series)
            }

            AnnuityType::Reversible {
                reversal_rate,
                spouse_age,
            } => {
                let primary = self.discounted_series(curve, params.age, amount, discount, life);

                let spouse_curve = self
                    .mortality
                    .curve(&params.mortality_table, params.sex.opposite());
                let survivor_amount = amount * reversal_rate / 100.0;
                let survivor =
                    self.discounted_series(spouse_curve, spouse_age, survivor_amount, discount, life);

                primary + self.config.joint_life_factor * survivor
            }
        }
    }

    /// Sum of payment x survival x discount over a series of years
    ///
    /// Survival is accumulated one age at a time. Once the curve runs out it
    /// stays flat, so the remaining years form a geometric series and are
    /// summed in closed form. The work is bounded by the curve length.
    fn discounted_series(
        &self,
        curve: &SurvivalCurve,
        age: u32,
        amount: f64,
        discount: DiscountRate,
        series: PaymentSeries,
    ) -> f64 {
        let mut pv = 0.0;
        let mut survival = 1.0;

        for year in 1..=series.last_year {
            let Some(q) = curve.rate(age as usize + year as usize - 1) else {
                if !(series.truncate && survival < self.config.survival_threshold) {
                    let first = year.max(series.first_year);
                    pv += flat_tail(amount * survival, discount, series, first);
                }
                break;
            };

            survival *= 1.0 - q;
            if series.truncate && survival < self.config.survival_threshold {
                break;
            }
            if year >= series.first_year {
                let payment = amount * compound(1.0 + series.growth, year - 1);
                pv += payment * survival * discount.factor(year);
            }
        }

        pv
    }

    /// Yearly projection over min(projection_years, ceil(life expectancy)) years
    ///
    /// Returns the points and the unrounded survival-weighted total.
    fn project(
        &self,
        params: &AnnuityParameters,
        curve: &SurvivalCurve,
        life_expectancy: f64,
    ) -> (Vec<ProjectionPoint>, f64) {
        let years = (life_expectancy.ceil().max(0.0) as u32).min(self.config.projection_years);
        let mut points = Vec::with_capacity(years as usize);
        let mut running_total = 0.0;

        for year in 1..=years {
            let payment = scheduled_payment(params, year);
            let survival = curve.survival_probability(params.age, year);
            running_total += payment * survival;

            points.push(ProjectionPoint {
                year,
                payment: round_currency(payment),
                cumulative_payment: round_currency(running_total),
                survival_probability: round_to(survival, 2),
            });
        }

        (points, running_total)
    }
}

/// Discounted payments for years `first..=series.last_year` at constant survival
///
/// `weight` is the annual amount times the flat survival probability.
fn flat_tail(weight: f64, discount: DiscountRate, series: PaymentSeries, first: u32) -> f64 {
    if first > series.last_year || weight == 0.0 {
        return 0.0;
    }

    let years = f64::from(series.last_year - first) + 1.0;
    let ratio = (1.0 + series.growth) * discount.factor(1);
    let first_term = weight * compound(1.0 + series.growth, first - 1) * discount.factor(first);

    if (ratio - 1.0).abs() < f64::EPSILON {
        first_term * years
    } else {
        first_term * (1.0 - ratio.powf(years)) / (1.0 - ratio)
    }
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::standard()
    }
}

/// Payment due in a projection year, before survival weighting
pub fn scheduled_payment(params: &AnnuityParameters, year: u32) -> f64 {
    let amount = params.annual_amount;
    match params.annuity {
        AnnuityType::Growing { growth_rate } => {
            amount * compound(1.0 + growth_rate / 100.0, year.saturating_sub(1))
        }
        AnnuityType::Temporary { duration } if year > duration => 0.0,
        AnnuityType::Deferred { deferral_period } if year <= deferral_period => 0.0,
        _ => amount,
    }
}
