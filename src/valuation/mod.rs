//! Annuity valuation: parameters, engine, discounting and result records

mod cashflows;
mod discount;
mod engine;
mod params;

pub use cashflows::{AnnuityResult, ProjectionPoint};
pub use discount::{compound, round_currency, round_to, DiscountRate};
pub use engine::{
    scheduled_payment, ValuationConfig, ValuationEngine,
    JOINT_LIFE_FACTOR, MAX_HORIZON_YEARS, MAX_PROJECTION_YEARS,
};
pub use params::{
    AnnuityKind, AnnuityParameters, AnnuityType, ParameterRecord,
    DEFAULT_DEFERRAL_PERIOD, DEFAULT_DURATION, DEFAULT_GROWTH_RATE, DEFAULT_REVERSAL_RATE,
    SPOUSE_AGE_GAP,
};
