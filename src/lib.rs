//! Annuity System - Life annuity valuation engine
//!
//! This library provides:
//! - Reference and CSV-loaded mortality tables with survival and life expectancy
//! - Present values for simple, reversible, temporary, deferred and growing annuities
//! - Year-by-year expected cash-flow projections
//! - Form-level parameter validation
//! - Bounded calculation history and CSV/JSON exports
//! - Parallel batch and sensitivity runs

pub mod error;
pub mod mortality;
pub mod valuation;
pub mod validation;
pub mod history;
pub mod export;
pub mod scenario;

// Re-export commonly used types
pub use error::{AnnuityError, Result};
pub use mortality::{MortalityRegistry, MortalityTable, MortalityTableId, Sex, SurvivalCurve};
pub use valuation::{
    AnnuityKind, AnnuityParameters, AnnuityResult, AnnuityType, ProjectionPoint, ValuationConfig,
    ValuationEngine,
};
pub use history::CalculationHistory;
pub use scenario::ValuationRunner;
