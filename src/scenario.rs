//! Batch and sensitivity runs over a shared valuation engine
//!
//! The engine holds only read-only data, so valuations run in parallel
//! without locking.

use rayon::prelude::*;

use crate::valuation::{AnnuityKind, AnnuityParameters, AnnuityResult, ValuationEngine};

/// Runs many valuations against one engine
///
/// # Example
/// ```ignore
/// let runner = ValuationRunner::new();
///
/// for (rate, result) in runner.rate_sensitivity(&params, &[1.0, 2.0, 3.0]) {
///     println!("{rate}%: {}", result.present_value);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValuationRunner {
    engine: ValuationEngine,
}

impl ValuationRunner {
    /// Runner over the standard mortality registry
    pub fn new() -> Self {
        Self::with_engine(ValuationEngine::standard())
    }

    pub fn with_engine(engine: ValuationEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ValuationEngine {
        &self.engine
    }

    pub fn run(&self, params: &AnnuityParameters) -> AnnuityResult {
        self.engine.evaluate(params)
    }

    /// Value every parameter record in parallel; output order matches input
    pub fn run_batch(&self, params: &[AnnuityParameters]) -> Vec<AnnuityResult> {
        params.par_iter().map(|p| self.engine.evaluate(p)).collect()
    }

    /// Same annuity at each technical rate (percent)
    pub fn rate_sensitivity(
        &self,
        params: &AnnuityParameters,
        rates: &[f64],
    ) -> Vec<(f64, AnnuityResult)> {
        rates
            .par_iter()
            .map(|&rate| {
                let scenario = AnnuityParameters {
                    interest_rate: rate,
                    ..params.clone()
                };
                (rate, self.engine.evaluate(&scenario))
            })
            .collect()
    }

    /// Same annuitant under each annuity type with default terms
    pub fn compare_types(
        &self,
        params: &AnnuityParameters,
        kinds: &[AnnuityKind],
    ) -> Vec<(AnnuityKind, AnnuityResult)> {
        kinds
            .par_iter()
            .map(|&kind| (kind, self.engine.evaluate(&params.clone().with_kind(kind))))
            .collect()
    }
}
