//! Mortality model: survival curves, the table registry and table loading

mod table;
mod registry;
pub mod loader;

pub use table::{
    MortalityTable, MortalityTableId, Sex, SurvivalCurve,
    LIFE_EXPECTANCY_HORIZON, REFERENCE_CURVE_LENGTH, REFERENCE_RATE_CAP, SURVIVAL_THRESHOLD,
};
pub use registry::MortalityRegistry;
pub use loader::{load_registry, load_table, load_table_from_reader, load_tables};
