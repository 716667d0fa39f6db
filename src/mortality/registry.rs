//! Read-only registry of mortality tables
//!
//! The standard registry holds the built-in reference tables and is created
//! once per process. Lookups never fail: anything that does not resolve falls
//! back to the male curve of the default table.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use log::{debug, warn};

use super::table::{MortalityTable, MortalityTableId, Sex, SurvivalCurve};

static STANDARD: OnceLock<Arc<MortalityRegistry>> = OnceLock::new();

/// Immutable set of mortality tables with a deterministic fallback curve
#[derive(Debug, Clone)]
pub struct MortalityRegistry {
    tables: HashMap<MortalityTableId, MortalityTable>,
    /// Male curve of the default table
    fallback: SurvivalCurve,
}

impl MortalityRegistry {
    /// Shared registry of the built-in tables, initialized on first use
    pub fn standard() -> Arc<MortalityRegistry> {
        STANDARD
            .get_or_init(|| {
                debug!("Initializing standard mortality registry");
                Arc::new(Self::builtin())
            })
            .clone()
    }

    /// Fresh registry holding every built-in reference table
    pub fn builtin() -> Self {
        let tables: HashMap<_, _> = MortalityTableId::builtin()
            .iter()
            .filter_map(MortalityTable::reference)
            .map(|table| (table.id.clone(), table))
            .collect();

        let fallback = tables
            .get(&MortalityTableId::DEFAULT)
            .map(|table| table.male.clone())
            .unwrap_or_else(|| SurvivalCurve::reference(0.0005, 0.0010));

        Self { tables, fallback }
    }

    /// Add or replace a table, returning the extended registry
    ///
    /// Replacing the default table also replaces the fallback curve.
    pub fn with_table(mut self, table: MortalityTable) -> Self {
        if table.id == MortalityTableId::DEFAULT {
            self.fallback = table.male.clone();
        }
        self.tables.insert(table.id.clone(), table);
        self
    }

    /// Add every table from an iterator
    pub fn with_tables(self, tables: impl IntoIterator<Item = MortalityTable>) -> Self {
        tables.into_iter().fold(self, Self::with_table)
    }

    /// Registered table ids, sorted by name
    pub fn table_ids(&self) -> Vec<MortalityTableId> {
        let mut ids: Vec<_> = self.tables.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    pub fn contains(&self, table: &MortalityTableId) -> bool {
        self.tables.contains_key(table)
    }

    /// Curve fallback used for any unresolved lookup
    pub fn fallback_curve(&self) -> &SurvivalCurve {
        &self.fallback
    }

    /// Resolve a curve from raw form values
    ///
    /// Both arguments may be arbitrary strings. An unknown table or sex
    /// resolves to the fallback curve.
    pub fn resolve_curve(&self, table: &str, sex: &str) -> &SurvivalCurve {
        match Sex::parse(sex) {
            Some(sex) => self.curve(&MortalityTableId::parse(table), sex),
            None => {
                warn!("Unknown sex '{}', using fallback mortality curve", sex);
                &self.fallback
            }
        }
    }

    /// Curve for a table and sex, falling back when the table is unknown
    pub fn curve(&self, table: &MortalityTableId, sex: Sex) -> &SurvivalCurve {
        match self.tables.get(table) {
            Some(t) => t.curve(sex),
            None => {
                warn!(
                    "Unknown mortality table '{}', using {} male curve",
                    table,
                    MortalityTableId::DEFAULT
                );
                &self.fallback
            }
        }
    }

    /// Probability that a life survives `years` more years
    pub fn survival_probability(
        &self,
        age: u32,
        sex: Sex,
        table: &MortalityTableId,
        years: u32,
    ) -> f64 {
        self.curve(table, sex).survival_probability(age, years)
    }

    /// Curtate life expectancy, rounded to one decimal
    pub fn life_expectancy(&self, age: u32, sex: Sex, table: &MortalityTableId) -> f64 {
        self.curve(table, sex).life_expectancy(age)
    }
}

impl Default for MortalityRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
