//! Survival curves and the identifiers used to look them up
//!
//! A curve stores one-year death probabilities q(x) indexed by age, starting
//! at age 0. Curves are immutable once built; registries hand out shared
//! references only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the reference curves (ages 0-99)
pub const REFERENCE_CURVE_LENGTH: usize = 100;

/// Upper bound on any reference curve rate
pub const REFERENCE_RATE_CAP: f64 = 0.32;

/// Maximum number of years summed for life expectancy
pub const LIFE_EXPECTANCY_HORIZON: u32 = 50;

/// Running survival probability below which accumulation stops
pub const SURVIVAL_THRESHOLD: f64 = 0.01;

/// Sex of an annuitant, used to select the curve within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// The other sex (used for the survivor of a reversible annuity)
    pub fn opposite(self) -> Self {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }

    /// Lenient parse of form values; `None` for anything unrecognised
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "homme" | "h" => Some(Sex::Male),
            "female" | "f" | "femme" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named mortality table
///
/// Built-in tables have their own variants. Any other name parses to
/// `Custom`, which resolves only if a table with that name was registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MortalityTableId {
    /// Generational table, male reference
    Tgh05,
    /// Generational table, female reference
    Tgf05,
    /// Period table 2000-2002, male reference
    Th0002,
    /// Period table 2000-2002, female reference
    Tf0002,
    /// Single curve for both sexes
    Unisex,
    Custom(String),
}

impl MortalityTableId {
    /// Table used when a lookup fails
    pub const DEFAULT: MortalityTableId = MortalityTableId::Tgh05;

    pub fn builtin() -> [MortalityTableId; 5] {
        [
            MortalityTableId::Tgh05,
            MortalityTableId::Tgf05,
            MortalityTableId::Th0002,
            MortalityTableId::Tf0002,
            MortalityTableId::Unisex,
        ]
    }

    /// Case-insensitive parse; never fails
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "TGH05" => MortalityTableId::Tgh05,
            "TGF05" => MortalityTableId::Tgf05,
            "TH00-02" | "TH0002" => MortalityTableId::Th0002,
            "TF00-02" | "TF0002" => MortalityTableId::Tf0002,
            "UNISEX" => MortalityTableId::Unisex,
            _ => MortalityTableId::Custom(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MortalityTableId::Tgh05 => "TGH05",
            MortalityTableId::Tgf05 => "TGF05",
            MortalityTableId::Th0002 => "TH00-02",
            MortalityTableId::Tf0002 => "TF00-02",
            MortalityTableId::Unisex => "UNISEX",
            MortalityTableId::Custom(name) => name.as_str(),
        }
    }
}

impl Default for MortalityTableId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for MortalityTableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for MortalityTableId {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for MortalityTableId {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<MortalityTableId> for String {
    fn from(id: MortalityTableId) -> Self {
        id.as_str().to_string()
    }
}

/// One-year death probabilities by age
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalCurve {
    /// q(x) for x = 0..len
    rates: Vec<f64>,
}

impl SurvivalCurve {
    /// Build from explicit rates; each rate is clamped to [0, 1]
    pub fn new(rates: Vec<f64>) -> Self {
        let rates = rates
            .into_iter()
            .map(|q| if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) })
            .collect();
        Self { rates }
    }

    /// Capped linear ramp: q(i) = min(cap, base + slope * i)
    pub fn linear_ramp(base: f64, slope: f64, cap: f64, len: usize) -> Self {
        let rates = (0..len)
            .map(|i| (base + slope * i as f64).min(cap))
            .collect();
        Self::new(rates)
    }

    /// Reference curve shape shared by the built-in tables
    pub fn reference(base: f64, slope: f64) -> Self {
        Self::linear_ramp(base, slope, REFERENCE_RATE_CAP, REFERENCE_CURVE_LENGTH)
    }

    /// Death probability at an age, `None` past the end of the curve
    pub fn rate(&self, age: usize) -> Option<f64> {
        self.rates.get(age).copied()
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Probability that a life aged `age` is alive `years` later
    ///
    /// Product of (1 - q) over the ages covered by the curve. Ages past the
    /// last defined rate contribute a factor of 1.
    pub fn survival_probability(&self, age: u32, years: u32) -> f64 {
        let start = age as usize;
        let end = start.saturating_add(years as usize).min(self.rates.len());
        if start >= end {
            return 1.0;
        }
        self.rates[start..end].iter().map(|q| 1.0 - q).product()
    }

    /// Curtate life expectancy, rounded to one decimal
    ///
    /// Sums the running survival probability year by year over
    /// `LIFE_EXPECTANCY_HORIZON` years, stopping once it drops below
    /// `SURVIVAL_THRESHOLD`.
    pub fn life_expectancy(&self, age: u32) -> f64 {
        self.life_expectancy_within(age, LIFE_EXPECTANCY_HORIZON, SURVIVAL_THRESHOLD)
    }

    /// Curtate life expectancy over `horizon` years with an explicit cutoff
    pub fn life_expectancy_within(&self, age: u32, horizon: u32, threshold: f64) -> f64 {
        let mut survival = 1.0;
        let mut expectancy = 0.0;

        for year in 0..horizon {
            match self.rate(age as usize + year as usize) {
                Some(q) => survival *= 1.0 - q,
                // Flat past the end of the curve: the remaining years add the same amount
                None => {
                    if survival >= threshold {
                        expectancy += survival * f64::from(horizon - year);
                    }
                    break;
                }
            }
            if survival < threshold {
                break;
            }
            expectancy += survival;
        }

        (expectancy * 10.0_f64).round() / 10.0
    }

    /// True when rates never decrease with age
    pub fn is_non_decreasing(&self) -> bool {
        self.rates.windows(2).all(|w| w[0] <= w[1])
    }
}

/// A named table holding one curve per sex
#[derive(Debug, Clone, PartialEq)]
pub struct MortalityTable {
    pub id: MortalityTableId,
    pub male: SurvivalCurve,
    pub female: SurvivalCurve,
}

impl MortalityTable {
    pub fn new(id: MortalityTableId, male: SurvivalCurve, female: SurvivalCurve) -> Self {
        Self { id, male, female }
    }

    pub fn curve(&self, sex: Sex) -> &SurvivalCurve {
        match sex {
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        }
    }

    /// Reference curves for a built-in table, `None` for custom ids
    pub fn reference(id: &MortalityTableId) -> Option<Self> {
        // (male base, male slope, female base, female slope)
        let (mb, ms, fb, fs) = match id {
            MortalityTableId::Tgh05 => (0.0005, 0.0010, 0.0003, 0.0008),
            MortalityTableId::Tgf05 => (0.0004, 0.0009, 0.0002, 0.0007),
            MortalityTableId::Th0002 => (0.0008, 0.0012, 0.0005, 0.0010),
            MortalityTableId::Tf0002 => (0.0006, 0.0011, 0.0004, 0.0009),
            MortalityTableId::Unisex => (0.0004, 0.00095, 0.0004, 0.00095),
            MortalityTableId::Custom(_) => return None,
        };
        Some(Self::new(
            id.clone(),
            SurvivalCurve::reference(mb, ms),
            SurvivalCurve::reference(fb, fs),
        ))
    }
}
